use crate::errors::OpsError;
use crate::utils::data_path::lookup;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed '{{{{' at byte {0}")]
    Unclosed(usize),
    #[error("empty expression at byte {0}")]
    EmptyExpression(usize),
    #[error("invalid expression '{0}'")]
    InvalidExpression(String),
    #[error("missing value for '{0}'")]
    Missing(String),
}

impl From<TemplateError> for OpsError {
    fn from(err: TemplateError) -> Self {
        OpsError::template(format!("Template error: {}", err))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Expr(String),
}

/// `{{ path }}` placeholders resolved against a JSON context.
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;
        while let Some(start) = rest.find("{{") {
            let (prefix, tail) = rest.split_at(start);
            if !prefix.is_empty() {
                segments.push(Segment::Literal(prefix.to_string()));
            }
            let end = tail
                .find("}}")
                .ok_or(TemplateError::Unclosed(offset + start))?;
            let expr = tail[2..end].trim();
            if expr.is_empty() {
                return Err(TemplateError::EmptyExpression(offset + start));
            }
            if expr.contains("{{") {
                return Err(TemplateError::InvalidExpression(expr.to_string()));
            }
            segments.push(Segment::Expr(expr.to_string()));
            offset += start + end + 2;
            rest = &tail[end + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn placeholders(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Expr(expr) => Some(expr.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Every placeholder must resolve; `escape` is applied to substituted
    /// values only, never to the template text.
    pub fn render(&self, context: &Value, escape: fn(&str) -> String) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Expr(expr) => {
                    let value = lookup(context, expr)
                        .map_err(|_| TemplateError::InvalidExpression(expr.clone()))?
                        .filter(|v| !v.is_null())
                        .ok_or_else(|| TemplateError::Missing(expr.clone()))?;
                    out.push_str(&escape(&stringify(value)));
                }
            }
        }
        Ok(out)
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(num) => num.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

pub fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
