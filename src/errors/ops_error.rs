use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpsErrorKind {
    InvalidParams,
    Subprocess,
    Filesystem,
    Validation,
    Template,
}

/// Every failure in a run ends up here. The kind only feeds diagnostics:
/// all of them abort the run the same way.
#[derive(Debug, Clone, Serialize)]
pub struct OpsError {
    pub kind: OpsErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl OpsError {
    pub fn new(kind: OpsErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(OpsErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    pub fn subprocess(message: impl Into<String>) -> Self {
        Self::new(OpsErrorKind::Subprocess, "SUBPROCESS", message)
    }

    pub fn filesystem(message: impl Into<String>) -> Self {
        Self::new(OpsErrorKind::Filesystem, "FILESYSTEM", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(OpsErrorKind::Validation, "VALIDATION", message)
    }

    pub fn template(message: impl Into<String>) -> Self {
        Self::new(OpsErrorKind::Template, "TEMPLATE", message)
    }
}

impl fmt::Display for OpsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(hint) = self.hint.as_ref() {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

impl Error for OpsError {}

impl From<std::io::Error> for OpsError {
    fn from(err: std::io::Error) -> Self {
        OpsError::filesystem(err.to_string())
    }
}

impl From<walkdir::Error> for OpsError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.display().to_string());
        let mut out = OpsError::filesystem(format!("Failed to walk directory: {}", err));
        if let Some(path) = path {
            out = out.with_details(serde_json::json!({ "path": path }));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{OpsError, OpsErrorKind};

    #[test]
    fn io_errors_map_to_filesystem_kind() {
        let err: OpsError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind, OpsErrorKind::Filesystem);
        assert_eq!(err.code, "FILESYSTEM");
    }

    #[test]
    fn display_appends_hint() {
        let err = OpsError::validation("bad ip").with_hint("pass -ip");
        assert_eq!(err.to_string(), "bad ip (hint: pass -ip)");
    }
}
