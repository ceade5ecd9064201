use crate::errors::OpsError;
use std::net::Ipv4Addr;

#[derive(Clone)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_non_empty(&self, value: &str, label: &str) -> Result<String, OpsError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(OpsError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        if trimmed.contains('\0') {
            return Err(OpsError::invalid_params(format!(
                "{} must not contain null bytes",
                label
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Dotted-quad only: no IPv6, no surrounding whitespace, no leading zeros.
    pub fn ensure_ipv4(&self, value: &str) -> Result<Ipv4Addr, OpsError> {
        value.parse::<Ipv4Addr>().map_err(|_| {
            OpsError::validation(format!("'{}' is not a valid ip", value))
                .with_hint("Expected a dotted-quad IPv4 address such as 203.0.113.7.")
        })
    }

    /// Labels end up in a file name and a launchd job name.
    pub fn ensure_label(&self, value: &str) -> Result<String, OpsError> {
        let label = self.ensure_non_empty(value, "label")?;
        if label
            .chars()
            .any(|ch| ch == '/' || ch == '\\' || ch.is_whitespace())
        {
            return Err(OpsError::invalid_params(format!(
                "label '{}' must not contain slashes or whitespace",
                label
            )));
        }
        if label.starts_with('.') || label.ends_with('.') {
            return Err(OpsError::invalid_params(format!(
                "label '{}' must not start or end with a dot",
                label
            )));
        }
        Ok(label)
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Validation;
    use crate::errors::OpsErrorKind;

    #[test]
    fn ipv4_accepts_dotted_quads_only() {
        let validation = Validation::new();
        assert_eq!(
            validation.ensure_ipv4("10.0.0.5").expect("valid").octets(),
            [10, 0, 0, 5]
        );
        for raw in ["", "10.0.0", "256.1.1.1", "::1", " 10.0.0.5", "host.example", "010.0.0.5"] {
            let err = validation.ensure_ipv4(raw).expect_err(raw);
            assert_eq!(err.kind, OpsErrorKind::Validation);
        }
    }

    #[test]
    fn label_rejects_path_characters() {
        let validation = Validation::new();
        assert_eq!(validation.ensure_label(" com.test ").expect("ok"), "com.test");
        assert!(validation.ensure_label("com/test").is_err());
        assert!(validation.ensure_label("com test").is_err());
        assert!(validation.ensure_label(".hidden").is_err());
        assert!(validation.ensure_label("").is_err());
    }
}
