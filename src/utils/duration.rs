use crate::errors::OpsError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static UNIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)").expect("duration regex")
});

fn unit_nanos(unit: &str) -> f64 {
    match unit {
        "ns" => 1.0,
        "us" | "µs" | "μs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60.0 * 1e9,
        _ => 3600.0 * 1e9,
    }
}

/// Parses Go-style durations such as `10m`, `1h30m`, `1.5h` or `90s`. A bare
/// `0` is accepted; negative durations are not.
pub fn parse_duration(raw: &str) -> Result<Duration, OpsError> {
    let text = raw.trim();
    let invalid = || {
        OpsError::invalid_params(format!("Invalid duration '{}'", raw))
            .with_hint("Use a number followed by a unit, e.g. 90s, 5m or 1h30m.")
    };
    if text == "0" {
        return Ok(Duration::ZERO);
    }
    if text.is_empty() || text.starts_with('-') {
        return Err(invalid());
    }
    let text = text.strip_prefix('+').unwrap_or(text);

    let mut consumed = 0;
    let mut nanos = 0f64;
    for caps in UNIT_RE.captures_iter(text) {
        let whole = caps.get(0).ok_or_else(invalid)?;
        if whole.start() != consumed {
            return Err(invalid());
        }
        consumed = whole.end();
        let amount: f64 = caps[1].parse().map_err(|_| invalid())?;
        nanos += amount * unit_nanos(&caps[2]);
    }
    if consumed == 0 || consumed != text.len() {
        return Err(invalid());
    }
    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}

/// Clap value parser wrapper.
pub fn parse_duration_arg(raw: &str) -> Result<Duration, String> {
    parse_duration(raw).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::parse_duration;
    use std::time::Duration;

    #[test]
    fn parses_single_and_compound_units() {
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "5", "m", "-5m", "5 m", "5mm", "10x", "1h 30m"] {
            assert!(parse_duration(raw).is_err(), "{} should be rejected", raw);
        }
    }
}
