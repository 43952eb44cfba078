//! Query parameter parsing with default-value fallback
//!
//! An empty raw value means "parameter absent" and resolves to the default.
//! Anything else must parse, otherwise the caller gets a [`ParseError`].

/// Failure to parse a query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("\"{0}\" is not a valid number")]
    Float(String),
    #[error("\"{0}\" is not a valid integer")]
    Int(String),
}

/// Parse a float query value.
///
/// # Errors
///
/// Returns [`ParseError::Float`] when `raw` is empty or not a float.
pub fn parse_query_float(raw: &str) -> Result<f64, ParseError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::Float(raw.to_string()))
}

/// Parse a float query value, falling back to `default` when blank.
///
/// # Errors
///
/// Returns [`ParseError::Float`] when `raw` is non-blank and not a float.
pub fn parse_query_float_or(raw: &str, default: f64) -> Result<f64, ParseError> {
    if raw.trim().is_empty() {
        Ok(default)
    } else {
        parse_query_float(raw)
    }
}

/// Parse an integer query value (dates, time deltas, counts).
///
/// # Errors
///
/// Returns [`ParseError::Int`] when `raw` is empty or not an integer.
pub fn parse_query_int(raw: &str) -> Result<i64, ParseError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ParseError::Int(raw.to_string()))
}

/// Parse an integer query value, falling back to `default` when blank.
///
/// # Errors
///
/// Returns [`ParseError::Int`] when `raw` is non-blank and not an integer.
pub fn parse_query_int_or(raw: &str, default: i64) -> Result<i64, ParseError> {
    if raw.trim().is_empty() {
        Ok(default)
    } else {
        parse_query_int(raw)
    }
}
