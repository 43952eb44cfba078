//! Response validation against the OpenAPI document
//!
//! Binds a captured exchange to its operation, then checks status code,
//! declared headers, Content-Type and body schema. No I/O beyond reading
//! the (replayable) response body.

use crate::body::{BodyError, CapturedResponse};
use crate::openapi::{ResponseSpec, SpecDocument, is_json_media};
use crate::request::ApiRequest;

/// Server base used when the request context does not record one.
pub const DEFAULT_SERVER_BASE: &str = "http://localhost:8080";

/// Maximum number of schema violations reported per body.
const MAX_BODY_VIOLATIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no operation in the OpenAPI document matches {method} {url}")]
    RouteNotFound { method: String, url: String },
    #[error("response does not conform to {operation}: {}", .violations.join("; "))]
    Schema {
        operation: String,
        violations: Vec<String>,
    },
    #[error(transparent)]
    Body(#[from] BodyError),
}

/// Validate `response` against the operation `request` resolves to.
///
/// `server_base` is the URL prefix the request was resolved against; `None`
/// falls back to [`DEFAULT_SERVER_BASE`].
///
/// # Errors
///
/// - [`ValidationError::RouteNotFound`] when no operation matches
/// - [`ValidationError::Schema`] listing every violation found
/// - [`ValidationError::Body`] when the body could not be read
pub fn validate_response(
    spec: &SpecDocument,
    request: &ApiRequest,
    response: &CapturedResponse,
    server_base: Option<&str>,
) -> Result<(), ValidationError> {
    let method = request.method().as_str();
    let path = route_path(request, server_base.unwrap_or(DEFAULT_SERVER_BASE));
    let operation = path
        .as_deref()
        .and_then(|p| spec.find_operation(method, p))
        .ok_or_else(|| ValidationError::RouteNotFound {
            method: method.to_string(),
            url: without_credentials(request.url()).to_string(),
        })?;
    tracing::debug!(operation = %operation.label(), "validating response");

    let status = response.status();
    let Some(declared) = operation.response_for(status) else {
        return Err(ValidationError::Schema {
            operation: operation.label(),
            violations: vec![format!(
                "status {status} is not declared (declared: {})",
                operation.declared_statuses().join(", ")
            )],
        });
    };

    let mut violations = Vec::new();
    check_headers(declared, response, &mut violations);
    check_body(declared, response, &mut violations)?;

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Schema {
            operation: operation.label(),
            violations,
        })
    }
}

/// Request path relative to `server_base`, `None` if the URL lies outside it.
fn route_path(request: &ApiRequest, server_base: &str) -> Option<String> {
    let mut url = without_credentials(request.url());
    url.set_query(None);
    url.set_fragment(None);
    let full = url.as_str();
    let base = server_base.trim_end_matches('/');
    let rest = full.strip_prefix(base)?;
    if rest.is_empty() {
        Some("/".to_string())
    } else if rest.starts_with('/') {
        Some(rest.to_string())
    } else {
        // "http://h/api" must not match "http://h/apiv2/..."
        None
    }
}

/// Copy of `url` with userinfo removed; server bases are built from the origin,
/// which never carries it.
fn without_credentials(url: &reqwest::Url) -> reqwest::Url {
    let mut url = url.clone();
    // Only fails for URLs that cannot carry userinfo in the first place.
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url
}

fn check_headers(
    declared: &ResponseSpec,
    response: &CapturedResponse,
    violations: &mut Vec<String>,
) {
    for header in &declared.headers {
        let Some(present) = response.headers().get(header.name.as_str()) else {
            if header.required {
                violations.push(format!("required header {} is missing", header.name));
            }
            continue;
        };
        let Ok(raw) = present.to_str() else {
            violations.push(format!("header {} is not valid text", header.name));
            continue;
        };
        let Some(schema) = &header.schema else {
            continue;
        };
        let value = header_value(raw, header.value_type.as_deref());
        let errors: Vec<String> = schema.iter_errors(&value).map(|e| e.to_string()).collect();
        if !errors.is_empty() {
            violations.push(format!(
                "header {} value \"{raw}\": {}",
                header.name,
                errors.join(", ")
            ));
        }
    }
}

/// Interpret a header string as the JSON type its schema declares.
fn header_value(raw: &str, value_type: Option<&str>) -> serde_json::Value {
    let raw = raw.trim();
    let parsed = match value_type {
        Some("integer") => raw.parse::<i64>().ok().map(serde_json::Value::from),
        Some("number") => raw.parse::<f64>().ok().map(serde_json::Value::from),
        Some("boolean") => raw.parse::<bool>().ok().map(serde_json::Value::from),
        _ => None,
    };
    parsed.unwrap_or_else(|| serde_json::Value::String(raw.to_string()))
}

/// Content-Type conformance and body schema.
///
/// - Content declared + empty body → violation
/// - Content declared + media type mismatch → violation
/// - JSON schema declared → body must parse and validate
/// - Nothing declared → body not checked
fn check_body(
    declared: &ResponseSpec,
    response: &CapturedResponse,
    violations: &mut Vec<String>,
) -> Result<(), ValidationError> {
    if declared.content_types.is_empty() {
        return Ok(());
    }
    let body = response.body()?;
    if body.is_empty() {
        violations.push(format!(
            "body is empty, expected one of {:?}",
            declared.content_types
        ));
        return Ok(());
    }

    match response.header("content-type") {
        Some(actual) => {
            let media = actual.split(';').next().unwrap_or("").trim();
            if !declared
                .content_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(media))
            {
                violations.push(format!(
                    "Content-Type \"{media}\" is not one of {:?}",
                    declared.content_types
                ));
                return Ok(());
            }
            if !is_json_media(media) {
                return Ok(());
            }
        }
        None => {
            violations.push(format!(
                "Content-Type header is missing, expected one of {:?}",
                declared.content_types
            ));
            return Ok(());
        }
    }

    let Some(schema) = &declared.body else {
        return Ok(());
    };
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => {
            violations.extend(
                schema
                    .iter_errors(&value)
                    .take(MAX_BODY_VIOLATIONS)
                    .map(|e| e.to_string()),
            );
        }
        Err(e) => violations.push(format!("body is not valid JSON: {e}")),
    }
    Ok(())
}
