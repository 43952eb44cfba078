//! Outgoing request description

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid HTTP method '{0}'")]
    Method(String),
    #[error("invalid URL '{url}': {reason}")]
    Url { url: String, reason: String },
    #[error("invalid header '{0}'")]
    Header(String),
}

/// A request to issue against the server under test.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// # Errors
    ///
    /// Returns error if the method is not a valid token or the URL is not
    /// an absolute http(s) URL.
    pub fn new(method: &str, url: &str) -> Result<Self, RequestError> {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| RequestError::Method(method.to_string()))?;
        let parsed = Url::parse(url).map_err(|e| RequestError::Url {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RequestError::Url {
                url: url.to_string(),
                reason: "scheme must be http or https".into(),
            });
        }
        Ok(Self {
            method,
            url: parsed,
            headers: HeaderMap::new(),
            body: None,
        })
    }

    /// # Errors
    ///
    /// Returns error if name or value is not a valid HTTP header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, RequestError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| RequestError::Header(name.to_string()))?;
        let value =
            HeaderValue::from_str(value).map_err(|_| RequestError::Header(name.to_string()))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    #[must_use]
    pub fn with_json_body(mut self, body: &serde_json::Value) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(body.to_string().into_bytes());
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// First value of a query parameter, percent-decoded.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Query parameter value, empty when absent.
    #[must_use]
    pub fn query_or_empty(&self, name: &str) -> String {
        self.query(name).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_method_case_insensitively() {
        let req = ApiRequest::new("patch", "http://localhost:8080/bookings/1").unwrap();
        assert_eq!(*req.method(), Method::PATCH);
    }

    #[test]
    fn rejects_relative_and_non_http_urls() {
        assert!(matches!(
            ApiRequest::new("GET", "/status"),
            Err(RequestError::Url { .. })
        ));
        assert!(matches!(
            ApiRequest::new("GET", "ftp://example.com/status"),
            Err(RequestError::Url { .. })
        ));
    }

    #[test]
    fn query_lookup_decodes_and_defaults() {
        let req = ApiRequest::new(
            "GET",
            "http://h/driver_journeys?departureLat=46.16&message=hello%20there&count=",
        )
        .unwrap();
        assert_eq!(req.query("departureLat").as_deref(), Some("46.16"));
        assert_eq!(req.query("message").as_deref(), Some("hello there"));
        assert_eq!(req.query("count").as_deref(), Some(""));
        assert_eq!(req.query("timeDelta"), None);
        assert_eq!(req.query_or_empty("timeDelta"), "");
    }

    #[test]
    fn json_body_sets_content_type() {
        let req = ApiRequest::new("POST", "http://h/messages")
            .unwrap()
            .with_json_body(&serde_json::json!({"message": "hi"}));
        assert_eq!(
            req.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(req.body(), Some(br#"{"message":"hi"}"#.as_slice()));
    }

    #[test]
    fn invalid_header_value_rejected() {
        let err = ApiRequest::new("GET", "http://h/status")
            .unwrap()
            .with_header("X-API-KEY", "bad\nvalue")
            .unwrap_err();
        assert!(matches!(err, RequestError::Header(_)));
    }
}
