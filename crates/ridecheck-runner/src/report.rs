//! Per-request report

use ridecheck_core::{AssertionRecord, ReportRecord};

use crate::assertion::AssertionError;

/// One executed assertion.
#[derive(Debug)]
pub struct AssertionResult {
    pub description: String,
    pub error: Option<AssertionError>,
}

impl AssertionResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Results of every assertion executed for one request.
#[derive(Debug)]
pub struct Report {
    endpoint: String,
    server_base: String,
    url: String,
    results: Vec<AssertionResult>,
}

impl Report {
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        server_base: impl Into<String>,
        url: impl Into<String>,
        results: Vec<AssertionResult>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            server_base: server_base.into(),
            url: url.into(),
            results,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn server_base(&self) -> &str {
        &self.server_base
    }

    #[must_use]
    pub fn results(&self) -> &[AssertionResult] {
        &self.results
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|r| !r.passed())
    }

    /// Terminal rendering. Passing assertions are only listed when `verbose`.
    #[must_use]
    pub fn render(&self, verbose: bool) -> String {
        let mut lines = Vec::new();
        for result in &self.results {
            match &result.error {
                Some(e) => lines.push(format!("FAIL {}: {e}", result.description)),
                None if verbose => lines.push(format!("PASS {}", result.description)),
                None => {}
            }
        }
        lines.join("\n")
    }

    #[must_use]
    pub fn to_record(&self) -> ReportRecord {
        ReportRecord {
            endpoint: self.endpoint.clone(),
            server_base: self.server_base.clone(),
            url: self.url.clone(),
            assertions: self
                .results
                .iter()
                .map(|r| AssertionRecord {
                    description: r.description.clone(),
                    error: r.error.as_ref().map(ToString::to_string),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        Report::new(
            "GET /driver_journeys",
            "http://localhost:8080",
            "http://localhost:8080/driver_journeys?count=1",
            vec![
                AssertionResult {
                    description: "status code is 200".into(),
                    error: None,
                },
                AssertionResult {
                    description: "result count does not exceed count".into(),
                    error: Some(AssertionError::CountExceeded {
                        limit: 1,
                        actual: 2,
                    }),
                },
                AssertionResult {
                    description: "result ids are unique".into(),
                    error: Some(AssertionError::DuplicateId("j1".into())),
                },
            ],
        )
    }

    #[test]
    fn counts_errors() {
        let report = sample();
        assert_eq!(report.error_count(), 2);
        assert!(report.has_errors());
        assert!(!Report::new("GET /status", "", "", vec![]).has_errors());
    }

    #[test]
    fn render_verbose() {
        insta::assert_snapshot!(sample().render(true), @r#"
          PASS status code is 200
          FAIL result count does not exceed count: 2 results returned, more than count=1
          FAIL result ids are unique: duplicate id "j1"
        "#);
    }

    #[test]
    fn render_hides_passes_by_default() {
        let rendered = sample().render(false);
        assert!(!rendered.contains("PASS"));
        assert_eq!(rendered.lines().count(), 2);
    }

    #[test]
    fn record_keeps_order_and_messages() {
        let record = sample().to_record();
        assert_eq!(record.endpoint, "GET /driver_journeys");
        assert_eq!(record.error_count(), 2);
        assert_eq!(record.assertions[0].error, None);
        assert_eq!(
            record.assertions[2].error.as_deref(),
            Some("duplicate id \"j1\"")
        );
    }
}
