//! Serializable report format
//!
//! The runner produces these from its in-memory reports; the CLI prints them
//! as JSON and exports their JSON Schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of one executed assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AssertionRecord {
    /// What the assertion checks, e.g. "status code is 200"
    pub description: String,
    /// Failure message, absent when the assertion passed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssertionRecord {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// All assertion outcomes for one tested request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportRecord {
    /// Operation label: "GET /driver_journeys"
    pub endpoint: String,
    /// Server prefix the request URL was resolved against
    pub server_base: String,
    /// URL that was requested
    pub url: String,
    /// Executed assertions, in execution order
    pub assertions: Vec<AssertionRecord>,
}

impl ReportRecord {
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.assertions.iter().filter(|a| !a.passed()).count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.assertions.iter().any(|a| !a.passed())
    }
}

/// Aggregate over several tested requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RunSummary {
    /// Number of requests tested
    pub requests: u64,
    /// Number of requests with at least one failed assertion
    pub failed_requests: u64,
    /// Number of assertions executed
    pub assertions: u64,
    /// Number of failed assertions
    pub failed_assertions: u64,
    /// Requests that could not be tested at all (unknown endpoint, ...)
    #[serde(default)]
    pub errors: Vec<String>,
    /// Per-request reports
    pub reports: Vec<ReportRecord>,
}

impl RunSummary {
    pub fn record(&mut self, report: ReportRecord) {
        self.requests += 1;
        self.assertions += report.assertions.len() as u64;
        let failed = report.error_count() as u64;
        self.failed_assertions += failed;
        if failed > 0 {
            self.failed_requests += 1;
        }
        self.reports.push(report);
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Process exit code for this run.
    ///
    /// - 3: some request could not be tested (tool error)
    /// - 1: at least one assertion failed
    /// - 0: every assertion passed
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if !self.errors.is_empty() {
            3
        } else if self.failed_assertions > 0 {
            1
        } else {
            0
        }
    }
}

/// Generate JSON Schema for the report format.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(RunSummary);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}
