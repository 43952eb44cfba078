//! One request, end to end

use std::sync::Arc;

use ridecheck_core::{Endpoint, Flags};

use crate::accumulator::Accumulator;
use crate::assertion::Assertion;
use crate::dispatch::{DispatchError, TestTable, resolve_endpoint};
use crate::http::HttpCall;
use crate::openapi::SpecDocument;
use crate::report::Report;
use crate::request::ApiRequest;
use crate::suites::TestContext;

/// Issues requests and runs the matching test implementation on each response.
pub struct Orchestrator<C> {
    client: C,
    spec: Arc<SpecDocument>,
    tests: TestTable,
    endpoints: Vec<Endpoint>,
}

impl<C: HttpCall> Orchestrator<C> {
    pub fn new(client: C, spec: Arc<SpecDocument>, tests: TestTable) -> Self {
        let endpoints = tests.endpoints();
        Self {
            client,
            spec,
            tests,
            endpoints,
        }
    }

    #[must_use]
    pub fn spec(&self) -> &SpecDocument {
        &self.spec
    }

    #[must_use]
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Test one request.
    ///
    /// A transport failure yields a report with a single failing result and
    /// no domain assertions.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the request targets no registered endpoint.
    /// No request is issued in that case.
    pub fn run(&self, request: &ApiRequest, flags: &Flags) -> Result<Report, DispatchError> {
        let resolved = resolve_endpoint(&self.endpoints, request.method().as_str(), request.url())?;
        let test = self.tests.lookup(&resolved.endpoint)?;

        tracing::debug!(endpoint = %resolved.endpoint, url = %request.url(), "issuing request");
        let results = match self.client.call(request) {
            Ok(response) => {
                let ctx = TestContext {
                    spec: &self.spec,
                    request,
                    response: &response,
                    server_base: &resolved.server_base,
                    endpoint: resolved.endpoint,
                    flags,
                };
                let mut acc = Accumulator::new();
                test(&ctx, &mut acc);
                acc.execute_all()
            }
            Err(error) => {
                tracing::warn!(endpoint = %resolved.endpoint, %error, "API call failed");
                let mut acc = Accumulator::new();
                acc.queue_critical(Assertion::ApiCallSuccess { error });
                acc.execute_all()
            }
        };

        let report = Report::new(
            resolved.endpoint.label(),
            resolved.server_base,
            request.url().as_str(),
            results,
        );
        tracing::info!(
            endpoint = report.endpoint(),
            assertions = report.results().len(),
            errors = report.error_count(),
            "request tested"
        );
        Ok(report)
    }
}
