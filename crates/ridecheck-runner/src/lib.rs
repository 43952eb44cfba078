//! ridecheck-runner: conformance checks for carpooling API servers

pub mod accumulator;
pub mod assertion;
pub mod body;
pub mod dispatch;
pub mod http;
pub mod openapi;
pub mod orchestrator;
pub mod report;
pub mod request;
pub mod suites;
pub mod validator;

pub use accumulator::Accumulator;
pub use assertion::{Assertion, AssertionError, Leg, Origin, ParsingError};
pub use body::{BodyError, CapturedResponse, ReplayableBody};
pub use dispatch::{DispatchError, ResolvedEndpoint, TestImplementation, TestTable, resolve_endpoint};
pub use http::{HttpCall, HttpClient, TransportError};
pub use openapi::{SpecDocument, SpecError};
pub use orchestrator::Orchestrator;
pub use report::{AssertionResult, Report};
pub use request::{ApiRequest, RequestError};
pub use suites::TestContext;
pub use validator::{ValidationError, validate_response};
