//! ridecheck-core: Core types for carpooling API conformance testing
//!
//! Endpoints, geographic and query-parameter primitives, test flags,
//! configuration, and the serializable report format. No network I/O.

pub mod config;
pub mod endpoint;
pub mod flags;
pub mod geo;
pub mod params;
pub mod report;

pub use config::{Config, ConfigError, Expectations, RequestCase};
pub use endpoint::Endpoint;
pub use flags::{DEFAULT_RADIUS_MARGIN, Flags};
pub use geo::{Coordinate, distance};
pub use params::ParseError;
pub use report::{AssertionRecord, ReportRecord, RunSummary};
