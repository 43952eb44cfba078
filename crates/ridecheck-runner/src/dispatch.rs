//! Endpoint resolution and test selection

use std::collections::HashMap;

use reqwest::Url;
use ridecheck_core::Endpoint;

use crate::accumulator::Accumulator;
use crate::suites::{self, TestContext};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown endpoint: {method} {path}")]
    UnknownEndpoint { method: String, path: String },
    #[error("no test implementation registered for {0}")]
    NoTestImplementation(Endpoint),
}

/// Queues every assertion that applies to one endpoint.
pub type TestImplementation = for<'a> fn(&TestContext<'a>, &mut Accumulator<'a>);

/// A request bound to the endpoint it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub endpoint: Endpoint,
    /// Origin plus whatever path prefix precedes the endpoint template,
    /// e.g. `https://api.example.com/v1`
    pub server_base: String,
}

/// Identify the endpoint `method` + `url` targets among `known`.
///
/// The query string is ignored. Endpoints with a trailing path parameter
/// have their last segment split off before matching. When several
/// endpoints match, the longest template wins, then the longest server
/// prefix.
///
/// # Errors
///
/// Returns [`DispatchError::UnknownEndpoint`] when nothing matches.
pub fn resolve_endpoint(
    known: &[Endpoint],
    method: &str,
    url: &Url,
) -> Result<ResolvedEndpoint, DispatchError> {
    let path = url.path().trim_end_matches('/');

    let mut best: Option<((usize, usize), Endpoint, &str)> = None;
    for endpoint in known
        .iter()
        .filter(|e| e.method.eq_ignore_ascii_case(method))
    {
        let candidate = if endpoint.has_path_param {
            match path.rsplit_once('/') {
                Some((rest, id)) if !id.is_empty() => rest,
                _ => continue,
            }
        } else {
            path
        };
        let Some(prefix) = candidate.strip_suffix(endpoint.path) else {
            continue;
        };
        let rank = (endpoint.path.len(), prefix.len());
        if best.as_ref().is_none_or(|(current, ..)| rank > *current) {
            best = Some((rank, *endpoint, prefix));
        }
    }

    let Some((_, endpoint, prefix)) = best else {
        return Err(DispatchError::UnknownEndpoint {
            method: method.to_ascii_uppercase(),
            path: url.path().to_string(),
        });
    };
    let server_base = format!("{}{prefix}", url.origin().ascii_serialization());
    tracing::debug!(%endpoint, %server_base, "resolved endpoint");
    Ok(ResolvedEndpoint {
        endpoint,
        server_base,
    })
}

/// Immutable mapping from endpoint to its test implementation.
///
/// Built once at startup and handed to the orchestrator.
#[derive(Clone, Default)]
pub struct TestTable {
    tests: HashMap<Endpoint, TestImplementation>,
}

impl std::fmt::Debug for TestTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.endpoints().iter().map(Endpoint::label))
            .finish()
    }
}

impl TestTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, endpoint: Endpoint, test: TestImplementation) -> Self {
        self.tests.insert(endpoint, test);
        self
    }

    /// Every endpoint of the carpooling API with its suite.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with(Endpoint::GET_STATUS, suites::get_status)
            .with(Endpoint::GET_DRIVER_JOURNEYS, suites::get_driver_journeys)
            .with(Endpoint::GET_PASSENGER_JOURNEYS, suites::get_passenger_journeys)
            .with(
                Endpoint::GET_DRIVER_REGULAR_TRIPS,
                suites::get_driver_regular_trips,
            )
            .with(
                Endpoint::GET_PASSENGER_REGULAR_TRIPS,
                suites::get_passenger_regular_trips,
            )
            .with(Endpoint::POST_BOOKING_EVENTS, suites::post_booking_events)
            .with(Endpoint::POST_MESSAGES, suites::post_messages)
            .with(Endpoint::POST_BOOKINGS, suites::post_bookings)
            .with(Endpoint::PATCH_BOOKINGS, suites::patch_bookings)
            .with(Endpoint::GET_BOOKINGS, suites::get_bookings)
    }

    /// # Errors
    ///
    /// Returns [`DispatchError::NoTestImplementation`] for an unregistered endpoint.
    pub fn lookup(&self, endpoint: &Endpoint) -> Result<TestImplementation, DispatchError> {
        self.tests
            .get(endpoint)
            .copied()
            .ok_or(DispatchError::NoTestImplementation(*endpoint))
    }

    /// Registered endpoints, ordered by method then path.
    #[must_use]
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let mut endpoints: Vec<Endpoint> = self.tests.keys().copied().collect();
        endpoints.sort_by_key(|e| (e.path, e.has_path_param, e.method));
        endpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(method: &str, url: &str) -> Result<ResolvedEndpoint, DispatchError> {
        resolve_endpoint(&Endpoint::ALL, method, &Url::parse(url).unwrap())
    }

    #[test]
    fn resolves_plain_endpoint_and_ignores_query() {
        let r = resolve(
            "GET",
            "http://localhost:8080/driver_journeys?departureLat=1&count=2",
        )
        .unwrap();
        assert_eq!(r.endpoint, Endpoint::GET_DRIVER_JOURNEYS);
        assert_eq!(r.server_base, "http://localhost:8080");
    }

    #[test]
    fn server_prefix_becomes_base() {
        let r = resolve("GET", "https://api.example.com/v1/passenger_journeys").unwrap();
        assert_eq!(r.endpoint, Endpoint::GET_PASSENGER_JOURNEYS);
        assert_eq!(r.server_base, "https://api.example.com/v1");
    }

    #[test]
    fn trailing_path_parameter_is_split_off() {
        let get = resolve("GET", "http://localhost:8080/bookings/abc-123").unwrap();
        assert_eq!(get.endpoint, Endpoint::GET_BOOKINGS);
        let patch = resolve("patch", "http://localhost:8080/bookings/abc-123?status=CONFIRMED")
            .unwrap();
        assert_eq!(patch.endpoint, Endpoint::PATCH_BOOKINGS);
        let post = resolve("POST", "http://localhost:8080/bookings").unwrap();
        assert_eq!(post.endpoint, Endpoint::POST_BOOKINGS);
    }

    #[test]
    fn longest_template_wins() {
        // "/bookings/status" is a booking id lookup, not /status under a "/bookings" prefix
        let r = resolve("GET", "http://localhost:8080/bookings/status").unwrap();
        assert_eq!(r.endpoint, Endpoint::GET_BOOKINGS);
        assert_eq!(r.server_base, "http://localhost:8080");
    }

    #[test]
    fn trailing_slash_tolerated() {
        let r = resolve("GET", "http://localhost:8080/status/").unwrap();
        assert_eq!(r.endpoint, Endpoint::GET_STATUS);
    }

    #[test]
    fn unknown_method_or_path() {
        assert!(matches!(
            resolve("DELETE", "http://localhost:8080/status"),
            Err(DispatchError::UnknownEndpoint { .. })
        ));
        assert!(matches!(
            resolve("GET", "http://localhost:8080/bookings"),
            Err(DispatchError::UnknownEndpoint { .. })
        ));
        assert!(matches!(
            resolve("GET", "http://localhost:8080/driver_journeys_v2"),
            Err(DispatchError::UnknownEndpoint { .. })
        ));
        let err = resolve("get", "http://localhost:8080/nope").unwrap_err();
        assert_eq!(err.to_string(), "unknown endpoint: GET /nope");
    }

    #[test]
    fn standard_table_covers_every_endpoint() {
        let table = TestTable::standard();
        for endpoint in Endpoint::ALL {
            assert!(table.lookup(&endpoint).is_ok(), "{endpoint} not registered");
        }
        assert_eq!(table.endpoints().len(), Endpoint::ALL.len());
    }

    #[test]
    fn empty_table_reports_missing_implementation() {
        let err = TestTable::new().lookup(&Endpoint::GET_STATUS).unwrap_err();
        assert!(matches!(err, DispatchError::NoTestImplementation(e) if e == Endpoint::GET_STATUS));
    }
}
