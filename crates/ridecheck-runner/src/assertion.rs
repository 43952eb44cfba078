//! Assertion library
//!
//! Every assertion is a pure function of an already-captured exchange: it
//! never issues network calls. Each variant carries only what it needs.

use std::collections::HashSet;

use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};

use ridecheck_core::params::{
    ParseError, parse_query_float, parse_query_float_or, parse_query_int, parse_query_int_or,
};
use ridecheck_core::{Coordinate, distance};

use crate::body::{BodyError, CapturedResponse};
use crate::http::TransportError;
use crate::openapi::SpecDocument;
use crate::request::ApiRequest;
use crate::validator::{ValidationError, validate_response};

/// Radius in kilometers when the query leaves it out.
pub const DEFAULT_RADIUS_KM: f64 = 1.0;

/// Time window in seconds when the query leaves it out.
pub const DEFAULT_TIME_DELTA_SECS: i64 = 900;

/// Side of the exchange a value was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Request,
    Response,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Request => "request",
            Self::Response => "response",
        })
    }
}

/// Which end of the journey a radius check applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Departure,
    Arrival,
}

impl Leg {
    const fn lat_param(self) -> &'static str {
        match self {
            Self::Departure => "departureLat",
            Self::Arrival => "arrivalLat",
        }
    }

    const fn lng_param(self) -> &'static str {
        match self {
            Self::Departure => "departureLng",
            Self::Arrival => "arrivalLng",
        }
    }

    const fn radius_param(self) -> &'static str {
        match self {
            Self::Departure => "departureRadius",
            Self::Arrival => "arrivalRadius",
        }
    }
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Departure => "departure",
            Self::Arrival => "arrival",
        })
    }
}

/// Why a value could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    #[error("query parameter {name}: {source}")]
    Query {
        name: &'static str,
        #[source]
        source: ParseError,
    },
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Body(#[from] BodyError),
}

#[derive(Debug, thiserror::Error)]
pub enum AssertionError {
    #[error("API call failed: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to parse {origin}: {source}")]
    Parsing {
        origin: Origin,
        #[source]
        source: ParsingError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("expected status code {expected}, got {actual}")]
    StatusCode { expected: u16, actual: u16 },

    #[error("header {0} is missing")]
    MissingHeader(String),

    #[error("header {header} is \"{actual}\", expected it to contain \"{expected}\"")]
    HeaderMismatch {
        header: String,
        expected: String,
        actual: String,
    },

    #[error("expected a non-empty array")]
    EmptyArray,

    #[error(
        "{leg} point {point} is {distance_km:.3} km from {query}, beyond the allowed {allowed_km:.3} km"
    )]
    RadiusExceeded {
        leg: Leg,
        point: Coordinate,
        query: Coordinate,
        distance_km: f64,
        allowed_km: f64,
    },

    #[error(
        "passengerPickupDate {pickup} is outside departureDate {departure} +/- timeDelta {time_delta}s"
    )]
    TimeDeltaExceeded {
        pickup: i64,
        departure: i64,
        time_delta: i64,
    },

    #[error("{actual} results returned, more than count={limit}")]
    CountExceeded { limit: u64, actual: usize },

    #[error("duplicate id \"{0}\"")]
    DuplicateId(String),

    #[error("operator \"{operator}\" is not a bare domain: {reason}")]
    InvalidOperator { operator: String, reason: &'static str },

    #[error("expected booking status {expected}, got {actual}")]
    BookingStatus { expected: String, actual: String },
}

impl AssertionError {
    fn request(source: impl Into<ParsingError>) -> Self {
        Self::Parsing {
            origin: Origin::Request,
            source: source.into(),
        }
    }

    fn response(source: impl Into<ParsingError>) -> Self {
        Self::Parsing {
            origin: Origin::Response,
            source: source.into(),
        }
    }
}

/// A self-describing check over a captured exchange.
#[derive(Debug)]
pub enum Assertion<'a> {
    /// Stands in for the whole run when the call itself failed.
    ApiCallSuccess { error: TransportError },
    StatusCode {
        response: &'a CapturedResponse,
        expected: u16,
    },
    HeaderContains {
        response: &'a CapturedResponse,
        header: String,
        expected: String,
    },
    Format {
        spec: &'a SpecDocument,
        request: &'a ApiRequest,
        response: &'a CapturedResponse,
        server_base: &'a str,
    },
    ArrayNotEmpty { response: &'a CapturedResponse },
    Radius {
        request: &'a ApiRequest,
        response: &'a CapturedResponse,
        leg: Leg,
        /// Relative safety margin added to the query radius
        margin: f64,
    },
    TimeDelta {
        request: &'a ApiRequest,
        response: &'a CapturedResponse,
    },
    CountLimit {
        request: &'a ApiRequest,
        response: &'a CapturedResponse,
    },
    UniqueIds { response: &'a CapturedResponse },
    OperatorFormat { response: &'a CapturedResponse },
    BookingStatus {
        response: &'a CapturedResponse,
        expected: String,
    },
}

impl Assertion<'_> {
    /// Run the check.
    ///
    /// # Errors
    ///
    /// Returns the reason the check failed.
    pub fn execute(&self) -> Result<(), AssertionError> {
        match self {
            Self::ApiCallSuccess { error } => Err(AssertionError::Transport(error.clone())),
            Self::StatusCode { response, expected } => {
                let actual = response.status();
                if actual == *expected {
                    Ok(())
                } else {
                    Err(AssertionError::StatusCode {
                        expected: *expected,
                        actual,
                    })
                }
            }
            Self::HeaderContains {
                response,
                header,
                expected,
            } => header_contains(response, header, expected),
            Self::Format {
                spec,
                request,
                response,
                server_base,
            } => {
                validate_response(spec, request, response, Some(*server_base))?;
                Ok(())
            }
            Self::ArrayNotEmpty { response } => {
                let items: Vec<IgnoredAny> = parse_body(response)?;
                if items.is_empty() {
                    Err(AssertionError::EmptyArray)
                } else {
                    Ok(())
                }
            }
            Self::Radius {
                request,
                response,
                leg,
                margin,
            } => radius_compliance(request, response, *leg, *margin),
            Self::TimeDelta { request, response } => time_delta_compliance(request, response),
            Self::CountLimit { request, response } => count_compliance(request, response),
            Self::UniqueIds { response } => unique_ids(response),
            Self::OperatorFormat { response } => {
                let items: Vec<OperatorField> = parse_body(response)?;
                items
                    .iter()
                    .try_for_each(|item| check_operator(&item.operator))
            }
            Self::BookingStatus { response, expected } => {
                let booking: StatusField = parse_body(response)?;
                if booking.status == *expected {
                    Ok(())
                } else {
                    Err(AssertionError::BookingStatus {
                        expected: expected.clone(),
                        actual: booking.status,
                    })
                }
            }
        }
    }

    /// Human-readable statement of what is checked.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::ApiCallSuccess { .. } => "API call succeeds".to_string(),
            Self::StatusCode { expected, .. } => format!("status code is {expected}"),
            Self::HeaderContains {
                header, expected, ..
            } => format!("header {header} contains \"{expected}\""),
            Self::Format { .. } => "response conforms to the OpenAPI document".to_string(),
            Self::ArrayNotEmpty { .. } => "response array is not empty".to_string(),
            Self::Radius { leg, .. } => {
                format!("{leg} points lie within {} of the query", leg.radius_param())
            }
            Self::TimeDelta { .. } => {
                "pickup dates lie within timeDelta of departureDate".to_string()
            }
            Self::CountLimit { .. } => "result count does not exceed count".to_string(),
            Self::UniqueIds { .. } => "result ids are unique".to_string(),
            Self::OperatorFormat { .. } => "operator field is a bare domain".to_string(),
            Self::BookingStatus { expected, .. } => format!("booking status is {expected}"),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PickupPoint {
    passenger_pickup_lat: f64,
    passenger_pickup_lng: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DropPoint {
    passenger_drop_lat: f64,
    passenger_drop_lng: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PickupDate {
    passenger_pickup_date: i64,
}

#[derive(Deserialize)]
struct OptionalId {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct OperatorField {
    operator: String,
}

#[derive(Deserialize)]
struct StatusField {
    status: String,
}

fn parse_body<T: DeserializeOwned>(response: &CapturedResponse) -> Result<T, AssertionError> {
    let body = response.body().map_err(AssertionError::response)?;
    serde_json::from_slice(body).map_err(AssertionError::response)
}

fn query_param(
    request: &ApiRequest,
    name: &'static str,
    parse: impl FnOnce(&str) -> Result<f64, ParseError>,
) -> Result<f64, AssertionError> {
    parse(&request.query_or_empty(name))
        .map_err(|source| AssertionError::request(ParsingError::Query { name, source }))
}

fn query_int(
    request: &ApiRequest,
    name: &'static str,
    parse: impl FnOnce(&str) -> Result<i64, ParseError>,
) -> Result<i64, AssertionError> {
    parse(&request.query_or_empty(name))
        .map_err(|source| AssertionError::request(ParsingError::Query { name, source }))
}

fn header_contains(
    response: &CapturedResponse,
    header: &str,
    expected: &str,
) -> Result<(), AssertionError> {
    let Some(value) = response.headers().get(header) else {
        return Err(AssertionError::MissingHeader(header.to_string()));
    };
    let actual = String::from_utf8_lossy(value.as_bytes());
    if actual.contains(expected) {
        Ok(())
    } else {
        Err(AssertionError::HeaderMismatch {
            header: header.to_string(),
            expected: expected.to_string(),
            actual: actual.into_owned(),
        })
    }
}

fn radius_compliance(
    request: &ApiRequest,
    response: &CapturedResponse,
    leg: Leg,
    margin: f64,
) -> Result<(), AssertionError> {
    let query = Coordinate::new(
        query_param(request, leg.lat_param(), parse_query_float)?,
        query_param(request, leg.lng_param(), parse_query_float)?,
    );
    let radius = query_param(request, leg.radius_param(), |raw| {
        parse_query_float_or(raw, DEFAULT_RADIUS_KM)
    })?;
    let allowed_km = radius * (1.0 + margin);

    let points: Vec<Coordinate> = match leg {
        Leg::Departure => parse_body::<Vec<PickupPoint>>(response)?
            .into_iter()
            .map(|p| Coordinate::new(p.passenger_pickup_lat, p.passenger_pickup_lng))
            .collect(),
        Leg::Arrival => parse_body::<Vec<DropPoint>>(response)?
            .into_iter()
            .map(|p| Coordinate::new(p.passenger_drop_lat, p.passenger_drop_lng))
            .collect(),
    };

    for point in points {
        let distance_km = distance(query, point);
        if distance_km > allowed_km {
            return Err(AssertionError::RadiusExceeded {
                leg,
                point,
                query,
                distance_km,
                allowed_km,
            });
        }
    }
    Ok(())
}

fn time_delta_compliance(
    request: &ApiRequest,
    response: &CapturedResponse,
) -> Result<(), AssertionError> {
    let departure = query_int(request, "departureDate", parse_query_int)?;
    let time_delta = query_int(request, "timeDelta", |raw| {
        parse_query_int_or(raw, DEFAULT_TIME_DELTA_SECS)
    })?;
    let window = u64::try_from(time_delta).unwrap_or(0);

    let dates: Vec<PickupDate> = parse_body(response)?;
    match dates
        .iter()
        .find(|d| d.passenger_pickup_date.abs_diff(departure) > window)
    {
        Some(d) => Err(AssertionError::TimeDeltaExceeded {
            pickup: d.passenger_pickup_date,
            departure,
            time_delta,
        }),
        None => Ok(()),
    }
}

fn count_compliance(
    request: &ApiRequest,
    response: &CapturedResponse,
) -> Result<(), AssertionError> {
    // -1 (or absent) means no limit
    let count = query_int(request, "count", |raw| parse_query_int_or(raw, -1))?;
    let Ok(limit) = u64::try_from(count) else {
        return Ok(());
    };
    let items: Vec<IgnoredAny> = parse_body(response)?;
    if items.len() as u64 > limit {
        Err(AssertionError::CountExceeded {
            limit,
            actual: items.len(),
        })
    } else {
        Ok(())
    }
}

fn unique_ids(response: &CapturedResponse) -> Result<(), AssertionError> {
    let items: Vec<OptionalId> = parse_body(response)?;
    let mut seen = HashSet::new();
    for id in items.into_iter().filter_map(|item| item.id) {
        if let Some(dup) = seen.replace(id) {
            return Err(AssertionError::DuplicateId(dup));
        }
    }
    Ok(())
}

/// `operator.com` passes; schemes, paths, userinfo and query strings do not.
fn check_operator(operator: &str) -> Result<(), AssertionError> {
    let invalid = |reason: &'static str| AssertionError::InvalidOperator {
        operator: operator.to_string(),
        reason,
    };
    if operator.is_empty() {
        return Err(invalid("empty"));
    }
    let url = reqwest::Url::parse(&format!("https://{operator}"))
        .map_err(|_| invalid("not a valid host"))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("no host"));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("contains userinfo"));
    }
    if !matches!(url.path(), "" | "/") {
        return Err(invalid("contains a path"));
    }
    if url.query().is_some() {
        return Err(invalid("contains a query string"));
    }
    if url.fragment().is_some() {
        return Err(invalid("contains a fragment"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridecheck_core::geo::EARTH_RADIUS_KM;
    use serde_json::json;

    const LAT: f64 = 46.16;
    const LNG: f64 = -1.22;

    fn km_to_lat_degrees(km: f64) -> f64 {
        (km / EARTH_RADIUS_KM).to_degrees()
    }

    fn journeys_request(extra: &str) -> ApiRequest {
        ApiRequest::new(
            "GET",
            &format!(
                "http://localhost:8080/driver_journeys?departureLat={LAT}&departureLng={LNG}\
                 &arrivalLat={LAT}&arrivalLng={LNG}&departureDate=1700000000{extra}"
            ),
        )
        .unwrap()
    }

    fn journey(pickup_lat: f64, pickup_date: i64) -> serde_json::Value {
        json!({
            "operator": "operator.com",
            "passengerPickupLat": pickup_lat,
            "passengerPickupLng": LNG,
            "passengerDropLat": LAT,
            "passengerDropLng": LNG,
            "passengerPickupDate": pickup_date
        })
    }

    fn radius(req: &ApiRequest, resp: &CapturedResponse, leg: Leg) -> Result<(), AssertionError> {
        Assertion::Radius {
            request: req,
            response: resp,
            leg,
            margin: 0.01,
        }
        .execute()
    }

    #[test]
    fn status_code_exact_match() {
        let resp = CapturedResponse::json(201, &json!({}));
        let ok = Assertion::StatusCode {
            response: &resp,
            expected: 201,
        };
        assert!(ok.execute().is_ok());
        assert_eq!(ok.describe(), "status code is 201");

        let err = Assertion::StatusCode {
            response: &resp,
            expected: 200,
        }
        .execute()
        .unwrap_err();
        assert_eq!(err.to_string(), "expected status code 200, got 201");
    }

    #[test]
    fn header_contains_tolerates_charset() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "content-type",
            "application/json; charset=utf-8".parse().unwrap(),
        );
        let resp = CapturedResponse::from_bytes(200, headers, "[]");
        let check = |header: &str, expected: &str| {
            Assertion::HeaderContains {
                response: &resp,
                header: header.into(),
                expected: expected.into(),
            }
            .execute()
        };
        assert!(check("Content-Type", "application/json").is_ok());
        assert!(matches!(
            check("Content-Type", "text/html"),
            Err(AssertionError::HeaderMismatch { .. })
        ));
        assert!(matches!(
            check("X-Missing", "x"),
            Err(AssertionError::MissingHeader(_))
        ));
    }

    #[test]
    fn array_not_empty() {
        let empty = CapturedResponse::json(200, &json!([]));
        let full = CapturedResponse::json(200, &json!([1, {"a": 2}]));
        let object = CapturedResponse::json(200, &json!({"a": 1}));

        assert!(matches!(
            Assertion::ArrayNotEmpty { response: &empty }.execute(),
            Err(AssertionError::EmptyArray)
        ));
        assert!(Assertion::ArrayNotEmpty { response: &full }.execute().is_ok());
        assert!(matches!(
            Assertion::ArrayNotEmpty { response: &object }.execute(),
            Err(AssertionError::Parsing {
                origin: Origin::Response,
                ..
            })
        ));
    }

    #[test]
    fn radius_inside_margin_passes() {
        let req = journeys_request("&departureRadius=1");
        let resp = CapturedResponse::json(
            200,
            &json!([journey(LAT + km_to_lat_degrees(1.005), 1_700_000_000)]),
        );
        assert!(radius(&req, &resp, Leg::Departure).is_ok());
    }

    #[test]
    fn radius_beyond_margin_fails() {
        let req = journeys_request("&departureRadius=1");
        let resp = CapturedResponse::json(
            200,
            &json!([journey(LAT + km_to_lat_degrees(1.02), 1_700_000_000)]),
        );
        let err = radius(&req, &resp, Leg::Departure).unwrap_err();
        assert!(matches!(err, AssertionError::RadiusExceeded { leg: Leg::Departure, .. }));
        assert!(err.to_string().starts_with("departure point"), "{err}");
    }

    #[test]
    fn radius_defaults_to_one_km() {
        let req = journeys_request("");
        let near = CapturedResponse::json(200, &json!([journey(LAT + km_to_lat_degrees(0.9), 0)]));
        let far = CapturedResponse::json(200, &json!([journey(LAT + km_to_lat_degrees(1.5), 0)]));
        assert!(radius(&req, &near, Leg::Departure).is_ok());
        assert!(radius(&req, &far, Leg::Departure).is_err());

        let blank = journeys_request("&departureRadius=%20");
        assert!(radius(&blank, &near, Leg::Departure).is_ok());
        assert!(radius(&blank, &far, Leg::Departure).is_err());
    }

    #[test]
    fn arrival_radius_uses_drop_point() {
        let req = journeys_request("&arrivalRadius=0.5");
        let mut element = journey(LAT + 1.0, 0);
        element["passengerDropLat"] = json!(LAT + km_to_lat_degrees(0.4));
        let resp = CapturedResponse::json(200, &json!([element]));
        assert!(radius(&req, &resp, Leg::Arrival).is_ok());
        assert!(radius(&req, &resp, Leg::Departure).is_err());
    }

    #[test]
    fn radius_missing_query_coordinate_is_request_parsing_error() {
        let req = ApiRequest::new("GET", "http://h/driver_journeys?departureLng=1").unwrap();
        let resp = CapturedResponse::json(200, &json!([]));
        let err = radius(&req, &resp, Leg::Departure).unwrap_err();
        assert!(matches!(
            err,
            AssertionError::Parsing {
                origin: Origin::Request,
                source: ParsingError::Query { name: "departureLat", .. }
            }
        ));
        assert!(err.to_string().starts_with("failed to parse request"), "{err}");
    }

    #[test]
    fn radius_element_without_coordinates_is_response_parsing_error() {
        let req = journeys_request("");
        let resp = CapturedResponse::json(200, &json!([{"operator": "operator.com"}]));
        assert!(matches!(
            radius(&req, &resp, Leg::Departure),
            Err(AssertionError::Parsing {
                origin: Origin::Response,
                ..
            })
        ));
    }

    #[test]
    fn time_delta_boundary_is_inclusive() {
        let req = journeys_request("&timeDelta=600");
        let at_edge = CapturedResponse::json(
            200,
            &json!([journey(LAT, 1_700_000_600), journey(LAT, 1_699_999_400)]),
        );
        let past_edge = CapturedResponse::json(200, &json!([journey(LAT, 1_700_000_601)]));

        let check = |resp: &CapturedResponse| {
            Assertion::TimeDelta {
                request: &req,
                response: resp,
            }
            .execute()
        };
        assert!(check(&at_edge).is_ok());
        let err = check(&past_edge).unwrap_err();
        assert!(matches!(
            err,
            AssertionError::TimeDeltaExceeded {
                pickup: 1_700_000_601,
                departure: 1_700_000_000,
                time_delta: 600
            }
        ));
        assert!(err.to_string().contains("+/- timeDelta 600s"), "{err}");
    }

    #[test]
    fn time_delta_defaults_to_900() {
        let req = journeys_request("");
        let check = |date: i64| {
            let resp = CapturedResponse::json(200, &json!([journey(LAT, date)]));
            Assertion::TimeDelta {
                request: &req,
                response: &resp,
            }
            .execute()
        };
        assert!(check(1_700_000_900).is_ok());
        assert!(check(1_700_000_901).is_err());
    }

    #[test]
    fn time_delta_requires_departure_date() {
        let req = ApiRequest::new("GET", "http://h/driver_journeys").unwrap();
        let resp = CapturedResponse::json(200, &json!([]));
        let err = Assertion::TimeDelta {
            request: &req,
            response: &resp,
        }
        .execute()
        .unwrap_err();
        assert!(matches!(
            err,
            AssertionError::Parsing {
                origin: Origin::Request,
                ..
            }
        ));
    }

    #[test]
    fn count_limit() {
        let three = CapturedResponse::json(200, &json!([1, 2, 3]));
        let check = |query: &str| {
            let req = ApiRequest::new("GET", &format!("http://h/driver_journeys{query}")).unwrap();
            Assertion::CountLimit {
                request: &req,
                response: &three,
            }
            .execute()
        };
        assert!(check("?count=3").is_ok());
        assert!(matches!(
            check("?count=2"),
            Err(AssertionError::CountExceeded {
                limit: 2,
                actual: 3
            })
        ));
        assert!(check("").is_ok());
        assert!(check("?count=-1").is_ok());
        assert!(check("?count=").is_ok());
        assert!(check("?count=many").is_err());
    }

    #[test]
    fn unique_ids_ignore_nulls() {
        let check = |body: serde_json::Value| {
            let resp = CapturedResponse::json(200, &body);
            Assertion::UniqueIds { response: &resp }.execute()
        };
        assert!(check(json!([{"id": "a"}, {"id": "b"}])).is_ok());
        assert!(check(json!([{"id": null}, {"id": null}, {}, {}])).is_ok());
        let err = check(json!([{"id": "a"}, {"id": null}, {"id": "a"}])).unwrap_err();
        assert_eq!(err.to_string(), "duplicate id \"a\"");
    }

    #[test]
    fn operator_format() {
        assert!(check_operator("operator.com").is_ok());
        assert!(check_operator("sub.operator.co.uk").is_ok());
        for bad in [
            "https://operator.com",
            "operator.com/path",
            "/local/path",
            "user@operator.com",
            "operator.com?x=1",
            "",
        ] {
            assert!(
                matches!(
                    check_operator(bad),
                    Err(AssertionError::InvalidOperator { .. })
                ),
                "{bad} must be rejected"
            );
        }
    }

    #[test]
    fn operator_assertion_checks_every_element() {
        let resp = CapturedResponse::json(
            200,
            &json!([{"operator": "operator.com"}, {"operator": "https://bad.com"}]),
        );
        let err = Assertion::OperatorFormat { response: &resp }
            .execute()
            .unwrap_err();
        assert!(err.to_string().contains("https://bad.com"));
    }

    #[test]
    fn booking_status() {
        let resp = CapturedResponse::json(200, &json!({"id": "b1", "status": "CONFIRMED"}));
        let check = |expected: &str| {
            Assertion::BookingStatus {
                response: &resp,
                expected: expected.into(),
            }
            .execute()
        };
        assert!(check("CONFIRMED").is_ok());
        assert_eq!(
            check("CANCELLED").unwrap_err().to_string(),
            "expected booking status CANCELLED, got CONFIRMED"
        );
    }

    #[test]
    fn api_call_success_always_fails_with_transport_error() {
        let a = Assertion::ApiCallSuccess {
            error: TransportError::new("connection refused"),
        };
        assert_eq!(a.describe(), "API call succeeds");
        assert_eq!(
            a.execute().unwrap_err().to_string(),
            "API call failed: connection refused"
        );
    }

    #[test]
    fn format_delegates_to_validator() {
        let spec = SpecDocument::bundled();
        let req = ApiRequest::new("GET", "http://localhost:8080/unknown").unwrap();
        let resp = CapturedResponse::json(200, &json!([]));
        let err = Assertion::Format {
            spec: &spec,
            request: &req,
            response: &resp,
            server_base: "http://localhost:8080",
        }
        .execute()
        .unwrap_err();
        assert!(matches!(
            err,
            AssertionError::Validation(ValidationError::RouteNotFound { .. })
        ));
    }
}
