//! Logical API operations of the carpooling API

use serde::Serialize;

/// A logical API operation: method + path template.
///
/// `has_path_param` marks operations whose path ends with a resource ID
/// segment (e.g. `/bookings/{bookingId}`); `path` then holds the prefix only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
    pub has_path_param: bool,
}

impl Endpoint {
    pub const GET_STATUS: Self = Self::new("GET", "/status", false);
    pub const GET_DRIVER_JOURNEYS: Self = Self::new("GET", "/driver_journeys", false);
    pub const GET_PASSENGER_JOURNEYS: Self = Self::new("GET", "/passenger_journeys", false);
    pub const GET_DRIVER_REGULAR_TRIPS: Self = Self::new("GET", "/driver_regular_trips", false);
    pub const GET_PASSENGER_REGULAR_TRIPS: Self =
        Self::new("GET", "/passenger_regular_trips", false);
    pub const POST_BOOKING_EVENTS: Self = Self::new("POST", "/booking_events", false);
    pub const POST_MESSAGES: Self = Self::new("POST", "/messages", false);
    pub const POST_BOOKINGS: Self = Self::new("POST", "/bookings", false);
    pub const PATCH_BOOKINGS: Self = Self::new("PATCH", "/bookings", true);
    pub const GET_BOOKINGS: Self = Self::new("GET", "/bookings", true);

    /// Every operation of the API, in documentation order.
    pub const ALL: [Self; 10] = [
        Self::GET_STATUS,
        Self::GET_DRIVER_JOURNEYS,
        Self::GET_PASSENGER_JOURNEYS,
        Self::GET_DRIVER_REGULAR_TRIPS,
        Self::GET_PASSENGER_REGULAR_TRIPS,
        Self::POST_BOOKING_EVENTS,
        Self::POST_MESSAGES,
        Self::POST_BOOKINGS,
        Self::PATCH_BOOKINGS,
        Self::GET_BOOKINGS,
    ];

    #[must_use]
    pub const fn new(method: &'static str, path: &'static str, has_path_param: bool) -> Self {
        Self {
            method,
            path,
            has_path_param,
        }
    }

    /// Status code a conforming server answers with on success.
    #[must_use]
    pub fn default_status(&self) -> u16 {
        if *self == Self::POST_BOOKINGS || *self == Self::POST_MESSAGES {
            201
        } else {
            200
        }
    }

    /// Operation label, e.g. `GET /bookings/{id}`.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_path_param {
            write!(f, "{} {}/{{id}}", self.method, self.path)
        } else {
            write!(f, "{} {}", self.method, self.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn method_and_path_are_unique() {
        let keys: HashSet<(&str, &str, bool)> = Endpoint::ALL
            .iter()
            .map(|e| (e.method, e.path, e.has_path_param))
            .collect();
        assert_eq!(keys.len(), Endpoint::ALL.len());
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(Endpoint::new("GET", "/status", false), Endpoint::GET_STATUS);
        assert_ne!(Endpoint::GET_BOOKINGS, Endpoint::PATCH_BOOKINGS);
        assert_ne!(
            Endpoint::new("GET", "/bookings", false),
            Endpoint::GET_BOOKINGS
        );
    }

    #[test]
    fn default_status_codes() {
        assert_eq!(Endpoint::POST_BOOKINGS.default_status(), 201);
        assert_eq!(Endpoint::POST_MESSAGES.default_status(), 201);
        assert_eq!(Endpoint::POST_BOOKING_EVENTS.default_status(), 200);
        assert_eq!(Endpoint::GET_STATUS.default_status(), 200);
    }

    #[test]
    fn label_includes_id_segment() {
        assert_eq!(Endpoint::GET_BOOKINGS.label(), "GET /bookings/{id}");
        assert_eq!(Endpoint::GET_DRIVER_JOURNEYS.label(), "GET /driver_journeys");
    }
}
