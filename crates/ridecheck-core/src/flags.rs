//! Options controlling which assertions are queued and how they judge

use serde::{Deserialize, Serialize};

/// Safety margin added to query radii before comparing distances.
///
/// Absorbs discrepancies between great-circle formulas across implementations.
pub const DEFAULT_RADIUS_MARGIN: f64 = 0.01;

/// Test configuration for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flags {
    /// Response arrays must be non-empty (checked as a critical assertion)
    #[serde(default)]
    pub expect_non_empty: bool,

    /// Exact status code to assert. `None` uses the endpoint's success code.
    #[serde(default)]
    pub expected_response_code: Option<u16>,

    /// Booking status the response must carry. Empty means no check.
    #[serde(default)]
    pub expected_booking_status: Option<String>,

    /// Reserved, not used for assertion selection yet
    #[serde(default)]
    pub expect_deep_link_support: bool,

    /// Relative margin added to query radii (0.01 = 1%)
    #[serde(default = "default_radius_margin")]
    pub radius_margin: f64,
}

fn default_radius_margin() -> f64 {
    DEFAULT_RADIUS_MARGIN
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            expect_non_empty: false,
            expected_response_code: None,
            expected_booking_status: None,
            expect_deep_link_support: false,
            radius_margin: DEFAULT_RADIUS_MARGIN,
        }
    }
}

impl Flags {
    /// Booking status to check, if any. Empty strings count as unset.
    #[must_use]
    pub fn booking_status(&self) -> Option<&str> {
        self.expected_booking_status
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}
