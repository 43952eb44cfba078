//! Per-endpoint test implementations
//!
//! Each function queues the assertions that apply to one endpoint. Domain
//! assertions only make sense on a success response, so they are skipped
//! when the expected status is not 2xx.

use ridecheck_core::{Endpoint, Flags};

use crate::accumulator::Accumulator;
use crate::assertion::{Assertion, Leg};
use crate::body::CapturedResponse;
use crate::openapi::SpecDocument;
use crate::request::ApiRequest;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Everything a test implementation may look at.
#[derive(Debug, Clone, Copy)]
pub struct TestContext<'a> {
    pub spec: &'a SpecDocument,
    pub request: &'a ApiRequest,
    pub response: &'a CapturedResponse,
    pub server_base: &'a str,
    pub endpoint: Endpoint,
    pub flags: &'a Flags,
}

impl<'a> TestContext<'a> {
    /// Configured status, or the endpoint's success code.
    #[must_use]
    pub fn expected_status(&self) -> u16 {
        self.flags
            .expected_response_code
            .unwrap_or_else(|| self.endpoint.default_status())
    }

    #[must_use]
    pub fn expects_success(&self) -> bool {
        (200..300).contains(&self.expected_status())
    }

    fn status(&self) -> Assertion<'a> {
        Assertion::StatusCode {
            response: self.response,
            expected: self.expected_status(),
        }
    }

    fn json_content_type(&self) -> Assertion<'a> {
        Assertion::HeaderContains {
            response: self.response,
            header: "Content-Type".to_string(),
            expected: JSON_MEDIA_TYPE.to_string(),
        }
    }

    fn format(&self) -> Assertion<'a> {
        Assertion::Format {
            spec: self.spec,
            request: self.request,
            response: self.response,
            server_base: self.server_base,
        }
    }

    fn radius(&self, leg: Leg) -> Assertion<'a> {
        Assertion::Radius {
            request: self.request,
            response: self.response,
            leg,
            margin: self.flags.radius_margin,
        }
    }
}

pub fn get_status<'a>(ctx: &TestContext<'a>, acc: &mut Accumulator<'a>) {
    acc.queue(ctx.status());
}

pub fn get_driver_journeys<'a>(ctx: &TestContext<'a>, acc: &mut Accumulator<'a>) {
    if !queue_search_preamble(ctx, acc) {
        return;
    }
    queue_search_results(ctx, acc);
    acc.queue(Assertion::TimeDelta {
        request: ctx.request,
        response: ctx.response,
    });
}

pub fn get_passenger_journeys<'a>(ctx: &TestContext<'a>, acc: &mut Accumulator<'a>) {
    get_driver_journeys(ctx, acc);
}

pub fn get_driver_regular_trips<'a>(ctx: &TestContext<'a>, acc: &mut Accumulator<'a>) {
    if !queue_search_preamble(ctx, acc) {
        return;
    }
    queue_search_results(ctx, acc);
}

pub fn get_passenger_regular_trips<'a>(ctx: &TestContext<'a>, acc: &mut Accumulator<'a>) {
    get_driver_regular_trips(ctx, acc);
}

pub fn post_booking_events<'a>(ctx: &TestContext<'a>, acc: &mut Accumulator<'a>) {
    acc.queue_critical(ctx.status());
    acc.queue(ctx.format());
}

pub fn post_messages<'a>(ctx: &TestContext<'a>, acc: &mut Accumulator<'a>) {
    acc.queue_critical(ctx.status());
    acc.queue(ctx.format());
}

pub fn patch_bookings<'a>(ctx: &TestContext<'a>, acc: &mut Accumulator<'a>) {
    acc.queue_critical(ctx.status());
    acc.queue(ctx.format());
}

pub fn post_bookings<'a>(ctx: &TestContext<'a>, acc: &mut Accumulator<'a>) {
    queue_booking(ctx, acc);
}

pub fn get_bookings<'a>(ctx: &TestContext<'a>, acc: &mut Accumulator<'a>) {
    queue_booking(ctx, acc);
}

/// Status, then either the error body format or the success gates.
/// Returns whether result assertions should follow.
fn queue_search_preamble<'a>(ctx: &TestContext<'a>, acc: &mut Accumulator<'a>) -> bool {
    acc.queue_critical(ctx.status());
    if !ctx.expects_success() {
        acc.queue(ctx.format());
        return false;
    }
    acc.queue(ctx.json_content_type());
    acc.queue_critical(ctx.format());
    if ctx.flags.expect_non_empty {
        acc.queue_critical(Assertion::ArrayNotEmpty {
            response: ctx.response,
        });
    }
    true
}

/// Assertions over the elements of a journey or trip search result.
fn queue_search_results<'a>(ctx: &TestContext<'a>, acc: &mut Accumulator<'a>) {
    acc.queue(ctx.radius(Leg::Departure));
    acc.queue(ctx.radius(Leg::Arrival));
    acc.queue(Assertion::CountLimit {
        request: ctx.request,
        response: ctx.response,
    });
    acc.queue(Assertion::UniqueIds {
        response: ctx.response,
    });
    acc.queue(Assertion::OperatorFormat {
        response: ctx.response,
    });
}

fn queue_booking<'a>(ctx: &TestContext<'a>, acc: &mut Accumulator<'a>) {
    acc.queue_critical(ctx.status());
    if !ctx.expects_success() {
        acc.queue(ctx.format());
        return;
    }
    acc.queue(ctx.json_content_type());
    acc.queue_critical(ctx.format());
    if let Some(expected) = ctx.flags.booking_status() {
        acc.queue(Assertion::BookingStatus {
            response: ctx.response,
            expected: expected.to_string(),
        });
    }
}
