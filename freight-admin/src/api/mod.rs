//! Thin async fetchers over the freight backend and the geocoding service.
//!
//! Each backend fetcher issues exactly one request with an explicit
//! [`RequestContext`] and returns the decoded envelope as [`Fetched`].

pub mod auth;
pub mod bookings;
pub mod client;
pub mod error;
pub mod geo;
pub mod shipments;
pub mod users;
pub mod warehouse;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{decode_envelope, ApiClient, Fetched, RequestContext};
pub use error::{ApiError, GENERIC_FAILURE};
pub use geo::{GeoClient, LocationOption};
