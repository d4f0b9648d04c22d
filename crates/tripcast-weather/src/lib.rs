//! Forecast store and weather-conditioned place recommendations for Tripcast.
//!
//! Fetches a 7-day forecast plus candidate places for a city or device
//! position, tracks the selected day, and derives which places to show.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod error;
pub mod location;
pub mod provider;
pub mod recommend;
pub mod store;
pub mod types;

pub use error::{FetchError, ProviderError};
pub use location::{FixedPosition, GeolocationProvider, IpGeolocation, NoGeolocation};
pub use provider::{HttpPlacesProvider, PlacesProvider};
pub use recommend::filter_places;
pub use store::{ForecastSnapshot, ForecastStore, Query};
pub use types::*;
