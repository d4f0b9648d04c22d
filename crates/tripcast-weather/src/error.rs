//! Forecast error types.

use thiserror::Error;
use tripcast_core::{AppError, NetworkError, WeatherError};

use crate::types::LocationError;

/// Failure from the weather/places backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("API error {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Api { status: u16, message: Option<String> },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Short text for display; prefers the backend's own message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api {
                message: Some(msg), ..
            } if !msg.trim().is_empty() => msg.clone(),
            Self::Api { status: 404, .. } => "Location not found. Check and try again.".to_string(),
            Self::Api { .. } => "Weather service error. Please try again.".to_string(),
            Self::Network(e) => e.user_message().to_string(),
            Self::Parse(_) => "Received unexpected weather data. Please try again.".to_string(),
        }
    }
}

/// Errors surfaced by the forecast store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Empty query")]
    EmptyQuery,

    #[error("Invalid coordinates")]
    InvalidCoordinates,

    #[error("Geolocation denied")]
    GeolocationDenied,

    #[error("Fetch failed: {0}")]
    RemoteFetchFailed(String),
}

impl FetchError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyQuery => "Enter a city to search.".to_string(),
            Self::InvalidCoordinates => {
                "Your position could not be read. Try searching for a city.".to_string()
            }
            Self::GeolocationDenied => {
                "Location access was denied. Showing the default city.".to_string()
            }
            Self::RemoteFetchFailed(msg) => msg.clone(),
        }
    }
}

impl From<ProviderError> for FetchError {
    fn from(e: ProviderError) -> Self {
        Self::RemoteFetchFailed(e.user_message())
    }
}

impl From<LocationError> for FetchError {
    fn from(e: LocationError) -> Self {
        match e {
            LocationError::PermissionDenied => Self::GeolocationDenied,
            other => Self::RemoteFetchFailed(other.to_string()),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::EmptyQuery => AppError::Weather(WeatherError::EmptyQuery),
            FetchError::InvalidCoordinates => AppError::Weather(WeatherError::InvalidCoordinates),
            FetchError::GeolocationDenied => AppError::Weather(WeatherError::GeolocationDenied),
            FetchError::RemoteFetchFailed(msg) => AppError::Weather(WeatherError::ApiError(msg)),
        }
    }
}
