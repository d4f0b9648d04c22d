//! Weather/places backend client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;
use tripcast_core::{ReqwestErrorExt, WeatherConfig};

use crate::error::ProviderError;
use crate::types::PlacesPayload;

/// Source of forecasts and recommended places for a location.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    async fn fetch_by_city(&self, city: &str) -> Result<PlacesPayload, ProviderError>;

    async fn fetch_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<PlacesPayload, ProviderError>;
}

/// Error body returned by the backend, e.g. `{"error": "City not found"}`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(alias = "message")]
    error: Option<String>,
}

/// HTTP implementation backed by the Tripcast weather API.
#[derive(Debug, Clone)]
pub struct HttpPlacesProvider {
    client: Client,
    base_url: String,
}

impl HttpPlacesProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.into_network_error()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, ProviderError> {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    async fn get_payload(&self, query: &[(&str, String)]) -> Result<PlacesPayload, ProviderError> {
        let url = format!("{}/weather", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.into_network_error()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.into_network_error()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error);
            tracing::debug!("Weather API returned {}: {:?}", status, message);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[async_trait]
impl PlacesProvider for HttpPlacesProvider {
    #[instrument(skip(self), level = "info")]
    async fn fetch_by_city(&self, city: &str) -> Result<PlacesPayload, ProviderError> {
        self.get_payload(&[("city", city.to_string())]).await
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<PlacesPayload, ProviderError> {
        self.get_payload(&[("lat", latitude.to_string()), ("lon", longitude.to_string())])
            .await
    }
}
