//! Device position lookup.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tripcast_core::{GeolocationConfig, GeolocationMode};

use crate::types::{Coordinates, LocationError};

const USER_AGENT: &str = "Tripcast/0.1.0";

/// Something that can tell where the user is.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Always reports the same configured position.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl GeolocationProvider for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Geolocation switched off; every lookup is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl GeolocationProvider for NoGeolocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

/// Approximate position from the public IP (ip-api.com compatible).
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    client: Client,
    lookup_url: String,
}

impl IpGeolocation {
    pub fn new(lookup_url: &str, timeout: Duration) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LocationError::Other(e.to_string()))?;

        Ok(Self {
            client,
            lookup_url: lookup_url.to_string(),
        })
    }
}

#[async_trait]
impl GeolocationProvider for IpGeolocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let response = self
            .client
            .get(&self.lookup_url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LocationError::Timeout
                } else {
                    tracing::debug!("IP lookup request failed: {}", e);
                    LocationError::ServiceUnavailable
                }
            })?;

        if !response.status().is_success() {
            tracing::debug!("IP lookup returned status {}", response.status());
            return Err(LocationError::ServiceUnavailable);
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Other(format!("IP lookup parse error: {e}")))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(latitude), Some(longitude)) => {
                tracing::info!("Located via IP: {}, {}", latitude, longitude);
                Ok(Coordinates {
                    latitude,
                    longitude,
                })
            }
            _ => Err(LocationError::Other(
                body.message.unwrap_or_else(|| "IP lookup failed".to_string()),
            )),
        }
    }
}

/// Build the configured geolocation provider.
pub fn from_config(
    config: &GeolocationConfig,
    timeout: Duration,
) -> Result<Arc<dyn GeolocationProvider>, LocationError> {
    let provider: Arc<dyn GeolocationProvider> = match config.mode {
        GeolocationMode::Ip => Arc::new(IpGeolocation::new(&config.ip_lookup_url, timeout)?),
        GeolocationMode::Fixed => match config.fixed_position {
            Some(p) => Arc::new(FixedPosition(p.into())),
            None => Arc::new(NoGeolocation),
        },
        GeolocationMode::Off => Arc::new(NoGeolocation),
    };
    Ok(provider)
}
