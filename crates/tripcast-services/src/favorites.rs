//! Favorite places, stored by the profile backend.
//!
//! Places are keyed by the same derived id the forecast store uses, so a
//! recommended place can be checked for membership directly.

use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tripcast_core::{AppError, NetworkError, ReqwestErrorExt};
use tripcast_weather::RecommendedPlace;
use url::Url;

/// Favorites client errors
#[derive(Debug, thiserror::Error)]
pub enum FavoritesError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Favorites API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FavoritesError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Sign in to manage your favorites.".to_string(),
            Self::Api { message, .. } => message.clone(),
            Self::Network(e) => e.user_message().to_string(),
            Self::InvalidUrl(_) => "Favorites service is misconfigured.".to_string(),
        }
    }
}

impl From<FavoritesError> for AppError {
    fn from(e: FavoritesError) -> Self {
        use tripcast_core::FavoritesError as Core;
        match e {
            FavoritesError::NotAuthenticated => AppError::Favorites(Core::NotAuthenticated),
            FavoritesError::Api { status: 404, message } => {
                AppError::Favorites(Core::NotFound(message))
            }
            FavoritesError::Api { message, .. } => AppError::Favorites(Core::ApiError(message)),
            FavoritesError::Network(e) => AppError::Network(e),
            FavoritesError::InvalidUrl(e) => AppError::Config(
                tripcast_core::ConfigError::Invalid(e.to_string()),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FavoritesResponse {
    #[serde(default)]
    favorites: Vec<RecommendedPlace>,
}

#[derive(Debug, Serialize)]
struct AddFavoriteRequest<'a> {
    place: &'a RecommendedPlace,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddFavoriteResponse {
    added_place: RecommendedPlace,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

/// HTTP client for the profile favorites endpoints.
#[derive(Debug, Clone)]
pub struct FavoritesClient {
    base_url: Url,
    client: Arc<Client>,
    token: Option<String>,
}

impl FavoritesClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, FavoritesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FavoritesError::Network(e.into_network_error()))?;

        // Url::join drops the last path segment unless the base ends in '/'.
        let base = format!("{}/", base_url.trim_end_matches('/'));

        Ok(Self {
            base_url: Url::parse(&base)?,
            client: Arc::new(client),
            token,
        })
    }

    fn build_request(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => req,
        }
    }

    /// Map a failed response to an error, preferring the backend's message.
    async fn check_response(
        &self,
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<reqwest::Response, FavoritesError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(FavoritesError::NotAuthenticated);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| fallback.to_string());
        Err(FavoritesError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// List the user's favorite places
    pub async fn list(&self) -> Result<Vec<RecommendedPlace>, FavoritesError> {
        tracing::debug!("Fetching favorites");

        let url = self.base_url.join("profile/favorites")?;
        let response = self
            .build_request(self.client.get(url))
            .send()
            .await
            .map_err(|e| FavoritesError::Network(e.into_network_error()))?;
        let response = self
            .check_response(response, "Failed to fetch favorites")
            .await?;
        let body: FavoritesResponse = response
            .json()
            .await
            .map_err(|e| FavoritesError::Network(e.into_network_error()))?;

        tracing::info!("Fetched {} favorites", body.favorites.len());
        Ok(body.favorites)
    }

    /// Add a place; returns the place as stored by the backend
    pub async fn add(&self, place: &RecommendedPlace) -> Result<RecommendedPlace, FavoritesError> {
        tracing::debug!("Adding favorite: {}", place.id);

        let url = self.base_url.join("profile/add-favorites")?;
        let response = self
            .build_request(self.client.post(url).json(&AddFavoriteRequest { place }))
            .send()
            .await
            .map_err(|e| FavoritesError::Network(e.into_network_error()))?;
        let response = self.check_response(response, "Failed to add favorite").await?;
        let body: AddFavoriteResponse = response
            .json()
            .await
            .map_err(|e| FavoritesError::Network(e.into_network_error()))?;

        Ok(body.added_place)
    }

    /// Remove a place by id
    pub async fn remove(&self, place_id: &str) -> Result<(), FavoritesError> {
        tracing::debug!("Removing favorite: {}", place_id);

        let url = self
            .base_url
            .join(&format!("profile/favorites/{}", urlencode_segment(place_id)))?;
        let response = self
            .build_request(self.client.delete(url))
            .send()
            .await
            .map_err(|e| FavoritesError::Network(e.into_network_error()))?;
        self.check_response(response, "Failed to remove favorite")
            .await?;
        Ok(())
    }
}

fn urlencode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

/// Local favorites list kept in step with the backend.
#[derive(Debug)]
pub struct Favorites {
    client: FavoritesClient,
    places: Vec<RecommendedPlace>,
}

impl Favorites {
    pub fn new(client: FavoritesClient) -> Self {
        Self {
            client,
            places: Vec::new(),
        }
    }

    /// Replace the local list with the backend's.
    pub async fn load(&mut self) -> Result<(), FavoritesError> {
        self.places = self.client.list().await?;
        Ok(())
    }

    pub fn places(&self) -> &[RecommendedPlace] {
        &self.places
    }

    pub fn contains(&self, place_id: &str) -> bool {
        self.places.iter().any(|p| p.id == place_id)
    }

    /// Add on the backend, then put the stored place first locally.
    pub async fn add(&mut self, place: &RecommendedPlace) -> Result<(), FavoritesError> {
        let added = self.client.add(place).await?;
        self.places.retain(|p| p.id != added.id);
        self.places.insert(0, added);
        Ok(())
    }

    /// Remove locally, then on the backend. A backend failure is logged and
    /// the local removal stands.
    pub async fn remove(&mut self, place_id: &str) {
        self.places.retain(|p| p.id != place_id);
        if let Err(e) = self.client.remove(place_id).await {
            tracing::error!("Failed to remove favorite {} remotely: {}", place_id, e);
        }
    }

    /// Add the place if absent, remove it if present. Returns the new membership.
    pub async fn toggle(&mut self, place: &RecommendedPlace) -> Result<bool, FavoritesError> {
        if self.contains(&place.id) {
            self.remove(&place.id).await;
            Ok(false)
        } else {
            self.add(place).await?;
            Ok(true)
        }
    }
}
