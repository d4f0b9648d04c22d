//! Forecast store: the fetched forecast for one location plus the selected day.
//!
//! Every resolve is tagged with a sequence number taken under the state lock.
//! A response is applied only if its tag is still the latest issued, so a slow
//! stale request can never overwrite data from a newer one. Superseded
//! requests are not cancelled; their results are dropped on arrival.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{FetchError, ProviderError};
use crate::location::GeolocationProvider;
use crate::provider::PlacesProvider;
use crate::recommend;
use crate::types::{
    Coordinates, DayForecast, DayIndex, ForecastSet, Location, PlacesPayload, RecommendedPlace,
};

/// What a resolve was asked for; kept so `refresh` can repeat it.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    City(String),
    Coordinates(Coordinates),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    /// New location: selected day goes back to today.
    Fresh,
    /// Same location re-fetched: selected day is kept.
    Refresh,
}

#[derive(Debug, Default)]
struct StoreState {
    payload: Option<PlacesPayload>,
    selected_day: DayIndex,
    is_loading: bool,
    error: Option<String>,
    last_query: Option<Query>,
    latest_seq: u64,
}

/// Point-in-time view for the map and day selector.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSnapshot {
    pub location: Option<Location>,
    pub forecast: Option<ForecastSet>,
    pub selected_day: DayIndex,
    pub selected_forecast: Option<DayForecast>,
    pub filtered_places: Vec<RecommendedPlace>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Owns forecast state for one view. Construct one per view; nothing is global.
pub struct ForecastStore {
    provider: Arc<dyn PlacesProvider>,
    geolocation: Arc<dyn GeolocationProvider>,
    default_city: String,
    state: Mutex<StoreState>,
}

/// Clears `is_loading` when the request it belongs to ends, however it ends.
struct LoadingGuard<'a> {
    state: &'a Mutex<StoreState>,
    seq: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.latest_seq == self.seq {
            state.is_loading = false;
        }
    }
}

impl ForecastStore {
    pub fn new(
        provider: Arc<dyn PlacesProvider>,
        geolocation: Arc<dyn GeolocationProvider>,
        default_city: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            geolocation,
            default_city: default_city.into(),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Resolve a city by name.
    ///
    /// A blank name is a silent no-op returning `EmptyQuery`.
    pub async fn resolve_by_query(&self, city: &str) -> Result<(), FetchError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(FetchError::EmptyQuery);
        }
        self.resolve(Query::City(city.to_string()), Intent::Fresh)
            .await
    }

    /// Resolve a device position.
    ///
    /// Non-finite or out-of-range values fail with `InvalidCoordinates`
    /// without touching the resolved data.
    pub async fn resolve_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), FetchError> {
        let coordinates = Coordinates {
            latitude,
            longitude,
        };
        if !coordinates.is_valid() {
            let err = FetchError::InvalidCoordinates;
            self.state.lock().error = Some(err.user_message());
            return Err(err);
        }
        self.resolve(Query::Coordinates(coordinates), Intent::Fresh)
            .await
    }

    /// Locate the device and resolve that position, falling back to the
    /// default city when the position is unavailable or denied.
    ///
    /// If another resolve starts while the position is pending, this one
    /// returns `Ok` without fetching.
    pub async fn resolve_current_location(&self) -> Result<(), FetchError> {
        let seq = self.begin();
        let _loading = LoadingGuard {
            state: &self.state,
            seq,
        };

        let query = match self.geolocation.current_position().await {
            Ok(coordinates) if coordinates.is_valid() => Query::Coordinates(coordinates),
            Ok(coordinates) => {
                warn!(
                    "Geolocation returned invalid coordinates {:?}, using {}",
                    coordinates, self.default_city
                );
                Query::City(self.default_city.clone())
            }
            Err(e) => {
                let reason = FetchError::from(e);
                warn!(
                    "Geolocation failed ({}), falling back to {}",
                    reason, self.default_city
                );
                Query::City(self.default_city.clone())
            }
        };

        let latest = self.state.lock().latest_seq;
        if latest != seq {
            debug!(
                "Skipping fetch for superseded location request #{} (latest is #{})",
                seq, latest
            );
            return Ok(());
        }

        let result = self.fetch(&query).await;
        self.finish(seq, query, Intent::Fresh, result)
    }

    /// Re-fetch the last resolved query, keeping the selected day.
    pub async fn refresh(&self) -> Result<(), FetchError> {
        let query = self.state.lock().last_query.clone();
        match query {
            Some(query) => self.resolve(query, Intent::Refresh).await,
            None => Err(FetchError::EmptyQuery),
        }
    }

    /// Select the day to display. Offsets outside `0..7` are ignored.
    pub fn select_day(&self, index: i64) {
        match DayIndex::new(index) {
            Some(day) => {
                debug!("Selected day {}", index);
                self.state.lock().selected_day = day;
            }
            None => debug!("Ignoring out-of-range day {}", index),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn selected_day(&self) -> DayIndex {
        self.state.lock().selected_day
    }

    pub fn location(&self) -> Option<Location> {
        self.state
            .lock()
            .payload
            .as_ref()
            .map(|p| p.location.clone())
    }

    pub fn forecast(&self) -> Option<ForecastSet> {
        self.state
            .lock()
            .payload
            .as_ref()
            .map(|p| p.forecast.clone())
    }

    pub fn recommended_places(&self) -> Vec<RecommendedPlace> {
        self.state
            .lock()
            .payload
            .as_ref()
            .map(|p| p.recommended_places.clone())
            .unwrap_or_default()
    }

    /// Forecast for the selected day, if anything has been resolved.
    pub fn selected_forecast(&self) -> Option<DayForecast> {
        let state = self.state.lock();
        state
            .payload
            .as_ref()
            .map(|p| p.forecast.day(state.selected_day).clone())
    }

    /// Places for the selected day, recomputed from current state on every call.
    pub fn filtered_places(&self) -> Vec<RecommendedPlace> {
        let state = self.state.lock();
        state
            .payload
            .as_ref()
            .map(|p| {
                recommend::filter_places(p.forecast.day(state.selected_day), &p.recommended_places)
            })
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> ForecastSnapshot {
        let state = self.state.lock();
        let payload = state.payload.as_ref();
        let selected_forecast = payload.map(|p| p.forecast.day(state.selected_day).clone());
        let filtered_places = match (payload, &selected_forecast) {
            (Some(p), Some(day)) => recommend::filter_places(day, &p.recommended_places),
            _ => Vec::new(),
        };

        ForecastSnapshot {
            location: payload.map(|p| p.location.clone()),
            forecast: payload.map(|p| p.forecast.clone()),
            selected_day: state.selected_day,
            selected_forecast,
            filtered_places,
            is_loading: state.is_loading,
            error: state.error.clone(),
        }
    }

    async fn resolve(&self, query: Query, intent: Intent) -> Result<(), FetchError> {
        let seq = self.begin();
        let _loading = LoadingGuard {
            state: &self.state,
            seq,
        };

        let result = self.fetch(&query).await;
        self.finish(seq, query, intent, result)
    }

    /// Claim the next sequence number and enter the loading state.
    fn begin(&self) -> u64 {
        let mut state = self.state.lock();
        state.latest_seq += 1;
        state.is_loading = true;
        state.error = None;
        state.latest_seq
    }

    async fn fetch(&self, query: &Query) -> Result<PlacesPayload, ProviderError> {
        debug!("Fetching forecast for {:?}", query);
        match query {
            Query::City(city) => self.provider.fetch_by_city(city).await,
            Query::Coordinates(c) => {
                self.provider
                    .fetch_by_coordinates(c.latitude, c.longitude)
                    .await
            }
        }
    }

    /// Apply a completed fetch if `seq` is still current.
    ///
    /// Stale results are dropped and reported as `Ok`.
    fn finish(
        &self,
        seq: u64,
        query: Query,
        intent: Intent,
        result: Result<PlacesPayload, ProviderError>,
    ) -> Result<(), FetchError> {
        let mut state = self.state.lock();
        if state.latest_seq != seq {
            debug!(
                "Discarding stale response #{} (latest is #{})",
                seq, state.latest_seq
            );
            return Ok(());
        }

        match result {
            Ok(payload) => {
                info!("Resolved forecast for {}", payload.location.city);
                state.payload = Some(payload);
                if intent == Intent::Fresh {
                    state.selected_day = DayIndex::TODAY;
                }
                state.last_query = Some(query);
                state.error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to fetch forecast for {:?}: {}", query, e);
                let err = FetchError::from(e);
                state.error = Some(err.user_message());
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for ForecastStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastStore")
            .field("default_city", &self.default_city)
            .field("state", &*self.state.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::NoGeolocation;
    use crate::types::{PlaceCategory, FORECAST_DAYS};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Provider that never answers.
    struct PendingProvider;

    #[async_trait]
    impl PlacesProvider for PendingProvider {
        async fn fetch_by_city(&self, _city: &str) -> Result<PlacesPayload, ProviderError> {
            std::future::pending().await
        }

        async fn fetch_by_coordinates(
            &self,
            _latitude: f64,
            _longitude: f64,
        ) -> Result<PlacesPayload, ProviderError> {
            std::future::pending().await
        }
    }

    /// Provider that always returns a payload named after the query.
    struct EchoProvider;

    fn payload(city: &str) -> PlacesPayload {
        let days: Vec<DayForecast> = (0..FORECAST_DAYS)
            .map(|i| DayForecast {
                description: if i % 2 == 0 { "Sunny" } else { "Rain" }.to_string(),
                temp_min: 5.0,
                temp_max: 15.0,
                humidity: 70.0,
                wind_speed: 2.0,
            })
            .collect();
        let origin = Coordinates {
            latitude: 0.0,
            longitude: 0.0,
        };
        PlacesPayload {
            location: Location {
                city: city.to_string(),
                coordinates: origin,
            },
            forecast: ForecastSet::try_from(days).unwrap(),
            recommended_places: vec![
                RecommendedPlace::new("Park", PlaceCategory::Outdoor, "1 Road", origin),
                RecommendedPlace::new("Museum", PlaceCategory::Indoor, "2 Road", origin),
            ],
        }
    }

    #[async_trait]
    impl PlacesProvider for EchoProvider {
        async fn fetch_by_city(&self, city: &str) -> Result<PlacesPayload, ProviderError> {
            Ok(payload(city))
        }

        async fn fetch_by_coordinates(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> Result<PlacesPayload, ProviderError> {
            Ok(payload(&format!("{latitude},{longitude}")))
        }
    }

    fn store(provider: impl PlacesProvider + 'static) -> ForecastStore {
        ForecastStore::new(Arc::new(provider), Arc::new(NoGeolocation), "Johannesburg")
    }

    #[tokio::test]
    async fn test_dropped_request_clears_loading() {
        let store = store(PendingProvider);

        let result =
            tokio::time::timeout(Duration::from_millis(20), store.resolve_by_query("Paris")).await;

        assert!(result.is_err(), "pending provider should time out");
        assert!(!store.is_loading());
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_filtered_places_follow_selected_day() {
        let store = store(EchoProvider);
        store.resolve_by_query("Paris").await.unwrap();

        // Day 0 is sunny, day 1 rainy.
        assert_eq!(store.filtered_places()[0].name, "Park");
        store.select_day(1);
        assert_eq!(store.filtered_places()[0].name, "Museum");
        assert_eq!(store.snapshot().filtered_places[0].name, "Museum");
    }

    #[tokio::test]
    async fn test_refresh_keeps_selected_day() {
        let store = store(EchoProvider);
        store.resolve_by_query("Paris").await.unwrap();
        store.select_day(4);

        store.refresh().await.unwrap();
        assert_eq!(store.selected_day().as_usize(), 4);

        store.resolve_by_query("Lyon").await.unwrap();
        assert_eq!(store.selected_day(), DayIndex::TODAY);
    }

    #[tokio::test]
    async fn test_refresh_without_query_is_noop() {
        let store = store(EchoProvider);
        assert_eq!(store.refresh().await, Err(FetchError::EmptyQuery));
        assert!(store.location().is_none());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_query_is_trimmed() {
        let store = store(EchoProvider);
        store.resolve_by_query("  Paris  ").await.unwrap();
        assert_eq!(store.location().unwrap().city, "Paris");
    }

    #[test]
    fn test_empty_snapshot() {
        let store = store(EchoProvider);
        let snapshot = store.snapshot();
        assert!(snapshot.location.is_none());
        assert!(snapshot.forecast.is_none());
        assert!(snapshot.selected_forecast.is_none());
        assert!(snapshot.filtered_places.is_empty());
        assert_eq!(snapshot.selected_day, DayIndex::TODAY);
    }
}
