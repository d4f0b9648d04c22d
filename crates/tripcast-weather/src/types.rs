use serde::{Deserialize, Serialize};

/// Number of days in a forecast set (today plus six).
pub const FORECAST_DAYS: usize = 7;

/// Geographic coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<tripcast_core::Position> for Coordinates {
    fn from(p: tripcast_core::Position) -> Self {
        Self {
            latitude: p.latitude,
            longitude: p.longitude,
        }
    }
}

/// A resolved location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub coordinates: Coordinates,
}

/// Forecast for a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub description: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: f64,
    pub wind_speed: f64,
}

impl DayForecast {
    /// True when the description mentions rain, in any case.
    pub fn is_rainy(&self) -> bool {
        self.description.to_lowercase().contains("rain")
    }
}

/// Exactly seven days of forecast, indexed by day offset from today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DayForecast>", into = "Vec<DayForecast>")]
pub struct ForecastSet([DayForecast; FORECAST_DAYS]);

impl ForecastSet {
    pub fn day(&self, index: DayIndex) -> &DayForecast {
        &self.0[index.as_usize()]
    }

    pub fn days(&self) -> &[DayForecast] {
        &self.0
    }
}

impl TryFrom<Vec<DayForecast>> for ForecastSet {
    type Error = String;

    fn try_from(days: Vec<DayForecast>) -> Result<Self, Self::Error> {
        let len = days.len();
        <[DayForecast; FORECAST_DAYS]>::try_from(days)
            .map(Self)
            .map_err(|_| format!("expected {FORECAST_DAYS} forecast days, got {len}"))
    }
}

impl From<ForecastSet> for Vec<DayForecast> {
    fn from(set: ForecastSet) -> Self {
        set.0.into()
    }
}

/// Day offset from today, always in `0..7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DayIndex(u8);

impl DayIndex {
    pub const TODAY: DayIndex = DayIndex(0);

    /// Returns `None` for offsets outside `0..7`.
    pub fn new(offset: i64) -> Option<Self> {
        u8::try_from(offset)
            .ok()
            .filter(|o| usize::from(*o) < FORECAST_DAYS)
            .map(Self)
    }

    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }
}

/// Whether a place is enjoyed indoors or outdoors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceCategory {
    Indoor,
    Outdoor,
}

/// A point of interest suggested for the resolved location.
///
/// Deserializing without an `id` derives one from the name, so the same place
/// keeps the same identity across fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PlaceRecord")]
pub struct RecommendedPlace {
    pub id: String,
    pub name: String,
    pub category: PlaceCategory,
    pub address: String,
    pub coordinates: Coordinates,
}

impl RecommendedPlace {
    pub fn new(
        name: impl Into<String>,
        category: PlaceCategory,
        address: impl Into<String>,
        coordinates: Coordinates,
    ) -> Self {
        let name = name.into();
        Self {
            id: place_id(&name),
            name,
            category,
            address: address.into(),
            coordinates,
        }
    }
}

/// Derive a stable place id: lower-cased, spaces replaced with hyphens.
pub fn place_id(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

#[derive(Deserialize)]
struct PlaceRecord {
    #[serde(default)]
    id: Option<String>,
    name: String,
    category: PlaceCategory,
    #[serde(default)]
    address: String,
    coordinates: Coordinates,
}

impl From<PlaceRecord> for RecommendedPlace {
    fn from(r: PlaceRecord) -> Self {
        let id = r
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| place_id(&r.name));
        Self {
            id,
            name: r.name,
            category: r.category,
            address: r.address,
            coordinates: r.coordinates,
        }
    }
}

/// Everything one fetch returns; replaced as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacesPayload {
    pub location: Location,
    pub forecast: ForecastSet,
    #[serde(default)]
    pub recommended_places: Vec<RecommendedPlace>,
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(description: &str) -> DayForecast {
        DayForecast {
            description: description.to_string(),
            temp_min: 10.0,
            temp_max: 20.0,
            humidity: 50.0,
            wind_speed: 3.0,
        }
    }

    #[test]
    fn test_day_index_bounds() {
        assert_eq!(DayIndex::new(0), Some(DayIndex::TODAY));
        assert_eq!(DayIndex::new(6).map(DayIndex::as_usize), Some(6));
        assert_eq!(DayIndex::new(7), None);
        assert_eq!(DayIndex::new(-1), None);
        assert_eq!(DayIndex::new(i64::MAX), None);
    }

    #[test]
    fn test_forecast_set_requires_seven_days() {
        let six: Vec<_> = (0..6).map(|_| day("Sunny")).collect();
        let err = ForecastSet::try_from(six).unwrap_err();
        assert!(err.contains("got 6"));

        let seven: Vec<_> = (0..7).map(|i| day(&format!("day {i}"))).collect();
        let set = ForecastSet::try_from(seven).unwrap();
        assert_eq!(set.days().len(), 7);
        assert_eq!(set.day(DayIndex::new(3).unwrap()).description, "day 3");
    }

    #[test]
    fn test_forecast_set_rejects_wrong_length_json() {
        let json = serde_json::json!([{
            "description": "Sunny",
            "temp_min": 1.0,
            "temp_max": 2.0,
            "humidity": 3.0,
            "wind_speed": 4.0
        }]);
        let result: Result<ForecastSet, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_is_rainy_is_case_insensitive() {
        assert!(day("Light RAIN").is_rainy());
        assert!(day("Rainy afternoon").is_rainy());
        assert!(!day("Sunny").is_rainy());
    }

    #[test]
    fn test_place_id_derivation() {
        assert_eq!(place_id("Table Mountain"), "table-mountain");
        assert_eq!(place_id("Zeitz MOCAA"), "zeitz-mocaa");
    }

    #[test]
    fn test_place_without_id_gets_derived_id() {
        let place: RecommendedPlace = serde_json::from_value(serde_json::json!({
            "name": "Gold Reef City",
            "category": "Outdoor",
            "address": "Northern Parkway",
            "coordinates": {"latitude": -26.23, "longitude": 28.01}
        }))
        .unwrap();
        assert_eq!(place.id, "gold-reef-city");
        assert_eq!(place.category, PlaceCategory::Outdoor);
    }

    #[test]
    fn test_place_keeps_explicit_id() {
        let place: RecommendedPlace = serde_json::from_value(serde_json::json!({
            "id": "abc123",
            "name": "Apartheid Museum",
            "category": "Indoor",
            "address": "Northern Parkway",
            "coordinates": {"latitude": -26.24, "longitude": 28.01}
        }))
        .unwrap();
        assert_eq!(place.id, "abc123");
    }

    #[test]
    fn test_coordinates_validity() {
        let at = |latitude, longitude| Coordinates {
            latitude,
            longitude,
        };
        assert!(at(-26.2, 28.0).is_valid());
        assert!(!at(f64::NAN, 10.0).is_valid());
        assert!(!at(10.0, f64::INFINITY).is_valid());
        assert!(!at(95.0, 10.0).is_valid());
    }
}
