//! Weather-conditioned place selection.

use crate::types::{DayForecast, PlaceCategory, RecommendedPlace};

/// Category that suits the given day: indoors when it rains.
pub fn preferred_category(day: &DayForecast) -> PlaceCategory {
    if day.is_rainy() {
        PlaceCategory::Indoor
    } else {
        PlaceCategory::Outdoor
    }
}

/// Places to show for `day`.
///
/// Keeps only the preferred category; if none match, every candidate is
/// returned so the map is never empty while places exist.
pub fn filter_places(day: &DayForecast, places: &[RecommendedPlace]) -> Vec<RecommendedPlace> {
    let category = preferred_category(day);
    let matching: Vec<RecommendedPlace> = places
        .iter()
        .filter(|p| p.category == category)
        .cloned()
        .collect();

    if matching.is_empty() {
        places.to_vec()
    } else {
        matching
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coordinates;

    fn day(description: &str) -> DayForecast {
        DayForecast {
            description: description.to_string(),
            temp_min: 12.0,
            temp_max: 22.0,
            humidity: 60.0,
            wind_speed: 4.0,
        }
    }

    fn place(name: &str, category: PlaceCategory) -> RecommendedPlace {
        RecommendedPlace::new(
            name,
            category,
            "Somewhere",
            Coordinates {
                latitude: 0.0,
                longitude: 0.0,
            },
        )
    }

    #[test]
    fn test_sunny_keeps_outdoor_only() {
        let places = vec![
            place("Botanical Garden", PlaceCategory::Outdoor),
            place("Art Gallery", PlaceCategory::Indoor),
        ];
        let filtered = filter_places(&day("Sunny"), &places);
        assert_eq!(filtered, vec![places[0].clone()]);
    }

    #[test]
    fn test_rain_keeps_indoor_only() {
        let places = vec![
            place("Botanical Garden", PlaceCategory::Outdoor),
            place("Art Gallery", PlaceCategory::Indoor),
            place("Aquarium", PlaceCategory::Indoor),
        ];
        let filtered = filter_places(&day("Heavy Rain"), &places);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|p| p.category == PlaceCategory::Indoor));
    }

    #[test]
    fn test_rain_without_indoor_falls_back_to_all() {
        let places = vec![
            place("Botanical Garden", PlaceCategory::Outdoor),
            place("Beach", PlaceCategory::Outdoor),
        ];
        let filtered = filter_places(&day("Light rain"), &places);
        assert_eq!(filtered, places);
    }

    #[test]
    fn test_no_candidates_stays_empty() {
        assert!(filter_places(&day("Sunny"), &[]).is_empty());
    }

    #[test]
    fn test_preferred_category() {
        assert_eq!(preferred_category(&day("drizzle and RAIN")), PlaceCategory::Indoor);
        assert_eq!(preferred_category(&day("Overcast")), PlaceCategory::Outdoor);
    }
}
