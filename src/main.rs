use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tripcast_core::{AppError, Config};
use tripcast_services::{Favorites, FavoritesClient};
use tripcast_weather::{location, ForecastSnapshot, ForecastStore, HttpPlacesProvider};

/// Weather-aware travel planner
#[derive(Debug, Parser)]
#[command(name = "tripcast", version, about = "7-day forecast and places to visit")]
struct Cli {
    /// City to look up; omit to use your current location
    city: Option<String>,

    /// Day to show, as an offset from today (0-6)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    day: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tripcast_core::init()?;
    let cli = Cli::parse();

    let (config, _) = Config::load_validated()?;
    let timeout = Duration::from_secs(config.weather.request_timeout_secs);

    let provider = Arc::new(HttpPlacesProvider::from_config(&config.weather)?);
    let geolocation = location::from_config(&config.geolocation, timeout)?;
    let store = ForecastStore::new(provider, geolocation, config.weather.default_city.clone());

    let result = match cli.city.as_deref() {
        Some(city) => store.resolve_by_query(city).await,
        None => store.resolve_current_location().await,
    };

    if let Err(e) = result {
        let message = store
            .error()
            .unwrap_or_else(|| AppError::from(e).user_message().to_string());
        anyhow::bail!(message);
    }

    store.select_day(cli.day);
    if store.selected_day().as_usize() as i64 != cli.day {
        tracing::warn!("Day {} is outside 0-6, showing today", cli.day);
    }

    let favorites = load_favorites(&config).await;
    print_snapshot(&store.snapshot(), favorites.as_ref());

    Ok(())
}

/// Favorites are optional: missing credentials or a failing backend only
/// mean no stars in the output.
async fn load_favorites(config: &Config) -> Option<Favorites> {
    let token = config.favorites.effective_token()?;
    let client = match FavoritesClient::new(&config.favorites.api_base_url, Some(token)) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Favorites unavailable: {}", e);
            return None;
        }
    };

    let mut favorites = Favorites::new(client);
    match favorites.load().await {
        Ok(()) => Some(favorites),
        Err(e) => {
            tracing::warn!("Favorites unavailable: {}", AppError::from(e).user_message());
            None
        }
    }
}

fn print_snapshot(snapshot: &ForecastSnapshot, favorites: Option<&Favorites>) {
    let (Some(location), Some(forecast)) = (&snapshot.location, &snapshot.forecast) else {
        println!("No forecast available.");
        return;
    };

    println!(
        "{} ({:.2}, {:.2})",
        location.city, location.coordinates.latitude, location.coordinates.longitude
    );
    println!();

    for (offset, day) in forecast.days().iter().enumerate() {
        let marker = if offset == snapshot.selected_day.as_usize() {
            ">"
        } else {
            " "
        };
        println!(
            "{} +{}d  {:<20} {:>5.1}° / {:>5.1}°  humidity {:>3.0}%  wind {:>4.1} m/s",
            marker,
            offset,
            day.description,
            day.temp_min,
            day.temp_max,
            day.humidity,
            day.wind_speed
        );
    }

    println!();
    match &snapshot.selected_forecast {
        Some(day) => println!(
            "Places for day +{} ({}):",
            snapshot.selected_day.as_usize(),
            day.description
        ),
        None => println!("Places:"),
    }

    if snapshot.filtered_places.is_empty() {
        println!("  (no recommendations)");
    }
    for place in &snapshot.filtered_places {
        let star = match favorites {
            Some(f) if f.contains(&place.id) => "★",
            _ => " ",
        };
        println!(
            "  {} {:<30} {:?}  {}",
            star, place.name, place.category, place.address
        );
    }
}
