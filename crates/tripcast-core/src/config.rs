use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Weather and places backend settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Favorites backend settings
    #[serde(default)]
    pub favorites: FavoritesConfig,

    /// Device position lookup
    #[serde(default)]
    pub geolocation: GeolocationConfig,
}

/// A configured latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL of the weather/places API
    #[serde(default = "default_weather_api_url")]
    pub api_base_url: String,

    /// City used when the device position cannot be determined
    #[serde(default = "default_city")]
    pub default_city: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_weather_api_url() -> String {
    "https://backend-node-thw6.onrender.com".to_string()
}

fn default_city() -> String {
    "Johannesburg".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_weather_api_url(),
            default_city: default_city(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesConfig {
    /// Base URL of the profile/favorites backend
    #[serde(default = "default_weather_api_url")]
    pub api_base_url: String,

    /// Bearer token for the favorites backend (falls back to `TRIPCAST_AUTH_TOKEN`)
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_weather_api_url(),
            auth_token: None,
        }
    }
}

impl FavoritesConfig {
    /// Token from config, or from the environment when unset.
    pub fn effective_token(&self) -> Option<String> {
        self.auth_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var("TRIPCAST_AUTH_TOKEN").ok())
    }
}

/// How the device position is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeolocationMode {
    /// Look up the public IP's approximate position
    #[default]
    Ip,
    /// Use `fixed_position`
    Fixed,
    /// Never locate; always use the default city
    Off,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default)]
    pub mode: GeolocationMode,

    /// IP lookup endpoint used in `ip` mode
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    /// Position used in `fixed` mode
    #[serde(default)]
    pub fixed_position: Option<Position>,
}

fn default_ip_lookup_url() -> String {
    "http://ip-api.com/json".to_string()
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            mode: GeolocationMode::default(),
            ip_lookup_url: default_ip_lookup_url(),
            fixed_position: None,
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating default if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config_path = Self::config_path()?;
        Self::load_validated_from(&config_path)
    }

    /// Load from an explicit path and validate
    pub fn load_validated_from(config_path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(config_path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.weather.api_base_url, "weather.api_base_url", &mut result);
        validate_url(
            &self.favorites.api_base_url,
            "favorites.api_base_url",
            &mut result,
        );

        if self.weather.default_city.trim().is_empty() {
            result.add_error("weather.default_city", "Default city must not be blank");
        }

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        } else if self.weather.request_timeout_secs > 120 {
            result.add_warning(
                "weather.request_timeout_secs",
                "Request timeout is unusually long (>120s)",
            );
        }

        match self.geolocation.mode {
            GeolocationMode::Ip => validate_url(
                &self.geolocation.ip_lookup_url,
                "geolocation.ip_lookup_url",
                &mut result,
            ),
            GeolocationMode::Fixed => match self.geolocation.fixed_position {
                None => result.add_error(
                    "geolocation.fixed_position",
                    "Fixed mode requires a fixed_position",
                ),
                Some(p)
                    if !(-90.0..=90.0).contains(&p.latitude)
                        || !(-180.0..=180.0).contains(&p.longitude) =>
                {
                    result.add_error(
                        "geolocation.fixed_position",
                        "Latitude must be -90..90 and longitude -180..180",
                    )
                }
                Some(_) => {}
            },
            GeolocationMode::Off => result.add_warning(
                "geolocation.mode",
                "Geolocation disabled - the default city will always be used",
            ),
        }

        if self.favorites.effective_token().is_none() {
            result.add_warning(
                "favorites.auth_token",
                "No auth token configured - favorites will be unavailable",
            );
        }

        result
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("tripcast");

        Ok(config_dir.join("config.toml"))
    }
}

/// Validate a URL field
fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }

            if url.port() == Some(0) {
                result.add_error(field_name, "Port cannot be 0");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
