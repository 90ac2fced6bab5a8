//! Booking configuration for skybook
//!
//! The configuration is a single JSON document with four sections:
//! `flight_details`, `passengers`, `booking_preferences` and `browser_settings`.
//! It is loaded once at process start, validated, and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Result, SkybookError};

/// File name looked up next to the executable and in the working directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variable that overrides config file discovery
pub const ENV_CONFIG_PATH: &str = "SKYBOOK_CONFIG";

/// Number of adult passengers the checkout flow is built for
pub const REQUIRED_ADULTS: usize = 2;

/// Top-level booking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Itinerary values substituted into step actions
    pub flight_details: Itinerary,

    /// Ordered passenger records
    pub passengers: PassengerList,

    /// Fare tier and other preferences
    pub booking_preferences: BookingPreferences,

    /// Browser launch and timeout settings
    pub browser_settings: BrowserSettings,
}

/// Round-trip itinerary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Itinerary {
    pub departure_airport: String,
    pub departure_code: String,
    pub destination_airport: String,
    pub destination_code: String,
    /// Calendar month tab identifier, e.g. `2025-06-01`
    pub departure_month: String,
    pub departure_date: String,
    pub return_date: String,
}

/// Passenger records grouped by type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PassengerList {
    pub adults: Vec<Passenger>,
}

/// A single passenger record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Passenger {
    /// Title as shown in the site's dropdown (Mr, Mrs, Ms...)
    pub title: String,
    pub first_name: String,
    pub surname: String,
}

/// Booking preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingPreferences {
    pub fare_type: FareType,
}

/// Fare tier selector
///
/// Unknown tiers are kept rather than rejected so the flow can report them
/// as not implemented when it reaches the fare step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FareType {
    Basic,
    Unsupported(String),
}

impl FareType {
    pub fn as_str(&self) -> &str {
        match self {
            FareType::Basic => "basic",
            FareType::Unsupported(name) => name,
        }
    }
}

impl From<String> for FareType {
    fn from(value: String) -> Self {
        if value == "basic" {
            FareType::Basic
        } else {
            FareType::Unsupported(value)
        }
    }
}

impl From<FareType> for String {
    fn from(value: FareType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for FareType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Browser launch and timeout settings (all timeouts in milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrowserSettings {
    /// Run Chrome without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Short timeout for UI affordances (consent banners, suggestions)
    pub timeout: u64,

    /// Longer timeout for full page transitions
    pub page_load_timeout: u64,

    /// Timeout for navigation and network-idle waits
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout: u64,

    /// Site entry point
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Which configured timeout bounds a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutClass {
    /// `browser_settings.timeout`
    Ui,
    /// `browser_settings.page_load_timeout`
    PageLoad,
    /// `browser_settings.navigation_timeout`
    Navigation,
}

// Default value providers
fn default_headless() -> bool {
    true
}

fn default_navigation_timeout() -> u64 {
    30_000
}

fn default_base_url() -> String {
    "https://www.ryanair.com/".to_string()
}

impl BookingConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SkybookError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| SkybookError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants every step relies on
    pub fn validate(&self) -> Result<()> {
        let itinerary = &self.flight_details;
        let fields = [
            ("departure_airport", &itinerary.departure_airport),
            ("departure_code", &itinerary.departure_code),
            ("destination_airport", &itinerary.destination_airport),
            ("destination_code", &itinerary.destination_code),
            ("departure_month", &itinerary.departure_month),
            ("departure_date", &itinerary.departure_date),
            ("return_date", &itinerary.return_date),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(SkybookError::InvalidConfig(format!(
                    "flight_details.{} must not be empty",
                    name
                )));
            }
        }

        let adults = &self.passengers.adults;
        if adults.len() != REQUIRED_ADULTS {
            return Err(SkybookError::InvalidConfig(format!(
                "expected exactly {} adult passengers, found {}",
                REQUIRED_ADULTS,
                adults.len()
            )));
        }
        for (i, adult) in adults.iter().enumerate() {
            if adult.title.trim().is_empty()
                || adult.first_name.trim().is_empty()
                || adult.surname.trim().is_empty()
            {
                return Err(SkybookError::InvalidConfig(format!(
                    "passengers.adults[{}] has an empty title or name",
                    i
                )));
            }
        }

        let settings = &self.browser_settings;
        if settings.timeout == 0 || settings.page_load_timeout == 0 || settings.navigation_timeout == 0 {
            return Err(SkybookError::InvalidConfig(
                "browser_settings timeouts must be greater than zero".to_string(),
            ));
        }
        if settings.base_url.trim().is_empty() {
            return Err(SkybookError::InvalidConfig(
                "browser_settings.base_url must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Pick the config file path
///
/// Precedence: explicit path, `SKYBOOK_CONFIG`, `config.json` beside the
/// executable, `config.json` in the working directory. When neither candidate
/// file exists the executable-relative path is returned so the load error
/// names the primary location.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    env_value: Option<&str>,
    exe_dir: Option<&Path>,
    cwd: &Path,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return PathBuf::from(value);
    }

    let cwd_candidate = cwd.join(CONFIG_FILE_NAME);
    match exe_dir.map(|dir| dir.join(CONFIG_FILE_NAME)) {
        Some(exe_candidate) if exe_candidate.exists() => exe_candidate,
        Some(exe_candidate) if !cwd_candidate.exists() => exe_candidate,
        _ => cwd_candidate,
    }
}

/// Resolve the config path from the live process environment
pub fn locate_config(explicit: Option<&Path>) -> Result<PathBuf> {
    let env_value = std::env::var(ENV_CONFIG_PATH).ok();
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = std::env::current_dir()?;

    Ok(resolve_config_path(
        explicit,
        env_value.as_deref(),
        exe_dir.as_deref(),
        &cwd,
    ))
}
