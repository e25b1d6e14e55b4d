use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Temperature unit used for display. Stored weather values are always
/// metric; the unit only affects derived views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Fahrenheit,
    Celsius,
}

impl From<skycast_core::config::TemperatureUnit> for TemperatureUnit {
    fn from(unit: skycast_core::config::TemperatureUnit) -> Self {
        match unit {
            skycast_core::config::TemperatureUnit::Fahrenheit => TemperatureUnit::Fahrenheit,
            skycast_core::config::TemperatureUnit::Celsius => TemperatureUnit::Celsius,
        }
    }
}

/// Deterministic location identity derived from coordinates.
pub fn location_id(lat: f64, lon: f64) -> String {
    format!("{lat}:{lon}")
}

/// A place the dashboard shows weather for. Immutable once constructed;
/// selection replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// `"lat:lon"`, see [`location_id`]
    pub id: String,
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    /// Two locations are the same entity iff their coordinates match exactly.
    pub fn is_same_place(&self, other: &Location) -> bool {
        self.lat == other.lat && self.lon == other.lon
    }
}

/// One row of the search dropdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSearchResult {
    pub id: String,
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

/// Current conditions. Temperature in Celsius, wind speed in km/h.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub location: Location,
    pub temperature: f64,
    pub condition: String,
    pub condition_icon: String,
    pub humidity: u8,
    pub wind_speed: f64,
    pub last_updated: DateTime<Utc>,
}

/// One hour of forecast. Metric storage, formatted display time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    /// e.g. "2:00 PM"
    pub time: String,
    pub temperature: f64,
    pub condition: String,
    pub condition_icon: String,
    pub wind_speed: f64,
    pub humidity: u8,
    pub precipitation_chance: u8,
}

/// One day of forecast. Metric storage, formatted display date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    /// e.g. "Mon, Dec 4"
    pub date: String,
    /// e.g. "Monday"
    pub day_of_week: String,
    pub high_temperature: f64,
    pub low_temperature: f64,
    pub condition: String,
    pub condition_icon: String,
    pub precipitation_chance: u8,
}

/// Complete weather bundle for one location.
///
/// Invariant: every temperature/wind field is metric (Celsius, km/h);
/// unit conversion happens only when a view is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WeatherSnapshot {
    pub current: Option<CurrentWeather>,
    /// ≤ 12 entries, chronological, strictly in the future at fetch time
    pub hourly: Vec<HourlyEntry>,
    /// ≤ 7 entries, chronological
    pub daily: Vec<DailyEntry>,
}
