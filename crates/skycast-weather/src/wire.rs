//! Provider payload types for the WeatherAPI.com REST surface.
//!
//! Only metric fields are deserialized; the provider's imperial duplicates
//! are ignored so display conversion never accumulates provider rounding.

use serde::Deserialize;

use crate::types::{location_id, LocationSearchResult};

/// One record from `search.json`.
#[derive(Debug, Deserialize)]
pub struct ApiSearchRecord {
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl From<ApiSearchRecord> for LocationSearchResult {
    fn from(record: ApiSearchRecord) -> Self {
        LocationSearchResult {
            id: location_id(record.lat, record.lon),
            name: record.name,
            region: record.region,
            country: record.country,
            lat: record.lat,
            lon: record.lon,
        }
    }
}

/// Top-level `forecast.json` payload.
#[derive(Debug, Deserialize)]
pub struct ApiForecastResponse {
    pub location: ApiLocation,
    pub current: ApiCurrent,
    pub forecast: ApiForecast,
}

#[derive(Debug, Deserialize)]
pub struct ApiLocation {
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct ApiCondition {
    pub text: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiCurrent {
    pub temp_c: f64,
    pub condition: ApiCondition,
    pub wind_kph: f64,
    pub humidity: u8,
}

#[derive(Debug, Deserialize)]
pub struct ApiHour {
    pub time_epoch: i64,
    /// Location-local wall clock, e.g. "2026-08-07 14:00"
    pub time: String,
    pub temp_c: f64,
    pub condition: ApiCondition,
    pub wind_kph: f64,
    pub humidity: u8,
    #[serde(default)]
    pub chance_of_rain: u8,
}

#[derive(Debug, Deserialize)]
pub struct ApiDay {
    pub maxtemp_c: f64,
    pub mintemp_c: f64,
    pub condition: ApiCondition,
    #[serde(default)]
    pub daily_chance_of_rain: u8,
}

#[derive(Debug, Deserialize)]
pub struct ApiForecastDay {
    /// "YYYY-MM-DD"
    pub date: String,
    pub day: ApiDay,
    #[serde(default)]
    pub hour: Vec<ApiHour>,
}

#[derive(Debug, Deserialize)]
pub struct ApiForecast {
    #[serde(default)]
    pub forecastday: Vec<ApiForecastDay>,
}
