//! The weather session: all mutable dashboard state plus the actions that
//! drive it.
//!
//! State lives behind a single `RwLock` and is mutated only by the action
//! methods below; a lock is never held across an await, so every mutation is
//! atomic from a caller's perspective. The presentation layer reads state
//! through the derived views, which recompute on every call; nothing here is
//! cached, so a unit toggle is visible on the very next read.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use parking_lot::RwLock;

use skycast_core::error::WeatherError;
use skycast_weather::gateway::{SearchReply, WeatherGateway};
use skycast_weather::geolocate::{self, LocationProvider};
use skycast_weather::types::{
    location_id, CurrentWeather, DailyEntry, HourlyEntry, Location, LocationSearchResult,
    TemperatureUnit, WeatherSnapshot,
};
use skycast_weather::units;

#[derive(Debug, Default)]
struct SessionState {
    weather: WeatherSnapshot,
    current_location: Option<Location>,
    unit: TemperatureUnit,
    searching: bool,
    loading_weather: bool,
    refreshing: bool,
    search_error: Option<WeatherError>,
    weather_error: Option<WeatherError>,
    search_results: Vec<LocationSearchResult>,
    last_search_query: String,
    last_updated: Option<DateTime<Utc>>,
    location_detection_attempted: bool,
}

pub struct WeatherSession {
    state: RwLock<SessionState>,
    gateway: Arc<WeatherGateway>,
    locator: Arc<LocationProvider>,
}

impl WeatherSession {
    pub fn new(gateway: Arc<WeatherGateway>, locator: Arc<LocationProvider>) -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            gateway,
            locator,
        }
    }

    // =========== Actions ===========

    /// Search for locations matching `query`.
    ///
    /// A blank query clears the search state synchronously without touching
    /// the gateway. A superseded reply (an overlapping newer search) mutates
    /// nothing; the newer call owns the search state including the busy flag.
    pub async fn search_locations(&self, query: &str) {
        if query.trim().is_empty() {
            let mut state = self.state.write();
            state.search_results.clear();
            state.last_search_query.clear();
            state.search_error = None;
            return;
        }

        {
            let mut state = self.state.write();
            state.searching = true;
            state.search_error = None;
            state.last_search_query = query.to_string();
        }

        match self.gateway.search_locations(query).await {
            Ok(SearchReply::Results(results)) => {
                let mut state = self.state.write();
                state.search_results = results;
                state.search_error = None;
                state.searching = false;
            }
            Ok(SearchReply::Superseded) => {
                tracing::debug!("Ignoring superseded search for '{}'", query);
            }
            Err(error) => {
                let mut state = self.state.write();
                state.search_error = Some(error);
                state.search_results.clear();
                state.searching = false;
            }
        }
    }

    /// Promote a search result to the current location and fetch its weather.
    /// This is the only search-flow path that changes the current location.
    pub async fn select_location(&self, result: &LocationSearchResult) {
        {
            let mut state = self.state.write();
            state.current_location = Some(Location {
                id: result.id.clone(),
                name: result.name.clone(),
                region: result.region.clone(),
                country: result.country.clone(),
                lat: result.lat,
                lon: result.lon,
            });
            state.search_results.clear();
            state.search_error = None;
        }

        self.fetch_weather(result.lat, result.lon).await;
    }

    /// Fetch weather for the given coordinates, replacing the snapshot.
    ///
    /// On failure the snapshot is reset to empty: unlike a refresh, an
    /// initial fetch that fails leaves nothing stale on screen.
    pub async fn fetch_weather(&self, lat: f64, lon: f64) {
        {
            let mut state = self.state.write();
            state.loading_weather = true;
            state.weather_error = None;
        }

        match self.gateway.weather_by_coordinates(lat, lon).await {
            Ok(snapshot) => {
                let mut state = self.state.write();
                backfill_provisional_location(&mut state, &snapshot);
                state.weather = snapshot;
                state.last_updated = Some(Utc::now());
                state.weather_error = None;
                state.loading_weather = false;
            }
            Err(error) => {
                let mut state = self.state.write();
                state.weather_error = Some(error);
                state.weather = WeatherSnapshot::default();
                state.loading_weather = false;
            }
        }
    }

    /// Re-fetch weather for the current location.
    ///
    /// Single-flight: a refresh that is already running suppresses any
    /// overlapping call entirely. A failed refresh keeps the previous
    /// snapshot on screen.
    pub async fn refresh_weather(&self) {
        let (lat, lon) = {
            let mut state = self.state.write();
            let Some(location) = state.current_location.as_ref() else {
                return;
            };
            if state.refreshing {
                return;
            }
            let coords = (location.lat, location.lon);
            state.refreshing = true;
            state.weather_error = None;
            coords
        };

        match self.gateway.weather_by_coordinates(lat, lon).await {
            Ok(snapshot) => {
                let mut state = self.state.write();
                state.weather = snapshot;
                state.last_updated = Some(Utc::now());
                state.weather_error = None;
                state.refreshing = false;
            }
            Err(error) => {
                // Keep the previous snapshot: a failed refresh must not
                // blank the screen.
                let mut state = self.state.write();
                state.weather_error = Some(error);
                state.refreshing = false;
            }
        }
    }

    /// Flip the display unit. Pure state transition, no I/O.
    pub fn toggle_temperature_unit(&self) {
        let mut state = self.state.write();
        state.unit = match state.unit {
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
        };
    }

    pub fn set_temperature_unit(&self, unit: TemperatureUnit) {
        self.state.write().unit = unit;
    }

    /// Try to detect the user's location once per session.
    ///
    /// The attempted flag is set before the first await, so overlapping calls
    /// fired while the probe is pending are also suppressed. Geolocation
    /// failures are silent by policy: the user falls back to manual search
    /// and `weather_error` stays untouched.
    ///
    /// Returns `true` iff a position was obtained and a weather fetch was
    /// attempted for it.
    pub async fn try_detect_location(&self) -> bool {
        {
            let mut state = self.state.write();
            if state.location_detection_attempted {
                return false;
            }
            state.location_detection_attempted = true;
        }

        let coordinates = match self.locator.get_location().await {
            Ok(coordinates) => coordinates,
            Err(error) => {
                let classified = geolocate::classify_geolocation(&error);
                tracing::debug!("Location detection failed: {:?} ({})", classified.kind, error);
                return false;
            }
        };

        {
            let mut state = self.state.write();
            // Provisional entry; the place name is backfilled from the
            // forecast payload.
            state.current_location = Some(Location {
                id: location_id(coordinates.latitude, coordinates.longitude),
                name: String::new(),
                region: String::new(),
                country: String::new(),
                lat: coordinates.latitude,
                lon: coordinates.longitude,
            });
        }

        self.fetch_weather(coordinates.latitude, coordinates.longitude)
            .await;
        true
    }

    /// Clear the search state.
    pub fn reset_search(&self) {
        let mut state = self.state.write();
        state.search_results.clear();
        state.last_search_query.clear();
        state.search_error = None;
    }

    /// Clear everything, including the one-shot detection flag: the next
    /// `try_detect_location` call after a reset probes again.
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.weather = WeatherSnapshot::default();
        state.current_location = None;
        state.search_results.clear();
        state.last_search_query.clear();
        state.search_error = None;
        state.weather_error = None;
        state.last_updated = None;
        state.location_detection_attempted = false;
    }

    // =========== Derived views ===========

    /// Current conditions converted to the display unit.
    pub fn current_weather_for_display(&self) -> Option<CurrentWeather> {
        let state = self.state.read();
        state.weather.current.as_ref().map(|current| CurrentWeather {
            temperature: units::to_display_temperature(current.temperature, state.unit),
            wind_speed: units::to_display_wind_speed(current.wind_speed, state.unit),
            ..current.clone()
        })
    }

    /// Hourly forecast converted to the display unit.
    pub fn hourly_forecast_for_display(&self) -> Vec<HourlyEntry> {
        let state = self.state.read();
        state
            .weather
            .hourly
            .iter()
            .map(|entry| HourlyEntry {
                temperature: units::to_display_temperature(entry.temperature, state.unit),
                wind_speed: units::to_display_wind_speed(entry.wind_speed, state.unit),
                ..entry.clone()
            })
            .collect()
    }

    /// Daily forecast converted to the display unit.
    pub fn daily_forecast_for_display(&self) -> Vec<DailyEntry> {
        let state = self.state.read();
        state
            .weather
            .daily
            .iter()
            .map(|entry| DailyEntry {
                high_temperature: units::to_display_temperature(entry.high_temperature, state.unit),
                low_temperature: units::to_display_temperature(entry.low_temperature, state.unit),
                ..entry.clone()
            })
            .collect()
    }

    /// Local wall-clock time of the last successful fetch, e.g. "2:07 PM".
    /// Empty before the first fetch.
    pub fn formatted_last_updated(&self) -> String {
        match self.state.read().last_updated {
            Some(at) => at.with_timezone(&Local).format("%-I:%M %p").to_string(),
            None => String::new(),
        }
    }

    /// True while any of the three busy flags is set.
    pub fn is_loading(&self) -> bool {
        let state = self.state.read();
        state.searching || state.loading_weather || state.refreshing
    }

    // =========== State accessors ===========

    pub fn weather(&self) -> WeatherSnapshot {
        self.state.read().weather.clone()
    }

    pub fn current_location(&self) -> Option<Location> {
        self.state.read().current_location.clone()
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.state.read().unit
    }

    pub fn search_results(&self) -> Vec<LocationSearchResult> {
        self.state.read().search_results.clone()
    }

    pub fn last_search_query(&self) -> String {
        self.state.read().last_search_query.clone()
    }

    pub fn search_error(&self) -> Option<WeatherError> {
        self.state.read().search_error.clone()
    }

    pub fn weather_error(&self) -> Option<WeatherError> {
        self.state.read().weather_error.clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.read().last_updated
    }

    pub fn is_searching(&self) -> bool {
        self.state.read().searching
    }

    pub fn is_loading_weather(&self) -> bool {
        self.state.read().loading_weather
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.read().refreshing
    }
}

/// A location detected from coordinates alone has no place name yet; fill it
/// in from the resolved location the forecast payload carries.
fn backfill_provisional_location(state: &mut SessionState, snapshot: &WeatherSnapshot) {
    let Some(current) = snapshot.current.as_ref() else {
        return;
    };
    if let Some(location) = state.current_location.as_mut() {
        if location.name.is_empty() {
            location.name = current.location.name.clone();
            location.region = current.location.region.clone();
            location.country = current.location.country.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn offline_session() -> WeatherSession {
        let gateway = Arc::new(WeatherGateway::new("test-key").unwrap());
        WeatherSession::new(gateway, Arc::new(LocationProvider::unavailable()))
    }

    #[test]
    fn unit_defaults_to_fahrenheit_and_toggle_is_idempotent_in_pairs() {
        let session = offline_session();
        assert_eq!(session.temperature_unit(), TemperatureUnit::Fahrenheit);

        session.toggle_temperature_unit();
        assert_eq!(session.temperature_unit(), TemperatureUnit::Celsius);

        session.toggle_temperature_unit();
        assert_eq!(session.temperature_unit(), TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn fresh_session_has_empty_views() {
        let session = offline_session();
        assert!(session.current_weather_for_display().is_none());
        assert!(session.hourly_forecast_for_display().is_empty());
        assert!(session.daily_forecast_for_display().is_empty());
        assert_eq!(session.formatted_last_updated(), "");
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn blank_query_clears_search_state_without_gateway() {
        let session = offline_session();
        session.search_locations("   ").await;
        assert!(session.search_results().is_empty());
        assert_eq!(session.last_search_query(), "");
        assert!(session.search_error().is_none());
        assert!(!session.is_searching());
    }

    #[test]
    fn reset_search_clears_only_search_state() {
        let session = offline_session();
        {
            let mut state = session.state.write();
            state.search_results.push(LocationSearchResult {
                id: location_id(1.0, 2.0),
                name: "Somewhere".into(),
                region: String::new(),
                country: String::new(),
                lat: 1.0,
                lon: 2.0,
            });
            state.last_search_query = "some".into();
            state.location_detection_attempted = true;
        }

        session.reset_search();

        let state = session.state.read();
        assert!(state.search_results.is_empty());
        assert!(state.last_search_query.is_empty());
        // Detection flag is a session-lifetime guard; only reset() clears it.
        assert!(state.location_detection_attempted);
    }

    #[test]
    fn reset_clears_detection_flag_and_search_state() {
        let session = offline_session();
        {
            let mut state = session.state.write();
            state.location_detection_attempted = true;
            state.last_search_query = "seattle".into();
            state.last_updated = Some(Utc::now());
        }

        session.reset();

        let state = session.state.read();
        assert!(!state.location_detection_attempted);
        assert!(state.last_search_query.is_empty());
        assert!(state.last_updated.is_none());
        assert!(state.current_location.is_none());
    }
}
