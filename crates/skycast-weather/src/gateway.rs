//! Weather provider gateway: location search and forecast retrieval.
//!
//! Failures never cross this boundary as panics or raw transport errors;
//! every outcome is either a payload or a classified [`WeatherError`].
//!
//! Search concurrency discipline: issuing a new search cancels the in-flight
//! one (cancellation token raced against the request, plus a generation
//! membership check after resumption), and dispatches are spaced by a
//! minimum interval; callers inside the window get an empty result set,
//! most-recent-wins, nothing is queued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use parking_lot::Mutex;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use skycast_core::error::{self, ErrorKind, WeatherError};

use crate::types::{
    location_id, CurrentWeather, DailyEntry, HourlyEntry, Location, LocationSearchResult,
    WeatherSnapshot,
};
use crate::wire;

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MIN_SEARCH_INTERVAL: Duration = Duration::from_millis(300);
const FORECAST_DAYS: usize = 7;
const HOURLY_WINDOW: usize = 12;

/// Outcome of a search call that was not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchReply {
    Results(Vec<LocationSearchResult>),
    /// A newer search started before this one resolved; the caller must
    /// ignore it without touching any state.
    Superseded,
}

pub struct WeatherGateway {
    http: Client,
    base_url: Url,
    api_key: String,
    min_search_interval: Duration,
    search_generation: AtomicU64,
    search_cancel: Mutex<Option<CancellationToken>>,
    last_dispatch: Mutex<Option<Instant>>,
}

impl WeatherGateway {
    pub fn new(api_key: impl Into<String>) -> Result<Self, WeatherError> {
        Self::configured(api_key, DEFAULT_BASE_URL, REQUEST_TIMEOUT)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Result<Self, WeatherError> {
        Self::configured(api_key, base_url, REQUEST_TIMEOUT)
    }

    pub fn configured(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(error::classify_reqwest)?;

        // `Url::join` drops the last path segment unless it ends in a slash.
        let mut normalized = base_url.to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)
            .map_err(|e| WeatherError::new(ErrorKind::Unknown, Some(e.to_string())))?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
            min_search_interval: MIN_SEARCH_INTERVAL,
            search_generation: AtomicU64::new(0),
            search_cancel: Mutex::new(None),
            last_dispatch: Mutex::new(None),
        })
    }

    /// Override the minimum spacing between dispatched search calls.
    pub fn with_min_search_interval(mut self, interval: Duration) -> Self {
        self.min_search_interval = interval;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, WeatherError> {
        self.base_url
            .join(path)
            .map_err(|e| WeatherError::new(ErrorKind::Unknown, Some(e.to_string())))
    }

    /// Search locations by free-text query (city name or zip code).
    pub async fn search_locations(&self, query: &str) -> Result<SearchReply, WeatherError> {
        if let Some(invalid) = error::validate_search_query(query) {
            return Err(invalid);
        }

        // Supersede any in-flight search before dispatching this one.
        let token = CancellationToken::new();
        if let Some(previous) = self.search_cancel.lock().replace(token.clone()) {
            previous.cancel();
        }
        let generation = self.search_generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut last = self.last_dispatch.lock();
            if let Some(at) = *last {
                if at.elapsed() < self.min_search_interval {
                    tracing::debug!("Search '{}' inside minimum interval, not dispatched", query);
                    return Ok(SearchReply::Results(Vec::new()));
                }
            }
            *last = Some(Instant::now());
        }

        tracing::debug!("Searching locations for '{}'", query);
        let url = self.endpoint("search.json")?;
        let request = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("q", query), ("aqi", "no")]);

        let response = tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!("Search '{}' superseded while in flight", query);
                return Ok(SearchReply::Superseded);
            }
            sent = request.send() => sent.map_err(error::classify_reqwest)?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(error::classify_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
            ));
        }

        let records: Vec<wire::ApiSearchRecord> =
            response.json().await.map_err(error::classify_reqwest)?;

        if token.is_cancelled() || self.search_generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Search '{}' response is stale, discarding", query);
            return Ok(SearchReply::Superseded);
        }

        let results: Vec<LocationSearchResult> = records
            .into_iter()
            .map(LocationSearchResult::from)
            .collect();
        tracing::info!("Search '{}' matched {} locations", query, results.len());
        Ok(SearchReply::Results(results))
    }

    /// Cancel any pending search request.
    pub fn cancel_search(&self) {
        if let Some(token) = self.search_cancel.lock().take() {
            token.cancel();
        }
    }

    /// Fetch current conditions plus the 7-day/24-hour forecast in one call
    /// and translate them into the canonical metric snapshot.
    pub async fn weather_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        tracing::debug!("Fetching weather for {},{}", lat, lon);
        let url = self.endpoint("forecast.json")?;
        let coords = format!("{lat},{lon}");
        let days = FORECAST_DAYS.to_string();

        let response = self
            .http
            .get(url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", coords.as_str()),
                ("days", days.as_str()),
                ("aqi", "no"),
                ("alerts", "no"),
            ])
            .send()
            .await
            .map_err(error::classify_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(error::classify_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
            ));
        }

        let payload: wire::ApiForecastResponse =
            response.json().await.map_err(error::classify_reqwest)?;

        Ok(snapshot_from_payload(payload, Utc::now()))
    }
}

/// Translate a provider payload into the canonical snapshot.
///
/// Hourly entries come from the first forecast day only, keep strictly-future
/// timestamps, and are truncated to twelve. Daily entries map one-to-one up
/// to seven. Only the provider's metric fields are read.
fn snapshot_from_payload(payload: wire::ApiForecastResponse, now: DateTime<Utc>) -> WeatherSnapshot {
    let location = Location {
        id: location_id(payload.location.lat, payload.location.lon),
        name: payload.location.name,
        region: payload.location.region,
        country: payload.location.country,
        lat: payload.location.lat,
        lon: payload.location.lon,
    };

    let current = CurrentWeather {
        location,
        temperature: payload.current.temp_c,
        condition: payload.current.condition.text,
        condition_icon: payload.current.condition.icon,
        humidity: payload.current.humidity,
        wind_speed: payload.current.wind_kph,
        last_updated: now,
    };

    let hourly: Vec<HourlyEntry> = payload
        .forecast
        .forecastday
        .first()
        .map(|today| {
            today
                .hour
                .iter()
                .filter(|hour| hour.time_epoch > now.timestamp())
                .take(HOURLY_WINDOW)
                .map(|hour| HourlyEntry {
                    time: format_hour_label(&hour.time),
                    temperature: hour.temp_c,
                    condition: hour.condition.text.clone(),
                    condition_icon: hour.condition.icon.clone(),
                    wind_speed: hour.wind_kph,
                    humidity: hour.humidity,
                    precipitation_chance: hour.chance_of_rain,
                })
                .collect()
        })
        .unwrap_or_default();

    let daily: Vec<DailyEntry> = payload
        .forecast
        .forecastday
        .iter()
        .take(FORECAST_DAYS)
        .map(|day| {
            let (date, day_of_week) = format_day_labels(&day.date);
            DailyEntry {
                date,
                day_of_week,
                high_temperature: day.day.maxtemp_c,
                low_temperature: day.day.mintemp_c,
                condition: day.day.condition.text.clone(),
                condition_icon: day.day.condition.icon.clone(),
                precipitation_chance: day.day.daily_chance_of_rain,
            }
        })
        .collect();

    WeatherSnapshot {
        current: Some(current),
        hourly,
        daily,
    }
}

/// "2026-08-07 14:00" → "2:00 PM"; the raw string on parse failure.
fn format_hour_label(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        Ok(time) => time.format("%-I:%M %p").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// "2026-08-07" → ("Fri, Aug 7", "Friday"); the raw string on parse failure.
fn format_day_labels(raw: &str) -> (String, String) {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => (
            date.format("%a, %b %-d").to_string(),
            date.format("%A").to_string(),
        ),
        Err(_) => (raw.to_string(), raw.to_string()),
    }
}
