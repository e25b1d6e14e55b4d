//! Error taxonomy and classification for the Skycast core.
//!
//! Every failure that can reach a caller is converted into a [`WeatherError`]
//! value: a closed kind, a fixed user-facing message/suggestion pair, a
//! retryable flag, and the raw diagnostic preserved for logging only. The
//! gateway and the location provider never propagate a raw transport error
//! across their public boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of user-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    LocationNotFound,
    Network,
    Api,
    Timeout,
    GeolocationDenied,
    GeolocationUnavailable,
    Unknown,
}

impl ErrorKind {
    /// User-facing message for this kind. Fixed per kind, independent of the
    /// triggering instance.
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Please enter a valid location (city name or zip code).",
            ErrorKind::LocationNotFound => {
                "No locations match your criteria. Please try a different search."
            }
            ErrorKind::Network => "Unable to connect. Please check your internet and try again.",
            ErrorKind::Api => "Weather service unavailable. Please try again later.",
            ErrorKind::Timeout => "Request took too long. Please try again.",
            ErrorKind::GeolocationDenied => {
                "Location permission denied. Please use the search box to find a location."
            }
            ErrorKind::GeolocationUnavailable => {
                "Your location could not be determined. Please use the search box."
            }
            ErrorKind::Unknown => "An unexpected error occurred. Please try again.",
        }
    }

    /// Recovery suggestion shown next to the message.
    pub fn suggestion(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Try a different search term.",
            ErrorKind::LocationNotFound => {
                "Search for a nearby city or try a different spelling."
            }
            ErrorKind::Network | ErrorKind::Timeout => "Check your connection and retry.",
            ErrorKind::Api => "Try again in a few moments.",
            ErrorKind::GeolocationDenied | ErrorKind::GeolocationUnavailable => {
                "You can search for a location manually."
            }
            ErrorKind::Unknown => "If the problem persists, try refreshing the page.",
        }
    }

    /// Whether re-invoking the failed action can reasonably succeed.
    pub fn is_retryable(self) -> bool {
        !matches!(
            self,
            ErrorKind::GeolocationDenied | ErrorKind::GeolocationUnavailable
        )
    }
}

/// A classified failure, constructed exactly once per incident and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct WeatherError {
    pub kind: ErrorKind,
    pub message: &'static str,
    pub suggestion: &'static str,
    /// Raw diagnostic for logging; never part of the user-facing surface.
    pub technical_details: Option<String>,
    pub retryable: bool,
}

impl WeatherError {
    pub fn new(kind: ErrorKind, technical_details: Option<String>) -> Self {
        Self {
            kind,
            message: kind.user_message(),
            suggestion: kind.suggestion(),
            technical_details,
            retryable: kind.is_retryable(),
        }
    }
}

/// Validate a location search query. `None` means the query is acceptable.
///
/// Rule 1 of the classification order: empty or shorter than two characters
/// after trimming.
pub fn validate_search_query(query: &str) -> Option<WeatherError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Some(WeatherError::new(
            ErrorKind::Validation,
            Some("empty search query".to_string()),
        ));
    }
    if trimmed.chars().count() < 2 {
        return Some(WeatherError::new(
            ErrorKind::Validation,
            Some("search query too short".to_string()),
        ));
    }
    None
}

/// Classify a transport-level failure from the HTTP client.
pub fn classify_reqwest(error: reqwest::Error) -> WeatherError {
    let details = error.to_string();
    if error.is_timeout() {
        return WeatherError::new(ErrorKind::Timeout, Some(details));
    }
    if error.is_connect() {
        return WeatherError::new(ErrorKind::Network, Some(details));
    }
    if let Some(status) = error.status() {
        return classify_status(status.as_u16(), &details);
    }
    classify_message(&details)
}

/// Classify an HTTP response status that was not a success.
pub fn classify_status(status: u16, detail: &str) -> WeatherError {
    let technical = Some(format!("HTTP {status}: {detail}"));
    let kind = match status {
        404 => ErrorKind::LocationNotFound,
        429 => ErrorKind::Api,
        s if s >= 500 => ErrorKind::Api,
        _ => ErrorKind::Unknown,
    };
    WeatherError::new(kind, technical)
}

/// Classify a generic error message by content heuristics.
///
/// Last resort before `Unknown`; substring matches are case-insensitive.
pub fn classify_message(message: &str) -> WeatherError {
    let lowered = message.to_lowercase();
    let kind = if lowered.contains("not found") || lowered.contains("no matching") {
        ErrorKind::LocationNotFound
    } else if lowered.contains("api") || lowered.contains("service") {
        ErrorKind::Api
    } else if lowered.contains("timeout") {
        ErrorKind::Timeout
    } else {
        ErrorKind::Unknown
    };
    WeatherError::new(kind, Some(message.to_string()))
}
