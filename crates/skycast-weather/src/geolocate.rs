//! Device/host geolocation behind an injectable capability.
//!
//! The session never talks to a platform API directly; it holds a
//! [`LocationProvider`] wrapping whatever [`LocationSource`] the host offers
//! (an IP-geolocation probe by default, a fake in tests). The probe is
//! one-shot with a fixed timeout and no retries, and it never panics: every
//! failure is a [`GeolocationError`] value.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use skycast_core::error::{ErrorKind, WeatherError};

/// Default probe timeout; coarse accuracy is acceptable, cached fixes are not.
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

const IP_GEOLOCATE_URL: &str = "https://ipapi.co/json/";

/// A coarse position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
}

/// Why a position fix could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    Denied,
    #[error("location service unavailable")]
    Unavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("location error: {0}")]
    Unknown(String),
}

/// Map a geolocation failure onto the shared error taxonomy.
///
/// Callers surface these only in logs; the session's silent-failure contract
/// keeps them away from the user.
pub fn classify_geolocation(error: &GeolocationError) -> WeatherError {
    let kind = match error {
        GeolocationError::Denied => ErrorKind::GeolocationDenied,
        GeolocationError::Unavailable => ErrorKind::GeolocationUnavailable,
        GeolocationError::Timeout => ErrorKind::Timeout,
        GeolocationError::Unknown(_) => ErrorKind::Unknown,
    };
    WeatherError::new(kind, Some(error.to_string()))
}

/// A host capability that can produce one current position.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// One-shot geolocation probe with a fixed timeout.
pub struct LocationProvider {
    source: Option<Arc<dyn LocationSource>>,
    timeout: Duration,
}

impl LocationProvider {
    pub fn new(source: Arc<dyn LocationSource>) -> Self {
        Self::with_timeout(source, LOCATION_TIMEOUT)
    }

    pub fn with_timeout(source: Arc<dyn LocationSource>, timeout: Duration) -> Self {
        Self {
            source: Some(source),
            timeout,
        }
    }

    /// A provider on a host with no geolocation capability at all.
    pub fn unavailable() -> Self {
        Self {
            source: None,
            timeout: LOCATION_TIMEOUT,
        }
    }

    pub fn is_available(&self) -> bool {
        self.source.is_some()
    }

    /// Request the current position once. No retries, no cached fixes.
    /// Resolves immediately with `Unavailable` when the host has no
    /// capability.
    pub async fn get_location(&self) -> Result<Coordinates, GeolocationError> {
        let Some(source) = self.source.clone() else {
            return Err(GeolocationError::Unavailable);
        };

        match tokio::time::timeout(self.timeout, source.current_position()).await {
            Ok(result) => result,
            Err(_) => Err(GeolocationError::Timeout),
        }
    }
}

/// IP-based geolocation: a coarse fix with no permission prompt, which is
/// all the dashboard needs to seed a first forecast.
pub struct IpLocationSource {
    http: reqwest::Client,
    endpoint: String,
}

impl IpLocationSource {
    pub fn new() -> Result<Self, GeolocationError> {
        Self::with_endpoint(IP_GEOLOCATE_URL)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, GeolocationError> {
        let http = reqwest::Client::builder()
            .timeout(LOCATION_TIMEOUT)
            .build()
            .map_err(|e| GeolocationError::Unknown(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpFix {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[async_trait]
impl LocationSource for IpLocationSource {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        let response = self.http.get(&self.endpoint).send().await.map_err(|e| {
            if e.is_timeout() {
                GeolocationError::Timeout
            } else {
                GeolocationError::Unavailable
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(GeolocationError::Denied);
        }
        if !status.is_success() {
            return Err(GeolocationError::Unavailable);
        }

        let fix: IpFix = response
            .json()
            .await
            .map_err(|e| GeolocationError::Unknown(e.to_string()))?;

        match (fix.latitude, fix.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates {
                latitude,
                longitude,
                // IP fixes are city-level at best; no meaningful radius.
                accuracy_meters: None,
            }),
            _ => Err(GeolocationError::Unavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StalledSource;

    #[async_trait]
    impl LocationSource for StalledSource {
        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(GeolocationError::Unknown("unreachable".into()))
        }
    }

    #[tokio::test]
    async fn absent_capability_resolves_unavailable_immediately() {
        let provider = LocationProvider::unavailable();
        assert!(!provider.is_available());
        assert_eq!(
            provider.get_location().await.unwrap_err(),
            GeolocationError::Unavailable
        );
    }

    #[tokio::test]
    async fn stalled_source_times_out() {
        let provider =
            LocationProvider::with_timeout(Arc::new(StalledSource), Duration::from_millis(20));
        assert_eq!(
            provider.get_location().await.unwrap_err(),
            GeolocationError::Timeout
        );
    }

    #[tokio::test]
    async fn ip_source_parses_fix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ip": "203.0.113.7", "city": "Seattle",
                "latitude": 47.6062, "longitude": -122.3321
            })))
            .mount(&server)
            .await;

        let source = IpLocationSource::with_endpoint(format!("{}/json/", server.uri())).unwrap();
        let provider = LocationProvider::new(Arc::new(source));
        let fix = provider.get_location().await.unwrap();
        assert_eq!(fix.latitude, 47.6062);
        assert_eq!(fix.longitude, -122.3321);
        assert!(fix.accuracy_meters.is_none());
    }

    #[tokio::test]
    async fn ip_source_maps_forbidden_to_denied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let source = IpLocationSource::with_endpoint(format!("{}/json/", server.uri())).unwrap();
        assert_eq!(
            source.current_position().await.unwrap_err(),
            GeolocationError::Denied
        );
    }

    #[tokio::test]
    async fn ip_source_without_coordinates_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ip": "203.0.113.7"})),
            )
            .mount(&server)
            .await;

        let source = IpLocationSource::with_endpoint(format!("{}/json/", server.uri())).unwrap();
        assert_eq!(
            source.current_position().await.unwrap_err(),
            GeolocationError::Unavailable
        );
    }

    #[test]
    fn classification_matches_error_codes() {
        assert_eq!(
            classify_geolocation(&GeolocationError::Denied).kind,
            ErrorKind::GeolocationDenied
        );
        assert_eq!(
            classify_geolocation(&GeolocationError::Unavailable).kind,
            ErrorKind::GeolocationUnavailable
        );
        assert_eq!(
            classify_geolocation(&GeolocationError::Timeout).kind,
            ErrorKind::Timeout
        );
        assert_eq!(
            classify_geolocation(&GeolocationError::Unknown("x".into())).kind,
            ErrorKind::Unknown
        );
        assert!(!classify_geolocation(&GeolocationError::Denied).retryable);
        assert!(classify_geolocation(&GeolocationError::Timeout).retryable);
    }
}
