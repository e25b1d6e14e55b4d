//! Weather domain for Skycast
//!
//! Canonical metric data model, unit conversion, the provider gateway
//! (search + forecast), and the geolocation capability abstraction.

pub mod gateway;
pub mod geolocate;
pub mod types;
pub mod units;
pub mod wire;

pub use gateway::{SearchReply, WeatherGateway};
pub use geolocate::{Coordinates, GeolocationError, IpLocationSource, LocationProvider, LocationSource};
pub use types::*;
