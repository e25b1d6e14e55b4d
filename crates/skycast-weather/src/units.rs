//! Pure unit conversions between canonical metric storage and display units.

use crate::types::TemperatureUnit;

/// km/h → mph factor
pub const KMH_TO_MPH: f64 = 0.621371;

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

pub fn kmh_to_mph(kmh: f64) -> f64 {
    kmh * KMH_TO_MPH
}

pub fn mph_to_kmh(mph: f64) -> f64 {
    mph / KMH_TO_MPH
}

/// Convert a stored Celsius value to the display unit.
pub fn to_display_temperature(celsius: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Fahrenheit => celsius_to_fahrenheit(celsius),
        TemperatureUnit::Celsius => celsius,
    }
}

/// Convert a stored km/h value to the display unit. Wind follows the
/// temperature unit: mph alongside Fahrenheit, km/h alongside Celsius.
pub fn to_display_wind_speed(kmh: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Fahrenheit => kmh_to_mph(kmh),
        TemperatureUnit::Celsius => kmh,
    }
}

/// Rounded display string, e.g. `72°F`.
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    let value = to_display_temperature(celsius, unit);
    let suffix = match unit {
        TemperatureUnit::Fahrenheit => "F",
        TemperatureUnit::Celsius => "C",
    };
    format!("{}°{}", value.round(), suffix)
}
