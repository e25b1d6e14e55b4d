use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use skycast_session::WeatherSession;
use skycast_weather::gateway::WeatherGateway;
use skycast_weather::geolocate::{IpLocationSource, LocationProvider};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    skycast_core::init()?;

    let (config, _validation) = skycast_core::Config::load_validated()?;
    let api_key = config
        .resolved_api_key()
        .context("No weather API key configured. Set SKYCAST_API_KEY or api.key in config.toml")?;

    let gateway = WeatherGateway::configured(
        api_key,
        &config.api.base_url,
        Duration::from_secs(config.api.timeout_secs),
    )?
    .with_min_search_interval(Duration::from_millis(config.search.min_interval_ms));

    let locator = match IpLocationSource::new() {
        Ok(source) => LocationProvider::with_timeout(
            Arc::new(source),
            Duration::from_secs(config.location.timeout_secs),
        ),
        Err(e) => {
            tracing::debug!("No geolocation capability: {}", e);
            LocationProvider::unavailable()
        }
    };

    let session = Arc::new(WeatherSession::new(Arc::new(gateway), Arc::new(locator)));
    session.set_temperature_unit(config.weather.default_unit.into());

    tracing::info!("Skycast session started");

    // An explicit query wins over detection; otherwise fall back to geolocation.
    match std::env::args().nth(1) {
        Some(query) => {
            session.search_locations(&query).await;
            if let Some(error) = session.search_error() {
                println!("{} {}", error.message, error.suggestion);
                return Ok(());
            }
            let results = session.search_results();
            let Some(first) = results.first() else {
                println!("No locations matched '{query}'.");
                return Ok(());
            };
            session.select_location(first).await;
        }
        None => {
            if !session.try_detect_location().await {
                println!("Could not detect a location. Run: skycast <city or zip>");
                return Ok(());
            }
        }
    }

    print_dashboard(&session);
    Ok(())
}

fn print_dashboard(session: &WeatherSession) {
    if let Some(error) = session.weather_error() {
        println!("{} {}", error.message, error.suggestion);
        return;
    }

    let Some(current) = session.current_weather_for_display() else {
        println!("No weather data available.");
        return;
    };

    let place = session
        .current_location()
        .map(|l| {
            if l.region.is_empty() {
                l.name
            } else {
                format!("{}, {}", l.name, l.region)
            }
        })
        .unwrap_or_else(|| "Unknown location".to_string());

    println!("\n{place} - {}", current.condition);
    println!(
        "  {:.0}°  wind {:.0}  humidity {}%",
        current.temperature, current.wind_speed, current.humidity
    );

    let hourly = session.hourly_forecast_for_display();
    if !hourly.is_empty() {
        println!("\nNext hours:");
        for entry in hourly.iter().take(6) {
            println!(
                "  {:>8}  {:>5.1}°  {}",
                entry.time, entry.temperature, entry.condition
            );
        }
    }

    let daily = session.daily_forecast_for_display();
    if !daily.is_empty() {
        println!("\nNext days:");
        for entry in &daily {
            println!(
                "  {:<12} {:>5.1}° / {:>5.1}°  {}",
                entry.date, entry.high_temperature, entry.low_temperature, entry.condition
            );
        }
    }

    let updated = session.formatted_last_updated();
    if !updated.is_empty() {
        println!("\nUpdated at {updated}");
    }
}
