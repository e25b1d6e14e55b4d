//! Integration tests for the search input controller: debounce collapse and
//! keyboard-driven selection.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skycast_session::{SearchInputController, SearchKey, WeatherSession};
use skycast_weather::gateway::WeatherGateway;
use skycast_weather::geolocate::LocationProvider;

const TEST_DEBOUNCE: Duration = Duration::from_millis(50);

fn search_body() -> serde_json::Value {
    serde_json::json!([
        {"name": "Seattle", "region": "Washington",
         "country": "United States of America", "lat": 47.61, "lon": -122.33},
        {"name": "SeaTac", "region": "Washington",
         "country": "United States of America", "lat": 47.44, "lon": -122.29},
        {"name": "Seaside", "region": "Oregon",
         "country": "United States of America", "lat": 45.99, "lon": -123.92}
    ])
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "location": {"name": "Seattle", "region": "Washington",
                     "country": "United States of America",
                     "lat": 47.61, "lon": -122.33},
        "current": {"temp_c": 18.0,
                    "condition": {"text": "Overcast", "icon": "//cdn/overcast.png"},
                    "wind_kph": 8.0, "humidity": 70},
        "forecast": {"forecastday": []}
    })
}

async fn controller_against(server: &MockServer) -> (Arc<WeatherSession>, SearchInputController) {
    let gateway = WeatherGateway::with_base_url("test-key", &server.uri())
        .unwrap()
        .with_min_search_interval(Duration::ZERO);
    let session = Arc::new(WeatherSession::new(
        Arc::new(gateway),
        Arc::new(LocationProvider::unavailable()),
    ));
    let controller = SearchInputController::with_debounce(Arc::clone(&session), TEST_DEBOUNCE);
    (session, controller)
}

async fn settle() {
    tokio::time::sleep(TEST_DEBOUNCE * 8).await;
}

#[tokio::test]
async fn rapid_keystrokes_collapse_to_one_search_with_final_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "seattle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (session, controller) = controller_against(&server).await;

    controller.on_input("sea");
    controller.on_input("seatt");
    controller.on_input("seattle");
    settle().await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(session.search_results().len(), 3);
    assert_eq!(session.last_search_query(), "seattle");
    assert!(controller.is_dropdown_open());
}

#[tokio::test]
async fn blank_input_clears_results_and_closes_dropdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(&server)
        .await;

    let (session, controller) = controller_against(&server).await;
    controller.on_input("seattle");
    settle().await;
    assert_eq!(session.search_results().len(), 3);

    controller.on_input("");
    settle().await;

    assert!(!controller.is_dropdown_open());
    assert!(session.search_results().is_empty());
    assert_eq!(session.last_search_query(), "");
}

#[tokio::test]
async fn arrows_clamp_at_list_bounds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(&server)
        .await;

    let (_session, controller) = controller_against(&server).await;
    controller.on_input("seattle");
    settle().await;

    assert_eq!(controller.highlighted_index(), None);

    controller.on_key(SearchKey::ArrowUp).await;
    assert_eq!(controller.highlighted_index(), None);

    controller.on_key(SearchKey::ArrowDown).await;
    assert_eq!(controller.highlighted_index(), Some(0));

    for _ in 0..5 {
        controller.on_key(SearchKey::ArrowDown).await;
    }
    assert_eq!(controller.highlighted_index(), Some(2)); // clamped, no wrap

    controller.on_key(SearchKey::ArrowUp).await;
    controller.on_key(SearchKey::ArrowUp).await;
    controller.on_key(SearchKey::ArrowUp).await;
    assert_eq!(controller.highlighted_index(), Some(0)); // clamped at top
}

#[tokio::test]
async fn enter_selects_highlighted_result_and_clears_input() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&server)
        .await;

    let (session, controller) = controller_against(&server).await;
    controller.on_input("seattle");
    settle().await;

    controller.on_key(SearchKey::ArrowDown).await;
    controller.on_key(SearchKey::ArrowDown).await;
    controller.on_key(SearchKey::Enter).await;

    let location = session.current_location().unwrap();
    assert_eq!(location.name, "SeaTac");
    assert!(session.weather().current.is_some());

    assert_eq!(controller.query(), "");
    assert!(!controller.is_dropdown_open());
    assert_eq!(controller.highlighted_index(), None);
    assert!(session.search_results().is_empty());
}

#[tokio::test]
async fn enter_without_highlight_is_a_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(&server)
        .await;

    let (session, controller) = controller_against(&server).await;
    controller.on_input("seattle");
    settle().await;

    controller.on_key(SearchKey::Enter).await;

    assert!(session.current_location().is_none());
    assert_eq!(controller.query(), "seattle");
    assert_eq!(session.search_results().len(), 3);
}

#[tokio::test]
async fn escape_closes_dropdown_but_keeps_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(&server)
        .await;

    let (_session, controller) = controller_against(&server).await;
    controller.on_input("seattle");
    settle().await;

    controller.on_key(SearchKey::Escape).await;

    assert!(!controller.is_dropdown_open());
    assert_eq!(controller.query(), "seattle");
}

#[tokio::test]
async fn focus_resets_highlight_and_blur_closes_dropdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .mount(&server)
        .await;

    let (_session, controller) = controller_against(&server).await;
    controller.on_input("seattle");
    settle().await;

    controller.on_key(SearchKey::ArrowDown).await;
    assert_eq!(controller.highlighted_index(), Some(0));

    controller.on_focus();
    assert_eq!(controller.highlighted_index(), None);
    assert!(controller.is_dropdown_open()); // text present, dropdown stays

    controller.on_blur();
    assert!(!controller.is_dropdown_open());
}
