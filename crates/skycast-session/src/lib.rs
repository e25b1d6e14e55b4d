//! Session layer for Skycast
//!
//! Owns the dashboard's mutable state and its concurrency discipline:
//! debounced/cancelable search, single-flight refresh, one-shot location
//! detection, and on-demand unit conversion for display.

pub mod search_input;
pub mod session;

pub use search_input::{SearchInputController, SearchKey, SEARCH_DEBOUNCE};
pub use session::WeatherSession;
