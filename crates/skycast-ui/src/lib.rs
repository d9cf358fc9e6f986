//! Screen models for SkyCast.
//!
//! Each model owns its view state and drives fetches through the service
//! layer; results come back over a channel the model drains on its own
//! thread, the way a UI event loop would.

pub mod error_mapping;
pub mod models;
pub mod services;

#[cfg(test)]
mod testing;

pub use models::detail_model::{DetailModel, DETAIL_FAILED_MESSAGE};
pub use models::forecast_model::{ForecastModel, FORECAST_FAILED_MESSAGE};
pub use models::home_model::{HomeMessage, HomeModel, HOME_FAILED_MESSAGE};
pub use models::search_model::{SearchModel, SEARCH_FAILED_MESSAGE};
pub use models::settings_model::SettingsModel;
pub use services::ServiceChannel;
