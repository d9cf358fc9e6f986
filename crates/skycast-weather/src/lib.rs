//! Weather data for SkyCast
//!
//! Provides current conditions, details and the five-day forecast via the
//! OpenWeatherMap API, plus unit conversion, daily forecast aggregation and
//! the permission-gated location seam.

pub mod types;
pub mod units;
pub mod forecast;
pub mod location;
pub mod provider;

pub use types::*;
pub use units::{apply_temperature_unit, celsius_to_fahrenheit, fahrenheit_to_celsius, format_temperature};
pub use forecast::{aggregate_daily, DailyForecastSummary, MIDDAY_HOURS};
pub use location::{request_current_position, FixedLocation, LocationOptions, LocationResolver, PermissionStatus};
pub use provider::{OpenWeatherProvider, WeatherSource};
