//! Weather backend: async weather fetching.
//! All network work runs on the runtime; results are sent back via mpsc,
//! tagged with the generation of the request that produced them.

use std::sync::Arc;

use skycast_weather::{Coordinates, Forecast, WeatherDetail, WeatherSnapshot, WeatherSource};
use tokio::sync::mpsc::UnboundedSender;

/// Error type for weather operations
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherError {
    /// Failure reported by the data source, kept as its description
    Source(String),
    /// Blank city name; never reaches the data source
    EmptyInput,
}

impl std::fmt::Display for WeatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherError::Source(s) => write!(f, "Weather error: {}", s),
            WeatherError::EmptyInput => write!(f, "City name is empty"),
        }
    }
}

impl std::error::Error for WeatherError {}

impl From<skycast_weather::WeatherError> for WeatherError {
    fn from(e: skycast_weather::WeatherError) -> Self {
        WeatherError::Source(e.to_string())
    }
}

/// What to look up current conditions for
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    City(String),
    Position(Coordinates),
}

/// Messages sent from async operations back to the screen model
#[derive(Debug)]
pub enum WeatherServiceMessage {
    CurrentDone {
        generation: u64,
        result: Result<WeatherSnapshot, WeatherError>,
    },
    DetailDone {
        generation: u64,
        result: Result<WeatherDetail, WeatherError>,
    },
    ForecastDone {
        generation: u64,
        result: Result<Forecast, WeatherError>,
    },
}

impl WeatherServiceMessage {
    pub fn generation(&self) -> u64 {
        match self {
            WeatherServiceMessage::CurrentDone { generation, .. }
            | WeatherServiceMessage::DetailDone { generation, .. }
            | WeatherServiceMessage::ForecastDone { generation, .. } => *generation,
        }
    }
}

/// Request current conditions. Sends `CurrentDone` when complete.
pub fn request_current<M>(
    runtime: &tokio::runtime::Handle,
    tx: &UnboundedSender<M>,
    source: Arc<dyn WeatherSource>,
    query: WeatherQuery,
    generation: u64,
) where
    M: From<WeatherServiceMessage> + Send + 'static,
{
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = match &query {
            WeatherQuery::City(city) => {
                tracing::debug!("Fetching current weather for {}", city);
                source.fetch_current_by_city(city).await
            }
            WeatherQuery::Position(position) => {
                tracing::debug!(
                    "Fetching current weather at {}, {}",
                    position.latitude,
                    position.longitude
                );
                source
                    .fetch_current_by_coords(position.latitude, position.longitude)
                    .await
            }
        };
        if let Err(e) = &result {
            tracing::error!("Failed to fetch weather: {}", e);
        }
        let message = WeatherServiceMessage::CurrentDone {
            generation,
            result: result.map_err(WeatherError::from),
        };
        let _ = tx.send(M::from(message));
    });
}

/// Request the detail view for `city`. Sends `DetailDone` when complete.
pub fn request_detail<M>(
    runtime: &tokio::runtime::Handle,
    tx: &UnboundedSender<M>,
    source: Arc<dyn WeatherSource>,
    city: String,
    generation: u64,
) where
    M: From<WeatherServiceMessage> + Send + 'static,
{
    let tx = tx.clone();
    runtime.spawn(async move {
        tracing::debug!("Fetching weather detail for {}", city);
        let result = source.fetch_detail_by_city(&city).await;
        if let Err(e) = &result {
            tracing::error!("Failed to fetch weather detail: {}", e);
        }
        let message = WeatherServiceMessage::DetailDone {
            generation,
            result: result.map_err(WeatherError::from),
        };
        let _ = tx.send(M::from(message));
    });
}

/// Request the five-day forecast for `city`. Sends `ForecastDone` when complete.
pub fn request_forecast<M>(
    runtime: &tokio::runtime::Handle,
    tx: &UnboundedSender<M>,
    source: Arc<dyn WeatherSource>,
    city: String,
    generation: u64,
) where
    M: From<WeatherServiceMessage> + Send + 'static,
{
    let tx = tx.clone();
    runtime.spawn(async move {
        tracing::debug!("Fetching forecast for {}", city);
        let result = source.fetch_forecast_by_city(&city).await;
        if let Err(e) = &result {
            tracing::error!("Failed to fetch forecast: {}", e);
        }
        let message = WeatherServiceMessage::ForecastDone {
            generation,
            result: result.map_err(WeatherError::from),
        };
        let _ = tx.send(M::from(message));
    });
}
