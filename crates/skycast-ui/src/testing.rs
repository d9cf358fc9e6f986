//! Canned weather source for model tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use parking_lot::Mutex;
use skycast_core::{MemoryStore, SettingsStore};
use skycast_weather::{
    Coordinates, Forecast, ForecastCity, ForecastEntry, WeatherDetail, WeatherError, WeatherSnapshot,
    WeatherSource,
};

pub(crate) fn snapshot(city: &str, temperature: f64) -> WeatherSnapshot {
    WeatherSnapshot {
        city: city.to_string(),
        country: "TW".to_string(),
        temperature,
        feels_like: temperature + 2.0,
        humidity: 70,
        wind_speed: 3.6,
        description: "多雲".to_string(),
        icon: "04d".to_string(),
        observed_at: Utc.with_ymd_and_hms(2024, 6, 1, 4, 0, 0).unwrap(),
        utc_offset_secs: 8 * 3600,
        display: None,
    }
}

pub(crate) fn forecast_entry(stamp: &str, min: f64, max: f64) -> ForecastEntry {
    let local_time = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").unwrap();
    ForecastEntry {
        timestamp: Utc.from_utc_datetime(&local_time),
        local_time,
        temperature: (min + max) / 2.0,
        temp_min: min,
        temp_max: max,
        feels_like: max,
        humidity: 60,
        pressure: 1012,
        description: "晴".to_string(),
        icon: "01d".to_string(),
        wind_speed: 2.0,
        clouds: 10,
        pop: 0.0,
        rain_3h: None,
    }
}

/// Answers from a fixed table of cities; anything else is a 404.
#[derive(Default)]
pub(crate) struct StubSource {
    cities: Mutex<HashMap<String, (f64, Duration)>>,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(self, city: &str, temperature: f64) -> Self {
        self.with_slow_city(city, temperature, Duration::ZERO)
    }

    /// City whose answers arrive only after `delay`
    pub fn with_slow_city(self, city: &str, temperature: f64, delay: Duration) -> Self {
        self.cities.lock().insert(city.to_string(), (temperature, delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn lookup(&self, city: &str) -> Result<f64, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let found = self.cities.lock().get(city).copied();
        match found {
            Some((temperature, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(temperature)
            }
            None => Err(WeatherError::Http { status: 404 }),
        }
    }
}

#[async_trait]
impl WeatherSource for StubSource {
    async fn fetch_current_by_city(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let temperature = self.lookup(city).await?;
        Ok(snapshot(city, temperature))
    }

    async fn fetch_current_by_coords(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(snapshot("Current Position", 21.0))
    }

    async fn fetch_detail_by_city(&self, city: &str) -> Result<WeatherDetail, WeatherError> {
        let temperature = self.lookup(city).await?;
        Ok(WeatherDetail {
            snapshot: snapshot(city, temperature),
            sunrise: Utc.with_ymd_and_hms(2024, 5, 31, 21, 5, 0).unwrap(),
            sunset: Utc.with_ymd_and_hms(2024, 6, 1, 10, 40, 0).unwrap(),
            pressure: 1009,
            visibility: Some(10000),
            clouds: 75,
            uv_index: None,
            rain: None,
            snow: None,
        })
    }

    async fn fetch_forecast_by_city(&self, city: &str) -> Result<Forecast, WeatherError> {
        self.lookup(city).await?;
        Ok(Forecast {
            city: ForecastCity {
                id: 1668341,
                name: city.to_string(),
                country: "TW".to_string(),
                coordinates: Coordinates {
                    latitude: 25.05,
                    longitude: 121.53,
                },
                utc_offset_secs: 8 * 3600,
                sunrise: Utc.with_ymd_and_hms(2024, 5, 31, 21, 5, 0).unwrap(),
                sunset: Utc.with_ymd_and_hms(2024, 6, 1, 10, 40, 0).unwrap(),
            },
            entries: vec![
                forecast_entry("2024-06-01 12:00:00", 26.0, 31.0),
                forecast_entry("2024-06-01 15:00:00", 25.0, 30.0),
                forecast_entry("2024-06-02 12:00:00", 24.0, 29.0),
            ],
        })
    }
}

/// Loaded settings store over an in-memory backend
pub(crate) async fn settings_store() -> (Arc<SettingsStore>, Arc<MemoryStore>) {
    let storage = Arc::new(MemoryStore::new());
    let store = Arc::new(SettingsStore::new(storage.clone()));
    store.load().await;
    (store, storage)
}
