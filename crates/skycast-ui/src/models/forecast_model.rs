//! Five-day forecast screen: daily summaries plus a selected day.

use std::sync::Arc;

use skycast_core::{AppSettings, RequestGeneration, SettingsStore, ViewState};
use skycast_weather::{aggregate_daily, DailyForecastSummary, ForecastCity, WeatherSource};
use tokio::runtime::Handle;
use tokio::sync::watch;

use super::take_settings_change;
use crate::error_mapping::screen_message;
use crate::services::{request_weather_forecast, ServiceChannel, WeatherServiceMessage};

pub const FORECAST_FAILED_MESSAGE: &str = "無法獲取天氣預報，請稍後再試";

pub struct ForecastModel {
    channel: ServiceChannel<WeatherServiceMessage>,
    source: Arc<dyn WeatherSource>,
    settings: Arc<SettingsStore>,
    settings_rx: watch::Receiver<Arc<AppSettings>>,
    generation: RequestGeneration,
    state: ViewState<Vec<DailyForecastSummary>>,
    forecast_city: Option<ForecastCity>,
    city: String,
    selected_day: usize,
    refreshing: bool,
}

impl ForecastModel {
    pub fn new(
        runtime: Handle,
        source: Arc<dyn WeatherSource>,
        settings: Arc<SettingsStore>,
        city: &str,
    ) -> Self {
        let settings_rx = settings.subscribe();
        Self {
            channel: ServiceChannel::new(runtime),
            source,
            settings,
            settings_rx,
            generation: RequestGeneration::default(),
            state: ViewState::Idle,
            forecast_city: None,
            city: city.to_string(),
            selected_day: 0,
            refreshing: false,
        }
    }

    pub fn state(&self) -> &ViewState<Vec<DailyForecastSummary>> {
        &self.state
    }

    pub fn days(&self) -> &[DailyForecastSummary] {
        self.state.data().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    /// City metadata from the last successful fetch
    pub fn forecast_city(&self) -> Option<&ForecastCity> {
        self.forecast_city.as_ref()
    }

    pub fn selected_index(&self) -> usize {
        self.selected_day
    }

    pub fn selected_day(&self) -> Option<&DailyForecastSummary> {
        self.days().get(self.selected_day)
    }

    /// Pick a day. Out-of-range indices are ignored.
    pub fn select_day(&mut self, index: usize) -> bool {
        if index >= self.days().len() {
            return false;
        }
        self.selected_day = index;
        true
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn load(&mut self) {
        let generation = self.generation.issue();
        self.state = ViewState::Loading;
        request_weather_forecast(
            self.channel.runtime(),
            self.channel.sender(),
            self.source.clone(),
            self.city.clone(),
            generation,
        );
    }

    /// Pull-to-refresh
    pub fn refresh(&mut self) {
        self.refreshing = true;
        self.load();
    }

    pub fn retry(&mut self) {
        self.load();
    }

    pub fn poll_channel(&mut self) -> bool {
        let mut changed = false;
        while let Some(msg) = self.channel.try_recv() {
            changed |= self.handle_message(msg);
        }
        if take_settings_change(&mut self.settings_rx).is_some() {
            self.load();
            changed = true;
        }
        changed
    }

    pub async fn wait_for_update(&mut self) -> bool {
        match self.channel.recv().await {
            Some(msg) => self.handle_message(msg),
            None => false,
        }
    }

    pub async fn settle(&mut self) {
        while self.state.is_loading() {
            match self.channel.recv().await {
                Some(msg) => {
                    self.handle_message(msg);
                }
                None => break,
            }
        }
    }

    fn handle_message(&mut self, msg: WeatherServiceMessage) -> bool {
        let WeatherServiceMessage::ForecastDone { generation, result } = msg else {
            tracing::warn!("Forecast screen ignoring unexpected message");
            return false;
        };
        if !self.generation.is_current(generation) {
            tracing::debug!("Discarding stale forecast for generation {}", generation);
            return false;
        }

        self.refreshing = false;
        match result {
            Ok(forecast) => {
                let unit = self.settings.settings().temperature_unit;
                let days = aggregate_daily(&forecast.entries, unit);
                tracing::info!("Forecast for {}: {} days", forecast.city.name, days.len());
                if self.selected_day >= days.len() {
                    self.selected_day = 0;
                }
                self.forecast_city = Some(forecast.city);
                self.state = ViewState::Ready(days);
            }
            Err(e) => {
                self.state = ViewState::Error(screen_message(&e, FORECAST_FAILED_MESSAGE));
            }
        }
        true
    }
}
