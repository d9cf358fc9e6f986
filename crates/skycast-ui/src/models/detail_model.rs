//! Detailed conditions for one city.

use std::sync::Arc;

use skycast_core::{AppSettings, RequestGeneration, SettingsStore, ViewState};
use skycast_weather::{apply_temperature_unit, uv_description, WeatherDetail, WeatherSource};
use tokio::runtime::Handle;
use tokio::sync::watch;

use super::take_settings_change;
use crate::error_mapping::screen_message;
use crate::services::{request_weather_detail, ServiceChannel, WeatherServiceMessage};

pub const DETAIL_FAILED_MESSAGE: &str = "無法獲取天氣詳情，請稍後再試";

pub struct DetailModel {
    channel: ServiceChannel<WeatherServiceMessage>,
    source: Arc<dyn WeatherSource>,
    settings: Arc<SettingsStore>,
    settings_rx: watch::Receiver<Arc<AppSettings>>,
    generation: RequestGeneration,
    state: ViewState<WeatherDetail>,
    city: String,
}

impl DetailModel {
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
            city: city.to_string(),
        }
    }

    pub fn state(&self) -> &ViewState<WeatherDetail> {
        &self.state
    }

    pub fn detail(&self) -> Option<&WeatherDetail> {
        self.state.data()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// UV label for the loaded detail, when the source reported an index
    pub fn uv_label(&self) -> Option<&'static str> {
        self.detail()?.uv_index.map(uv_description)
    }

    /// Switch to another city and fetch it
    pub fn set_city(&mut self, city: &str) {
        if self.city != city {
            self.city = city.to_string();
            self.load();
        }
    }

    pub fn load(&mut self) {
        let generation = self.generation.issue();
        self.state = ViewState::Loading;
        request_weather_detail(
            self.channel.runtime(),
            self.channel.sender(),
            self.source.clone(),
            self.city.clone(),
            generation,
        );
    }

    pub fn retry(&mut self) {
        self.load();
    }

    /// Drain pending results; a unit change triggers a fresh fetch.
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
        let WeatherServiceMessage::DetailDone { generation, result } = msg else {
            tracing::warn!("Detail screen ignoring unexpected message");
            return false;
        };
        if !self.generation.is_current(generation) {
            tracing::debug!("Discarding stale detail for generation {}", generation);
            return false;
        }

        self.state = match result {
            Ok(detail) => {
                let unit = self.settings.settings().temperature_unit;
                match apply_temperature_unit(Some(&detail), unit) {
                    Some(shown) => ViewState::Ready(shown),
                    None => ViewState::Error(DETAIL_FAILED_MESSAGE.to_string()),
                }
            }
            Err(e) => ViewState::Error(screen_message(&e, DETAIL_FAILED_MESSAGE)),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{settings_store, StubSource};
    use skycast_weather::TemperatureUnit;

    #[tokio::test]
    async fn loads_detail_with_unit() {
        let (settings, _) = settings_store().await;
        settings.set_temperature_unit(TemperatureUnit::Fahrenheit).await.unwrap();
        let source = Arc::new(StubSource::new().with_city("Taipei", 30.0));
        let mut model = DetailModel::new(Handle::current(), source, settings, "Taipei");

        model.load();
        model.settle().await;

        let detail = model.detail().unwrap();
        assert_eq!(detail.snapshot.shown_temperature(), 86.0);
        assert_eq!(detail.snapshot.temperature_unit(), Some("°F"));
        assert_eq!(detail.sunrise_local(), "05:05");
        assert_eq!(detail.visibility_km(), Some(10.0));
        assert!(model.uv_label().is_none());
    }

    #[tokio::test]
    async fn failure_uses_detail_message() {
        let (settings, _) = settings_store().await;
        let source = Arc::new(StubSource::new());
        let mut model = DetailModel::new(Handle::current(), source, settings, "Nowhere");

        model.load();
        model.settle().await;
        assert!(model.error().unwrap().contains("找不到"));
    }

    #[tokio::test]
    async fn unit_change_refetches() {
        let (settings, _) = settings_store().await;
        let source = Arc::new(StubSource::new().with_city("Taipei", 30.0));
        let mut model = DetailModel::new(Handle::current(), source.clone(), settings.clone(), "Taipei");
        model.load();
        model.settle().await;

        settings.set_temperature_unit(TemperatureUnit::Fahrenheit).await.unwrap();
        assert!(model.poll_channel());
        assert!(model.state().is_loading());

        model.settle().await;
        assert_eq!(source.calls(), 2);
        assert_eq!(model.detail().unwrap().snapshot.temperature_unit(), Some("°F"));
    }
}
