//! City search screen.

use std::sync::Arc;

use skycast_core::{AppSettings, RequestGeneration, SettingsStore, ViewState};
use skycast_weather::{apply_temperature_unit, WeatherSnapshot, WeatherSource};
use tokio::runtime::Handle;
use tokio::sync::watch;

use super::take_settings_change;
use crate::error_mapping::{screen_message, EMPTY_CITY_MESSAGE};
use crate::services::{request_weather_current, ServiceChannel, WeatherQuery, WeatherServiceMessage};

pub const SEARCH_FAILED_MESSAGE: &str = "搜尋失敗，請稍後再試";

pub struct SearchModel {
    channel: ServiceChannel<WeatherServiceMessage>,
    source: Arc<dyn WeatherSource>,
    settings: Arc<SettingsStore>,
    settings_rx: watch::Receiver<Arc<AppSettings>>,
    generation: RequestGeneration,
    state: ViewState<WeatherSnapshot>,
    city: String,
    input_focused: bool,
}

impl SearchModel {
    pub fn new(runtime: Handle, source: Arc<dyn WeatherSource>, settings: Arc<SettingsStore>) -> Self {
        let settings_rx = settings.subscribe();
        Self {
            channel: ServiceChannel::new(runtime),
            source,
            settings,
            settings_rx,
            generation: RequestGeneration::default(),
            state: ViewState::Idle,
            city: String::new(),
            input_focused: true,
        }
    }

    pub fn state(&self) -> &ViewState<WeatherSnapshot> {
        &self.state
    }

    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        self.state.data()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn set_city(&mut self, text: &str) {
        self.city = text.to_string();
    }

    /// Look up the typed city. A blank name is rejected locally and
    /// focuses the input.
    pub fn search(&mut self) {
        let city = self.city.trim().to_string();
        if city.is_empty() {
            self.state = ViewState::Error(EMPTY_CITY_MESSAGE.to_string());
            self.input_focused = true;
            return;
        }

        let generation = self.generation.issue();
        self.state = ViewState::Loading;
        self.input_focused = false;
        request_weather_current(
            self.channel.runtime(),
            self.channel.sender(),
            self.source.clone(),
            WeatherQuery::City(city),
            generation,
        );
    }

    /// Retry after a failure; with nothing typed, focus the input instead.
    pub fn retry(&mut self) {
        if self.city.trim().is_empty() {
            self.state = ViewState::Idle;
            self.input_focused = true;
        } else {
            self.search();
        }
    }

    /// Reset the screen and drop any answer still in flight.
    pub fn clear(&mut self) {
        self.generation.issue();
        self.city.clear();
        self.state = ViewState::Idle;
        self.input_focused = true;
    }

    /// Drain pending results. Returns true if anything changed.
    pub fn poll_channel(&mut self) -> bool {
        let mut changed = false;
        while let Some(msg) = self.channel.try_recv() {
            changed |= self.handle_message(msg);
        }
        if let Some(settings) = take_settings_change(&mut self.settings_rx) {
            changed |= self.restamp(&settings);
        }
        changed
    }

    /// Wait for the next result and apply it
    pub async fn wait_for_update(&mut self) -> bool {
        match self.channel.recv().await {
            Some(msg) => self.handle_message(msg),
            None => false,
        }
    }

    /// Wait until the current search settles
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
        let WeatherServiceMessage::CurrentDone { generation, result } = msg else {
            tracing::warn!("Search screen ignoring unexpected message");
            return false;
        };
        if !self.generation.is_current(generation) {
            tracing::debug!("Discarding stale search result (generation {})", generation);
            return false;
        }

        self.state = match result {
            Ok(snapshot) => {
                let unit = self.settings.settings().temperature_unit;
                match apply_temperature_unit(Some(&snapshot), unit) {
                    Some(shown) => ViewState::Ready(shown),
                    None => ViewState::Error(SEARCH_FAILED_MESSAGE.to_string()),
                }
            }
            Err(e) => {
                tracing::error!("Search failed: {}", e);
                ViewState::Error(screen_message(&e, SEARCH_FAILED_MESSAGE))
            }
        };
        true
    }

    /// Re-derive display temperatures after a unit change
    fn restamp(&mut self, settings: &AppSettings) -> bool {
        let ViewState::Ready(snapshot) = &self.state else {
            return false;
        };
        match apply_temperature_unit(Some(snapshot), settings.temperature_unit) {
            Some(shown) => {
                self.state = ViewState::Ready(shown);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{settings_store, StubSource};
    use skycast_weather::TemperatureUnit;
    use std::time::Duration;

    async fn model(source: StubSource) -> (SearchModel, Arc<StubSource>, Arc<SettingsStore>) {
        let source = Arc::new(source);
        let (settings, _) = settings_store().await;
        let model = SearchModel::new(Handle::current(), source.clone(), settings.clone());
        (model, source, settings)
    }

    #[tokio::test]
    async fn blank_city_never_reaches_source() {
        let (mut model, source, _) = model(StubSource::new()).await;
        model.set_city("   ");
        model.search();

        assert_eq!(model.error(), Some(EMPTY_CITY_MESSAGE));
        assert!(model.input_focused());
        assert!(!model.is_loading());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn found_city_is_ready_in_celsius() {
        let (mut model, _, _) = model(StubSource::new().with_city("Tokyo", 24.0)).await;
        model.set_city(" Tokyo ");
        model.search();
        assert!(model.is_loading());
        assert!(!model.input_focused());

        model.settle().await;
        let weather = model.weather().unwrap();
        assert_eq!(weather.city, "Tokyo");
        assert_eq!(weather.temperature_unit(), Some("°C"));
        assert_eq!(weather.shown_temperature(), 24.0);
    }

    #[tokio::test]
    async fn unknown_city_clears_weather() {
        let (mut model, _, _) = model(StubSource::new().with_city("Tokyo", 24.0)).await;
        model.set_city("Tokyo");
        model.search();
        model.settle().await;
        assert!(model.weather().is_some());

        model.set_city("Atlantis");
        model.search();
        model.settle().await;
        assert!(model.weather().is_none());
        assert!(model.error().unwrap().contains("找不到"));
    }

    #[tokio::test]
    async fn stale_answer_is_discarded() {
        let source = StubSource::new()
            .with_slow_city("Slowtown", 10.0, Duration::from_millis(150))
            .with_city("Taipei", 30.0);
        let (mut model, _, _) = model(source).await;

        model.set_city("Slowtown");
        model.search();
        model.set_city("Taipei");
        model.search();

        model.settle().await;
        assert_eq!(model.weather().unwrap().city, "Taipei");

        // The slow answer still arrives, but must not overwrite the newer one
        assert!(!model.wait_for_update().await);
        assert_eq!(model.weather().unwrap().city, "Taipei");
    }

    #[tokio::test]
    async fn clear_resets_and_focuses() {
        let (mut model, _, _) = model(StubSource::new().with_city("Tokyo", 24.0)).await;
        model.set_city("Tokyo");
        model.search();
        model.clear();

        assert_eq!(model.city(), "");
        assert_eq!(*model.state(), ViewState::Idle);
        assert!(model.input_focused());

        assert!(!model.wait_for_update().await);
        assert_eq!(*model.state(), ViewState::Idle);
    }

    #[tokio::test]
    async fn retry_with_blank_input_focuses() {
        let (mut model, source, _) = model(StubSource::new()).await;
        model.set_city("");
        model.search();
        model.retry();

        assert_eq!(*model.state(), ViewState::Idle);
        assert!(model.input_focused());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn unit_change_restamps_without_refetch() {
        let (mut model, source, settings) = model(StubSource::new().with_city("Tokyo", 25.0)).await;
        model.set_city("Tokyo");
        model.search();
        model.settle().await;

        settings.set_temperature_unit(TemperatureUnit::Fahrenheit).await.unwrap();
        assert!(model.poll_channel());

        let weather = model.weather().unwrap();
        assert_eq!(weather.shown_temperature(), 77.0);
        assert_eq!(weather.temperature, 25.0);
        assert_eq!(source.calls(), 1);
    }
}
