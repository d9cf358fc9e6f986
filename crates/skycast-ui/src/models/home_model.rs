//! Home screen: weather for the default city or the current position.

use std::sync::Arc;

use skycast_core::{AppSettings, RequestGeneration, SettingsStore, ViewState};
use skycast_weather::{
    apply_temperature_unit, Coordinates, LocationError, LocationOptions, LocationResolver,
    WeatherSnapshot, WeatherSource,
};
use tokio::runtime::Handle;
use tokio::sync::watch;

use super::take_settings_change;
use crate::error_mapping::{screen_message, LocationPrompt};
use crate::services::{
    request_location, request_weather_current, LocationServiceMessage, ServiceChannel,
    WeatherQuery, WeatherServiceMessage,
};

pub const HOME_FAILED_MESSAGE: &str = "無法讀取天氣資料";

/// Everything the home screen's background work can report
#[derive(Debug)]
pub enum HomeMessage {
    Weather(WeatherServiceMessage),
    Location(LocationServiceMessage),
}

impl From<WeatherServiceMessage> for HomeMessage {
    fn from(msg: WeatherServiceMessage) -> Self {
        HomeMessage::Weather(msg)
    }
}

impl From<LocationServiceMessage> for HomeMessage {
    fn from(msg: LocationServiceMessage) -> Self {
        HomeMessage::Location(msg)
    }
}

pub struct HomeModel {
    channel: ServiceChannel<HomeMessage>,
    source: Arc<dyn WeatherSource>,
    resolver: Arc<dyn LocationResolver>,
    location_options: LocationOptions,
    settings_rx: watch::Receiver<Arc<AppSettings>>,
    applied: Arc<AppSettings>,
    generation: RequestGeneration,
    location_generation: RequestGeneration,
    state: ViewState<WeatherSnapshot>,
    using_current_location: bool,
    location: Option<Coordinates>,
    location_error: Option<LocationError>,
    locating: bool,
    prompt: Option<LocationPrompt>,
}

impl HomeModel {
    pub fn new(
        runtime: Handle,
        source: Arc<dyn WeatherSource>,
        resolver: Arc<dyn LocationResolver>,
        location_options: LocationOptions,
        settings: Arc<SettingsStore>,
    ) -> Self {
        let mut settings_rx = settings.subscribe();
        let applied = settings_rx.borrow_and_update().clone();
        Self {
            channel: ServiceChannel::new(runtime),
            source,
            resolver,
            location_options,
            settings_rx,
            using_current_location: applied.use_current_location_by_default,
            applied,
            generation: RequestGeneration::default(),
            location_generation: RequestGeneration::default(),
            state: ViewState::Idle,
            location: None,
            location_error: None,
            locating: false,
            prompt: None,
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

    pub fn using_current_location(&self) -> bool {
        self.using_current_location
    }

    pub fn location(&self) -> Option<Coordinates> {
        self.location
    }

    pub fn location_error(&self) -> Option<&LocationError> {
        self.location_error.as_ref()
    }

    pub fn is_locating(&self) -> bool {
        self.locating
    }

    /// Pending location alert, if the last toggle raised one
    pub fn location_prompt(&self) -> Option<&LocationPrompt> {
        self.prompt.as_ref()
    }

    /// City to open in the detail and forecast screens
    pub fn selected_city(&self) -> Option<&str> {
        self.weather().map(|w| w.city.as_str())
    }

    /// First fetch after the screen appears
    pub fn start(&mut self) {
        if self.using_current_location {
            self.request_location();
        }
        self.refresh();
    }

    /// Fetch for the current target: the resolved position when location
    /// mode is on and a position is known, else the default city.
    pub fn refresh(&mut self) {
        let query = match (self.using_current_location, self.location) {
            (true, Some(position)) => WeatherQuery::Position(position),
            _ => WeatherQuery::City(self.applied.default_city.name.clone()),
        };
        tracing::info!("Home screen fetching {:?}", query);

        let generation = self.generation.issue();
        self.state = ViewState::Loading;
        request_weather_current(
            self.channel.runtime(),
            self.channel.sender(),
            self.source.clone(),
            query,
            generation,
        );
    }

    pub fn retry(&mut self) {
        self.refresh();
    }

    pub fn toggle_location_mode(&mut self) {
        if self.using_current_location {
            self.using_current_location = false;
            self.refresh();
            return;
        }

        if self.location.is_some() {
            self.using_current_location = true;
            self.refresh();
        } else if let Some(e) = &self.location_error {
            self.prompt = Some(LocationPrompt::for_error(e));
        } else {
            self.request_location();
            self.using_current_location = true;
            self.refresh();
        }
    }

    /// Accept the retry offered by the location prompt
    pub fn confirm_location_retry(&mut self) {
        match self.prompt.take() {
            Some(prompt) if prompt.can_retry => {
                self.request_location();
                self.using_current_location = true;
                self.refresh();
            }
            _ => {}
        }
    }

    pub fn dismiss_location_prompt(&mut self) {
        self.prompt = None;
    }

    fn request_location(&mut self) {
        let generation = self.location_generation.issue();
        self.locating = true;
        request_location(
            self.channel.runtime(),
            self.channel.sender(),
            self.resolver.clone(),
            self.location_options.clone(),
            generation,
        );
    }

    /// Drain pending results and react to settings changes.
    pub fn poll_channel(&mut self) -> bool {
        let mut changed = false;
        while let Some(msg) = self.channel.try_recv() {
            changed |= self.handle_message(msg);
        }
        if let Some(settings) = take_settings_change(&mut self.settings_rx) {
            changed |= self.apply_settings(settings);
        }
        changed
    }

    pub async fn wait_for_update(&mut self) -> bool {
        match self.channel.recv().await {
            Some(msg) => self.handle_message(msg),
            None => false,
        }
    }

    /// Wait until neither a position lookup nor a fetch is outstanding
    pub async fn settle(&mut self) {
        while self.state.is_loading() || self.locating {
            match self.channel.recv().await {
                Some(msg) => {
                    self.handle_message(msg);
                }
                None => break,
            }
        }
    }

    fn apply_settings(&mut self, settings: Arc<AppSettings>) -> bool {
        let previous = std::mem::replace(&mut self.applied, settings);
        let current = self.applied.clone();

        if previous.use_current_location_by_default != current.use_current_location_by_default {
            self.using_current_location = current.use_current_location_by_default;
            if self.using_current_location && self.location.is_none() && !self.locating {
                self.request_location();
            }
        }

        if *previous == *current {
            return false;
        }
        self.refresh();
        true
    }

    fn handle_message(&mut self, msg: HomeMessage) -> bool {
        match msg {
            HomeMessage::Location(LocationServiceMessage::LocationDone { generation, result }) => {
                if !self.location_generation.is_current(generation) {
                    return false;
                }
                self.locating = false;
                match result {
                    Ok(position) => {
                        self.location = Some(position);
                        self.location_error = None;
                        if self.using_current_location {
                            self.refresh();
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Location unavailable: {}", e);
                        self.location_error = Some(e);
                    }
                }
                true
            }
            HomeMessage::Weather(WeatherServiceMessage::CurrentDone { generation, result }) => {
                if !self.generation.is_current(generation) {
                    tracing::debug!("Discarding stale home weather (generation {})", generation);
                    return false;
                }
                self.state = match result {
                    Ok(snapshot) => match apply_temperature_unit(Some(&snapshot), self.applied.temperature_unit) {
                        Some(shown) => ViewState::Ready(shown),
                        None => ViewState::Error(HOME_FAILED_MESSAGE.to_string()),
                    },
                    Err(e) => ViewState::Error(screen_message(&e, HOME_FAILED_MESSAGE)),
                };
                true
            }
            HomeMessage::Weather(_) => {
                tracing::warn!("Home screen ignoring unexpected message");
                false
            }
        }
    }

    /// Settings the screen currently reflects
    pub fn applied_settings(&self) -> &AppSettings {
        &self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{settings_store, StubSource};
    use async_trait::async_trait;
    use skycast_core::City;
    use skycast_weather::{FixedLocation, PermissionStatus, TemperatureUnit};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DeniedResolver {
        requests: AtomicUsize,
    }

    #[async_trait]
    impl LocationResolver for DeniedResolver {
        async fn check_permission(&self) -> PermissionStatus {
            PermissionStatus::Denied
        }

        async fn request_permission(&self) -> PermissionStatus {
            self.requests.fetch_add(1, Ordering::SeqCst);
            PermissionStatus::Denied
        }

        async fn current_position(&self, _options: &LocationOptions) -> Result<Coordinates, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    const HERE: Coordinates = Coordinates {
        latitude: 25.03,
        longitude: 121.56,
    };

    fn source() -> Arc<StubSource> {
        Arc::new(
            StubSource::new()
                .with_city("Taipei", 28.0)
                .with_city("Tokyo", 22.0),
        )
    }

    fn home(
        source: Arc<StubSource>,
        resolver: Arc<dyn LocationResolver>,
        settings: Arc<SettingsStore>,
    ) -> HomeModel {
        HomeModel::new(
            Handle::current(),
            source,
            resolver,
            LocationOptions::default(),
            settings,
        )
    }

    #[tokio::test]
    async fn starts_with_default_city() {
        let (settings, _) = settings_store().await;
        let mut model = home(source(), Arc::new(FixedLocation::new(Some(HERE))), settings);

        model.start();
        assert!(model.state().is_loading());
        assert!(!model.is_locating());
        model.settle().await;

        let weather = model.weather().unwrap();
        assert_eq!(weather.city, "Taipei");
        assert_eq!(weather.temperature_unit(), Some("°C"));
        assert_eq!(model.selected_city(), Some("Taipei"));
    }

    #[tokio::test]
    async fn location_default_uses_position() {
        let (settings, _) = settings_store().await;
        settings.set_use_current_location_by_default(true).await.unwrap();
        let mut model = home(source(), Arc::new(FixedLocation::new(Some(HERE))), settings);

        model.start();
        assert!(model.is_locating());
        model.settle().await;

        assert_eq!(model.location(), Some(HERE));
        assert_eq!(model.weather().unwrap().city, "Current Position");
    }

    #[tokio::test]
    async fn toggle_switches_between_modes() {
        let (settings, _) = settings_store().await;
        let mut model = home(source(), Arc::new(FixedLocation::new(Some(HERE))), settings);
        model.start();
        model.settle().await;

        model.toggle_location_mode();
        assert!(model.using_current_location());
        model.settle().await;
        assert_eq!(model.weather().unwrap().city, "Current Position");

        model.toggle_location_mode();
        assert!(!model.using_current_location());
        model.settle().await;
        assert_eq!(model.weather().unwrap().city, "Taipei");
    }

    #[tokio::test]
    async fn failed_lookup_prompts_for_retry() {
        let (settings, _) = settings_store().await;
        let resolver = Arc::new(DeniedResolver {
            requests: AtomicUsize::new(0),
        });
        let mut model = home(source(), resolver.clone(), settings);
        model.start();
        model.settle().await;

        model.toggle_location_mode();
        model.settle().await;
        assert_eq!(model.location_error(), Some(&LocationError::PermissionDenied));
        // Falls back to the default city while no position is known
        assert_eq!(model.weather().unwrap().city, "Taipei");

        model.toggle_location_mode();
        model.toggle_location_mode();
        let prompt = model.location_prompt().unwrap();
        assert!(prompt.can_retry);
        assert!(prompt.message.contains("要再試一次嗎？"));

        model.confirm_location_retry();
        assert!(model.location_prompt().is_none());
        model.settle().await;
        assert_eq!(resolver.requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unavailable_location_gives_no_retry() {
        let (settings, _) = settings_store().await;
        settings.set_use_current_location_by_default(true).await.unwrap();
        let mut model = home(source(), Arc::new(FixedLocation::new(None)), settings);
        model.start();
        model.settle().await;

        model.toggle_location_mode();
        model.toggle_location_mode();
        let prompt = model.location_prompt().unwrap();
        assert!(!prompt.can_retry);

        model.confirm_location_retry();
        assert!(!model.is_locating());
    }

    #[tokio::test]
    async fn settings_changes_refetch() {
        let (settings, _) = settings_store().await;
        let source = source();
        let mut model = home(source.clone(), Arc::new(FixedLocation::new(None)), settings.clone());
        model.start();
        model.settle().await;

        settings.set_default_city(City::new("tokyo", "Tokyo", "JP")).await.unwrap();
        settings.set_temperature_unit(TemperatureUnit::Fahrenheit).await.unwrap();
        assert!(model.poll_channel());
        model.settle().await;

        let weather = model.weather().unwrap();
        assert_eq!(weather.city, "Tokyo");
        assert_eq!(weather.shown_temperature(), 72.0);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn unknown_default_city_reports_not_found() {
        let (settings, _) = settings_store().await;
        settings.set_default_city(City::new("sydney", "Sydney", "AU")).await.unwrap();
        let mut model = home(source(), Arc::new(FixedLocation::new(None)), settings);
        model.start();
        model.settle().await;

        assert!(model.weather().is_none());
        assert!(model.error().unwrap().contains("找不到"));
    }
}
