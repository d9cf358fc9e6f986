//! Settings screen: default city, temperature unit, location mode, theme.

use std::sync::Arc;

use skycast_core::{available_cities, AppSettings, City, SettingsStore, StorageError, ThemeMode, ThemeStore};
use skycast_weather::TemperatureUnit;

pub struct SettingsModel {
    settings: Arc<SettingsStore>,
    theme: Arc<ThemeStore>,
    cities: Vec<City>,
    city_picker_open: bool,
}

impl SettingsModel {
    pub fn new(settings: Arc<SettingsStore>, theme: Arc<ThemeStore>) -> Self {
        Self {
            settings,
            theme,
            cities: available_cities(),
            city_picker_open: false,
        }
    }

    pub fn settings(&self) -> Arc<AppSettings> {
        self.settings.settings()
    }

    pub fn is_loading(&self) -> bool {
        self.settings.is_loading()
    }

    pub fn available_cities(&self) -> &[City] {
        &self.cities
    }

    pub fn is_default_city(&self, city: &City) -> bool {
        self.settings().default_city.id == city.id
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.theme.mode()
    }

    pub fn city_picker_open(&self) -> bool {
        self.city_picker_open
    }

    pub fn open_city_picker(&mut self) {
        self.city_picker_open = true;
    }

    pub fn close_city_picker(&mut self) {
        self.city_picker_open = false;
    }

    pub async fn select_city(&mut self, city: City) {
        let result = self.settings.set_default_city(city).await;
        self.record(result);
        self.city_picker_open = false;
    }

    /// Select a city from the offered list by id
    pub async fn select_city_by_id(&mut self, id: &str) -> bool {
        let Some(city) = self.cities.iter().find(|c| c.id == id).cloned() else {
            return false;
        };
        self.select_city(city).await;
        true
    }

    pub async fn toggle_temperature_unit(&mut self) {
        let next = match self.settings().temperature_unit {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        };
        self.set_temperature_unit(next).await;
    }

    pub async fn set_temperature_unit(&mut self, unit: TemperatureUnit) {
        let result = self.settings.set_temperature_unit(unit).await;
        self.record(result);
    }

    pub async fn toggle_use_current_location(&mut self) {
        let enabled = !self.settings().use_current_location_by_default;
        let result = self.settings.set_use_current_location_by_default(enabled).await;
        self.record(result);
    }

    pub async fn set_theme_mode(&mut self, mode: ThemeMode) {
        let result = self.theme.set_theme_mode(mode).await;
        self.record(result);
    }

    /// Failed saves are only logged; the previous value stays in effect.
    fn record(&self, result: Result<(), StorageError>) {
        if let Err(e) = result {
            tracing::warn!("Settings change not saved: {}", e);
        }
    }
}
