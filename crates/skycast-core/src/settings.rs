//! Persisted user preferences.
//!
//! The store is the only writer. Readers either call [`SettingsStore::settings`]
//! or hold a [`watch::Receiver`] from [`SettingsStore::subscribe`]; each
//! successful write publishes a fresh `Arc`, so a pointer comparison is
//! enough to detect a change.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use skycast_weather::TemperatureUnit;
use tokio::sync::watch;

use crate::error::StorageError;
use crate::storage::KeyValueStore;

pub const SETTINGS_STORAGE_KEY: &str = "@WeatherApp:settings";

/// A selectable default city
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
    pub country: String,
}

impl City {
    pub fn new(id: &str, name: &str, country: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            country: country.to_string(),
        }
    }
}

/// Cities offered as defaults, Taipei first
pub fn available_cities() -> Vec<City> {
    vec![
        City::new("taipei", "Taipei", "TW"),
        City::new("tokyo", "Tokyo", "JP"),
        City::new("new_york", "New York", "US"),
        City::new("london", "London", "GB"),
        City::new("sydney", "Sydney", "AU"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub default_city: City,
    pub temperature_unit: TemperatureUnit,
    pub use_current_location_by_default: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_city: City::new("taipei", "Taipei", "TW"),
            temperature_unit: TemperatureUnit::Celsius,
            use_current_location_by_default: false,
        }
    }
}

/// Settings store lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorePhase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

pub struct SettingsStore {
    storage: Arc<dyn KeyValueStore>,
    phase: RwLock<StorePhase>,
    tx: watch::Sender<Arc<AppSettings>>,
}

impl SettingsStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let (tx, _) = watch::channel(Arc::new(AppSettings::default()));
        Self {
            storage,
            phase: RwLock::new(StorePhase::Uninitialized),
            tx,
        }
    }

    /// Load persisted settings. Never fails: a missing or unreadable blob
    /// leaves the defaults in place.
    pub async fn load(&self) {
        *self.phase.write() = StorePhase::Loading;

        match self.storage.get_item(SETTINGS_STORAGE_KEY).await {
            Ok(Some(json)) => match serde_json::from_str::<AppSettings>(&json) {
                Ok(stored) => {
                    tracing::info!("Loaded settings (default city {})", stored.default_city.name);
                    self.tx.send_replace(Arc::new(stored));
                }
                Err(e) => {
                    tracing::warn!("Stored settings are unreadable, using defaults: {}", e);
                    self.tx.send_replace(Arc::new(AppSettings::default()));
                }
            },
            Ok(None) => tracing::debug!("No stored settings, using defaults"),
            Err(e) => tracing::warn!("Failed to read settings, using defaults: {}", e),
        }

        *self.phase.write() = StorePhase::Ready;
    }

    pub fn phase(&self) -> StorePhase {
        *self.phase.read()
    }

    pub fn is_loading(&self) -> bool {
        self.phase() != StorePhase::Ready
    }

    /// Current settings snapshot
    pub fn settings(&self) -> Arc<AppSettings> {
        self.tx.borrow().clone()
    }

    /// Receive every successfully persisted settings object
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppSettings>> {
        self.tx.subscribe()
    }

    pub async fn set_default_city(&self, city: City) -> Result<(), StorageError> {
        self.update(|s| s.default_city = city).await
    }

    pub async fn set_temperature_unit(&self, unit: TemperatureUnit) -> Result<(), StorageError> {
        self.update(|s| s.temperature_unit = unit).await
    }

    pub async fn set_use_current_location_by_default(&self, enabled: bool) -> Result<(), StorageError> {
        self.update(|s| s.use_current_location_by_default = enabled).await
    }

    /// Merge one change into the current settings, persist the whole object,
    /// and publish it only once the write went through.
    async fn update(&self, change: impl FnOnce(&mut AppSettings)) -> Result<(), StorageError> {
        let mut next = (*self.settings()).clone();
        change(&mut next);

        let json = serde_json::to_string(&next)?;
        if let Err(e) = self.storage.set_item(SETTINGS_STORAGE_KEY, &json).await {
            tracing::error!("Failed to save settings: {}", e);
            return Err(e);
        }

        self.tx.send_replace(Arc::new(next));
        Ok(())
    }
}
