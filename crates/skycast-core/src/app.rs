use anyhow::Result;
use std::sync::Arc;

use skycast_weather::OpenWeatherProvider;

use crate::error::{AppError, ConfigError};
use crate::settings::SettingsStore;
use crate::storage::{FileStore, KeyValueStore};
use crate::theme::ThemeStore;
use crate::Config;

/// Main application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
    settings: Arc<SettingsStore>,
    theme: Arc<ThemeStore>,
}

impl App {
    /// Create an application from the on-disk configuration, with an
    /// optional API key taking precedence over the file
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let (config, _) = Config::load_validated(api_key)?;
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.config_dir.clone()));
        Ok(Self::with_storage(config, storage))
    }

    /// Create an application over an explicit persistence backend
    pub fn with_storage(config: Config, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            config: Arc::new(config),
            settings: Arc::new(SettingsStore::new(storage.clone())),
            theme: Arc::new(ThemeStore::new(storage)),
        }
    }

    /// Load the persisted stores
    pub async fn initialize(&self) -> Result<()> {
        tracing::info!("Initializing application");

        self.settings.load().await;
        self.theme.load().await;

        tracing::info!("Application initialized successfully");
        Ok(())
    }

    pub fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down application");
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> Arc<SettingsStore> {
        self.settings.clone()
    }

    pub fn theme(&self) -> Arc<ThemeStore> {
        self.theme.clone()
    }

    /// Build the OpenWeatherMap client from the configuration
    pub fn weather_provider(&self) -> Result<OpenWeatherProvider, AppError> {
        let weather = &self.config.weather;
        let api_key = weather
            .resolved_api_key()
            .ok_or_else(|| ConfigError::MissingSetting("weather.api_key".to_string()))?;

        let mut provider = OpenWeatherProvider::with_base_url(
            &api_key,
            &weather.base_url,
            weather.request_timeout(),
        )?;
        provider.set_language(&weather.language);
        Ok(provider)
    }
}
