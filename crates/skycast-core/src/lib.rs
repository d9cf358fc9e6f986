pub mod app;
pub mod config;
pub mod error;
pub mod settings;
pub mod storage;
pub mod theme;
pub mod view_state;

pub use app::App;
pub use config::{Config, LocationConfig, WeatherConfig};
pub use error::{AppError, ConfigError, NetworkError, StorageError, WeatherError};
pub use settings::{available_cities, AppSettings, City, SettingsStore, StorePhase};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use theme::{ColorScheme, Theme, ThemeMode, ThemeStore};
pub use view_state::{RequestGeneration, ViewState};

use anyhow::Result;

/// Initialize the core application
pub fn init() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("SkyCast core initialized");
    Ok(())
}
