//! Persisted light/dark theme preference.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::StorageError;
use crate::settings::StorePhase;
use crate::storage::KeyValueStore;

pub const THEME_STORAGE_KEY: &str = "themeType";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// Color scheme reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub primary: &'static str,
    pub background: &'static str,
    pub card: &'static str,
    pub text: &'static str,
    pub border: &'static str,
    pub notification: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spacing {
    pub small: u16,
    pub medium: u16,
    pub large: u16,
}

/// Resolved presentation theme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub dark: bool,
    pub colors: Palette,
    pub spacing: Spacing,
}

const SPACING: Spacing = Spacing {
    small: 8,
    medium: 16,
    large: 24,
};

impl Theme {
    pub fn light() -> Self {
        Self {
            dark: false,
            colors: Palette {
                primary: "rgb(0, 122, 255)",
                background: "rgb(242, 242, 242)",
                card: "rgb(255, 255, 255)",
                text: "rgb(28, 28, 30)",
                border: "rgb(216, 216, 216)",
                notification: "rgb(255, 59, 48)",
            },
            spacing: SPACING,
        }
    }

    pub fn dark() -> Self {
        Self {
            dark: true,
            colors: Palette {
                primary: "rgb(10, 132, 255)",
                background: "rgb(1, 1, 1)",
                card: "rgb(18, 18, 18)",
                text: "rgb(229, 229, 231)",
                border: "rgb(39, 39, 41)",
                notification: "rgb(255, 69, 58)",
            },
            spacing: SPACING,
        }
    }
}

pub struct ThemeStore {
    storage: Arc<dyn KeyValueStore>,
    phase: RwLock<StorePhase>,
    tx: watch::Sender<ThemeMode>,
}

impl ThemeStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let (tx, _) = watch::channel(ThemeMode::default());
        Self {
            storage,
            phase: RwLock::new(StorePhase::Uninitialized),
            tx,
        }
    }

    pub async fn load(&self) {
        *self.phase.write() = StorePhase::Loading;

        match self.storage.get_item(THEME_STORAGE_KEY).await {
            Ok(Some(raw)) => match ThemeMode::parse(&raw) {
                Some(mode) => {
                    self.tx.send_replace(mode);
                }
                None => tracing::warn!("Ignoring unknown theme mode {:?}", raw),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load theme: {}", e),
        }

        *self.phase.write() = StorePhase::Ready;
    }

    pub fn phase(&self) -> StorePhase {
        *self.phase.read()
    }

    pub fn mode(&self) -> ThemeMode {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemeMode> {
        self.tx.subscribe()
    }

    /// Persist `mode`, then publish it
    pub async fn set_theme_mode(&self, mode: ThemeMode) -> Result<(), StorageError> {
        if let Err(e) = self.storage.set_item(THEME_STORAGE_KEY, mode.as_str()).await {
            tracing::error!("Failed to save theme: {}", e);
            return Err(e);
        }
        self.tx.send_replace(mode);
        Ok(())
    }

    /// Theme for the current mode; `System` follows `system`
    pub fn resolve(&self, system: ColorScheme) -> Theme {
        let dark = match self.mode() {
            ThemeMode::Light => false,
            ThemeMode::Dark => true,
            ThemeMode::System => system == ColorScheme::Dark,
        };
        if dark {
            Theme::dark()
        } else {
            Theme::light()
        }
    }

    pub fn is_dark(&self, system: ColorScheme) -> bool {
        self.resolve(system).dark
    }
}
