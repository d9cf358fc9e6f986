//! Centralized error types for SkyCast.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling throughout the codebase
//! - Provides user-facing messages suitable for display
//! - Preserves full error context for debugging/logging

use skycast_weather::{LocationError, WeatherError as SourceError};
use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a display-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),
}

impl AppError {
    /// Returns a user-facing message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Location(e) if e.is_terminal() => "位置服務無法使用，請檢查系統設定",
            AppError::Location(_) => "無法獲取您的位置，請再試一次",
        }
    }
}

impl From<SourceError> for AppError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::Http { status: 404 } => {
                AppError::Weather(WeatherError::CityNotFound(e.to_string()))
            }
            SourceError::Http { status: 401 } => AppError::Weather(WeatherError::InvalidApiKey),
            SourceError::Http { status } if status >= 500 => {
                AppError::Weather(WeatherError::ServiceUnavailable)
            }
            SourceError::Http { .. } => AppError::Weather(WeatherError::ApiError(e.to_string())),
            SourceError::Network(err) => AppError::Network(err.into_network_error()),
            SourceError::Parse(msg) => AppError::Network(NetworkError::InvalidResponse(msg)),
            SourceError::Location(err) => AppError::Location(err),
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "網路連線錯誤，請檢查您的網路連線",
            NetworkError::Timeout => "連線逾時，請稍後再試",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "伺服器暫時無法回應，請稍後再試"
            }
            NetworkError::ServerError { .. } => "請求失敗，請再試一次",
            NetworkError::InvalidResponse(_) => "收到無法辨識的回應，請再試一次",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::MissingSetting(_) => "缺少必要的設定，請檢查您的設定",
        }
    }
}

/// Local key-value persistence errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage is read-only: {0}")]
    ReadOnly(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Io(_) => "無法存取本機資料",
            StorageError::Serialize(_) => "本機資料格式錯誤",
            StorageError::ReadOnly(_) => "無法儲存設定",
        }
    }
}

/// Weather service errors.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("Weather API error: {0}")]
    ApiError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Service unavailable")]
    ServiceUnavailable,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::CityNotFound(_) => "找不到該城市，請確認城市名稱是否正確",
            WeatherError::ApiError(_) => "天氣服務發生錯誤，請再試一次",
            WeatherError::InvalidApiKey => "天氣服務金鑰無效，請檢查設定",
            WeatherError::ServiceUnavailable => "天氣服務暫時無法使用，請稍後再試",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}
