//! Permission-gated device position lookup.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{Coordinates, LocationError};

/// Geolocation error code reported when the lookup times out
pub const TIMEOUT_CODE: i32 = 3;

/// Platform permission states for location access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Unavailable,
    Denied,
    Blocked,
    Limited,
    Granted,
}

/// Position request tuning
#[derive(Debug, Clone, PartialEq)]
pub struct LocationOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Accept a cached position no older than this
    pub maximum_age: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(15),
            maximum_age: Duration::from_secs(10),
        }
    }
}

/// Platform location capability
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn check_permission(&self) -> PermissionStatus;

    async fn request_permission(&self) -> PermissionStatus;

    async fn current_position(&self, options: &LocationOptions) -> Result<Coordinates, LocationError>;
}

/// Run the permission sequence, then ask for the current position.
pub async fn request_current_position(
    resolver: &dyn LocationResolver,
    options: &LocationOptions,
) -> Result<Coordinates, LocationError> {
    match resolver.check_permission().await {
        PermissionStatus::Granted => {}
        PermissionStatus::Unavailable => return Err(LocationError::Unavailable),
        PermissionStatus::Blocked => return Err(LocationError::PermissionBlocked),
        PermissionStatus::Denied => {
            if resolver.request_permission().await != PermissionStatus::Granted {
                return Err(LocationError::PermissionDenied);
            }
        }
        PermissionStatus::Limited => return Err(LocationError::PermissionUnknown),
    }

    match tokio::time::timeout(options.timeout, resolver.current_position(options)).await {
        Ok(Ok(position)) => {
            tracing::info!("Got location: {}, {}", position.latitude, position.longitude);
            Ok(position)
        }
        Ok(Err(e)) => {
            tracing::warn!("Location lookup failed: {}", e);
            Err(e)
        }
        Err(_) => {
            tracing::warn!("Location lookup timed out after {:?}", options.timeout);
            Err(LocationError::Position {
                code: TIMEOUT_CODE,
                message: "Location request timed out".to_string(),
            })
        }
    }
}

/// Resolver backed by a known position, or by none at all.
///
/// Used where no platform location service exists, such as the terminal
/// front end with `--lat/--lon`.
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    position: Option<Coordinates>,
}

impl FixedLocation {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl LocationResolver for FixedLocation {
    async fn check_permission(&self) -> PermissionStatus {
        if self.position.is_some() {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Unavailable
        }
    }

    async fn request_permission(&self) -> PermissionStatus {
        self.check_permission().await
    }

    async fn current_position(&self, _options: &LocationOptions) -> Result<Coordinates, LocationError> {
        self.position.ok_or(LocationError::Unavailable)
    }
}
