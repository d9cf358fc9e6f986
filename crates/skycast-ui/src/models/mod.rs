pub mod detail_model;
pub mod forecast_model;
pub mod home_model;
pub mod search_model;
pub mod settings_model;

use std::sync::Arc;

use skycast_core::AppSettings;
use tokio::sync::watch;

/// Take the latest settings if they changed since the last look
fn take_settings_change(rx: &mut watch::Receiver<Arc<AppSettings>>) -> Option<Arc<AppSettings>> {
    match rx.has_changed() {
        Ok(true) => Some(rx.borrow_and_update().clone()),
        _ => None,
    }
}
