//! Maps UI service errors to skycast_core::AppError for consistent user-facing messages.
//! Each service has its own module to keep mappings small and readable.

mod location;
mod weather;

pub use location::LocationPrompt;
pub use weather::{screen_message, EMPTY_CITY_MESSAGE};
