use crate::services::weather_service::WeatherError as UiWeatherError;
use skycast_core::{AppError, NetworkError, WeatherError};

/// Shown when a search is submitted with a blank city name
pub const EMPTY_CITY_MESSAGE: &str = "請輸入城市名稱";

/// Failure descriptions only carry text, so the category is recovered by
/// substring: connectivity first, then a 404 from the API.
impl From<UiWeatherError> for AppError {
    fn from(e: UiWeatherError) -> Self {
        match e {
            UiWeatherError::Source(s) if s.contains("network") || s.contains("Network") => {
                AppError::Network(NetworkError::ConnectionFailed(s))
            }
            UiWeatherError::Source(s) if s.contains("404") => {
                AppError::Weather(WeatherError::CityNotFound(s))
            }
            UiWeatherError::Source(s) => AppError::Weather(WeatherError::ApiError(s)),
            UiWeatherError::EmptyInput => {
                AppError::Weather(WeatherError::CityNotFound(String::new()))
            }
        }
    }
}

/// User-facing message for a failed fetch on a screen whose generic
/// message is `fallback`.
pub fn screen_message(e: &UiWeatherError, fallback: &str) -> String {
    if *e == UiWeatherError::EmptyInput {
        return EMPTY_CITY_MESSAGE.to_string();
    }
    match AppError::from(e.clone()) {
        err @ AppError::Network(NetworkError::ConnectionFailed(_))
        | err @ AppError::Weather(WeatherError::CityNotFound(_)) => err.user_message().to_string(),
        _ => fallback.to_string(),
    }
}
