use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Display unit stamped onto converted readings
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// Parse the lowercase name used in settings files and on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "celsius" | "c" => Some(Self::Celsius),
            "fahrenheit" | "f" => Some(Self::Fahrenheit),
            _ => None,
        }
    }
}

/// Geographic position reported by the location resolver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Temperatures derived for display in a particular unit.
///
/// Kept apart from the canonical Celsius fields so a reading is never
/// converted twice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayTemperature {
    pub temperature: f64,
    pub feels_like: f64,
    pub unit: TemperatureUnit,
}

impl DisplayTemperature {
    pub fn symbol(&self) -> &'static str {
        self.unit.symbol()
    }
}

/// Current weather conditions for one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub country: String,
    /// Celsius, rounded to whole degrees
    pub temperature: f64,
    /// Celsius, rounded to whole degrees
    pub feels_like: f64,
    pub humidity: u8,
    /// Meters per second
    pub wind_speed: f64,
    pub description: String,
    pub icon: String,
    pub observed_at: DateTime<Utc>,
    /// Shift from UTC in seconds for the observed location
    pub utc_offset_secs: i32,
    /// Set only by [`crate::apply_temperature_unit`]
    #[serde(default)]
    pub display: Option<DisplayTemperature>,
}

impl WeatherSnapshot {
    /// Observation date in the location's local calendar, `YYYY/M/D`
    pub fn observation_date(&self) -> String {
        match FixedOffset::east_opt(self.utc_offset_secs) {
            Some(offset) => self
                .observed_at
                .with_timezone(&offset)
                .format("%Y/%-m/%-d")
                .to_string(),
            None => self.observed_at.format("%Y/%-m/%-d").to_string(),
        }
    }

    /// Unit symbol of the display values, if a unit has been applied
    pub fn temperature_unit(&self) -> Option<&'static str> {
        self.display.map(|d| d.unit.symbol())
    }

    /// Display temperature, falling back to Celsius before a unit is applied
    pub fn shown_temperature(&self) -> f64 {
        self.display.map(|d| d.temperature).unwrap_or(self.temperature)
    }

    pub fn shown_feels_like(&self) -> f64 {
        self.display.map(|d| d.feels_like).unwrap_or(self.feels_like)
    }

    pub fn icon_name(&self) -> &'static str {
        icon_name(&self.icon)
    }
}

/// Rain or snow accumulation in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Accumulation {
    pub last_hour: Option<f64>,
    pub last_three_hours: Option<f64>,
}

/// Current conditions extended with atmospheric and astronomical fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDetail {
    #[serde(flatten)]
    pub snapshot: WeatherSnapshot,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    /// hPa
    pub pressure: u32,
    /// Meters; absent when the station does not report it
    pub visibility: Option<u32>,
    /// Cloud cover percent
    pub clouds: u8,
    pub uv_index: Option<f64>,
    pub rain: Option<Accumulation>,
    pub snow: Option<Accumulation>,
}

impl WeatherDetail {
    /// Sunrise as local `HH:MM`
    pub fn sunrise_local(&self) -> String {
        self.local_time(self.sunrise)
    }

    /// Sunset as local `HH:MM`
    pub fn sunset_local(&self) -> String {
        self.local_time(self.sunset)
    }

    /// Visibility in kilometers
    pub fn visibility_km(&self) -> Option<f64> {
        self.visibility.map(|m| f64::from(m) / 1000.0)
    }

    fn local_time(&self, at: DateTime<Utc>) -> String {
        match FixedOffset::east_opt(self.snapshot.utc_offset_secs) {
            Some(offset) => at.with_timezone(&offset).format("%H:%M").to_string(),
            None => at.format("%H:%M").to_string(),
        }
    }
}

/// One 3-hour forecast sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    /// Parsed once from the API's `dt_txt` stamp
    pub local_time: NaiveDateTime,
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: u32,
    pub description: String,
    pub icon: String,
    pub wind_speed: f64,
    pub clouds: u8,
    /// Probability of precipitation, 0.0 to 1.0
    pub pop: f64,
    /// Rain over the 3-hour window in millimeters
    pub rain_3h: Option<f64>,
}

/// City metadata returned with a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
    pub utc_offset_secs: i32,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// Five-day / three-hour forecast for a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city: ForecastCity,
    pub entries: Vec<ForecastEntry>,
}

/// Map an OpenWeatherMap icon code to an icon name
pub fn icon_name(code: &str) -> &'static str {
    match code {
        "01d" => "weather-sunny",
        "01n" => "weather-night",
        "02d" => "weather-partly-cloudy",
        "02n" => "weather-night-partly-cloudy",
        "03d" | "03n" | "04d" | "04n" => "weather-cloudy",
        "09d" | "09n" => "weather-pouring",
        "10d" | "10n" => "weather-rainy",
        "11d" | "11n" => "weather-lightning",
        "13d" | "13n" => "weather-snowy",
        "50d" | "50n" => "weather-fog",
        _ => "weather-cloudy",
    }
}

/// Describe a UV index band
pub fn uv_description(uvi: f64) -> &'static str {
    if uvi <= 2.0 {
        "低 (無危險)"
    } else if uvi <= 5.0 {
        "中等 (需要防護)"
    } else if uvi <= 7.0 {
        "高 (需要加強防護)"
    } else if uvi <= 10.0 {
        "非常高 (需要額外防護)"
    } else {
        "極端 (避免外出)"
    }
}

/// Location service errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("此裝置不支援位置服務")]
    Unavailable,
    #[error("需要位置權限才能獲取當前位置")]
    PermissionDenied,
    #[error("位置權限已被永久拒絕，請在系統設定中啟用")]
    PermissionBlocked,
    #[error("無法獲取位置權限")]
    PermissionUnknown,
    #[error("無法獲取位置：{message} (Code {code})")]
    Position { code: i32, message: String },
}

impl LocationError {
    /// Blocked permission needs a change in system settings and is final
    /// for the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PermissionBlocked | Self::Unavailable)
    }
}

/// Weather data source errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("HTTP error! Status: {status}")]
    Http { status: u16 },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl WeatherError {
    /// HTTP status carried by the failure, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
