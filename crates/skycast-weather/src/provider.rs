//! OpenWeatherMap data source.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{
    Accumulation, Coordinates, Forecast, ForecastCity, ForecastEntry, WeatherDetail, WeatherError,
    WeatherSnapshot,
};
use crate::units::round_half_up;

pub const OPENWEATHER_API_BASE: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_LANGUAGE: &str = "zh_tw";

/// Source of weather readings. All temperatures are Celsius.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_current_by_city(&self, city: &str) -> Result<WeatherSnapshot, WeatherError>;

    async fn fetch_current_by_coords(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSnapshot, WeatherError>;

    async fn fetch_detail_by_city(&self, city: &str) -> Result<WeatherDetail, WeatherError>;

    async fn fetch_forecast_by_city(&self, city: &str) -> Result<Forecast, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
    language: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, WeatherError> {
        Self::with_base_url(api_key, OPENWEATHER_API_BASE, timeout)
    }

    pub fn with_base_url(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        })
    }

    /// Language for the condition descriptions
    pub fn set_language(&mut self, language: &str) {
        self.language = language.to_string();
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        location: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut query: Vec<(&str, String)> = location.to_vec();
        query.push(("units", "metric".to_string()));
        query.push(("appid", self.api_key.clone()));
        query.push(("lang", self.language.clone()));

        tracing::debug!("GET {} {:?}", url, location);
        let response = self.client.get(&url).query(&query).send().await?;
        self.handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, WeatherError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(format!("JSON parse error: {}", e)))
        } else {
            Err(WeatherError::Http {
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherProvider {
    #[instrument(skip(self), level = "info")]
    async fn fetch_current_by_city(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let raw: ApiCurrent = self.get("weather", &[("q", city.to_string())]).await?;
        raw.into_snapshot()
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_current_by_coords(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let raw: ApiCurrent = self
            .get(
                "weather",
                &[("lat", latitude.to_string()), ("lon", longitude.to_string())],
            )
            .await?;
        raw.into_snapshot()
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_detail_by_city(&self, city: &str) -> Result<WeatherDetail, WeatherError> {
        let raw: ApiCurrent = self.get("weather", &[("q", city.to_string())]).await?;
        raw.into_detail()
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_forecast_by_city(&self, city: &str) -> Result<Forecast, WeatherError> {
        let raw: ApiForecast = self.get("forecast", &[("q", city.to_string())]).await?;
        raw.into_forecast()
    }
}

// --- wire format ---

#[derive(Debug, Deserialize)]
struct ApiCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: u32,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct ApiWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct ApiClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct ApiAccumulation {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

impl From<ApiAccumulation> for Accumulation {
    fn from(raw: ApiAccumulation) -> Self {
        Self {
            last_hour: raw.one_hour,
            last_three_hours: raw.three_hours,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiSys {
    #[serde(default)]
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct ApiCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct ApiCurrent {
    name: String,
    weather: Vec<ApiCondition>,
    main: ApiMain,
    wind: ApiWind,
    #[serde(default)]
    clouds: ApiClouds,
    visibility: Option<u32>,
    rain: Option<ApiAccumulation>,
    snow: Option<ApiAccumulation>,
    uvi: Option<f64>,
    dt: i64,
    sys: ApiSys,
    #[serde(default)]
    timezone: i32,
}

impl ApiCurrent {
    fn into_snapshot(self) -> Result<WeatherSnapshot, WeatherError> {
        self.into_detail().map(|detail| detail.snapshot)
    }

    fn into_detail(self) -> Result<WeatherDetail, WeatherError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::Parse("response has no weather condition".into()))?;

        Ok(WeatherDetail {
            snapshot: WeatherSnapshot {
                city: self.name,
                country: self.sys.country,
                temperature: round_half_up(self.main.temp),
                feels_like: round_half_up(self.main.feels_like),
                humidity: self.main.humidity,
                wind_speed: self.wind.speed,
                description: condition.description,
                icon: condition.icon,
                observed_at: timestamp(self.dt)?,
                utc_offset_secs: self.timezone,
                display: None,
            },
            sunrise: timestamp(self.sys.sunrise)?,
            sunset: timestamp(self.sys.sunset)?,
            pressure: self.main.pressure,
            visibility: self.visibility,
            clouds: self.clouds.all,
            uv_index: self.uvi,
            rain: self.rain.map(Accumulation::from),
            snow: self.snow.map(Accumulation::from),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiForecastItem {
    dt: i64,
    main: ApiMain,
    weather: Vec<ApiCondition>,
    #[serde(default)]
    clouds: ApiClouds,
    wind: ApiWind,
    #[serde(default)]
    pop: f64,
    rain: Option<ApiAccumulation>,
    dt_txt: String,
}

#[derive(Debug, Deserialize)]
struct ApiForecastCity {
    id: i64,
    name: String,
    coord: ApiCoord,
    #[serde(default)]
    country: String,
    #[serde(default)]
    timezone: i32,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct ApiForecast {
    list: Vec<ApiForecastItem>,
    city: ApiForecastCity,
}

impl ApiForecast {
    fn into_forecast(self) -> Result<Forecast, WeatherError> {
        let entries = self
            .list
            .into_iter()
            .map(ApiForecastItem::into_entry)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Forecast {
            city: ForecastCity {
                id: self.city.id,
                name: self.city.name,
                country: self.city.country,
                coordinates: Coordinates {
                    latitude: self.city.coord.lat,
                    longitude: self.city.coord.lon,
                },
                utc_offset_secs: self.city.timezone,
                sunrise: timestamp(self.city.sunrise)?,
                sunset: timestamp(self.city.sunset)?,
            },
            entries,
        })
    }
}

impl ApiForecastItem {
    fn into_entry(self) -> Result<ForecastEntry, WeatherError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::Parse(format!("forecast entry {} has no weather condition", self.dt_txt)))?;
        let local_time = NaiveDateTime::parse_from_str(&self.dt_txt, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| WeatherError::Parse(format!("invalid dt_txt {:?}: {}", self.dt_txt, e)))?;

        Ok(ForecastEntry {
            timestamp: timestamp(self.dt)?,
            local_time,
            temperature: self.main.temp,
            temp_min: self.main.temp_min,
            temp_max: self.main.temp_max,
            feels_like: self.main.feels_like,
            humidity: self.main.humidity,
            pressure: self.main.pressure,
            description: condition.description,
            icon: condition.icon,
            wind_speed: self.wind.speed,
            clouds: self.clouds.all,
            pop: self.pop,
            rain_3h: self.rain.and_then(|r| r.three_hours),
        })
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| WeatherError::Parse(format!("invalid timestamp {}", secs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn current_body() -> serde_json::Value {
        serde_json::json!({
            "coord": {"lon": 121.5319, "lat": 25.0478},
            "weather": [{"id": 803, "main": "Clouds", "description": "多雲", "icon": "04d"}],
            "main": {
                "temp": 28.6, "feels_like": 32.4, "temp_min": 27.1, "temp_max": 29.9,
                "pressure": 1009, "humidity": 74
            },
            "visibility": 10000,
            "wind": {"speed": 3.6, "deg": 120},
            "clouds": {"all": 75},
            "rain": {"1h": 0.25},
            "dt": 1717228800,
            "sys": {"country": "TW", "sunrise": 1717190100, "sunset": 1717239300},
            "timezone": 28800,
            "name": "Taipei",
            "cod": 200
        })
    }

    fn forecast_body() -> serde_json::Value {
        serde_json::json!({
            "cod": "200",
            "cnt": 2,
            "list": [
                {
                    "dt": 1717232400,
                    "main": {"temp": 29.1, "feels_like": 33.0, "temp_min": 28.2, "temp_max": 29.1, "pressure": 1008, "humidity": 70},
                    "weather": [{"id": 500, "main": "Rain", "description": "小雨", "icon": "10d"}],
                    "clouds": {"all": 90},
                    "wind": {"speed": 4.2},
                    "pop": 0.62,
                    "rain": {"3h": 1.3},
                    "dt_txt": "2024-06-01 09:00:00"
                },
                {
                    "dt": 1717243200,
                    "main": {"temp": 27.0, "feels_like": 30.1, "temp_min": 26.5, "temp_max": 27.0, "pressure": 1009, "humidity": 78},
                    "weather": [{"id": 804, "main": "Clouds", "description": "陰，多雲", "icon": "04n"}],
                    "clouds": {"all": 100},
                    "wind": {"speed": 3.1},
                    "pop": 0.2,
                    "dt_txt": "2024-06-01 12:00:00"
                }
            ],
            "city": {
                "id": 1668341, "name": "Taipei", "coord": {"lat": 25.0478, "lon": 121.5319},
                "country": "TW", "timezone": 28800, "sunrise": 1717190100, "sunset": 1717239300
            }
        })
    }

    fn provider(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::with_base_url("test_key", &server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_current_by_city() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Taipei"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "test_key"))
            .and(query_param("lang", "zh_tw"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .mount(&mock_server)
            .await;

        let snapshot = provider(&mock_server).fetch_current_by_city("Taipei").await.unwrap();

        assert_eq!(snapshot.city, "Taipei");
        assert_eq!(snapshot.country, "TW");
        assert_eq!(snapshot.temperature, 29.0);
        assert_eq!(snapshot.feels_like, 32.0);
        assert_eq!(snapshot.humidity, 74);
        assert_eq!(snapshot.description, "多雲");
        assert!(snapshot.display.is_none());
    }

    #[tokio::test]
    async fn test_current_by_coords() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("lat", "25.03"))
            .and(query_param("lon", "121.56"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .mount(&mock_server)
            .await;

        let snapshot = provider(&mock_server)
            .fetch_current_by_coords(25.03, 121.56)
            .await
            .unwrap();
        assert_eq!(snapshot.city, "Taipei");
    }

    #[tokio::test]
    async fn test_detail_fields() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .mount(&mock_server)
            .await;

        let detail = provider(&mock_server).fetch_detail_by_city("Taipei").await.unwrap();
        assert_eq!(detail.pressure, 1009);
        assert_eq!(detail.visibility_km(), Some(10.0));
        assert_eq!(detail.clouds, 75);
        assert_eq!(detail.rain.and_then(|r| r.last_hour), Some(0.25));
        assert!(detail.snow.is_none());
        assert!(detail.uv_index.is_none());
    }

    #[tokio::test]
    async fn test_not_found_carries_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "cod": "404", "message": "city not found"
            })))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server)
            .fetch_current_by_city("InvalidCityXYZ")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP error! Status: 404");
    }

    #[tokio::test]
    async fn test_forecast_parses_entries() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("q", "Taipei"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .mount(&mock_server)
            .await;

        let forecast = provider(&mock_server).fetch_forecast_by_city("Taipei").await.unwrap();
        assert_eq!(forecast.city.id, 1668341);
        assert_eq!(forecast.city.utc_offset_secs, 28800);
        assert_eq!(forecast.entries.len(), 2);
        assert_eq!(forecast.entries[0].rain_3h, Some(1.3));
        assert_eq!(forecast.entries[1].rain_3h, None);
        assert_eq!(forecast.entries[1].local_time.to_string(), "2024-06-01 12:00:00");
    }

    #[tokio::test]
    async fn test_missing_condition_is_parse_error() {
        let mock_server = MockServer::start().await;
        let mut body = current_body();
        body["weather"] = serde_json::json!([]);

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server).fetch_current_by_city("Taipei").await.unwrap_err();
        assert!(matches!(err, WeatherError::Parse(_)));
    }
}
