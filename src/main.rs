use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use skycast_core::{App, ThemeMode};
use skycast_ui::{DetailModel, ForecastModel, HomeModel, SearchModel, SettingsModel};
use skycast_weather::{
    format_temperature, Coordinates, DailyForecastSummary, FixedLocation, TemperatureUnit,
    WeatherDetail, WeatherSnapshot, WeatherSource,
};
use tokio::runtime::Handle;

#[derive(Parser)]
#[command(name = "skycast")]
#[command(about = "Current conditions, details and five-day forecasts", long_about = None)]
struct Cli {
    /// OpenWeatherMap API key, replacing `weather.api_key` from the config file
    #[arg(long, global = true, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Weather for the default city, or for a position
    Home {
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    /// Current conditions for a city
    Search { city: String },
    /// Detailed conditions for a city
    Detail { city: String },
    /// Five-day forecast for a city
    Forecast {
        city: String,
        /// Day to expand, 0 is the first
        #[arg(long, default_value_t = 0)]
        day: usize,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Pick the default city by id (taipei, tokyo, new_york, london, sydney)
    City { id: String },
    /// celsius or fahrenheit
    Unit { unit: String },
    /// Flip whether the home screen starts from the current position
    ToggleLocation,
    /// light, dark or system
    Theme { mode: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    skycast_core::init()?;
    let cli = Cli::parse();

    let app = App::new(cli.api_key)?;
    app.initialize().await?;
    tracing::info!("SkyCast started (config in {})", app.config().config_dir.display());

    let result = run(&app, cli.command).await;
    app.shutdown()?;
    result
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Home { lat, lon } => home(app, lat.zip(lon)).await,
        Command::Search { city } => search(app, &city).await,
        Command::Detail { city } => detail(app, &city).await,
        Command::Forecast { city, day } => forecast(app, &city, day).await,
        Command::Settings { action } => settings(app, action).await,
    }
}

fn weather_source(app: &App) -> Result<Arc<dyn WeatherSource>> {
    match app.weather_provider() {
        Ok(provider) => Ok(Arc::new(provider)),
        Err(e) => {
            eprintln!("{}", e.user_message());
            Err(e.into())
        }
    }
}

async fn home(app: &App, position: Option<(f64, f64)>) -> Result<()> {
    let position = position.map(|(latitude, longitude)| Coordinates { latitude, longitude });
    let mut model = HomeModel::new(
        Handle::current(),
        weather_source(app)?,
        Arc::new(FixedLocation::new(position)),
        app.config().location.options(),
        app.settings(),
    );

    model.start();
    if position.is_some() && !model.using_current_location() {
        model.toggle_location_mode();
    }
    model.settle().await;

    if let Some(e) = model.location_error() {
        eprintln!("{}", e);
    }
    match (model.weather(), model.error()) {
        (Some(weather), _) => print_snapshot(weather),
        (None, Some(message)) => bail!("{}", message),
        (None, None) => {}
    }
    Ok(())
}

async fn search(app: &App, city: &str) -> Result<()> {
    let mut model = SearchModel::new(Handle::current(), weather_source(app)?, app.settings());
    model.set_city(city);
    model.search();
    model.settle().await;

    match (model.weather(), model.error()) {
        (Some(weather), _) => print_snapshot(weather),
        (None, Some(message)) => bail!("{}", message),
        (None, None) => {}
    }
    Ok(())
}

async fn detail(app: &App, city: &str) -> Result<()> {
    let mut model = DetailModel::new(Handle::current(), weather_source(app)?, app.settings(), city);
    model.load();
    model.settle().await;

    match (model.detail(), model.error()) {
        (Some(detail), _) => print_detail(detail, model.uv_label()),
        (None, Some(message)) => bail!("{}", message),
        (None, None) => {}
    }
    Ok(())
}

async fn forecast(app: &App, city: &str, day: usize) -> Result<()> {
    let mut model = ForecastModel::new(Handle::current(), weather_source(app)?, app.settings(), city);
    model.load();
    model.settle().await;

    if let Some(message) = model.error() {
        bail!("{}", message);
    }
    if !model.select_day(day) {
        eprintln!("Day {} is out of range, showing day 0", day);
    }

    if let Some(city) = model.forecast_city() {
        println!("{}, {}", city.name, city.country);
    }
    for (index, summary) in model.days().iter().enumerate() {
        let marker = if index == model.selected_index() { '>' } else { ' ' };
        println!(
            "{} {}  {}{} / {}{}  {}  降雨 {}%",
            marker,
            summary.display_date,
            summary.max_temp,
            summary.unit_symbol(),
            summary.min_temp,
            summary.unit_symbol(),
            summary.description,
            summary.pop
        );
    }
    if let Some(selected) = model.selected_day() {
        print_day(selected);
    }
    Ok(())
}

async fn settings(app: &App, action: Option<SettingsAction>) -> Result<()> {
    let mut model = SettingsModel::new(app.settings(), app.theme());

    match action {
        None => {}
        Some(SettingsAction::City { id }) => {
            if !model.select_city_by_id(&id).await {
                let ids: Vec<&str> = model.available_cities().iter().map(|c| c.id.as_str()).collect();
                bail!("Unknown city id {:?}; choose one of {}", id, ids.join(", "));
            }
        }
        Some(SettingsAction::Unit { unit }) => match TemperatureUnit::from_name(&unit) {
            Some(unit) => model.set_temperature_unit(unit).await,
            None => bail!("Unknown unit {:?}; use celsius or fahrenheit", unit),
        },
        Some(SettingsAction::ToggleLocation) => model.toggle_use_current_location().await,
        Some(SettingsAction::Theme { mode }) => match ThemeMode::parse(&mode) {
            Some(mode) => model.set_theme_mode(mode).await,
            None => bail!("Unknown theme {:?}; use light, dark or system", mode),
        },
    }

    let current = model.settings();
    println!(
        "Default city: {}, {}",
        current.default_city.name, current.default_city.country
    );
    println!("Temperature unit: {}", current.temperature_unit.symbol());
    println!(
        "Use current location by default: {}",
        current.use_current_location_by_default
    );
    println!("Theme: {}", model.theme_mode().as_str());
    Ok(())
}

fn print_snapshot(weather: &WeatherSnapshot) {
    let unit = weather.temperature_unit().unwrap_or("°C");
    println!("{}, {}  {}", weather.city, weather.country, weather.observation_date());
    println!(
        "{}{}  {} ({})",
        weather.shown_temperature(),
        unit,
        weather.description,
        weather.icon_name()
    );
    println!("體感溫度 {}{}", weather.shown_feels_like(), unit);
    println!("濕度 {}%  風速 {} m/s", weather.humidity, weather.wind_speed);
}

fn print_detail(detail: &WeatherDetail, uv_label: Option<&str>) {
    print_snapshot(&detail.snapshot);
    println!("氣壓 {} hPa  雲量 {}%", detail.pressure, detail.clouds);
    if let Some(km) = detail.visibility_km() {
        println!("能見度 {:.1} km", km);
    }
    println!("日出 {}  日落 {}", detail.sunrise_local(), detail.sunset_local());
    if let (Some(uvi), Some(label)) = (detail.uv_index, uv_label) {
        println!("紫外線指數 {} {}", uvi, label);
    }
    if let Some(mm) = detail.rain.and_then(|r| r.last_hour) {
        println!("降雨 (1h) {} mm", mm);
    }
    if let Some(mm) = detail.snow.and_then(|s| s.last_hour) {
        println!("降雪 (1h) {} mm", mm);
    }
}

fn print_day(day: &DailyForecastSummary) {
    println!();
    println!("{}  {}", day.display_date, day.description);
    println!(
        "濕度 {}%  風速 {} m/s  降雨機率 {}%",
        day.humidity, day.wind_speed, day.pop
    );
    for entry in &day.entries {
        println!(
            "  {}  {}  {}",
            entry.local_time.format("%H:%M"),
            format_temperature(entry.temperature, day.temperature_unit),
            entry.description
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_flag_is_global() {
        let cli = Cli::try_parse_from(["skycast", "search", "Taipei", "--api-key", "abc123"]).unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("abc123"));
        assert!(matches!(cli.command, Command::Search { city } if city == "Taipei"));
    }

    #[test]
    fn settings_action_is_optional() {
        let cli = Cli::try_parse_from(["skycast", "--api-key", "abc123", "settings"]).unwrap();
        assert!(matches!(cli.command, Command::Settings { action: None }));
    }
}
