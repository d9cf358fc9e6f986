//! Celsius/Fahrenheit conversion and display-unit stamping.

use crate::types::{DisplayTemperature, TemperatureUnit, WeatherDetail, WeatherSnapshot};

/// Round half toward positive infinity, so `-2.5` becomes `-2`.
pub(crate) fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// One decimal place, rounded from the exact stored value: `0.15` sits just
/// below the midpoint and gives `0.1`, exact midpoints like `0.25` round up.
pub(crate) fn round_to_tenth(value: f64) -> f64 {
    let quarters = value * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        return (value * 10.0).round() / 10.0;
    }
    format!("{:.1}", value).parse().unwrap_or(value)
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    round_half_up(celsius * 9.0 / 5.0 + 32.0)
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    round_half_up((fahrenheit - 32.0) * 5.0 / 9.0)
}

/// Convert a whole-degree Celsius reading into `unit`
pub fn convert_celsius(celsius: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius_to_fahrenheit(celsius),
    }
}

/// Format a Celsius reading for display, e.g. `23°C` or `73°F`
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    let value = match unit {
        TemperatureUnit::Celsius => round_half_up(celsius),
        TemperatureUnit::Fahrenheit => celsius_to_fahrenheit(celsius),
    };
    format!("{}{}", value, unit.symbol())
}

/// Readings that carry canonical Celsius temperatures plus a display slot.
pub trait TemperatureReading: Clone {
    fn snapshot(&self) -> &WeatherSnapshot;
    fn snapshot_mut(&mut self) -> &mut WeatherSnapshot;
}

impl TemperatureReading for WeatherSnapshot {
    fn snapshot(&self) -> &WeatherSnapshot {
        self
    }

    fn snapshot_mut(&mut self) -> &mut WeatherSnapshot {
        self
    }
}

impl TemperatureReading for WeatherDetail {
    fn snapshot(&self) -> &WeatherSnapshot {
        &self.snapshot
    }

    fn snapshot_mut(&mut self) -> &mut WeatherSnapshot {
        &mut self.snapshot
    }
}

/// Return a copy of `reading` with display temperatures in `unit`.
///
/// The input is never modified and the display values are always derived
/// from the Celsius fields, so applying a unit to an already converted
/// reading cannot double-convert.
pub fn apply_temperature_unit<T: TemperatureReading>(
    reading: Option<&T>,
    unit: TemperatureUnit,
) -> Option<T> {
    let mut processed = reading?.clone();
    let snapshot = processed.snapshot_mut();
    snapshot.display = Some(DisplayTemperature {
        temperature: convert_celsius(snapshot.temperature, unit),
        feels_like: convert_celsius(snapshot.feels_like, unit),
        unit,
    });
    Some(processed)
}
