//! Daily aggregation of the 3-hourly forecast.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::{ForecastEntry, TemperatureUnit};
use crate::units::{convert_celsius, round_half_up, round_to_tenth};

/// Local hours whose entry represents the day.
/// Tuning parameter; nothing else depends on the exact window.
pub const MIDDAY_HOURS: RangeInclusive<u32> = 12..=14;

/// One day of forecast, derived from that day's 3-hour entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastSummary {
    pub date: NaiveDate,
    pub display_date: String,
    pub entries: Vec<ForecastEntry>,
    /// Highest max temperature of the day, in `temperature_unit`
    pub max_temp: f64,
    /// Lowest min temperature of the day, in `temperature_unit`
    pub min_temp: f64,
    pub description: String,
    pub icon: String,
    /// Mean precipitation probability in percent
    pub pop: u8,
    /// Mean relative humidity in percent
    pub humidity: u8,
    /// Mean wind speed in m/s, one decimal
    pub wind_speed: f64,
    pub temperature_unit: TemperatureUnit,
}

impl DailyForecastSummary {
    pub fn unit_symbol(&self) -> &'static str {
        self.temperature_unit.symbol()
    }
}

/// Group entries by local calendar date and summarize each day.
///
/// Days come out in the order their first entry appears in `entries`.
pub fn aggregate_daily(entries: &[ForecastEntry], unit: TemperatureUnit) -> Vec<DailyForecastSummary> {
    let mut order: Vec<NaiveDate> = Vec::new();
    let mut buckets: HashMap<NaiveDate, Vec<&ForecastEntry>> = HashMap::new();

    for entry in entries {
        let date = entry.local_time.date();
        buckets
            .entry(date)
            .or_insert_with(|| {
                order.push(date);
                Vec::new()
            })
            .push(entry);
    }

    order
        .into_iter()
        .filter_map(|date| {
            let items = buckets.remove(&date)?;
            summarize_day(date, &items, unit)
        })
        .collect()
}

fn summarize_day(
    date: NaiveDate,
    items: &[&ForecastEntry],
    unit: TemperatureUnit,
) -> Option<DailyForecastSummary> {
    let first = items.first()?;
    let count = items.len() as f64;

    let max_temp = items.iter().map(|e| e.temp_max).fold(f64::NEG_INFINITY, f64::max);
    let min_temp = items.iter().map(|e| e.temp_min).fold(f64::INFINITY, f64::min);

    let representative = items
        .iter()
        .find(|e| MIDDAY_HOURS.contains(&e.local_time.hour()))
        .unwrap_or(first);

    let avg_pop = items.iter().map(|e| e.pop).sum::<f64>() / count;
    let avg_humidity = items.iter().map(|e| f64::from(e.humidity)).sum::<f64>() / count;
    let avg_wind = items.iter().map(|e| e.wind_speed).sum::<f64>() / count;

    Some(DailyForecastSummary {
        date,
        display_date: display_date(date),
        entries: items.iter().map(|e| (*e).clone()).collect(),
        max_temp: convert_celsius(round_half_up(max_temp), unit),
        min_temp: convert_celsius(round_half_up(min_temp), unit),
        description: representative.description.clone(),
        icon: representative.icon.clone(),
        pop: round_half_up(avg_pop * 100.0).clamp(0.0, 100.0) as u8,
        humidity: round_half_up(avg_humidity).clamp(0.0, 100.0) as u8,
        wind_speed: round_to_tenth(avg_wind),
        temperature_unit: unit,
    })
}

/// Short zh-TW date, e.g. `6月1日 週六`
pub fn display_date(date: NaiveDate) -> String {
    format!("{}月{}日 {}", date.month(), date.day(), weekday_short(date.weekday()))
}

fn weekday_short(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "週一",
        Weekday::Tue => "週二",
        Weekday::Wed => "週三",
        Weekday::Thu => "週四",
        Weekday::Fri => "週五",
        Weekday::Sat => "週六",
        Weekday::Sun => "週日",
    }
}
