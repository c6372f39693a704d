use chrono::{NaiveDate, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::model::{DayBucket, ForecastEntry};
use crate::units::{to_display_temperature, UnitSystem};

pub const MAX_FORECAST_DAYS: usize = 5;
pub const CHART_SAMPLES: usize = 8;
pub const CARD_SAMPLES: usize = 12;

/// Group forecast entries by calendar date in `tz`.
///
/// Buckets keep the order in which their date first appears, and only the
/// first [`MAX_FORECAST_DAYS`] are returned. The representative condition is
/// the first member's, not a majority vote.
pub fn group_by_day<Tz: TimeZone>(entries: &[ForecastEntry], tz: &Tz) -> Vec<DayBucket> {
    let mut days: Vec<(NaiveDate, Vec<&ForecastEntry>)> = Vec::new();

    for entry in entries {
        let date = entry.timestamp.with_timezone(tz).date_naive();

        match days.iter_mut().find(|(d, _)| *d == date) {
            Some((_, members)) => members.push(entry),
            None => days.push((date, vec![entry])),
        }
    }

    days.into_iter()
        .take(MAX_FORECAST_DAYS)
        .map(|(date, members)| summarize_day(date, &members))
        .collect()
}

fn summarize_day(date: NaiveDate, members: &[&ForecastEntry]) -> DayBucket {
    let count = members.len() as f64;

    let temp_sum: f64 = members.iter().map(|e| e.temperature).sum();
    let min_temp = members
        .iter()
        .map(|e| e.temperature)
        .fold(f64::INFINITY, f64::min);
    let max_temp = members
        .iter()
        .map(|e| e.temperature)
        .fold(f64::NEG_INFINITY, f64::max);

    let first = members[0];

    DayBucket {
        date,
        min_temp,
        max_temp,
        avg_temp: temp_sum / count,
        representative_condition: first.condition_category.clone(),
        representative_icon: first.condition_icon.clone(),
    }
}

/// The next `n` raw forecast samples (3 hours apart), not re-bucketed.
pub fn first_n_hours(entries: &[ForecastEntry], n: usize) -> &[ForecastEntry] {
    &entries[..entries.len().min(n)]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Temperature,
    Precipitation,
    Wind,
}

impl ChartType {
    pub fn label(&self, unit_system: UnitSystem) -> String {
        match self {
            Self::Temperature => format!(
                "Temperature ({})",
                crate::units::temperature_symbol(unit_system)
            ),
            Self::Precipitation => "Precipitation (%)".to_string(),
            Self::Wind => "Wind Speed (m/s)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub chart_type: ChartType,
    pub label: String,
    pub points: Vec<ChartPoint>,
}

/// Chart data for the first [`CHART_SAMPLES`] entries, labelled by local hour.
pub fn chart_series<Tz: TimeZone>(
    entries: &[ForecastEntry],
    chart_type: ChartType,
    unit_system: UnitSystem,
    tz: &Tz,
) -> ChartSeries {
    let points = first_n_hours(entries, CHART_SAMPLES)
        .iter()
        .map(|entry| {
            let value = match chart_type {
                ChartType::Temperature => {
                    to_display_temperature(entry.temperature, unit_system) as f64
                }
                ChartType::Precipitation => entry.precipitation_probability * 100.0,
                ChartType::Wind => entry.wind_speed,
            };

            ChartPoint {
                label: format!("{}:00", entry.timestamp.with_timezone(tz).hour()),
                value,
            }
        })
        .collect();

    ChartSeries {
        chart_type,
        label: chart_type.label(unit_system),
        points,
    }
}
