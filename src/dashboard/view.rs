//! Pure derivation of render-ready view models from dashboard state.
//!
//! Nothing here performs I/O. Every displayed temperature goes through
//! [`to_display_temperature`], so a unit toggle only needs a rebuild.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use super::controller::{DashboardState, ForecastState};
use crate::alerts::{highest_severity, Alert, AlertSeverity};
use crate::forecast::aggregate::{chart_series, first_n_hours, group_by_day, ChartSeries, CARD_SAMPLES};
use crate::metrics::{compass_label, day_length, dew_point, sun_position_fraction};
use crate::model::{AirQualitySample, DataSource, ForecastEntry, UvReading, WeatherSnapshot};
use crate::preferences::{Theme, MAX_SAVED_LOCATIONS};
use crate::units::{temperature_symbol, to_display_temperature, UnitSystem};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub theme: Theme,
    pub unit_system: UnitSystem,
    pub temperature_symbol: &'static str,
    pub loading: bool,
    pub error: Option<String>,
    pub background: Option<&'static str>,
    pub current: Option<CurrentView>,
    pub sun: Option<SunView>,
    pub alerts: Vec<Alert>,
    pub highest_alert: Option<AlertSeverity>,
    pub forecast: ForecastView,
    pub air_quality: Option<AirQualityView>,
    pub uv: Option<UvView>,
    pub saved_locations: Vec<SavedLocationView>,
    pub can_save_current_location: bool,
    pub search_history: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentView {
    pub location: String,
    pub date: String,
    pub icon: String,
    pub description: String,
    pub temperature: i32,
    pub feels_like: i32,
    pub high: i32,
    pub low: i32,
    pub humidity: f64,
    pub pressure: f64,
    pub visibility_km: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub wind_compass: &'static str,
    pub cloudiness: f64,
    /// Absent when humidity is not positive.
    pub dew_point: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SunView {
    pub sunrise: String,
    pub sunset: String,
    pub day_length: String,
    pub position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Loading,
    Ready,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastView {
    pub status: SectionStatus,
    pub days: Vec<DayCard>,
    pub hourly: Vec<HourlyCard>,
    pub chart: Option<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCard {
    pub day_name: String,
    pub date: String,
    pub high: i32,
    pub low: i32,
    pub average: i32,
    pub condition: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyCard {
    pub day_label: String,
    pub time: String,
    pub temperature: i32,
    pub feels_like: i32,
    pub icon: String,
    pub description: String,
    pub precipitation_chance: u8,
    pub wind_speed: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityView {
    pub aqi: u16,
    pub label: &'static str,
    pub css_class: &'static str,
    pub pm2_5: Option<f64>,
    pub source: DataSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UvView {
    pub index: f64,
    pub label: &'static str,
    pub css_class: &'static str,
    pub source: DataSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedLocationView {
    pub name: String,
    pub country_code: String,
    pub temperature: i32,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonCard {
    pub location: String,
    pub date: String,
    pub icon: String,
    pub description: String,
    pub temperature: i32,
    pub feels_like: i32,
    pub humidity: f64,
    pub wind_speed: f64,
    pub pressure: f64,
}

pub fn build_view(state: &DashboardState, tz: &Tz, now: DateTime<Utc>) -> DashboardView {
    let unit_system = state.preferences.unit_system;
    let snapshot = state.snapshot.as_ref();

    let saved_locations = state
        .saved_locations
        .iter()
        .map(|loc| SavedLocationView {
            name: loc.name.clone(),
            country_code: loc.country_code.clone(),
            temperature: to_display_temperature(loc.last_known_temp, unit_system),
            is_current: snapshot.is_some_and(|s| s.location.name == loc.name),
        })
        .collect::<Vec<_>>();

    let can_save_current_location = snapshot.is_some_and(|s| {
        state.saved_locations.len() < MAX_SAVED_LOCATIONS
            && !state.saved_locations.iter().any(|l| l.name == s.location.name)
    });

    DashboardView {
        theme: state.preferences.theme,
        unit_system,
        temperature_symbol: temperature_symbol(unit_system),
        loading: state.loading,
        error: state.error.clone(),
        background: snapshot.map(|s| background_for(&s.condition_category)),
        current: snapshot.map(|s| current_view(s, unit_system, tz)),
        sun: snapshot.map(|s| sun_view(s, tz, now)),
        alerts: state.alerts.clone(),
        highest_alert: highest_severity(&state.alerts),
        forecast: forecast_view(&state.forecast, state.chart_type, unit_system, tz, now),
        air_quality: state.air_quality.as_ref().map(air_quality_view),
        uv: state.uv.as_ref().map(uv_view),
        saved_locations,
        can_save_current_location,
        search_history: state.search_history.clone(),
    }
}

/// Backdrop keyed on the primary condition.
pub fn background_for(condition: &str) -> &'static str {
    let condition = condition.to_lowercase();
    if condition.contains("cloud") {
        "clouds"
    } else if condition.contains("rain") || condition.contains("drizzle") {
        "rain"
    } else if condition.contains("snow") {
        "snow"
    } else if condition.contains("thunder") {
        "thunderstorm"
    } else {
        "clear"
    }
}

fn current_view(snapshot: &WeatherSnapshot, unit_system: UnitSystem, tz: &Tz) -> CurrentView {
    let dew = (snapshot.humidity > 0.0)
        .then(|| to_display_temperature(dew_point(snapshot.temperature, snapshot.humidity), unit_system));

    CurrentView {
        location: format!("{}, {}", snapshot.location.name, snapshot.location.country_code),
        date: snapshot
            .timestamp
            .with_timezone(tz)
            .format("%A, %B %-d, %Y")
            .to_string(),
        icon: snapshot.condition_icon.clone(),
        description: snapshot.condition_description.clone(),
        temperature: to_display_temperature(snapshot.temperature, unit_system),
        feels_like: to_display_temperature(snapshot.feels_like, unit_system),
        high: to_display_temperature(snapshot.temp_max, unit_system),
        low: to_display_temperature(snapshot.temp_min, unit_system),
        humidity: snapshot.humidity,
        pressure: snapshot.pressure,
        visibility_km: (snapshot.visibility / 100.0).round() / 10.0,
        wind_speed: snapshot.wind_speed,
        wind_direction: snapshot.wind_direction,
        wind_compass: compass_label(snapshot.wind_direction),
        cloudiness: snapshot.cloudiness,
        dew_point: dew,
    }
}

fn sun_view(snapshot: &WeatherSnapshot, tz: &Tz, now: DateTime<Utc>) -> SunView {
    let (hours, minutes) = day_length(snapshot.sunrise, snapshot.sunset);

    SunView {
        sunrise: snapshot.sunrise.with_timezone(tz).format("%H:%M").to_string(),
        sunset: snapshot.sunset.with_timezone(tz).format("%H:%M").to_string(),
        day_length: format!("{}h {}m", hours, minutes),
        position: sun_position_fraction(now, snapshot.sunrise, snapshot.sunset),
    }
}

fn forecast_view(
    forecast: &ForecastState,
    chart_type: crate::forecast::ChartType,
    unit_system: UnitSystem,
    tz: &Tz,
    now: DateTime<Utc>,
) -> ForecastView {
    let entries = match forecast {
        ForecastState::Loading => return empty_forecast(SectionStatus::Loading),
        ForecastState::Unavailable => return empty_forecast(SectionStatus::Unavailable),
        ForecastState::Ready(entries) => entries,
    };

    let days = group_by_day(entries, tz)
        .into_iter()
        .map(|day| DayCard {
            day_name: day.date.format("%a").to_string(),
            date: day.date.format("%b %-d").to_string(),
            high: to_display_temperature(day.max_temp, unit_system),
            low: to_display_temperature(day.min_temp, unit_system),
            average: to_display_temperature(day.avg_temp, unit_system),
            condition: day.representative_condition,
            icon: day.representative_icon,
        })
        .collect();

    let hourly = first_n_hours(entries, CARD_SAMPLES)
        .iter()
        .enumerate()
        .map(|(index, entry)| hourly_card(index, entry, unit_system, tz, now))
        .collect();

    ForecastView {
        status: SectionStatus::Ready,
        days,
        hourly,
        chart: Some(chart_series(entries, chart_type, unit_system, tz)),
    }
}

fn empty_forecast(status: SectionStatus) -> ForecastView {
    ForecastView {
        status,
        days: Vec::new(),
        hourly: Vec::new(),
        chart: None,
    }
}

fn hourly_card(
    index: usize,
    entry: &ForecastEntry,
    unit_system: UnitSystem,
    tz: &Tz,
    now: DateTime<Utc>,
) -> HourlyCard {
    let local = entry.timestamp.with_timezone(tz);
    let today = now.with_timezone(tz).date_naive();

    let day_label = if index == 0 {
        "Now".to_string()
    } else if local.date_naive() == today {
        "Today".to_string()
    } else if local.date_naive() == (now + Duration::days(1)).with_timezone(tz).date_naive() {
        "Tomorrow".to_string()
    } else {
        local.format("%a").to_string()
    };

    HourlyCard {
        day_label,
        time: local.format("%H:%M").to_string(),
        temperature: to_display_temperature(entry.temperature, unit_system),
        feels_like: to_display_temperature(entry.feels_like, unit_system),
        icon: entry.condition_icon.clone(),
        description: entry.condition_description.clone(),
        precipitation_chance: (entry.precipitation_probability * 100.0).round() as u8,
        wind_speed: (entry.wind_speed * 10.0).round() / 10.0,
        humidity: entry.humidity,
    }
}

fn air_quality_view(sample: &AirQualitySample) -> AirQualityView {
    AirQualityView {
        aqi: sample.aqi,
        label: sample.category.label(),
        css_class: sample.category.css_class(),
        pm2_5: sample.pm2_5,
        source: sample.source,
    }
}

fn uv_view(reading: &UvReading) -> UvView {
    UvView {
        index: (reading.index * 10.0).round() / 10.0,
        label: reading.category.label(),
        css_class: reading.category.css_class(),
        source: reading.source,
    }
}

pub fn comparison_card(
    snapshot: &WeatherSnapshot,
    unit_system: UnitSystem,
    tz: &Tz,
    now: DateTime<Utc>,
) -> ComparisonCard {
    ComparisonCard {
        location: format!("{}, {}", snapshot.location.name, snapshot.location.country_code),
        date: now.with_timezone(tz).format("%b %-d").to_string(),
        icon: snapshot.condition_icon.clone(),
        description: snapshot.condition_description.clone(),
        temperature: to_display_temperature(snapshot.temperature, unit_system),
        feels_like: to_display_temperature(snapshot.feels_like, unit_system),
        humidity: snapshot.humidity,
        wind_speed: snapshot.wind_speed,
        pressure: snapshot.pressure,
    }
}

/// Plain-text summary suitable for a share sheet or clipboard.
pub fn share_text(snapshot: &WeatherSnapshot, unit_system: UnitSystem, link: &str) -> String {
    format!(
        "🌤️ Weather in {}, {}\n\
         📍 Temperature: {}{}\n\
         ☁️ Conditions: {}\n\
         💨 Wind: {} m/s\n\
         💧 Humidity: {}%\n\
         \n\
         Check the weather at: {}",
        snapshot.location.name,
        snapshot.location.country_code,
        to_display_temperature(snapshot.temperature, unit_system),
        temperature_symbol(unit_system),
        snapshot.condition_description,
        snapshot.wind_speed,
        snapshot.humidity,
        link,
    )
}
