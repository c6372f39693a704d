use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::{AqiCategory, UvCategory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country_code: String,
    pub lat: f64,
    pub lon: f64,
}

/// Current conditions for one location, as returned by a single provider call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: Location,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub visibility: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub cloudiness: f64,
    pub condition_category: String,
    pub condition_description: String,
    pub condition_icon: String,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub cloudiness: f64,
    pub visibility: Option<f64>,
    pub precipitation_probability: f64,
    pub condition_category: String,
    pub condition_description: String,
    pub condition_icon: String,
}

/// One calendar day of forecast entries, aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub min_temp: f64,
    pub max_temp: f64,
    pub avg_temp: f64,
    pub representative_condition: String,
    pub representative_icon: String,
}

/// Where a displayed value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Measured,
    /// Placeholder shown because the upstream call failed.
    Degraded,
    /// Heuristic guess shown because the upstream call failed.
    Estimated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySample {
    pub pm2_5: Option<f64>,
    pub aqi: u16,
    pub category: AqiCategory,
    pub source: DataSource,
}

impl AirQualitySample {
    pub fn from_pm25(pm2_5: f64) -> Self {
        let aqi = crate::metrics::pm25_to_aqi(pm2_5);
        Self {
            pm2_5: Some(pm2_5),
            aqi,
            category: crate::metrics::aqi_category(aqi),
            source: DataSource::Measured,
        }
    }

    pub fn degraded() -> Self {
        Self {
            pm2_5: None,
            aqi: 50,
            category: AqiCategory::Moderate,
            source: DataSource::Degraded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvReading {
    pub index: f64,
    pub category: UvCategory,
    pub source: DataSource,
}

impl UvReading {
    pub fn measured(index: f64) -> Self {
        Self {
            index,
            category: crate::metrics::uv_category(index),
            source: DataSource::Measured,
        }
    }

    pub fn estimated(index: f64) -> Self {
        Self {
            index,
            category: crate::metrics::uv_category(index),
            source: DataSource::Estimated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub name: String,
    pub country_code: String,
    pub lat: f64,
    pub lon: f64,
    pub last_known_temp: f64,
}

impl SavedLocation {
    pub fn from_snapshot(snapshot: &WeatherSnapshot) -> Self {
        Self {
            name: snapshot.location.name.clone(),
            country_code: snapshot.location.country_code.clone(),
            lat: snapshot.location.lat,
            lon: snapshot.location.lon,
            last_known_temp: snapshot.temperature,
        }
    }
}
