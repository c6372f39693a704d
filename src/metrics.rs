use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAGNUS_A: f64 = 17.27;
const MAGNUS_B: f64 = 237.7;

/// Dew point in °C using the Magnus approximation.
///
/// Returns NaN when `humidity_pct <= 0`; callers must guard.
pub fn dew_point(temp_c: f64, humidity_pct: f64) -> f64 {
    let alpha = (MAGNUS_A * temp_c) / (MAGNUS_B + temp_c) + (humidity_pct / 100.0).ln();
    (MAGNUS_B * alpha) / (MAGNUS_A - alpha)
}

/// One linear segment of the PM2.5 to AQI mapping.
#[derive(Debug, Clone, Copy)]
pub struct Breakpoint {
    pub c_low: f64,
    pub c_high: f64,
    pub i_low: f64,
    pub i_high: f64,
}

/// US EPA PM2.5 breakpoints.
pub const PM25_BREAKPOINTS: [Breakpoint; 6] = [
    Breakpoint { c_low: 0.0, c_high: 12.0, i_low: 0.0, i_high: 50.0 },
    Breakpoint { c_low: 12.1, c_high: 35.4, i_low: 51.0, i_high: 100.0 },
    Breakpoint { c_low: 35.5, c_high: 55.4, i_low: 101.0, i_high: 150.0 },
    Breakpoint { c_low: 55.5, c_high: 150.4, i_low: 151.0, i_high: 200.0 },
    Breakpoint { c_low: 150.5, c_high: 250.4, i_low: 201.0, i_high: 300.0 },
    Breakpoint { c_low: 250.5, c_high: 500.4, i_low: 301.0, i_high: 500.0 },
];

pub const MAX_AQI: u16 = 500;

/// AQI (0-500) from a PM2.5 concentration in µg/m³.
///
/// Concentrations above the top breakpoint clamp to 500. Anything that falls
/// outside every band (negative values, the 0.1-wide gaps between published
/// bands) reads as 0.
pub fn pm25_to_aqi(pm25: f64) -> u16 {
    for bp in PM25_BREAKPOINTS.iter() {
        if pm25 >= bp.c_low && pm25 <= bp.c_high {
            let aqi = (bp.i_high - bp.i_low) / (bp.c_high - bp.c_low) * (pm25 - bp.c_low) + bp.i_low;
            return aqi.round() as u16;
        }
    }

    if pm25 > PM25_BREAKPOINTS[PM25_BREAKPOINTS.len() - 1].c_high {
        MAX_AQI
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitive => "Unhealthy for Sensitive",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }

    /// Style hook for the rendering layer.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Good => "aqi-good",
            Self::Moderate => "aqi-fair",
            Self::UnhealthyForSensitive => "aqi-moderate",
            Self::Unhealthy => "aqi-poor",
            Self::VeryUnhealthy | Self::Hazardous => "aqi-very-poor",
        }
    }
}

pub fn aqi_category(aqi: u16) -> AqiCategory {
    match aqi {
        0..=50 => AqiCategory::Good,
        51..=100 => AqiCategory::Moderate,
        101..=150 => AqiCategory::UnhealthyForSensitive,
        151..=200 => AqiCategory::Unhealthy,
        201..=300 => AqiCategory::VeryUnhealthy,
        _ => AqiCategory::Hazardous,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UvCategory {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
            Self::Extreme => "Extreme",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Low => "uv-low",
            Self::Moderate => "uv-moderate",
            Self::High => "uv-high",
            Self::VeryHigh => "uv-very-high",
            Self::Extreme => "uv-extreme",
        }
    }
}

pub fn uv_category(uvi: f64) -> UvCategory {
    let index = uvi.round().clamp(0.0, 11.0) as u8;
    match index {
        0..=2 => UvCategory::Low,
        3..=5 => UvCategory::Moderate,
        6..=7 => UvCategory::High,
        8..=10 => UvCategory::VeryHigh,
        _ => UvCategory::Extreme,
    }
}

/// Time-of-day UV guess used when the UV endpoint is unavailable.
pub fn estimate_uv_index(local_hour: u32) -> f64 {
    if (10..=16).contains(&local_hour) {
        fastrand::u8(3..=10) as f64
    } else {
        fastrand::u8(0..=2) as f64
    }
}

/// Elapsed fraction of the daylight window, clamped to [0, 1].
pub fn sun_position_fraction(
    now: DateTime<Utc>,
    sunrise: DateTime<Utc>,
    sunset: DateTime<Utc>,
) -> f64 {
    let day_length = (sunset - sunrise).num_milliseconds() as f64;
    let elapsed = (now - sunrise).num_milliseconds() as f64;

    if day_length <= 0.0 {
        return if elapsed > 0.0 { 1.0 } else { 0.0 };
    }

    (elapsed / day_length).clamp(0.0, 1.0)
}

/// Daylight duration as whole hours and remaining minutes.
pub fn day_length(sunrise: DateTime<Utc>, sunset: DateTime<Utc>) -> (i64, i64) {
    let minutes = (sunset - sunrise).num_minutes().max(0);
    (minutes / 60, minutes % 60)
}

pub const COMPASS_LABELS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

pub fn compass_label(degrees: f64) -> &'static str {
    let normalized = degrees.rem_euclid(360.0);
    let sector = (normalized / 22.5).round() as usize % COMPASS_LABELS.len();
    COMPASS_LABELS[sector]
}
