use serde::{Deserialize, Serialize};

use crate::model::WeatherSnapshot;
use crate::units::{to_display_temperature, UnitSystem};

pub const HEAT_THRESHOLD_C: f64 = 35.0;
pub const FREEZE_THRESHOLD_C: f64 = 0.0;
pub const HIGH_WIND_THRESHOLD_MS: f64 = 10.0;
pub const LOW_VISIBILITY_THRESHOLD_M: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Severe,
    Extreme,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub icon: &'static str,
    pub title: String,
    pub description: String,
}

/// Advisories for the given snapshot, in rule evaluation order.
///
/// `unit_system` only affects how temperatures are worded in descriptions.
pub fn evaluate_alerts(snapshot: &WeatherSnapshot, unit_system: UnitSystem) -> Vec<Alert> {
    let mut alerts = Vec::new();

    push_alert(&mut alerts, temperature_alert(snapshot, unit_system));
    push_alert(&mut alerts, wind_alert(snapshot));
    push_alert(&mut alerts, visibility_alert(snapshot));
    push_alert(&mut alerts, precipitation_alert(snapshot));

    alerts
}

pub fn highest_severity(alerts: &[Alert]) -> Option<AlertSeverity> {
    alerts.iter().map(|a| a.severity).max()
}

fn push_alert(alerts: &mut Vec<Alert>, alert: Option<Alert>) {
    if let Some(alert) = alert {
        alerts.push(alert);
    }
}

fn temperature_alert(snapshot: &WeatherSnapshot, unit_system: UnitSystem) -> Option<Alert> {
    let shown = to_display_temperature(snapshot.temperature, unit_system);

    if snapshot.temperature > HEAT_THRESHOLD_C {
        Some(Alert {
            severity: AlertSeverity::Warning,
            icon: "fa-temperature-high",
            title: "Heat Advisory".to_string(),
            description: format!(
                "High temperature of {}°. Stay hydrated and avoid prolonged sun exposure.",
                shown
            ),
        })
    } else if snapshot.temperature < FREEZE_THRESHOLD_C {
        Some(Alert {
            severity: AlertSeverity::Warning,
            icon: "fa-temperature-low",
            title: "Cold Weather Alert".to_string(),
            description: format!(
                "Temperature is {}°. Dress warmly and protect exposed skin.",
                shown
            ),
        })
    } else {
        None
    }
}

fn wind_alert(snapshot: &WeatherSnapshot) -> Option<Alert> {
    if snapshot.wind_speed <= HIGH_WIND_THRESHOLD_MS {
        return None;
    }

    Some(Alert {
        severity: AlertSeverity::Info,
        icon: "fa-wind",
        title: "High Wind Advisory".to_string(),
        description: format!(
            "Wind speeds of {} m/s. Secure loose objects outdoors.",
            snapshot.wind_speed
        ),
    })
}

fn visibility_alert(snapshot: &WeatherSnapshot) -> Option<Alert> {
    if snapshot.visibility >= LOW_VISIBILITY_THRESHOLD_M {
        return None;
    }

    Some(Alert {
        severity: AlertSeverity::Severe,
        icon: "fa-eye-slash",
        title: "Low Visibility Warning".to_string(),
        description: format!(
            "Visibility reduced to {:.1} km. Drive carefully.",
            snapshot.visibility / 1000.0
        ),
    })
}

fn precipitation_alert(snapshot: &WeatherSnapshot) -> Option<Alert> {
    let condition = snapshot.condition_category.to_lowercase();

    if condition.contains("thunder") {
        Some(Alert {
            severity: AlertSeverity::Extreme,
            icon: "fa-cloud-bolt",
            title: "Thunderstorm Warning".to_string(),
            description: "Thunderstorms in the area. Seek shelter indoors and avoid open areas."
                .to_string(),
        })
    } else if condition.contains("rain") {
        Some(Alert {
            severity: AlertSeverity::Info,
            icon: "fa-cloud-rain",
            title: "Rain Alert".to_string(),
            description: "Rain expected. Carry an umbrella and drive carefully.".to_string(),
        })
    } else {
        None
    }
}
