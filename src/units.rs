use serde::{Deserialize, Serialize};

/// Measurement system used for every displayed temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn toggled(self) -> Self {
        match self {
            Self::Metric => Self::Imperial,
            Self::Imperial => Self::Metric,
        }
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Convert a Celsius reading to the whole-degree value shown to the user.
///
/// Halves round towards positive infinity, so -2.5 shows as -2.
pub fn to_display_temperature(celsius: f64, unit_system: UnitSystem) -> i32 {
    let value = match unit_system {
        UnitSystem::Metric => celsius,
        UnitSystem::Imperial => celsius_to_fahrenheit(celsius),
    };
    (value + 0.5).floor() as i32
}

pub fn temperature_symbol(unit_system: UnitSystem) -> &'static str {
    match unit_system {
        UnitSystem::Metric => "°C",
        UnitSystem::Imperial => "°F",
    }
}
