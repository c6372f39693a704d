use serde::{Deserialize, Serialize};
use std::env;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub openweather_api_key: String,
    pub openweather_base_url: String,
    pub openweather_weather_path: String,
    pub openweather_forecast3h_path: String,
    pub openweather_air_pollution_path: String,
    pub openweather_onecall_path: String,
    pub bind_addr: String,
    pub static_dir: String,
    pub dashboard_api_base: String,
    pub preferences_database_url: String,
    pub app_timezone: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config {
            openweather_api_key: env::var("OPENWEATHER_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENWEATHER_API_KEY not set"))?,
            openweather_base_url: env::var("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org".to_string()),
            openweather_weather_path: env::var("OPENWEATHER_WEATHER_PATH")
                .unwrap_or_else(|_| "/data/2.5/weather".to_string()),
            openweather_forecast3h_path: env::var("OPENWEATHER_FORECAST3H_PATH")
                .unwrap_or_else(|_| "/data/2.5/forecast".to_string()),
            openweather_air_pollution_path: env::var("OPENWEATHER_AIR_POLLUTION_PATH")
                .unwrap_or_else(|_| "/data/2.5/air_pollution".to_string()),
            openweather_onecall_path: env::var("OPENWEATHER_ONECALL_PATH")
                .unwrap_or_else(|_| "/data/2.5/onecall".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| ".".to_string()),
            dashboard_api_base: env::var("DASHBOARD_API_BASE")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            preferences_database_url: env::var("PREFERENCES_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./weather_dashboard.db?mode=rwc".to_string()),
            app_timezone: env::var("APP_TIMEZONE").unwrap_or_else(|_| "UTC".to_string()),
        };

        config.timezone()?;

        Ok(config)
    }

    /// Observer timezone used for calendar-day bucketing and local clock labels.
    pub fn timezone(&self) -> anyhow::Result<chrono_tz::Tz> {
        self.app_timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| anyhow::anyhow!("Invalid APP_TIMEZONE: {}", self.app_timezone))
    }

    /// Configuration pointing every upstream path at `base_url`, for tests.
    pub fn for_upstream(base_url: &str) -> Self {
        Self {
            openweather_api_key: "test-key".to_string(),
            openweather_base_url: base_url.to_string(),
            openweather_weather_path: "/data/2.5/weather".to_string(),
            openweather_forecast3h_path: "/data/2.5/forecast".to_string(),
            openweather_air_pollution_path: "/data/2.5/air_pollution".to_string(),
            openweather_onecall_path: "/data/2.5/onecall".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            static_dir: ".".to_string(),
            dashboard_api_base: "http://localhost:3000".to_string(),
            preferences_database_url: "sqlite::memory:".to_string(),
            app_timezone: "UTC".to_string(),
        }
    }
}
