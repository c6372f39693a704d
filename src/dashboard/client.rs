use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::forecast::types::{
    AirPollutionResponse, CurrentWeatherResponse, Forecast3hResponse, OneCallResponse,
};
use crate::model::{AirQualitySample, ForecastEntry, WeatherSnapshot};
use crate::preferences::PreferenceError;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("{0}")]
    MissingParameter(&'static str),
    #[error("Weather service returned HTTP {status}")]
    Upstream { status: u16, body: Value },
    #[error("Weather service unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Unexpected weather payload: {0}")]
    Decode(String),
    #[error(transparent)]
    Preferences(#[from] PreferenceError),
    #[error("No weather data loaded")]
    NoSnapshot,
    #[error("Please save at least {required} locations to compare weather")]
    NotEnoughLocations { required: usize },
}

/// HTTP client for the dashboard's own proxy endpoints.
#[derive(Clone)]
pub struct DashboardClient {
    client: Client,
    base_url: String,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, DashboardError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(DashboardError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        serde_json::from_value(body).map_err(|e| DashboardError::Decode(format!("{}: {}", path, e)))
    }

    fn coordinates(lat: f64, lon: f64) -> [(&'static str, String); 2] {
        [("lat", lat.to_string()), ("lon", lon.to_string())]
    }

    pub async fn current_by_city(&self, city: &str) -> Result<WeatherSnapshot, DashboardError> {
        let response: CurrentWeatherResponse = self
            .get("/api/weather", &[("city", city.to_string())])
            .await?;
        Ok(WeatherSnapshot::from(&response))
    }

    pub async fn current_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<WeatherSnapshot, DashboardError> {
        let response: CurrentWeatherResponse = self
            .get("/api/weather", &Self::coordinates(lat, lon))
            .await?;
        Ok(WeatherSnapshot::from(&response))
    }

    pub async fn forecast(&self, lat: f64, lon: f64) -> Result<Vec<ForecastEntry>, DashboardError> {
        let response: Forecast3hResponse = self
            .get("/api/forecast", &Self::coordinates(lat, lon))
            .await?;
        Ok(response.entries())
    }

    pub async fn air_quality(&self, lat: f64, lon: f64) -> Result<AirQualitySample, DashboardError> {
        let response: AirPollutionResponse = self
            .get("/api/air-pollution", &Self::coordinates(lat, lon))
            .await?;

        response
            .pm2_5()
            .map(AirQualitySample::from_pm25)
            .ok_or_else(|| DashboardError::Decode("air pollution list is empty".to_string()))
    }

    pub async fn uv_index(&self, lat: f64, lon: f64) -> Result<f64, DashboardError> {
        let response: OneCallResponse = self
            .get("/api/onecall", &Self::coordinates(lat, lon))
            .await?;
        Ok(response.current.uvi)
    }
}
