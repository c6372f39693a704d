use crate::config::Config;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenWeatherError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Upstream returned HTTP {status} with a body that is not JSON")]
    InvalidBody { status: u16 },
}

/// Upstream endpoints reachable through the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CurrentWeather,
    Forecast3h,
    AirPollution,
    OneCall,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CurrentWeather => "weather",
            Self::Forecast3h => "forecast",
            Self::AirPollution => "air-pollution",
            Self::OneCall => "onecall",
        }
    }

    fn path<'a>(&self, config: &'a Config) -> &'a str {
        match self {
            Self::CurrentWeather => &config.openweather_weather_path,
            Self::Forecast3h => &config.openweather_forecast3h_path,
            Self::AirPollution => &config.openweather_air_pollution_path,
            Self::OneCall => &config.openweather_onecall_path,
        }
    }

    /// Parameters the proxy always adds for this endpoint.
    fn fixed_params(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::CurrentWeather | Self::Forecast3h => &[("units", "metric")],
            Self::AirPollution => &[],
            Self::OneCall => &[("exclude", "minutely,hourly,daily,alerts")],
        }
    }
}

/// Upstream status and JSON body, passed back to the caller untouched.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct OpenWeatherClient {
    client: Client,
    config: Config,
}

impl OpenWeatherClient {
    pub fn new(config: Config) -> Result<Self, OpenWeatherError> {
        let client = Client::builder()
            .user_agent("WeatherDashboard/1.0")
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, config })
    }

    /// Forward one request upstream, injecting the API key.
    ///
    /// Non-2xx statuses are not errors here: they come back in the
    /// [`UpstreamResponse`] so the proxy can relay them verbatim.
    pub async fn forward(
        &self,
        endpoint: Endpoint,
        params: &[(&str, &str)],
    ) -> Result<UpstreamResponse, OpenWeatherError> {
        let url = format!(
            "{}{}",
            self.config.openweather_base_url,
            endpoint.path(&self.config)
        );

        tracing::debug!("Forwarding {} request to {}", endpoint.name(), url);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(endpoint.fixed_params())
            .query(&[("appid", self.config.openweather_api_key.as_str())])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body: Value = response
            .json()
            .await
            .map_err(|_| OpenWeatherError::InvalidBody { status })?;

        if !(200..300).contains(&status) {
            tracing::warn!("OpenWeather {} returned HTTP {}", endpoint.name(), status);
        }

        Ok(UpstreamResponse { status, body })
    }
}
