//! OpenWeatherMap wire payloads and their conversion into dashboard models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ForecastEntry, Location, WeatherSnapshot};

/// Visibility reported when the provider omits the field.
pub const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherDescriptor {
    pub id: i32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    #[serde(default)]
    pub deg: f64,
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Clouds {
    pub all: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentSys {
    #[serde(default)]
    pub country: String,
    pub sunrise: i64,
    pub sunset: i64,
}

/// `/data/2.5/weather`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeatherResponse {
    pub coord: Coord,
    #[serde(default)]
    pub weather: Vec<WeatherDescriptor>,
    pub main: MainReadings,
    pub visibility: Option<f64>,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub clouds: Clouds,
    pub dt: i64,
    pub sys: CurrentSys,
    #[serde(default)]
    pub timezone: i32,
    pub name: String,
}

/// `/data/2.5/forecast`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast3hResponse {
    pub cnt: i32,
    pub list: Vec<Forecast3hItem>,
    pub city: Option<Forecast3hCity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast3hItem {
    pub dt: i64,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<WeatherDescriptor>,
    #[serde(default)]
    pub clouds: Clouds,
    #[serde(default)]
    pub wind: Wind,
    pub visibility: Option<f64>,
    #[serde(default)]
    pub pop: f64,
    pub dt_txt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast3hCity {
    pub name: String,
    pub coord: Coord,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub timezone: i32,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// `/data/2.5/air_pollution`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirPollutionResponse {
    pub list: Vec<AirPollutionItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirPollutionItem {
    pub dt: i64,
    pub main: AirPollutionIndex,
    pub components: PollutantComponents,
}

/// The provider's own 1-5 index; the dashboard computes its own AQI instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirPollutionIndex {
    pub aqi: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollutantComponents {
    pub co: Option<f64>,
    pub no: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub so2: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub nh3: Option<f64>,
}

/// `/data/2.5/onecall` with everything but `current` excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneCallResponse {
    pub current: OneCallCurrent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneCallCurrent {
    #[serde(default)]
    pub uvi: f64,
}

fn epoch_to_utc(epoch: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(epoch, 0).unwrap_or_default()
}

fn primary_descriptor(weather: &[WeatherDescriptor]) -> (String, String, String) {
    weather
        .first()
        .map(|w| (w.main.clone(), w.description.clone(), w.icon.clone()))
        .unwrap_or_default()
}

impl From<&CurrentWeatherResponse> for WeatherSnapshot {
    fn from(response: &CurrentWeatherResponse) -> Self {
        let (category, description, icon) = primary_descriptor(&response.weather);

        Self {
            location: Location {
                name: response.name.clone(),
                country_code: response.sys.country.clone(),
                lat: response.coord.lat,
                lon: response.coord.lon,
            },
            timestamp: epoch_to_utc(response.dt),
            temperature: response.main.temp,
            feels_like: response.main.feels_like,
            temp_min: response.main.temp_min,
            temp_max: response.main.temp_max,
            humidity: response.main.humidity,
            pressure: response.main.pressure,
            visibility: response.visibility.unwrap_or(DEFAULT_VISIBILITY_M),
            wind_speed: response.wind.speed,
            wind_direction: response.wind.deg,
            cloudiness: response.clouds.all,
            condition_category: category,
            condition_description: description,
            condition_icon: icon,
            sunrise: epoch_to_utc(response.sys.sunrise),
            sunset: epoch_to_utc(response.sys.sunset),
        }
    }
}

impl From<&Forecast3hItem> for ForecastEntry {
    fn from(item: &Forecast3hItem) -> Self {
        let (category, description, icon) = primary_descriptor(&item.weather);

        Self {
            timestamp: epoch_to_utc(item.dt),
            temperature: item.main.temp,
            feels_like: item.main.feels_like,
            temp_min: item.main.temp_min,
            temp_max: item.main.temp_max,
            humidity: item.main.humidity,
            pressure: item.main.pressure,
            wind_speed: item.wind.speed,
            wind_direction: item.wind.deg,
            cloudiness: item.clouds.all,
            visibility: item.visibility,
            precipitation_probability: item.pop.clamp(0.0, 1.0),
            condition_category: category,
            condition_description: description,
            condition_icon: icon,
        }
    }
}

impl Forecast3hResponse {
    pub fn entries(&self) -> Vec<ForecastEntry> {
        self.list.iter().map(ForecastEntry::from).collect()
    }
}

impl AirPollutionResponse {
    /// PM2.5 of the first sample; a missing component reads as zero.
    pub fn pm2_5(&self) -> Option<f64> {
        self.list
            .first()
            .map(|item| item.components.pm2_5.unwrap_or(0.0))
    }
}
