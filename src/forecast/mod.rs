pub mod aggregate;
pub mod openweather;
pub mod types;

pub use aggregate::{chart_series, first_n_hours, group_by_day, ChartType};
pub use openweather::{Endpoint, OpenWeatherClient, OpenWeatherError, UpstreamResponse};
