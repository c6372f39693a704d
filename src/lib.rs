pub mod alerts;
pub mod config;
pub mod dashboard;
pub mod forecast;
pub mod metrics;
pub mod model;
pub mod preferences;
pub mod routes;
pub mod units;
