use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::forecast::openweather::{Endpoint, OpenWeatherClient, OpenWeatherError, UpstreamResponse};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub weather_client: Arc<OpenWeatherClient>,
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("{0}")]
    MissingParameter(&'static str),
    #[error("Upstream returned HTTP {}", .0.status)]
    Upstream(UpstreamResponse),
    #[error("{message}: {source}")]
    Internal {
        message: &'static str,
        source: OpenWeatherError,
    },
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingParameter(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::Upstream(upstream) => relay(upstream),
            Self::Internal { message, source } => {
                tracing::error!("{}: {}", message, source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }
        }
    }
}

fn relay(upstream: UpstreamResponse) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(upstream.body)).into_response()
}

// Request/Response types
#[derive(Debug, Default, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CoordinatesQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

impl CoordinatesQuery {
    fn required(&self) -> Option<(&str, &str)> {
        Some((present(&self.lat)?, present(&self.lon)?))
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Empty query values count as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

async fn forward(
    state: &AppState,
    endpoint: Endpoint,
    params: &[(&str, &str)],
    failure: &'static str,
) -> Result<Response, ProxyError> {
    let upstream = state
        .weather_client
        .forward(endpoint, params)
        .await
        .map_err(|source| ProxyError::Internal {
            message: failure,
            source,
        })?;

    if upstream.is_success() {
        Ok(relay(upstream))
    } else {
        Err(ProxyError::Upstream(upstream))
    }
}

// Route handlers
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Weather Dashboard API is running".to_string(),
    })
}

pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherQuery>,
) -> Result<Response, ProxyError> {
    let failure = "Failed to fetch weather data";

    // City takes precedence when both forms are given.
    if let Some(city) = present(&params.city) {
        return forward(&state, Endpoint::CurrentWeather, &[("q", city)], failure).await;
    }

    match (present(&params.lat), present(&params.lon)) {
        (Some(lat), Some(lon)) => {
            forward(
                &state,
                Endpoint::CurrentWeather,
                &[("lat", lat), ("lon", lon)],
                failure,
            )
            .await
        }
        _ => Err(ProxyError::MissingParameter(
            "Please provide city name or coordinates",
        )),
    }
}

async fn by_coordinates(
    state: &AppState,
    params: &CoordinatesQuery,
    endpoint: Endpoint,
    failure: &'static str,
) -> Result<Response, ProxyError> {
    let (lat, lon) = params
        .required()
        .ok_or(ProxyError::MissingParameter("Please provide latitude and longitude"))?;

    forward(state, endpoint, &[("lat", lat), ("lon", lon)], failure).await
}

pub async fn get_forecast(
    State(state): State<AppState>,
    Query(params): Query<CoordinatesQuery>,
) -> Result<Response, ProxyError> {
    by_coordinates(
        &state,
        &params,
        Endpoint::Forecast3h,
        "Failed to fetch forecast data",
    )
    .await
}

pub async fn get_air_pollution(
    State(state): State<AppState>,
    Query(params): Query<CoordinatesQuery>,
) -> Result<Response, ProxyError> {
    by_coordinates(
        &state,
        &params,
        Endpoint::AirPollution,
        "Failed to fetch air pollution data",
    )
    .await
}

pub async fn get_onecall(
    State(state): State<AppState>,
    Query(params): Query<CoordinatesQuery>,
) -> Result<Response, ProxyError> {
    by_coordinates(&state, &params, Endpoint::OneCall, "Failed to fetch UV data").await
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/weather", get(get_weather))
        .route("/api/forecast", get(get_forecast))
        .route("/api/air-pollution", get(get_air_pollution))
        .route("/api/onecall", get(get_onecall))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn router_for(upstream: &str) -> Router {
        let weather_client = Arc::new(OpenWeatherClient::new(Config::for_upstream(upstream)).unwrap());
        create_router(AppState { weather_client })
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(router_for("http://127.0.0.1:9"), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_weather_missing_parameters() {
        let router = router_for("http://127.0.0.1:9");

        let (status, body) = get_json(router.clone(), "/api/weather").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please provide city name or coordinates");

        let (status, _) = get_json(router.clone(), "/api/weather?city=&lat=1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get_json(router, "/api/forecast?lat=1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please provide latitude and longitude");
    }

    #[tokio::test]
    async fn test_weather_city_takes_precedence() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Nairobi"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Nairobi"})))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = get_json(
            router_for(&server.uri()),
            "/api/weather?city=Nairobi&lat=1&lon=2",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Nairobi");
    }

    #[tokio::test]
    async fn test_upstream_error_forwarded_verbatim() {
        let server = MockServer::start().await;
        let upstream_body = json!({"cod": "404", "message": "city not found"});
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(upstream_body.clone()))
            .mount(&server)
            .await;

        let (status, body) = get_json(router_for(&server.uri()), "/api/weather?city=Atlantis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, upstream_body);
    }

    #[tokio::test]
    async fn test_coordinate_endpoints_forward() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/air_pollution"))
            .and(query_param("lat", "51.5"))
            .and(query_param("lon", "-0.12"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"list": [{"main": {"aqi": 2}, "components": {"pm2_5": 8.1}}]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/onecall"))
            .and(query_param("exclude", "minutely,hourly,daily,alerts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"current": {"uvi": 6.0}})))
            .mount(&server)
            .await;

        let router = router_for(&server.uri());
        let (status, body) =
            get_json(router.clone(), "/api/air-pollution?lat=51.5&lon=-0.12").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["list"][0]["components"]["pm2_5"], 8.1);

        let (status, body) = get_json(router, "/api/onecall?lat=51.5&lon=-0.12").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current"]["uvi"], 6.0);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_internal_error() {
        // Nothing listens on the discard port.
        let (status, body) =
            get_json(router_for("http://127.0.0.1:9"), "/api/forecast?lat=1&lon=2").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch forecast data");
    }
}
