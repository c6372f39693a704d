use chrono::{Timelike, Utc};
use chrono_tz::Tz;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::client::{DashboardClient, DashboardError};
use super::view::{build_view, comparison_card, share_text, ComparisonCard, DashboardView};
use crate::alerts::{evaluate_alerts, Alert};
use crate::config::Config;
use crate::forecast::ChartType;
use crate::metrics::estimate_uv_index;
use crate::model::{AirQualitySample, ForecastEntry, SavedLocation, UvReading, WeatherSnapshot};
use crate::preferences::{PreferenceStore, Preferences};

pub const DEFAULT_CITY: &str = "London";
pub const MIN_COMPARISON_LOCATIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ForecastState {
    #[default]
    Loading,
    Ready(Vec<ForecastEntry>),
    Unavailable,
}

/// Everything the dashboard currently shows. `None` sections are still loading.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub preferences: Preferences,
    pub chart_type: ChartType,
    pub snapshot: Option<WeatherSnapshot>,
    /// Sequence token of the lookup that produced `snapshot`.
    pub snapshot_lookup: u64,
    pub alerts: Vec<Alert>,
    pub forecast: ForecastState,
    pub air_quality: Option<AirQualitySample>,
    pub uv: Option<UvReading>,
    pub search_history: Vec<String>,
    pub saved_locations: Vec<SavedLocation>,
    pub loading: bool,
    pub error: Option<String>,
}

enum Lookup {
    City(String),
    Coordinates(f64, f64),
}

impl Lookup {
    fn failure_message(&self) -> &'static str {
        match self {
            Self::City(_) => "City not found. Please try again.",
            Self::Coordinates(..) => "Unable to fetch weather for your location",
        }
    }
}

pub struct DashboardController {
    client: DashboardClient,
    preferences: PreferenceStore,
    timezone: Tz,
    share_link: String,
    state: Mutex<DashboardState>,
    sequence: AtomicU64,
}

impl DashboardController {
    pub fn new(client: DashboardClient, preferences: PreferenceStore, timezone: Tz, share_link: &str) -> Self {
        Self {
            client,
            preferences,
            timezone,
            share_link: share_link.to_string(),
            state: Mutex::new(DashboardState::default()),
            sequence: AtomicU64::new(0),
        }
    }

    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let preferences = PreferenceStore::connect(&config.preferences_database_url).await?;

        Ok(Self::new(
            DashboardClient::new(&config.dashboard_api_base),
            preferences,
            config.timezone()?,
            &config.dashboard_api_base,
        ))
    }

    fn state(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_latest(&self, token: u64) -> bool {
        self.sequence.load(Ordering::SeqCst) == token
    }

    pub fn view(&self) -> DashboardView {
        build_view(&self.state(), &self.timezone, Utc::now())
    }

    /// Load stored preferences, then show the last searched city.
    pub async fn start(&self) -> Result<DashboardView, DashboardError> {
        let preferences = self.preferences.get_preferences().await?;
        let search_history = self.preferences.search_history().await?;
        let saved_locations = self.preferences.saved_locations().await?;

        let city = preferences
            .last_city
            .clone()
            .unwrap_or_else(|| DEFAULT_CITY.to_string());

        {
            let mut state = self.state();
            state.preferences = preferences;
            state.search_history = search_history;
            state.saved_locations = saved_locations;
        }

        tracing::info!("Dashboard starting with {}", city);
        self.lookup(Lookup::City(city)).await
    }

    pub async fn search_city(&self, city: &str) -> Result<DashboardView, DashboardError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(DashboardError::MissingParameter("Please enter a city name"));
        }

        self.lookup(Lookup::City(city.to_string())).await
    }

    pub async fn search_coordinates(&self, lat: f64, lon: f64) -> Result<DashboardView, DashboardError> {
        self.lookup(Lookup::Coordinates(lat, lon)).await
    }

    async fn lookup(&self, target: Lookup) -> Result<DashboardView, DashboardError> {
        let token = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut state = self.state();
            state.loading = true;
            state.error = None;
        }

        let result = match &target {
            Lookup::City(city) => self.client.current_by_city(city).await,
            Lookup::Coordinates(lat, lon) => self.client.current_by_coordinates(*lat, *lon).await,
        };

        if !self.is_latest(token) {
            tracing::warn!("Discarding stale weather response (lookup {})", token);
            return Ok(self.view());
        }

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("Weather lookup failed: {}", e);
                let mut state = self.state();
                state.loading = false;
                state.error = Some(target.failure_message().to_string());
                return Err(e);
            }
        };

        let (lat, lon) = (snapshot.location.lat, snapshot.location.lon);
        self.install_snapshot(snapshot.clone(), token);
        self.remember_lookup(&snapshot).await;

        let (forecast, air_quality, uv) = tokio::join!(
            self.client.forecast(lat, lon),
            self.client.air_quality(lat, lon),
            self.client.uv_index(lat, lon),
        );

        if !self.is_latest(token) {
            tracing::warn!("Discarding stale secondary data (lookup {})", token);
            return Ok(self.view());
        }

        let local_hour = Utc::now().with_timezone(&self.timezone).hour();
        let mut state = self.state();

        state.forecast = match forecast {
            Ok(entries) => ForecastState::Ready(entries),
            Err(e) => {
                tracing::warn!("Forecast unavailable: {}", e);
                ForecastState::Unavailable
            }
        };

        state.air_quality = Some(air_quality.unwrap_or_else(|e| {
            tracing::warn!("Air quality unavailable, showing placeholder: {}", e);
            AirQualitySample::degraded()
        }));

        state.uv = Some(match uv {
            Ok(index) => UvReading::measured(index),
            Err(e) => {
                tracing::warn!("UV index unavailable, estimating: {}", e);
                UvReading::estimated(estimate_uv_index(local_hour))
            }
        });

        Ok(build_view(&state, &self.timezone, Utc::now()))
    }

    fn install_snapshot(&self, snapshot: WeatherSnapshot, token: u64) {
        let mut state = self.state();
        state.snapshot_lookup = token;
        state.alerts = evaluate_alerts(&snapshot, state.preferences.unit_system);
        state.snapshot = Some(snapshot);
        state.forecast = ForecastState::Loading;
        state.air_quality = None;
        state.uv = None;
        state.loading = false;
    }

    /// Persist the resolved location name as history and last city. Storage
    /// failures here do not fail the lookup.
    async fn remember_lookup(&self, snapshot: &WeatherSnapshot) {
        let name = snapshot.location.name.as_str();

        match self.preferences.add_search_history(name).await {
            Ok(history) => self.state().search_history = history,
            Err(e) => tracing::warn!("Failed to record search history: {}", e),
        }

        if let Err(e) = self.preferences.set_last_city(name).await {
            tracing::warn!("Failed to record last city: {}", e);
        } else {
            self.state().preferences.last_city = Some(name.to_string());
        }
    }

    /// Switch units, rebuild from the held snapshot and re-request only the forecast.
    pub async fn toggle_unit_system(&self) -> Result<DashboardView, DashboardError> {
        let unit_system = self.state().preferences.unit_system.toggled();
        self.preferences.set_unit_system(unit_system).await?;

        let location = {
            let mut guard = self.state();
            let state = &mut *guard;
            state.preferences.unit_system = unit_system;
            if let Some(snapshot) = &state.snapshot {
                state.alerts = evaluate_alerts(snapshot, unit_system);
            }
            let held = state
                .snapshot
                .as_ref()
                .map(|s| (s.location.lat, s.location.lon, state.snapshot_lookup));
            held
        };

        let Some((lat, lon, lookup)) = location else {
            return Ok(self.view());
        };

        let forecast = self.client.forecast(lat, lon).await;

        let mut state = self.state();
        // A lookup that installed a newer snapshot meanwhile owns the forecast.
        if state.snapshot_lookup != lookup {
            tracing::warn!("Discarding forecast refresh for a replaced location");
        } else {
            match forecast {
                Ok(entries) => state.forecast = ForecastState::Ready(entries),
                Err(e) => tracing::warn!("Forecast refresh failed, keeping previous data: {}", e),
            }
        }

        Ok(build_view(&state, &self.timezone, Utc::now()))
    }

    pub async fn toggle_theme(&self) -> Result<DashboardView, DashboardError> {
        let theme = self.state().preferences.theme.toggled();
        self.preferences.set_theme(theme).await?;
        self.state().preferences.theme = theme;
        Ok(self.view())
    }

    pub fn set_chart_type(&self, chart_type: ChartType) -> DashboardView {
        self.state().chart_type = chart_type;
        self.view()
    }

    pub async fn save_current_location(&self) -> Result<DashboardView, DashboardError> {
        let location = self
            .state()
            .snapshot
            .as_ref()
            .map(SavedLocation::from_snapshot)
            .ok_or(DashboardError::NoSnapshot)?;

        let saved = self.preferences.add_saved_location(location).await?;
        self.state().saved_locations = saved;
        Ok(self.view())
    }

    pub async fn remove_saved_location(&self, name: &str) -> Result<DashboardView, DashboardError> {
        self.preferences.remove_saved_location_by_name(name).await?;
        let saved = self.preferences.saved_locations().await?;
        self.state().saved_locations = saved;
        Ok(self.view())
    }

    /// Fetch a fresh temperature for each saved location. Failed fetches keep
    /// the cached value.
    pub async fn refresh_saved_locations(&self) -> Result<DashboardView, DashboardError> {
        let saved = self.preferences.saved_locations().await?;

        for location in &saved {
            match self.client.current_by_coordinates(location.lat, location.lon).await {
                Ok(snapshot) => {
                    self.preferences
                        .update_saved_location_temp(&location.name, snapshot.temperature)
                        .await?;
                }
                Err(e) => tracing::warn!("Keeping cached temperature for {}: {}", location.name, e),
            }
        }

        let saved = self.preferences.saved_locations().await?;
        self.state().saved_locations = saved;
        Ok(self.view())
    }

    /// One card per saved location that could be fetched.
    pub async fn compare_saved_locations(&self) -> Result<Vec<ComparisonCard>, DashboardError> {
        let saved = self.preferences.saved_locations().await?;
        if saved.len() < MIN_COMPARISON_LOCATIONS {
            return Err(DashboardError::NotEnoughLocations {
                required: MIN_COMPARISON_LOCATIONS,
            });
        }

        let unit_system = self.state().preferences.unit_system;
        let mut cards = Vec::with_capacity(saved.len());

        for location in &saved {
            match self.client.current_by_coordinates(location.lat, location.lon).await {
                Ok(snapshot) => cards.push(comparison_card(
                    &snapshot,
                    unit_system,
                    &self.timezone,
                    Utc::now(),
                )),
                Err(e) => tracing::error!("Error fetching data for {}: {}", location.name, e),
            }
        }

        Ok(cards)
    }

    pub fn share_text(&self) -> Result<String, DashboardError> {
        let state = self.state();
        let snapshot = state.snapshot.as_ref().ok_or(DashboardError::NoSnapshot)?;
        Ok(share_text(snapshot, state.preferences.unit_system, &self.share_link))
    }

    pub async fn clear_search_history(&self) -> Result<DashboardView, DashboardError> {
        self.preferences.clear_search_history().await?;
        self.state().search_history.clear();
        Ok(self.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataSource;
    use crate::preferences::{PreferenceError, Theme};
    use crate::units::UnitSystem;
    use crate::dashboard::view::SectionStatus;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn current_payload(name: &str, temp: f64, lat: f64, lon: f64) -> Value {
        json!({
            "coord": {"lat": lat, "lon": lon},
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
            "main": {
                "temp": temp, "feels_like": temp, "temp_min": temp - 1.0, "temp_max": temp + 1.0,
                "pressure": 1015, "humidity": 50
            },
            "visibility": 10000,
            "wind": {"speed": 3.0, "deg": 90},
            "clouds": {"all": 0},
            "dt": 1_700_000_000,
            "sys": {"country": "XX", "sunrise": 1_699_980_000, "sunset": 1_700_020_000},
            "timezone": 0,
            "name": name
        })
    }

    fn forecast_payload() -> Value {
        forecast_payload_at(10.0)
    }

    fn forecast_payload_at(temp: f64) -> Value {
        let list: Vec<Value> = (0..16)
            .map(|i| {
                json!({
                    "dt": 1_700_000_000 + i * 10_800,
                    "main": {
                        "temp": temp, "feels_like": temp, "temp_min": temp, "temp_max": temp,
                        "pressure": 1010, "humidity": 70
                    },
                    "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
                    "clouds": {"all": 90},
                    "wind": {"speed": 5.0, "deg": 180},
                    "visibility": 10000,
                    "pop": 0.6
                })
            })
            .collect();
        json!({"cnt": list.len(), "list": list})
    }

    async fn mount_city(server: &MockServer, name: &str, temp: f64, lat: f64, lon: f64) {
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("city", name))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_payload(name, temp, lat, lon)))
            .mount(server)
            .await;
    }

    async fn mount_secondary(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_payload()))
            .mount(server)
            .await;
        mount_air_and_uv(server).await;
    }

    async fn mount_air_and_uv(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/air-pollution"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [{"dt": 1_700_000_000, "main": {"aqi": 2}, "components": {"pm2_5": 35.4}}]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/onecall"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"current": {"uvi": 7.0}})))
            .mount(server)
            .await;
    }

    async fn controller_for(server: &MockServer) -> DashboardController {
        DashboardController::new(
            DashboardClient::new(&server.uri()),
            PreferenceStore::in_memory().await.unwrap(),
            Tz::UTC,
            "http://localhost:3000",
        )
    }

    #[tokio::test]
    async fn test_search_city_populates_every_section() {
        let server = MockServer::start().await;
        mount_city(&server, "Paris", 18.0, 48.85, 2.35).await;
        mount_secondary(&server).await;

        let controller = controller_for(&server).await;
        let view = controller.search_city("  Paris ").await.unwrap();

        assert_eq!(view.current.as_ref().unwrap().location, "Paris, XX");
        assert!(!view.loading);
        assert!(view.error.is_none());
        assert_eq!(view.forecast.status, SectionStatus::Ready);
        assert_eq!(view.forecast.hourly.len(), 12);

        let aqi = view.air_quality.unwrap();
        assert_eq!(aqi.aqi, 100);
        assert_eq!(aqi.source, DataSource::Measured);
        assert_eq!(view.uv.unwrap().source, DataSource::Measured);

        assert_eq!(view.search_history, vec!["Paris"]);
        assert!(view.can_save_current_location);

        let prefs = controller.preferences.get_preferences().await.unwrap();
        assert_eq!(prefs.last_city.as_deref(), Some("Paris"));
    }

    #[tokio::test]
    async fn test_secondary_failures_degrade_sections() {
        let server = MockServer::start().await;
        mount_city(&server, "Oslo", 2.0, 59.9, 10.7).await;
        for endpoint in ["/api/forecast", "/api/air-pollution", "/api/onecall"] {
            Mock::given(method("GET"))
                .and(path(endpoint))
                .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
                .mount(&server)
                .await;
        }

        let controller = controller_for(&server).await;
        let view = controller.search_city("Oslo").await.unwrap();

        assert!(view.current.is_some());
        assert_eq!(view.forecast.status, SectionStatus::Unavailable);

        let aqi = view.air_quality.unwrap();
        assert_eq!(aqi.aqi, 50);
        assert_eq!(aqi.label, "Moderate");
        assert_eq!(aqi.source, DataSource::Degraded);

        let uv = view.uv.unwrap();
        assert_eq!(uv.source, DataSource::Estimated);
        assert!((0.0..=10.0).contains(&uv.index));
    }

    #[tokio::test]
    async fn test_blank_city_is_rejected_without_fetching() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let controller = controller_for(&server).await;
        let err = controller.search_city("   ").await.unwrap_err();

        assert!(matches!(err, DashboardError::MissingParameter("Please enter a city name")));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_failed_city_lookup_sets_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"cod": "404", "message": "city not found"})),
            )
            .mount(&server)
            .await;

        let controller = controller_for(&server).await;
        let err = controller.search_city("Atlantis").await.unwrap_err();

        assert!(matches!(err, DashboardError::Upstream { status: 404, .. }));
        let view = controller.view();
        assert_eq!(view.error.as_deref(), Some("City not found. Please try again."));
        assert!(view.current.is_none());
        assert!(view.search_history.is_empty());
    }

    #[tokio::test]
    async fn test_failed_coordinate_lookup_sets_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "down"})))
            .mount(&server)
            .await;

        let controller = controller_for(&server).await;
        assert!(controller.search_coordinates(1.0, 2.0).await.is_err());
        assert_eq!(
            controller.view().error.as_deref(),
            Some("Unable to fetch weather for your location")
        );
    }

    #[tokio::test]
    async fn test_unit_toggle_refetches_forecast_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_payload("Rome", 20.0, 41.9, 12.5)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_payload()))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/air-pollution"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/onecall"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"current": {"uvi": 3.0}})))
            .expect(1)
            .mount(&server)
            .await;

        let controller = controller_for(&server).await;
        controller.search_city("Rome").await.unwrap();

        let view = controller.toggle_unit_system().await.unwrap();
        assert_eq!(view.unit_system, UnitSystem::Imperial);
        assert_eq!(view.current.unwrap().temperature, 68);
        assert_eq!(view.forecast.hourly[0].temperature, 50);

        let prefs = controller.preferences.get_preferences().await.unwrap();
        assert_eq!(prefs.unit_system, UnitSystem::Imperial);

        server.verify().await;
    }

    #[tokio::test]
    async fn test_stale_lookup_does_not_overwrite_newer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("city", "Slowtown"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(current_payload("Slowtown", 5.0, 1.0, 1.0))
                    .set_delay(Duration::from_millis(400)),
            )
            .mount(&server)
            .await;
        mount_city(&server, "Fastville", 25.0, 2.0, 2.0).await;
        mount_secondary(&server).await;

        let controller = controller_for(&server).await;

        let (slow, fast) = tokio::join!(controller.search_city("Slowtown"), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            controller.search_city("Fastville").await
        });
        slow.unwrap();
        fast.unwrap();

        let view = controller.view();
        assert_eq!(view.current.unwrap().location, "Fastville, XX");
        assert_eq!(view.search_history, vec!["Fastville"]);
    }

    #[tokio::test]
    async fn test_unit_toggle_during_lookup_keeps_new_location_forecast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("city", "Alpha"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_payload("Alpha", 0.0, 1.0, 1.0)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("city", "Beta"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(current_payload("Beta", 30.0, 2.0, 2.0))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/forecast"))
            .and(query_param("lat", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(forecast_payload_at(0.0))
                    .set_delay(Duration::from_millis(600)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/forecast"))
            .and(query_param("lat", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_payload_at(30.0)))
            .mount(&server)
            .await;
        mount_air_and_uv(&server).await;

        let controller = controller_for(&server).await;
        controller.search_city("Alpha").await.unwrap();

        let (beta, toggled) = tokio::join!(controller.search_city("Beta"), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            controller.toggle_unit_system().await
        });
        beta.unwrap();
        toggled.unwrap();

        let view = controller.view();
        assert_eq!(view.unit_system, UnitSystem::Imperial);
        assert_eq!(view.current.unwrap().location, "Beta, XX");
        assert_eq!(view.forecast.hourly[0].temperature, 86);
    }

    #[tokio::test]
    async fn test_history_and_last_city_use_resolved_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("city", "paris"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_payload("Paris", 16.0, 48.85, 2.35)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("lat", "6.45"))
            .and(query_param("lon", "3.39"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_payload("Lagos", 29.0, 6.45, 3.39)))
            .mount(&server)
            .await;
        mount_secondary(&server).await;

        let controller = controller_for(&server).await;
        controller.search_city("paris").await.unwrap();
        let view = controller.search_coordinates(6.45, 3.39).await.unwrap();

        assert_eq!(view.current.unwrap().location, "Lagos, XX");
        assert_eq!(view.forecast.status, SectionStatus::Ready);
        assert_eq!(view.air_quality.unwrap().source, DataSource::Measured);
        assert_eq!(view.uv.unwrap().source, DataSource::Measured);
        assert_eq!(view.search_history, vec!["Lagos", "Paris"]);

        let prefs = controller.preferences.get_preferences().await.unwrap();
        assert_eq!(prefs.last_city.as_deref(), Some("Lagos"));
        assert_eq!(
            controller.preferences.search_history().await.unwrap(),
            vec!["Lagos", "Paris"]
        );
    }

    #[tokio::test]
    async fn test_start_uses_default_city() {
        let server = MockServer::start().await;
        mount_city(&server, DEFAULT_CITY, 11.0, 51.5, -0.12).await;
        mount_secondary(&server).await;

        let controller = controller_for(&server).await;
        let view = controller.start().await.unwrap();

        assert_eq!(view.current.unwrap().location, "London, XX");
        assert_eq!(view.theme, Theme::Light);
    }

    #[tokio::test]
    async fn test_start_restores_preferences() {
        let server = MockServer::start().await;
        mount_city(&server, "Madrid", 30.0, 40.4, -3.7).await;
        mount_secondary(&server).await;

        let controller = controller_for(&server).await;
        controller.preferences.set_last_city("Madrid").await.unwrap();
        controller.preferences.set_theme(Theme::Dark).await.unwrap();

        let view = controller.start().await.unwrap();
        assert_eq!(view.current.unwrap().location, "Madrid, XX");
        assert_eq!(view.theme, Theme::Dark);
    }

    #[tokio::test]
    async fn test_theme_and_chart_type_need_no_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let controller = controller_for(&server).await;
        assert_eq!(controller.toggle_theme().await.unwrap().theme, Theme::Dark);
        controller.set_chart_type(ChartType::Wind);
        assert_eq!(controller.state().chart_type, ChartType::Wind);

        server.verify().await;
    }

    #[tokio::test]
    async fn test_save_compare_and_remove_locations() {
        let server = MockServer::start().await;
        mount_city(&server, "Lisbon", 22.0, 38.7, -9.1).await;
        mount_city(&server, "Porto", 19.0, 41.1, -8.6).await;
        mount_secondary(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("lat", "38.7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_payload("Lisbon", 23.0, 38.7, -9.1)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("lat", "41.1"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({})))
            .mount(&server)
            .await;

        let controller = controller_for(&server).await;
        assert!(matches!(
            controller.save_current_location().await,
            Err(DashboardError::NoSnapshot)
        ));

        controller.search_city("Lisbon").await.unwrap();
        let view = controller.save_current_location().await.unwrap();
        assert!(!view.can_save_current_location);
        assert!(view.saved_locations[0].is_current);

        let err = controller.save_current_location().await.unwrap_err();
        assert!(matches!(
            err,
            DashboardError::Preferences(PreferenceError::DuplicateLocation(_))
        ));

        assert!(matches!(
            controller.compare_saved_locations().await,
            Err(DashboardError::NotEnoughLocations { required: 2 })
        ));

        controller.search_city("Porto").await.unwrap();
        controller.save_current_location().await.unwrap();

        // Porto's coordinate fetch fails, so only Lisbon gets a card.
        let cards = controller.compare_saved_locations().await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].location, "Lisbon, XX");
        assert_eq!(cards[0].temperature, 23);

        let view = controller.refresh_saved_locations().await.unwrap();
        assert_eq!(view.saved_locations[0].temperature, 23);
        assert_eq!(view.saved_locations[1].temperature, 19);

        let view = controller.remove_saved_location("Lisbon").await.unwrap();
        assert_eq!(view.saved_locations.len(), 1);
        assert_eq!(view.saved_locations[0].name, "Porto");
    }

    #[tokio::test]
    async fn test_share_text_and_history() {
        let server = MockServer::start().await;
        mount_city(&server, "Tokyo", 15.0, 35.7, 139.7).await;
        mount_secondary(&server).await;

        let controller = controller_for(&server).await;
        assert!(matches!(controller.share_text(), Err(DashboardError::NoSnapshot)));

        controller.search_city("Tokyo").await.unwrap();
        let text = controller.share_text().unwrap();
        assert!(text.contains("Weather in Tokyo, XX"));
        assert!(text.contains("Temperature: 15°C"));

        let view = controller.clear_search_history().await.unwrap();
        assert!(view.search_history.is_empty());
        assert!(controller.preferences.search_history().await.unwrap().is_empty());
    }
}
