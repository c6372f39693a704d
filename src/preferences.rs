//! Client-local preference storage.
//!
//! Every logical record is a JSON value stored under a fixed key in a single
//! SQLite key-value table. Each operation reads and writes one record inside
//! its own transaction, so a failed write leaves the prior value in place.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use thiserror::Error;

use crate::model::SavedLocation;
use crate::units::UnitSystem;

pub const MAX_SEARCH_HISTORY: usize = 5;
pub const MAX_SAVED_LOCATIONS: usize = 5;

pub mod keys {
    pub const THEME: &str = "weather_theme";
    pub const UNIT: &str = "weather_unit";
    pub const LAST_CITY: &str = "weather_last_city";
    pub const SEARCH_HISTORY: &str = "weather_search_history";
    pub const SAVED_LOCATIONS: &str = "weather_saved_locations";
}

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Maximum {max} locations can be saved")]
    CapacityExceeded { max: usize },
    #[error("Location already saved: {0}")]
    DuplicateLocation(String),
    #[error("No saved location at index {index} ({len} saved)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("No saved location named {0}")]
    NotFound(String),
    #[error("Preference storage failed: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("Preference encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub unit_system: UnitSystem,
    pub theme: Theme,
    pub last_city: Option<String>,
}

pub struct PreferenceStore {
    pool: SqlitePool,
}

impl PreferenceStore {
    /// Open (creating if needed) the store at a SQLite URL such as
    /// `sqlite:./weather_dashboard.db` or `sqlite::memory:`.
    pub async fn connect(database_url: &str) -> Result<Self, PreferenceError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // One connection: a single writer, and in-memory databases live only
        // as long as their connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_tables().await?;
        Ok(store)
    }

    pub async fn in_memory() -> Result<Self, PreferenceError> {
        Self::connect("sqlite::memory:").await
    }

    async fn init_tables(&self) -> Result<(), PreferenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Scalar preferences

    pub async fn get_preferences(&self) -> Result<Preferences, PreferenceError> {
        let mut conn = self.pool.acquire().await?;

        Ok(Preferences {
            unit_system: read_record(&mut conn, keys::UNIT).await?.unwrap_or_default(),
            theme: read_record(&mut conn, keys::THEME).await?.unwrap_or_default(),
            last_city: read_record(&mut conn, keys::LAST_CITY).await?,
        })
    }

    pub async fn set_unit_system(&self, unit_system: UnitSystem) -> Result<(), PreferenceError> {
        let mut conn = self.pool.acquire().await?;
        write_record(&mut conn, keys::UNIT, &unit_system).await
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), PreferenceError> {
        let mut conn = self.pool.acquire().await?;
        write_record(&mut conn, keys::THEME, &theme).await
    }

    pub async fn set_last_city(&self, city: &str) -> Result<(), PreferenceError> {
        let mut conn = self.pool.acquire().await?;
        write_record(&mut conn, keys::LAST_CITY, &city).await
    }

    // Search history

    pub async fn search_history(&self) -> Result<Vec<String>, PreferenceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(read_record(&mut conn, keys::SEARCH_HISTORY)
            .await?
            .unwrap_or_default())
    }

    /// Move `city` to the front of the history, replacing any entry that
    /// differs only in case, and keep at most [`MAX_SEARCH_HISTORY`] entries.
    pub async fn add_search_history(&self, city: &str) -> Result<Vec<String>, PreferenceError> {
        let mut tx = self.pool.begin().await?;

        let mut history: Vec<String> = read_record(&mut tx, keys::SEARCH_HISTORY)
            .await?
            .unwrap_or_default();

        let needle = city.to_lowercase();
        history.retain(|c| c.to_lowercase() != needle);
        history.insert(0, city.to_string());
        history.truncate(MAX_SEARCH_HISTORY);

        write_record(&mut tx, keys::SEARCH_HISTORY, &history).await?;
        tx.commit().await?;

        Ok(history)
    }

    pub async fn clear_search_history(&self) -> Result<(), PreferenceError> {
        let mut conn = self.pool.acquire().await?;
        delete_record(&mut conn, keys::SEARCH_HISTORY).await
    }

    // Saved locations

    pub async fn saved_locations(&self) -> Result<Vec<SavedLocation>, PreferenceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(read_record(&mut conn, keys::SAVED_LOCATIONS)
            .await?
            .unwrap_or_default())
    }

    pub async fn add_saved_location(
        &self,
        location: SavedLocation,
    ) -> Result<Vec<SavedLocation>, PreferenceError> {
        let mut tx = self.pool.begin().await?;

        let mut saved: Vec<SavedLocation> = read_record(&mut tx, keys::SAVED_LOCATIONS)
            .await?
            .unwrap_or_default();

        if saved.len() >= MAX_SAVED_LOCATIONS {
            return Err(PreferenceError::CapacityExceeded {
                max: MAX_SAVED_LOCATIONS,
            });
        }
        if saved.iter().any(|l| l.name == location.name) {
            return Err(PreferenceError::DuplicateLocation(location.name));
        }

        saved.push(location);
        write_record(&mut tx, keys::SAVED_LOCATIONS, &saved).await?;
        tx.commit().await?;

        Ok(saved)
    }

    /// Remove by position in the stored list.
    ///
    /// Positions shift after every removal; prefer
    /// [`remove_saved_location_by_name`](Self::remove_saved_location_by_name)
    /// when the caller holds a possibly stale rendering of the list.
    pub async fn remove_saved_location(
        &self,
        index: usize,
    ) -> Result<SavedLocation, PreferenceError> {
        let mut tx = self.pool.begin().await?;

        let mut saved: Vec<SavedLocation> = read_record(&mut tx, keys::SAVED_LOCATIONS)
            .await?
            .unwrap_or_default();

        if index >= saved.len() {
            return Err(PreferenceError::IndexOutOfRange {
                index,
                len: saved.len(),
            });
        }

        let removed = saved.remove(index);
        write_record(&mut tx, keys::SAVED_LOCATIONS, &saved).await?;
        tx.commit().await?;

        Ok(removed)
    }

    pub async fn remove_saved_location_by_name(
        &self,
        name: &str,
    ) -> Result<SavedLocation, PreferenceError> {
        let mut tx = self.pool.begin().await?;

        let mut saved: Vec<SavedLocation> = read_record(&mut tx, keys::SAVED_LOCATIONS)
            .await?
            .unwrap_or_default();

        let index = saved
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| PreferenceError::NotFound(name.to_string()))?;

        let removed = saved.remove(index);
        write_record(&mut tx, keys::SAVED_LOCATIONS, &saved).await?;
        tx.commit().await?;

        Ok(removed)
    }

    /// Record a freshly fetched temperature; returns false if `name` is not saved.
    pub async fn update_saved_location_temp(
        &self,
        name: &str,
        temperature: f64,
    ) -> Result<bool, PreferenceError> {
        let mut tx = self.pool.begin().await?;

        let mut saved: Vec<SavedLocation> = read_record(&mut tx, keys::SAVED_LOCATIONS)
            .await?
            .unwrap_or_default();

        let Some(location) = saved.iter_mut().find(|l| l.name == name) else {
            return Ok(false);
        };
        location.last_known_temp = temperature;

        write_record(&mut tx, keys::SAVED_LOCATIONS, &saved).await?;
        tx.commit().await?;

        Ok(true)
    }
}

/// Read and decode one record. A record that no longer decodes is logged and
/// treated as absent.
async fn read_record<T: DeserializeOwned>(
    conn: &mut SqliteConnection,
    key: &str,
) -> Result<Option<T>, PreferenceError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;

    let Some((raw,)) = row else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("Ignoring unreadable preference record {}: {}", key, e);
            Ok(None)
        }
    }
}

async fn write_record<T: Serialize + ?Sized>(
    conn: &mut SqliteConnection,
    key: &str,
    value: &T,
) -> Result<(), PreferenceError> {
    let encoded = serde_json::to_string(value)?;

    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(encoded)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn delete_record(conn: &mut SqliteConnection, key: &str) -> Result<(), PreferenceError> {
    sqlx::query("DELETE FROM kv_store WHERE key = ?")
        .bind(key)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
