//! Key-value persistence for the last search and the form fields.
//!
//! A single SQLite table stands in for browser local storage. Values are
//! either raw strings (dates, trip type) or JSON documents (results, airport
//! selections). Every failure here is logged and swallowed: losing a saved
//! value only costs the user a retyped field.

use crate::error::SearchError;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

pub const FLIGHT_DATA: &str = "flightData";
pub const TRIP_TYPE: &str = "tripType";
pub const ORIGIN: &str = "origin";
pub const DESTINATION: &str = "destination";
pub const DEPARTURE_DATE: &str = "departureDate";
pub const RETURN_DATE: &str = "returnDate";

/// Cloneable handle to the store. Clones share one connection.
#[derive(Clone)]
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> rusqlite::Result<T> {
        // A poisoned lock still holds a usable connection.
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        f(&conn)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.with_conn(|conn| {
            conn.query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
                .optional()
        })
        .unwrap_or_else(|e| {
            error!("Failed to read '{}' from storage: {}", key, e);
            None
        })
    }

    pub fn set(&self, key: &str, value: &str) {
        let res = self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)",
                params![key, value],
            )
        });
        if let Err(e) = res {
            error!("Failed to write '{}' to storage: {}", key, e);
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.with_conn(|conn| conn.execute("DELETE FROM kv WHERE key = ?", [key])) {
            error!("Failed to remove '{}' from storage: {}", key, e);
        }
    }

    /// Reads and parses a JSON value. Malformed payloads are logged and
    /// dropped from storage.
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(source) => {
                let err = SearchError::PersistenceParse {
                    key: key.to_string(),
                    source,
                };
                warn!("{}", err);
                self.remove(key);
                None
            }
        }
    }

    pub fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw),
            Err(e) => error!("Failed to serialize '{}': {}", key, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AirportOption;

    #[test]
    fn set_get_remove() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(storage.get(TRIP_TYPE), None);

        storage.set(TRIP_TYPE, "oneway");
        storage.set(TRIP_TYPE, "roundtrip");
        assert_eq!(storage.get(TRIP_TYPE).as_deref(), Some("roundtrip"));

        storage.remove(TRIP_TYPE);
        assert_eq!(storage.get(TRIP_TYPE), None);
    }

    #[test]
    fn json_values_round_trip() {
        let storage = Storage::open_in_memory().unwrap();
        let jfk = AirportOption {
            label: "New York John F. Kennedy (JFK)".into(),
            sky_id: "JFK".into(),
            entity_id: "95565058".into(),
        };
        storage.save_json(ORIGIN, &jfk);
        assert_eq!(storage.load_json::<AirportOption>(ORIGIN), Some(jfk));
    }

    #[test]
    fn malformed_json_is_discarded() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set(ORIGIN, "{not json");

        assert_eq!(storage.load_json::<AirportOption>(ORIGIN), None);
        assert_eq!(storage.get(ORIGIN), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");

        Storage::open(&path).unwrap().set(DEPARTURE_DATE, "2024-06-01");
        let reopened = Storage::open(&path).unwrap();
        assert_eq!(reopened.get(DEPARTURE_DATE).as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn clones_share_state() {
        let storage = Storage::open_in_memory().unwrap();
        let other = storage.clone();
        other.set(RETURN_DATE, "2024-06-08");
        assert_eq!(storage.get(RETURN_DATE).as_deref(), Some("2024-06-08"));
    }
}
