use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CONFIG_PATH: &str = "config.toml";
const API_KEY_ENV: &str = "SKYSCRAPPER_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub key: String,               // RapidAPI key, overridden by SKYSCRAPPER_API_KEY
    pub host: String,              // Sent as X-RapidAPI-Host
    pub flights_base_url: String,  // .../searchFlights lives under this
    pub airports_base_url: String, // .../searchAirport lives under this
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            host: "sky-scrapper.p.rapidapi.com".to_string(),
            flights_base_url: "https://sky-scrapper.p.rapidapi.com/api/v2/flights".to_string(),
            airports_base_url: "https://sky-scrapper.p.rapidapi.com/api/v1/flights".to_string(),
            timeout_seconds: 15,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub path: String, // SQLite file holding the last search and form fields
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "skysearch.db".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 150 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
    pub level: String, // EnvFilter directive, e.g. "info" or "skysearch_tui=debug"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            level: "info".to_string(),
        }
    }
}

/// Something worth reporting from [`Config::load`]. Loading runs before the
/// log subscriber exists, so the caller logs these once it is up.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadNote {
    Loaded(PathBuf),
    ParseFailed { path: PathBuf, reason: String },
    WroteDefaults(PathBuf),
    WriteFailed(PathBuf),
    SerializeFailed(String),
    KeyFromEnv,
}

impl LoadNote {
    pub fn log(&self) {
        match self {
            LoadNote::Loaded(path) => info!("Loaded {}", path.display()),
            LoadNote::ParseFailed { path, reason } => {
                warn!("Failed to parse {}: {}. Using defaults.", path.display(), reason)
            }
            LoadNote::WroteDefaults(path) => info!("No {} found, wrote defaults.", path.display()),
            LoadNote::WriteFailed(path) => {
                warn!("Could not write default {} to disk.", path.display())
            }
            LoadNote::SerializeFailed(reason) => {
                warn!("Could not serialize default config: {}", reason)
            }
            LoadNote::KeyFromEnv => info!("Using API key from {}", API_KEY_ENV),
        }
    }
}

impl Config {
    /// Loads config.toml from the working directory.
    /// If it doesn't exist, creates a default one.
    pub fn load() -> (Self, Vec<LoadNote>) {
        let (mut config, mut notes) = Self::load_from(Path::new(CONFIG_PATH));
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            notes.push(LoadNote::KeyFromEnv);
            config.api.key = key;
        }
        (config, notes)
    }

    pub fn load_from(path: &Path) -> (Self, Vec<LoadNote>) {
        let path_buf = path.to_path_buf();
        if let Ok(content) = fs::read_to_string(path) {
            return match toml::from_str(&content) {
                Ok(config) => (config, vec![LoadNote::Loaded(path_buf)]),
                // Leave a broken file alone so the user can fix it.
                Err(e) => (
                    Config::default(),
                    vec![LoadNote::ParseFailed {
                        path: path_buf,
                        reason: e.to_string(),
                    }],
                ),
            };
        }

        let default_config = Config::default();

        // Save default config to disk for the user to edit later
        let note = match toml::to_string_pretty(&default_config) {
            Ok(toml_string) => match fs::write(path, toml_string) {
                Ok(()) => LoadNote::WroteDefaults(path_buf),
                Err(_) => LoadNote::WriteFailed(path_buf),
            },
            Err(e) => LoadNote::SerializeFailed(e.to_string()),
        };

        (default_config, vec![note])
    }
}
