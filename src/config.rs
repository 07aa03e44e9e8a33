use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;

use crate::elements::{default_providers, Provider, SatelliteTarget};
use crate::predict::{Heuristics, LocalClock, Observer, SearchSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid observer: {0}")]
    Observer(String),
    #[error("Invalid local clock: {0}")]
    LocalClock(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub observer: Option<ObserverConfig>,
    pub web: WebConfig,
    pub elements: ElementsConfig,
    pub search: SearchSettings,
    pub heuristics: Heuristics,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObserverConfig {
    pub coordinates: String,
    #[serde(default)]
    pub height_km: f64,
    /// IANA zone name, e.g. `Europe/Madrid`.
    pub time_zone: Option<String>,
    /// Fixed offset; overrides `time_zone`.
    pub utc_offset_hours: Option<f64>,
}

impl ObserverConfig {
    pub fn observer(&self) -> Result<Observer, ConfigError> {
        Observer::from_coordinates(&self.coordinates, Some(self.height_km))
            .ok_or_else(|| ConfigError::Observer(self.coordinates.clone()))
    }

    pub fn local_clock(&self) -> Result<Option<LocalClock>, ConfigError> {
        LocalClock::from_options(self.time_zone.as_deref(), self.utc_offset_hours)
            .map_err(|e| ConfigError::LocalClock(e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElementsConfig {
    #[serde(flatten)]
    pub target: SatelliteTarget,
    #[serde(deserialize_with = "deserialize_duration")]
    pub cache_ttl: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub fetch_timeout: Duration,
    pub providers: Vec<Provider>,
}

impl Default for ElementsConfig {
    fn default() -> Self {
        Self {
            target: SatelliteTarget::default(),
            cache_ttl: Duration::from_secs(60 * 60),
            fetch_timeout: Duration::from_secs(4),
            providers: default_providers(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        if let Some(observer) = &config.observer {
            observer.observer()?;
            observer.local_clock()?;
        }
        Ok(config)
    }

    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}
