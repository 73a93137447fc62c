use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::pos::FuelProduct;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub demo: DemoConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL; endpoint paths are appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub mode: ApiMode,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mode: ApiMode::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Which API gateway answers requests
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    /// Real backend over HTTP
    #[default]
    Live,
    /// Canned fixture responses, no network
    Demo,
}

impl std::fmt::Display for ApiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiMode::Live => write!(f, "live"),
            ApiMode::Demo => write!(f, "demo"),
        }
    }
}

/// Simulated latency for demo mode
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_auth_latency_ms")]
    pub auth_latency_ms: u64,
    #[serde(default = "default_read_latency_ms")]
    pub read_latency_ms: u64,
    #[serde(default = "default_write_latency_ms")]
    pub write_latency_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            auth_latency_ms: default_auth_latency_ms(),
            read_latency_ms: default_read_latency_ms(),
            write_latency_ms: default_write_latency_ms(),
        }
    }
}

impl DemoConfig {
    /// No simulated delay at all
    pub fn instant() -> Self {
        Self {
            auth_latency_ms: 0,
            read_latency_ms: 0,
            write_latency_ms: 0,
        }
    }
}

fn default_auth_latency_ms() -> u64 {
    800
}

fn default_read_latency_ms() -> u64 {
    500
}

fn default_write_latency_ms() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// JSON file holding the token and cached identity
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}

fn default_state_file() -> PathBuf {
    PathBuf::from("./data/session.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    /// Used for sales when the attendant's identity carries no station
    #[serde(default = "default_station_id")]
    pub station_id: String,
    #[serde(default = "default_station_name")]
    pub name: String,
    #[serde(default = "default_products")]
    pub products: Vec<FuelProduct>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            station_id: default_station_id(),
            name: default_station_name(),
            products: default_products(),
        }
    }
}

fn default_station_id() -> String {
    "ST101".to_string()
}

fn default_station_name() -> String {
    "Nairobi Central".to_string()
}

fn default_products() -> Vec<FuelProduct> {
    vec![
        FuelProduct::new(1, "Super Petrol", Decimal::new(21200, 2)),
        FuelProduct::new(2, "Diesel", Decimal::new(19850, 2)),
        FuelProduct::new(3, "Kerosene", Decimal::new(16000, 2)),
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    /// Check values serde cannot: returns a list of problems, empty when valid
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.api.mode == ApiMode::Live
            && !(self.api.base_url.starts_with("http://")
                || self.api.base_url.starts_with("https://"))
        {
            problems.push(format!(
                "api.base_url must start with http:// or https:// (got '{}')",
                self.api.base_url
            ));
        }

        if self.api.timeout_secs == 0 {
            problems.push("api.timeout_secs must be greater than 0".to_string());
        }

        if self.station.products.is_empty() {
            problems.push("station.products must list at least one product".to_string());
        }

        let mut seen = HashSet::new();
        for product in &self.station.products {
            if !seen.insert(product.id) {
                problems.push(format!("Duplicate product id {}", product.id));
            }
            if product.price_per_litre <= Decimal::ZERO {
                problems.push(format!(
                    "Product '{}' must have a positive price_per_litre",
                    product.name
                ));
            }
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.api.mode, ApiMode::Live);
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.demo.auth_latency_ms, 800);
        assert_eq!(config.demo.read_latency_ms, 500);
        assert_eq!(config.demo.write_latency_ms, 300);
        assert_eq!(config.session.state_file, PathBuf::from("./data/session.json"));
        assert_eq!(config.station.station_id, "ST101");
        assert_eq!(config.station.products.len(), 3);
        assert_eq!(config.station.products[1].name, "Diesel");
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.api.mode, ApiMode::Live);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fuelpoa.toml");
        std::fs::write(
            &path,
            r#"
[api]
mode = "demo"

[demo]
read_latency_ms = 0

[[station.products]]
id = 7
name = "V-Power"
price_per_litre = 230.5
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.mode, ApiMode::Demo);
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.demo.read_latency_ms, 0);
        assert_eq!(config.demo.auth_latency_ms, 800);
        assert_eq!(config.station.products.len(), 1);
        assert_eq!(config.station.products[0].price_per_litre, Decimal::new(2305, 1));
        assert_eq!(config.station.station_id, "ST101");
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fuelpoa.toml");
        std::fs::write(&path, "[api\nmode = ").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut config = Config::default();
        config.api.base_url = "localhost:3000".to_string();
        config.api.timeout_secs = 0;
        config.station.products.push(FuelProduct::new(1, "Dup", Decimal::ZERO));

        let problems = config.validate();
        assert_eq!(problems.len(), 4);
        assert!(problems.iter().any(|p| p.contains("base_url")));
        assert!(problems.iter().any(|p| p.contains("Duplicate product id 1")));
    }

    #[test]
    fn test_demo_mode_ignores_base_url() {
        let mut config = Config::default();
        config.api.mode = ApiMode::Demo;
        config.api.base_url = String::new();
        assert!(config.validate().is_empty());
    }
}
