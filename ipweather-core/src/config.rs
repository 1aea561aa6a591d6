use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Upstream services that need an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    OpenWeather,
    Ipify,
}

impl ServiceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::OpenWeather => "openweather",
            ServiceId::Ipify => "ipify",
        }
    }

    /// Environment variable that overrides the key stored on disk.
    pub fn env_var(&self) -> &'static str {
        match self {
            ServiceId::OpenWeather => "OPENWEATHER_API_KEY",
            ServiceId::Ipify => "IPIFY_API_KEY",
        }
    }

    pub const fn all() -> &'static [ServiceId] {
        &[ServiceId::OpenWeather, ServiceId::Ipify]
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ServiceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "openweather" => Ok(ServiceId::OpenWeather),
            "ipify" => Ok(ServiceId::Ipify),
            _ => Err(anyhow!("Unknown service '{value}'. Supported services: openweather, ipify.")),
        }
    }
}

/// Credentials for a single upstream service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub api_key: String,
}

/// Base URLs of every upstream the system talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Free-tier lookup, queried as `{ipapi}/{ip}/latlong/`.
    pub ipapi: String,
    /// Key-gated lookup, queried as `{ipify}?apiKey=..&ipAddress=..`.
    pub ipify: String,
    pub openweather: String,
    /// Plain-text "what is my IP" service used by the client.
    pub ip_echo: String,
    /// Where the client sends its temperature request.
    pub server: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            ipapi: "https://ipapi.co".to_string(),
            ipify: "https://geo.ipify.org/api/v1".to_string(),
            openweather: "http://api.openweathermap.org/data/2.5/weather".to_string(),
            ip_echo: "https://api.ipify.org?format=text".to_string(),
            server: "http://localhost:8080".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// listen_addr = "0.0.0.0:8080"
///
/// [services.openweather]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub request_timeout_secs: u64,
    pub endpoints: Endpoints,
    pub services: HashMap<String, ServiceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 10,
            endpoints: Endpoints::default(),
            services: HashMap::new(),
        }
    }
}

impl Config {
    /// Load config from the platform config dir, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load config from an explicit path; a missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Rejects values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be at least 1"));
        }

        Ok(())
    }

    /// Save config to the platform config dir.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "ipweather", "ipweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `OPENWEATHER_API_KEY` / `IPIFY_API_KEY` style overrides.
    ///
    /// `lookup` is usually `|name| std::env::var(name).ok()`. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for id in ServiceId::all() {
            if let Some(key) = lookup(id.env_var()).filter(|k| !k.is_empty()) {
                self.upsert_api_key(*id, key);
            }
        }
    }

    pub fn upsert_api_key(&mut self, id: ServiceId, api_key: String) {
        self.services.insert(id.as_str().to_string(), ServiceConfig { api_key });
    }

    pub fn remove_api_key(&mut self, id: ServiceId) -> bool {
        self.services.remove(id.as_str()).is_some()
    }

    /// Returns the API key for a service, if present and non-empty.
    pub fn api_key(&self, id: ServiceId) -> Option<&str> {
        self.services
            .get(id.as_str())
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.is_empty())
    }

    pub fn is_service_configured(&self, id: ServiceId) -> bool {
        self.api_key(id).is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_id_as_str_roundtrip() {
        for id in ServiceId::all() {
            let parsed = ServiceId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_service_error() {
        let err = ServiceId::try_from("weatherapi").unwrap_err();
        assert!(err.to_string().contains("Unknown service"));
    }

    #[test]
    fn defaults_listen_on_8080() {
        let cfg = Config::default();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert!(!cfg.is_service_configured(ServiceId::OpenWeather));
    }

    #[test]
    fn empty_api_key_counts_as_absent() {
        let mut cfg = Config::default();
        cfg.upsert_api_key(ServiceId::Ipify, String::new());

        assert_eq!(cfg.api_key(ServiceId::Ipify), None);
    }

    #[test]
    fn env_overrides_replace_file_keys() {
        let mut cfg = Config::default();
        cfg.upsert_api_key(ServiceId::OpenWeather, "FROM_FILE".into());

        cfg.apply_env_overrides(|name| match name {
            "OPENWEATHER_API_KEY" => Some("FROM_ENV".into()),
            "IPIFY_API_KEY" => Some(String::new()),
            _ => None,
        });

        assert_eq!(cfg.api_key(ServiceId::OpenWeather), Some("FROM_ENV"));
        assert_eq!(cfg.api_key(ServiceId::Ipify), None);
    }

    #[test]
    fn remove_api_key_clears_service() {
        let mut cfg = Config::default();
        cfg.upsert_api_key(ServiceId::Ipify, "KEY".into());

        assert!(cfg.remove_api_key(ServiceId::Ipify));
        assert!(!cfg.is_service_configured(ServiceId::Ipify));
        assert!(!cfg.remove_api_key(ServiceId::Ipify));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            request_timeout_secs = 3

            [endpoints]
            ipapi = "http://localhost:9000"

            [services.ipify]
            api_key = "IPIFY"
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.request_timeout_secs, 3);
        assert_eq!(cfg.endpoints.ipapi, "http://localhost:9000");
        assert_eq!(cfg.endpoints.ipify, Endpoints::default().ipify);
        assert_eq!(cfg.api_key(ServiceId::Ipify), Some("IPIFY"));
    }

    #[test]
    fn save_then_load_from_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_api_key(ServiceId::OpenWeather, "OPEN_KEY".into());
        cfg.save_to(&path).expect("save should succeed");

        let loaded = Config::load_from(&path).expect("load should succeed");
        assert_eq!(loaded.api_key(ServiceId::OpenWeather), Some("OPEN_KEY"));
        assert_eq!(loaded.endpoints, cfg.endpoints);
    }

    #[test]
    fn zero_timeout_is_rejected_on_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "request_timeout_secs = 0\n").expect("write config");

        let err = Config::load_from(&path).unwrap_err();

        assert!(err.to_string().contains("Invalid config file"));
        assert!(format!("{err:#}").contains("request_timeout_secs must be at least 1"));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn load_from_missing_path_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();

        assert!(err.to_string().contains("Failed to read config file"));
    }
}
