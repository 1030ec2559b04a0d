use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_VIACEP_BASE_URL: &str = "https://viacep.com.br/ws";
pub const DEFAULT_WEATHER_API_BASE_URL: &str = "http://api.weatherapi.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Settings for the WeatherAPI.com provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherApiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self { api_key: None, base_url: DEFAULT_WEATHER_API_BASE_URL.to_string() }
    }
}

/// Settings for the ViaCEP provider. It needs no credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViaCepConfig {
    pub base_url: String,
}

impl Default for ViaCepConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_VIACEP_BASE_URL.to_string() }
    }
}

/// Top-level configuration, loaded once at start-up.
///
/// Example TOML:
/// ```toml
/// listen_addr = "0.0.0.0:8080"
/// request_timeout_secs = 10
///
/// [weather_api]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    /// Upper bound for each outbound provider call.
    pub request_timeout_secs: u64,
    pub weather_api: WeatherApiConfig,
    pub via_cep: ViaCepConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            weather_api: WeatherApiConfig::default(),
            via_cep: ViaCepConfig::default(),
        }
    }
}

impl Config {
    /// Load config from `path` (or the platform default location), then apply
    /// environment overrides.
    ///
    /// Only the platform default may be absent; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) if !p.exists() => {
                return Err(anyhow!("Config file not found: {}", p.display()));
            }
            Some(p) => p.to_path_buf(),
            None => Self::config_file_path()?,
        };

        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env(|name| std::env::var(name).ok())?;
        Ok(cfg)
    }

    /// Load config from a file, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
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

    /// Path to the default config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cep-weather", "cep-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override file values with environment variables.
    ///
    /// `LISTEN_ADDR` wins over `SERVER_PORT` when both are set.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("WEATHER_API_KEY") {
            self.weather_api.api_key = Some(key);
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.listen_addr = listen_addr_from_port(&port)?;
        }
        if let Some(addr) = lookup("LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(url) = lookup("VIACEP_BASE_URL") {
            self.via_cep.base_url = url;
        }
        if let Some(url) = lookup("WEATHER_API_BASE_URL") {
            self.weather_api.base_url = url;
        }

        Ok(())
    }

    pub fn listen_socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address '{}'", self.listen_addr))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the WeatherAPI key, or an error explaining how to set one.
    pub fn require_weather_api_key(&self) -> Result<&str> {
        self.weather_api
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No WeatherAPI key configured.\n\
                     Hint: set WEATHER_API_KEY or run `cep-weather configure`."
                )
            })
    }

    pub fn set_weather_api_key(&mut self, api_key: String) {
        self.weather_api.api_key = Some(api_key);
    }
}

/// Accepts `8080` or `:8080` and binds on all interfaces.
fn listen_addr_from_port(raw: &str) -> Result<String> {
    let port: u16 = raw
        .trim()
        .trim_start_matches(':')
        .parse()
        .with_context(|| format!("Invalid SERVER_PORT '{raw}'"))?;

    Ok(format!("0.0.0.0:{port}"))
}
