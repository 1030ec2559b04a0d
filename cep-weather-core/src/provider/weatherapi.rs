use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::WeatherError;

use super::{WeatherProvider, fetch_json, normalize_base_url};

const SERVICE: &str = "weatherapi";

/// [`WeatherProvider`] backed by WeatherAPI.com's current conditions endpoint.
#[derive(Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String, base_url: String, http: Client) -> Self {
        Self { api_key, base_url: normalize_base_url(base_url), http }
    }
}

// Hand-written so the API key never reaches a log line.
impl std::fmt::Debug for WeatherApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiProvider")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    current: WaCurrent,
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn current_temperature(&self, place: &str) -> Result<f64, WeatherError> {
        let url = format!("{}/current.json", self.base_url);

        let request = self.http.get(url).query(&[
            ("key", self.api_key.as_str()),
            ("q", place),
            ("aqi", "no"),
        ]);

        let parsed: WaResponse = fetch_json(request, SERVICE).await?;

        Ok(parsed.current.temp_c)
    }
}
