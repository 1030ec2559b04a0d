use crate::{
    Cep, Config, UpstreamError, WeatherError,
    error::truncate_body,
    provider::{viacep::ViaCepProvider, weatherapi::WeatherApiProvider},
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, sync::Arc, time::Duration};

pub mod viacep;
pub mod weatherapi;

const USER_AGENT: &str = concat!("cep-weather/", env!("CARGO_PKG_VERSION"));

/// Resolves a postal code to the name of the city it belongs to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    /// Returns a non-empty place name, [`WeatherError::ZipCodeNotFound`] for
    /// unknown codes, or [`WeatherError::Upstream`] for anything else.
    async fn locate(&self, cep: &Cep) -> Result<String, WeatherError>;
}

/// Reports the current temperature for a place.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current temperature in degrees Celsius.
    async fn current_temperature(&self, place: &str) -> Result<f64, WeatherError>;
}

/// The pair of providers the service needs.
#[derive(Debug, Clone)]
pub struct Providers {
    pub location: Arc<dyn LocationProvider>,
    pub weather: Arc<dyn WeatherProvider>,
}

/// Construct both HTTP-backed providers from config.
pub fn providers_from_config(config: &Config) -> anyhow::Result<Providers> {
    let api_key = config.require_weather_api_key()?;
    let http = http_client(config.request_timeout())?;

    let location = ViaCepProvider::new(config.via_cep.base_url.clone(), http.clone());
    let weather =
        WeatherApiProvider::new(api_key.to_owned(), config.weather_api.base_url.clone(), http);

    Ok(Providers { location: Arc::new(location), weather: Arc::new(weather) })
}

/// One client shared by both providers; the timeout bounds every outbound call.
pub fn http_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// Send a GET and decode a JSON body, mapping every failure to [`UpstreamError`].
pub(crate) async fn fetch_json<T>(
    request: RequestBuilder,
    service: &'static str,
) -> Result<T, UpstreamError>
where
    T: DeserializeOwned,
{
    let res = request
        .send()
        .await
        .map_err(|source| UpstreamError::Transport { service, source })?;

    let status = res.status();
    let body = res.text().await.map_err(|source| UpstreamError::Transport { service, source })?;

    if !status.is_success() {
        return Err(UpstreamError::Status { service, status, body: truncate_body(&body) });
    }

    serde_json::from_str(&body).map_err(|source| UpstreamError::Decode { service, source })
}

/// Strip trailing slashes so joined paths don't end up with `//`.
pub(crate) fn normalize_base_url(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = providers_from_config(&cfg).unwrap_err();

        assert!(err.to_string().contains("No WeatherAPI key configured"));
    }

    #[test]
    fn providers_from_config_works_when_key_is_set() {
        let mut cfg = Config::default();
        cfg.set_weather_api_key("KEY".to_string());

        assert!(providers_from_config(&cfg).is_ok());
    }

    #[test]
    fn normalize_base_url_strips_trailing_slashes() {
        assert_eq!(normalize_base_url("http://x/ws//".into()), "http://x/ws");
        assert_eq!(normalize_base_url("http://x/ws".into()), "http://x/ws");
    }
}
