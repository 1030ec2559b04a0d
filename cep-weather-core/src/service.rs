use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    Cep, Config, WeatherError, WeatherReport,
    provider::{LocationProvider, Providers, WeatherProvider, providers_from_config},
};

/// Chains CEP validation, the location lookup, and the weather lookup.
///
/// Holds no mutable state, so one instance can be cloned into every request
/// handler.
#[derive(Debug, Clone)]
pub struct WeatherService {
    location: Arc<dyn LocationProvider>,
    weather: Arc<dyn WeatherProvider>,
}

impl WeatherService {
    pub fn new(location: Arc<dyn LocationProvider>, weather: Arc<dyn WeatherProvider>) -> Self {
        Self { location, weather }
    }

    /// Build a service backed by the real HTTP providers.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let Providers { location, weather } = providers_from_config(config)?;
        Ok(Self::new(location, weather))
    }

    /// Resolve a raw, untrusted postal code to the current temperature there.
    ///
    /// Stops at the first failure. Provider errors are returned unchanged.
    #[instrument(skip(self))]
    pub async fn resolve(&self, raw_cep: &str) -> Result<WeatherReport, WeatherError> {
        let cep = Cep::parse(raw_cep)?;

        let place = self.location.locate(&cep).await?;
        debug!(%cep, %place, "resolved location");

        let celsius = self.weather.current_temperature(&place).await?;
        debug!(%place, celsius, "fetched current temperature");

        Ok(WeatherReport::from_celsius(celsius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        UpstreamError,
        provider::{MockLocationProvider, MockWeatherProvider},
    };
    use reqwest::StatusCode;

    fn service(location: MockLocationProvider, weather: MockWeatherProvider) -> WeatherService {
        WeatherService::new(Arc::new(location), Arc::new(weather))
    }

    #[tokio::test]
    async fn returns_report_for_valid_cep() {
        let mut location = MockLocationProvider::new();
        location
            .expect_locate()
            .withf(|cep| cep.as_str() == "01001000")
            .times(1)
            .returning(|_| Ok("São Paulo".to_string()));

        let mut weather = MockWeatherProvider::new();
        weather
            .expect_current_temperature()
            .withf(|place| place == "São Paulo")
            .times(1)
            .returning(|_| Ok(25.0));

        let report = service(location, weather).resolve("01001000").await.unwrap();

        assert_eq!(report, WeatherReport { temp_c: 25.0, temp_f: 77.0, temp_k: 298.15 });
    }

    #[tokio::test]
    async fn invalid_cep_never_reaches_providers() {
        for raw in ["12345", "", "0100100a", "01001-000", "123456789"] {
            let mut location = MockLocationProvider::new();
            location.expect_locate().times(0);
            let mut weather = MockWeatherProvider::new();
            weather.expect_current_temperature().times(0);

            let err = service(location, weather).resolve(raw).await.unwrap_err();

            assert!(matches!(err, WeatherError::InvalidZipCode), "{raw:?} gave {err:?}");
        }
    }

    #[tokio::test]
    async fn unknown_cep_skips_weather_lookup() {
        let mut location = MockLocationProvider::new();
        location
            .expect_locate()
            .times(1)
            .returning(|_| Err(WeatherError::ZipCodeNotFound));

        let mut weather = MockWeatherProvider::new();
        weather.expect_current_temperature().times(0);

        let err = service(location, weather).resolve("99999999").await.unwrap_err();

        assert!(matches!(err, WeatherError::ZipCodeNotFound));
    }

    #[tokio::test]
    async fn location_upstream_failure_is_propagated() {
        let mut location = MockLocationProvider::new();
        location.expect_locate().times(1).returning(|_| {
            Err(UpstreamError::Status {
                service: "viacep",
                status: StatusCode::BAD_GATEWAY,
                body: String::new(),
            }
            .into())
        });

        let mut weather = MockWeatherProvider::new();
        weather.expect_current_temperature().times(0);

        let err = service(location, weather).resolve("01001000").await.unwrap_err();

        match err {
            WeatherError::Upstream(e) => assert_eq!(e.service(), "viacep"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn weather_failure_is_surfaced_unchanged() {
        let mut location = MockLocationProvider::new();
        location.expect_locate().times(1).returning(|_| Ok("São Paulo".to_string()));

        let mut weather = MockWeatherProvider::new();
        weather.expect_current_temperature().times(1).returning(|_| {
            Err(UpstreamError::Malformed { service: "weatherapi", reason: "service unavailable" }
                .into())
        });

        let err = service(location, weather).resolve("01001000").await.unwrap_err();

        match err {
            WeatherError::Upstream(UpstreamError::Malformed { service, reason }) => {
                assert_eq!(service, "weatherapi");
                assert_eq!(reason, "service unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn service_is_shareable_across_tasks() {
        let mut location = MockLocationProvider::new();
        location.expect_locate().times(2).returning(|_| Ok("Recife".to_string()));
        let mut weather = MockWeatherProvider::new();
        weather.expect_current_temperature().times(2).returning(|_| Ok(0.0));

        let svc = service(location, weather);
        let a = tokio::spawn({
            let svc = svc.clone();
            async move { svc.resolve("50030230").await }
        });
        let b = tokio::spawn({
            let svc = svc.clone();
            async move { svc.resolve("50030230").await }
        });

        for handle in [a, b] {
            let report = handle.await.unwrap().unwrap();
            assert_eq!(report.temp_f, 32.0);
            assert_eq!(report.temp_k, 273.15);
        }
    }
}
