//! Core library for the `cep-weather` service.
//!
//! This crate defines:
//! - Postal code (CEP) validation
//! - The temperature report and its unit conversions
//! - Abstractions over the location and weather providers, plus their HTTP adapters
//! - The service that chains CEP → city → temperature
//! - Configuration loading
//!
//! It is used by `cep-weather-server`, but can also be reused by other binaries or services.

pub mod cep;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod service;

pub use cep::Cep;
pub use config::{Config, ViaCepConfig, WeatherApiConfig};
pub use error::{UpstreamError, WeatherError};
pub use model::WeatherReport;
pub use provider::{LocationProvider, Providers, WeatherProvider, providers_from_config};
pub use service::WeatherService;
