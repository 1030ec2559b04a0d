use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};

use crate::{Cep, UpstreamError, WeatherError};

use super::{LocationProvider, fetch_json, normalize_base_url};

const SERVICE: &str = "viacep";

/// [`LocationProvider`] backed by the public ViaCEP API.
#[derive(Debug, Clone)]
pub struct ViaCepProvider {
    base_url: String,
    http: Client,
}

impl ViaCepProvider {
    pub fn new(base_url: String, http: Client) -> Self {
        Self { base_url: normalize_base_url(base_url), http }
    }
}

#[derive(Debug, Deserialize)]
struct VcResponse {
    #[serde(default)]
    localidade: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    erro: bool,
}

/// ViaCEP has answered unknown codes with both `"erro": true` and `"erro": "true"`.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.eq_ignore_ascii_case("true"),
    })
}

#[async_trait]
impl LocationProvider for ViaCepProvider {
    async fn locate(&self, cep: &Cep) -> Result<String, WeatherError> {
        let url = format!("{}/{}/json/", self.base_url, cep);

        let parsed: VcResponse = fetch_json(self.http.get(url), SERVICE).await?;

        if parsed.erro {
            return Err(WeatherError::ZipCodeNotFound);
        }

        match parsed.localidade {
            Some(city) if !city.trim().is_empty() => Ok(city),
            _ => Err(UpstreamError::Malformed { service: SERVICE, reason: "missing localidade" }
                .into()),
        }
    }
}
