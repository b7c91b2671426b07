//! Postal-code address lookup (ViaCEP).
//!
//! Third-party contract: `GET https://viacep.com.br/ws/{cep}/json/` returns a
//! partial address, or `{"erro": true}` for an unknown CEP. Any failure here
//! is non-fatal for the wizard; the caller falls back to manual address
//! entry.

use serde::Deserialize;
use thiserror::Error;

use matricula_core::Cep;

const VIACEP_BASE_URL: &str = "https://viacep.com.br";

#[derive(Debug, Error)]
pub enum AddressLookupError {
    /// The service answered but does not know the CEP.
    #[error("postal code not found")]
    NotFound,

    /// Transport failure or malformed answer.
    #[error("address service unavailable: {0}")]
    Unavailable(String),
}

/// Partial address as returned for a known CEP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CepAddress {
    #[serde(default)]
    pub logradouro: String,
    #[serde(default)]
    pub bairro: String,
    #[serde(rename = "localidade", default)]
    pub cidade: String,
    #[serde(rename = "uf", default)]
    pub estado: String,
}

/// Address lookup collaborator.
pub trait AddressLookup: Send + Sync {
    fn lookup(
        &self,
        cep: &Cep,
    ) -> impl std::future::Future<Output = Result<CepAddress, AddressLookupError>> + Send;
}

/// ViaCEP HTTP client.
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    http: reqwest::Client,
    base_url: String,
}

impl ViaCepClient {
    pub fn new() -> Self {
        Self::with_base_url(VIACEP_BASE_URL)
    }

    /// Custom base URL (tests point this at a local stub).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for ViaCepClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressLookup for ViaCepClient {
    async fn lookup(&self, cep: &Cep) -> Result<CepAddress, AddressLookupError> {
        let url = format!("{}/ws/{}/json/", self.base_url, cep.digits());

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AddressLookupError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AddressLookupError::Unavailable(format!(
                "status {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AddressLookupError::Unavailable(e.to_string()))?;

        parse_viacep_body(body)
    }
}

/// Interpret a ViaCEP response body: the not-found signal is an `erro` flag
/// in an otherwise 200 answer.
fn parse_viacep_body(body: serde_json::Value) -> Result<CepAddress, AddressLookupError> {
    if body.get("erro").map(is_truthy).unwrap_or(false) {
        return Err(AddressLookupError::NotFound);
    }

    serde_json::from_value(body).map_err(|e| AddressLookupError::Unavailable(e.to_string()))
}

// ViaCEP has answered both `"erro": true` and `"erro": "true"` over time.
fn is_truthy(value: &serde_json::Value) -> bool {
    value.as_bool().unwrap_or(false) || value.as_str() == Some("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_cep_body_maps_to_address() {
        let address = parse_viacep_body(json!({
            "cep": "65900-100",
            "logradouro": "Rua Simplício Moreira",
            "bairro": "Centro",
            "localidade": "Imperatriz",
            "uf": "MA"
        }))
        .unwrap();

        assert_eq!(address.cidade, "Imperatriz");
        assert_eq!(address.estado, "MA");
        assert_eq!(address.logradouro, "Rua Simplício Moreira");
    }

    #[test]
    fn erro_flag_means_not_found() {
        let err = parse_viacep_body(json!({"erro": true})).unwrap_err();
        assert!(matches!(err, AddressLookupError::NotFound));

        let err = parse_viacep_body(json!({"erro": "true"})).unwrap_err();
        assert!(matches!(err, AddressLookupError::NotFound));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let address = parse_viacep_body(json!({"localidade": "Imperatriz"})).unwrap();
        assert_eq!(address.cidade, "Imperatriz");
        assert_eq!(address.logradouro, "");
    }
}
