use serde::Deserialize;

use crate::core::CobranzaError;

/// Endpoints and credentials of the owning backend and its row store.
///
/// Loaded by [`BackendSettings::load`] from an optional `cobranza.{toml,yaml,json}`
/// file and `COBRANZA__*` environment variables (e.g. `COBRANZA__BASE_URL`).
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    /// Base URL of the owning backend, e.g. "https://admin.example.com".
    pub base_url: String,
    #[serde(default = "default_recalculation_path")]
    pub recalculation_path: String,
    #[serde(default = "default_approval_path")]
    pub approval_path: String,
    #[serde(default = "default_notification_path")]
    pub notification_path: String,
    /// Bearer token for the backend, if it requires one.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Base URL of the hosted database's REST interface (".../rest/v1").
    #[serde(default)]
    pub rest_url: Option<String>,
    #[serde(default)]
    pub rest_api_key: Option<String>,
    #[serde(default = "default_configuration_table")]
    pub configuration_table: String,
}

fn default_recalculation_path() -> String {
    "/api/facturas/recalcular".to_string()
}

fn default_approval_path() -> String {
    "/api/facturas/aprobar".to_string()
}

fn default_notification_path() -> String {
    "/api/notificaciones".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_configuration_table() -> String {
    "configuraciones_facturacion".to_string()
}

impl BackendSettings {
    /// Settings for `base_url` with every other value at its default.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            recalculation_path: default_recalculation_path(),
            approval_path: default_approval_path(),
            notification_path: default_notification_path(),
            api_token: None,
            request_timeout_secs: default_timeout_secs(),
            rest_url: None,
            rest_api_key: None,
            configuration_table: default_configuration_table(),
        }
    }

    /// Load from `.env`, an optional `cobranza` config file and `COBRANZA__*`
    /// environment variables, later sources winning.
    ///
    /// # Errors
    ///
    /// `CobranzaError::Settings` when a source is malformed or `base_url` is missing.
    pub fn load() -> Result<Self, CobranzaError> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name("cobranza").required(false))
            .add_source(config::Environment::with_prefix("COBRANZA").separator("__"))
            .build()
            .map_err(|e| CobranzaError::Settings(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| CobranzaError::Settings(e.to_string()))
    }

    /// Join a path onto the backend base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = BackendSettings::new("https://admin.example.com/");
        assert_eq!(s.request_timeout_secs, 60);
        assert_eq!(s.configuration_table, "configuraciones_facturacion");
        assert_eq!(
            s.endpoint(&s.approval_path),
            "https://admin.example.com/api/facturas/aprobar"
        );
    }

    #[test]
    fn deserialize_with_defaults() {
        let s: BackendSettings =
            serde_json::from_str(r#"{"base_url":"http://localhost:3000","api_token":"t"}"#).unwrap();
        assert_eq!(s.recalculation_path, "/api/facturas/recalcular");
        assert_eq!(s.api_token.as_deref(), Some("t"));
        assert!(s.rest_url.is_none());
    }
}
