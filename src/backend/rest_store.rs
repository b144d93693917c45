//! Configuration rows over a PostgREST-style interface.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::settings::BackendSettings;
use crate::core::{
    BillingConfiguration, CobranzaError, ConfigurationFields, ConfigurationId, ConfigurationKey,
};
use crate::special::ConfigurationStore;

/// A configuration row as the table stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationRow {
    pub id: ConfigurationId,
    pub propiedad_id: i64,
    pub cliente_id: i64,
    pub servicio_id: i64,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub tasa_base_especial: Option<Decimal>,
    #[serde(default)]
    pub aplica_iva: Option<bool>,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub porcentaje_iva: Option<Decimal>,
    #[serde(default)]
    pub observaciones: Option<String>,
    #[serde(default)]
    pub solo_factura_actual: bool,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConfigurationRow> for BillingConfiguration {
    fn from(row: ConfigurationRow) -> Self {
        Self {
            id: row.id,
            key: ConfigurationKey::new(row.propiedad_id, row.cliente_id, row.servicio_id),
            fields: ConfigurationFields {
                special_base_rate: row.tasa_base_especial,
                applies_tax: row.aplica_iva,
                special_tax_percentage: row.porcentaje_iva,
                notes: row.observaciones,
            },
            invoice_only: row.solo_factura_actual,
            active: row.activo,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldsPatch<'a> {
    #[serde(with = "rust_decimal::serde::float_option")]
    tasa_base_especial: Option<Decimal>,
    aplica_iva: Option<bool>,
    #[serde(with = "rust_decimal::serde::float_option")]
    porcentaje_iva: Option<Decimal>,
    observaciones: Option<&'a str>,
    updated_at: DateTime<Utc>,
}

impl<'a> FieldsPatch<'a> {
    fn new(fields: &'a ConfigurationFields, now: DateTime<Utc>) -> Self {
        Self {
            tasa_base_especial: fields.special_base_rate,
            aplica_iva: fields.applies_tax,
            porcentaje_iva: fields.special_tax_percentage,
            observaciones: fields.notes.as_deref(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewRow<'a> {
    propiedad_id: i64,
    cliente_id: i64,
    servicio_id: i64,
    #[serde(flatten)]
    fields: FieldsPatch<'a>,
    solo_factura_actual: bool,
    activo: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct Deactivation {
    activo: bool,
    updated_at: DateTime<Utc>,
}

/// [`ConfigurationStore`] backed by the hosted database's REST interface.
#[derive(Debug, Clone)]
pub struct RestConfigurationStore {
    http: reqwest::Client,
    table_url: String,
    api_key: Option<String>,
}

impl RestConfigurationStore {
    /// # Errors
    ///
    /// `CobranzaError::Settings` when `rest_url` is not configured,
    /// `CobranzaError::Network` when the HTTP client cannot be built.
    pub fn new(settings: &BackendSettings) -> Result<Self, CobranzaError> {
        let rest_url = settings
            .rest_url
            .as_deref()
            .ok_or_else(|| CobranzaError::Settings("rest_url is not configured".into()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| CobranzaError::Network(e.to_string()))?;

        Ok(Self {
            http,
            table_url: format!(
                "{}/{}",
                rest_url.trim_end_matches('/'),
                settings.configuration_table
            ),
            api_key: settings.rest_api_key.clone(),
        })
    }

    fn request(&self, method: Method, query: &[(&str, String)]) -> RequestBuilder {
        debug!(%method, table = %self.table_url, "row store request");
        let mut request = self
            .http
            .request(method, &self.table_url)
            .query(query)
            .header("Prefer", "return=representation");
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }
        request
    }

    async fn rows(
        request: RequestBuilder,
        to_error: fn(String) -> CobranzaError,
    ) -> Result<Vec<ConfigurationRow>, CobranzaError> {
        let resp = request
            .send()
            .await
            .map_err(|e| to_error(e.to_string()))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| to_error(e.to_string()))?;
        if !status.is_success() {
            return Err(CobranzaError::Persistence(format!("HTTP {status}: {body}")));
        }
        serde_json::from_str(&body)
            .map_err(|e| CobranzaError::Persistence(format!("unreadable rows: {e}")))
    }

    async fn single_row(
        request: RequestBuilder,
        missing: impl FnOnce() -> String,
    ) -> Result<BillingConfiguration, CobranzaError> {
        Self::rows(request, CobranzaError::Persistence)
            .await?
            .into_iter()
            .next()
            .map(BillingConfiguration::from)
            .ok_or_else(|| CobranzaError::Persistence(missing()))
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl ConfigurationStore for RestConfigurationStore {
    async fn find_active(
        &self,
        key: &ConfigurationKey,
    ) -> Result<Option<BillingConfiguration>, CobranzaError> {
        let request = self.request(
            Method::GET,
            &[
                ("propiedad_id", eq(key.property_id)),
                ("cliente_id", eq(key.client_id)),
                ("servicio_id", eq(key.service_id)),
                ("activo", eq(true)),
                ("limit", "1".to_string()),
            ],
        );
        let rows = Self::rows(request, CobranzaError::Network).await?;
        Ok(rows.into_iter().next().map(BillingConfiguration::from))
    }

    async fn insert(
        &self,
        key: &ConfigurationKey,
        fields: &ConfigurationFields,
    ) -> Result<BillingConfiguration, CobranzaError> {
        let now = Utc::now();
        let row = NewRow {
            propiedad_id: key.property_id,
            cliente_id: key.client_id,
            servicio_id: key.service_id,
            fields: FieldsPatch::new(fields, now),
            solo_factura_actual: false,
            activo: true,
            created_at: now,
        };
        let request = self.request(Method::POST, &[]).json(&row);
        Self::single_row(request, || format!("insert for {key} returned no row")).await
    }

    async fn update(
        &self,
        id: ConfigurationId,
        fields: &ConfigurationFields,
    ) -> Result<BillingConfiguration, CobranzaError> {
        let request = self
            .request(Method::PATCH, &[("id", eq(id)), ("activo", eq(true))])
            .json(&FieldsPatch::new(fields, Utc::now()));
        Self::single_row(request, || format!("no active configuration with id {id}")).await
    }

    async fn deactivate(&self, id: ConfigurationId) -> Result<(), CobranzaError> {
        let request = self.request(Method::PATCH, &[("id", eq(id))]).json(&Deactivation {
            activo: false,
            updated_at: Utc::now(),
        });
        Self::single_row(request, || format!("no configuration with id {id}")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn row_maps_to_configuration() {
        let body = r#"{
            "id": 12,
            "propiedad_id": 1,
            "cliente_id": 2,
            "servicio_id": 3,
            "tasa_base_especial": 3.5,
            "aplica_iva": true,
            "porcentaje_iva": 15.0,
            "observaciones": null,
            "solo_factura_actual": false,
            "activo": true,
            "created_at": "2026-03-01T10:00:00Z",
            "updated_at": "2026-03-02T10:00:00Z"
        }"#;
        let row: ConfigurationRow = serde_json::from_str(body).unwrap();
        let config = BillingConfiguration::from(row);
        assert_eq!(config.key, ConfigurationKey::new(1, 2, 3));
        assert_eq!(config.fields.special_base_rate, Some(dec!(3.5)));
        // Legacy rows may hold whole-number percentages; pricing normalizes them.
        assert_eq!(config.fields.special_tax_percentage, Some(dec!(15)));
        assert!(config.active);
    }

    #[test]
    fn missing_rest_url_is_a_settings_error() {
        let err = RestConfigurationStore::new(&BackendSettings::new("http://localhost")).unwrap_err();
        assert!(matches!(err, CobranzaError::Settings(_)));
    }
}
