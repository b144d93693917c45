//! reqwest client for the owning backend's invoice and messaging endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::settings::BackendSettings;
use crate::approval::{ApprovalGateway, ApprovalRequest, ApprovalResponse};
use crate::core::CobranzaError;
use crate::notify::{Notification, Notifier};
use crate::special::{InvoiceRecalculator, RecalculationRequest};

/// JSON client for the owning backend.
///
/// Implements [`InvoiceRecalculator`], [`ApprovalGateway`] and [`Notifier`].
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    settings: BackendSettings,
}

impl BackendClient {
    /// # Errors
    ///
    /// `CobranzaError::Network` when the HTTP client cannot be built.
    pub fn new(settings: BackendSettings) -> Result<Self, CobranzaError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| CobranzaError::Network(e.to_string()))?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> RequestBuilder {
        let url = self.settings.endpoint(path);
        debug!(%url, "backend request");
        let request = self.http.post(url).json(body);
        match &self.settings.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

async fn read_body(resp: Response) -> Result<(reqwest::StatusCode, String), CobranzaError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| CobranzaError::Network(e.to_string()))?;
    Ok((status, body))
}

#[async_trait]
impl InvoiceRecalculator for BackendClient {
    async fn recalculate(&self, request: &RecalculationRequest) -> Result<(), CobranzaError> {
        let resp = self
            .post(&self.settings.recalculation_path, request)
            .send()
            .await
            .map_err(|e| CobranzaError::Network(e.to_string()))?;

        let (status, body) = read_body(resp).await?;
        if !status.is_success() {
            let reason = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(CobranzaError::Persistence(format!(
                "recalculation of invoice {} failed: {reason}",
                request.invoice_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ApprovalGateway for BackendClient {
    async fn submit(&self, request: &ApprovalRequest) -> Result<ApprovalResponse, CobranzaError> {
        let resp = self
            .post(&self.settings.approval_path, request)
            .send()
            .await
            .map_err(|e| CobranzaError::Network(e.to_string()))?;

        let (status, body) = read_body(resp).await?;

        // Error statuses may still carry a regular response body with details.
        match serde_json::from_str::<ApprovalResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => {
                Err(CobranzaError::Network(format!("HTTP {status}: {body}")))
            }
            Err(e) => Err(CobranzaError::Network(format!(
                "unreadable approval response: {e}"
            ))),
        }
    }
}

#[async_trait]
impl Notifier for BackendClient {
    async fn notify(&self, notification: &Notification) -> Result<(), CobranzaError> {
        let resp = self
            .post(&self.settings.notification_path, notification)
            .send()
            .await
            .map_err(|e| CobranzaError::Notification(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CobranzaError::Notification(format!("HTTP {status}")));
        }
        Ok(())
    }
}
