use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{CobranzaError, InvoiceId};

/// Approval batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    #[serde(rename = "facturaIds")]
    pub invoice_ids: Vec<InvoiceId>,
    /// Sequence prefix, omitted when sequencing is not in use.
    #[serde(
        rename = "prefijoSecuencia",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub sequence_prefix: Option<String>,
    /// First sequence number for this batch.
    #[serde(
        rename = "numeroSecuenciaInicial",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub sequence_start: Option<u64>,
}

/// Approval batch response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalResponse {
    pub success: bool,
    /// Number of invoices approved in this batch.
    #[serde(rename = "aprobadas", default)]
    pub approved: u64,
    /// Number of invoices that failed in this batch.
    #[serde(rename = "errores", default)]
    pub failed: u64,
    #[serde(rename = "erroresDetalle", default)]
    pub failures: Vec<InvoiceFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A per-invoice failure reported by the approval endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFailure {
    #[serde(rename = "facturaId")]
    pub invoice_id: InvoiceId,
    pub error: String,
}

/// Submits invoices for approval with the external invoicing provider.
#[async_trait]
pub trait ApprovalGateway: Send + Sync {
    /// Submit one batch.
    ///
    /// Per-invoice failures belong in the response; `Err` means the batch as
    /// a whole could not be submitted.
    async fn submit(&self, request: &ApprovalRequest) -> Result<ApprovalResponse, CobranzaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_without_sequence() {
        let req = ApprovalRequest {
            invoice_ids: vec![1, 2, 3],
            sequence_prefix: None,
            sequence_start: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        insta::assert_snapshot!(json, @r#"{"facturaIds":[1,2,3]}"#);
    }

    #[test]
    fn request_with_sequence() {
        let req = ApprovalRequest {
            invoice_ids: vec![8],
            sequence_prefix: Some("001-001-".into()),
            sequence_start: Some(121),
        };
        let json = serde_json::to_string(&req).unwrap();
        insta::assert_snapshot!(json, @r#"{"facturaIds":[8],"prefijoSecuencia":"001-001-","numeroSecuenciaInicial":121}"#);
    }

    #[test]
    fn minimal_response_parses() {
        let resp: ApprovalResponse =
            serde_json::from_str(r#"{"success":false,"message":"token expirado"}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.approved, 0);
        assert!(resp.failures.is_empty());
        assert_eq!(resp.message.as_deref(), Some("token expirado"));
    }

    #[test]
    fn detailed_response_parses() {
        let body = r#"{
            "success": true,
            "aprobadas": 9,
            "errores": 1,
            "erroresDetalle": [{"facturaId": 7, "error": "Error 409: \"Documento ya existe\""}]
        }"#;
        let resp: ApprovalResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.approved, 9);
        assert_eq!(resp.failed, 1);
        assert_eq!(resp.failures[0].invoice_id, 7);
    }
}
