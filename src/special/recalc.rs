//! Invoice recalculation request sent to the owning backend.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{Charge, CobranzaError, InvoiceId};

/// Payload of the backend's recalculation endpoint.
///
/// Amounts travel as JSON numbers; `porcentaje_iva` is a fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalculationRequest {
    #[serde(rename = "facturaId")]
    pub invoice_id: InvoiceId,
    /// Special base rate, `null` to keep the catalog price.
    #[serde(
        rename = "tasa_base_especial",
        with = "rust_decimal::serde::float_option",
        default
    )]
    pub special_base_rate: Option<Decimal>,
    #[serde(rename = "aplica_iva")]
    pub applies_tax: bool,
    #[serde(
        rename = "porcentaje_iva",
        with = "rust_decimal::serde::float_option",
        default
    )]
    pub tax_fraction: Option<Decimal>,
    #[serde(rename = "area_propiedad", with = "rust_decimal::serde::float")]
    pub property_area: Decimal,
    #[serde(rename = "solo_factura_actual")]
    pub invoice_only: bool,
}

impl RecalculationRequest {
    /// Build the request from a resolved charge.
    ///
    /// `special_base_rate` is what the configuration sets, if anything; tax
    /// and area come from the charge.
    pub fn from_charge(
        invoice_id: InvoiceId,
        special_base_rate: Option<Decimal>,
        charge: &Charge,
        invoice_only: bool,
    ) -> Self {
        let applies_tax = charge.tax_fraction > Decimal::ZERO;
        Self {
            invoice_id,
            special_base_rate,
            applies_tax,
            tax_fraction: applies_tax.then_some(charge.tax_fraction),
            property_area: charge.area,
            invoice_only,
        }
    }
}

/// Recalculates and persists a draft invoice.
#[async_trait]
pub trait InvoiceRecalculator: Send + Sync {
    /// # Errors
    ///
    /// `Network` on transport failure, `Persistence` when the backend
    /// rejected or failed to store the recalculation.
    async fn recalculate(&self, request: &RecalculationRequest) -> Result<(), CobranzaError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compute;
    use rust_decimal_macros::dec;

    #[test]
    fn payload_field_names() {
        let charge = compute(dec!(3.5), dec!(200), dec!(0.15)).unwrap();
        let req = RecalculationRequest::from_charge(42, Some(dec!(3.5)), &charge, false);
        let json = serde_json::to_string(&req).unwrap();
        insta::assert_snapshot!(json, @r#"{"facturaId":42,"tasa_base_especial":3.5,"aplica_iva":true,"porcentaje_iva":0.15,"area_propiedad":200.0,"solo_factura_actual":false}"#);
    }

    #[test]
    fn zero_tax_sends_null_percentage() {
        let charge = compute(dec!(5), dec!(1), dec!(0)).unwrap();
        let req = RecalculationRequest::from_charge(7, None, &charge, true);
        assert!(!req.applies_tax);
        assert_eq!(req.tax_fraction, None);

        let value: serde_json::Value = serde_json::to_value(&req).unwrap();
        assert!(value["porcentaje_iva"].is_null());
        assert!(value["tasa_base_especial"].is_null());
        assert_eq!(value["solo_factura_actual"], true);
    }
}
