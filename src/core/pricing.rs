//! Rate, area and tax resolution for a single billed service.
//!
//! Every amount here is derived: `subtotal = round2(rate × area)`,
//! `tax = round2(subtotal × tax_fraction)`, `total = round2(subtotal + tax)`.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::CobranzaError;
use super::types::*;
use super::units::{self, AreaSource};

/// Result of pricing one service for one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    /// Effective unit rate.
    pub rate: Decimal,
    /// Multiplier: the resolved area, or 1 for flat services.
    pub area: Decimal,
    /// Effective tax rate as a fraction (0.12 = 12%).
    pub tax_fraction: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Round to two decimal places, half-up (commercial rounding).
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Normalize a stored tax percentage to a fraction.
///
/// Values `<= 1` are taken as fractions already, larger values are whole
/// percentages and get divided by 100. A whole-number 1% stored as `1` is
/// therefore read as 100%; rows written by this crate always hold fractions.
pub fn normalize_percentage(stored: Decimal) -> Decimal {
    if stored <= Decimal::ONE {
        stored
    } else {
        stored / dec!(100)
    }
}

/// Convert a floating-point amount received at a boundary into a `Decimal`.
///
/// # Errors
///
/// Returns `CobranzaError::InvalidInput` for NaN, infinities and values out
/// of `Decimal` range.
pub fn decimal_from_f64(value: f64, field: &str) -> Result<Decimal, CobranzaError> {
    if !value.is_finite() {
        return Err(CobranzaError::InvalidInput(format!(
            "{field} is not a finite number"
        )));
    }
    Decimal::from_f64(value)
        .ok_or_else(|| CobranzaError::InvalidInput(format!("{field} is out of range: {value}")))
}

/// Effective unit rate: the special base rate when configured, else the service price.
pub fn resolve_rate(service: &Service, configuration: Option<&BillingConfiguration>) -> Decimal {
    configuration
        .and_then(|c| c.fields.special_base_rate)
        .unwrap_or(service.base_price)
}

/// Effective area multiplier for a service on a property.
pub fn resolve_area(property: &Property, service: &Service) -> Decimal {
    if !units::is_area_unit(&service.unit) {
        return Decimal::ONE;
    }
    match units::area_source_for(&service.code) {
        AreaSource::Parking => property.area_of(AreaKind::Parking).unwrap_or(Decimal::ZERO),
        AreaSource::UsableOrTotal => property
            .area_of(AreaKind::Usable)
            .unwrap_or(property.total_area),
        AreaSource::Total => property.total_area,
    }
}

/// Effective tax rate as a fraction.
pub fn resolve_tax_fraction(
    service: &Service,
    configuration: Option<&BillingConfiguration>,
) -> Decimal {
    let default = normalize_percentage(service.default_tax_percentage);
    match configuration.and_then(|c| c.fields.applies_tax.map(|flag| (flag, c))) {
        Some((true, c)) => c
            .fields
            .special_tax_percentage
            .map(normalize_percentage)
            .unwrap_or(default),
        Some((false, _)) => Decimal::ZERO,
        None => default,
    }
}

/// Compute subtotal, tax and total from resolved inputs.
///
/// # Errors
///
/// `CobranzaError::InvalidInput` if rate or area is negative, the tax
/// fraction is outside `[0, 1]`, or the amounts overflow.
pub fn compute(rate: Decimal, area: Decimal, tax_fraction: Decimal) -> Result<Charge, CobranzaError> {
    if rate < Decimal::ZERO {
        return Err(CobranzaError::InvalidInput(format!(
            "rate must not be negative: {rate}"
        )));
    }
    if area < Decimal::ZERO {
        return Err(CobranzaError::InvalidInput(format!(
            "area must not be negative: {area}"
        )));
    }
    if tax_fraction < Decimal::ZERO || tax_fraction > Decimal::ONE {
        return Err(CobranzaError::InvalidInput(format!(
            "tax fraction must be between 0 and 1: {tax_fraction}"
        )));
    }

    let overflow = || CobranzaError::InvalidInput(format!("amount overflow: {rate} × {area}"));
    let subtotal = round2(rate.checked_mul(area).ok_or_else(overflow)?);
    let tax = round2(subtotal.checked_mul(tax_fraction).ok_or_else(overflow)?);
    let total = round2(subtotal.checked_add(tax).ok_or_else(overflow)?);

    Ok(Charge {
        rate,
        area,
        tax_fraction,
        subtotal,
        tax,
        total,
    })
}

/// Resolve rate, area and tax for a property/service pair and compute the charge.
///
/// Pure: identical inputs always give identical outputs.
///
/// # Errors
///
/// `CobranzaError::InvalidInput` when `service` is `None` or [`compute`] rejects
/// the resolved values.
pub fn resolve_and_compute(
    property: &Property,
    service: Option<&Service>,
    configuration: Option<&BillingConfiguration>,
) -> Result<Charge, CobranzaError> {
    let service = service
        .ok_or_else(|| CobranzaError::InvalidInput("service is required".into()))?;

    let rate = resolve_rate(service, configuration);
    let area = resolve_area(property, service);
    let tax_fraction = resolve_tax_fraction(service, configuration);

    compute(rate, area, tax_fraction)
}

impl Invoice {
    /// Replace the line billed for `service_code` (or append one) with the
    /// given charge and rederive the totals. Drafts only.
    pub fn apply_charge(
        &mut self,
        service_code: &str,
        description: impl Into<String>,
        charge: &Charge,
    ) -> Result<(), CobranzaError> {
        self.ensure_draft()?;

        let line = InvoiceLine {
            service_code: service_code.to_string(),
            description: description.into(),
            quantity: charge.area,
            unit_price: charge.rate,
            tax_percentage: charge.tax_fraction,
        };
        let previous = self.lines.clone();
        match self
            .lines
            .iter_mut()
            .find(|l| l.service_code.eq_ignore_ascii_case(service_code))
        {
            Some(existing) => *existing = line,
            None => self.lines.push(line),
        }

        // Leave the draft untouched when the new totals are not representable.
        self.recalculate_totals().inspect_err(|_| self.lines = previous)
    }

    /// Rederive subtotal, tax and total from the lines. Drafts only.
    pub fn recalculate_totals(&mut self) -> Result<(), CobranzaError> {
        self.ensure_draft()?;

        let id = self.id;
        let overflow = || CobranzaError::InvalidInput(format!("invoice {id} totals overflow"));
        let mut subtotal = Decimal::ZERO;
        let mut tax = Decimal::ZERO;
        for line in &self.lines {
            let charge = compute(line.unit_price, line.quantity, line.tax_percentage)?;
            subtotal = subtotal.checked_add(charge.subtotal).ok_or_else(overflow)?;
            tax = tax.checked_add(charge.tax).ok_or_else(overflow)?;
        }
        let total = round2(subtotal.checked_add(tax).ok_or_else(overflow)?);

        self.subtotal = subtotal;
        self.tax = tax;
        self.total = total;
        Ok(())
    }

    /// Move a draft to `Approved`, recording the provider's document id.
    pub fn mark_approved(
        &mut self,
        external_document_id: impl Into<String>,
        sequence_number: Option<String>,
    ) -> Result<(), CobranzaError> {
        self.ensure_draft()?;
        self.status = InvoiceStatus::Approved;
        self.external_document_id = Some(external_document_id.into());
        self.sequence_number = sequence_number;
        Ok(())
    }

    fn ensure_draft(&self) -> Result<(), CobranzaError> {
        match self.status {
            InvoiceStatus::Draft => Ok(()),
            InvoiceStatus::Approved => Err(CobranzaError::InvalidInput(format!(
                "invoice {} is approved and can no longer be changed",
                self.id
            ))),
        }
    }
}
