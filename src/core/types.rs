use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Row id of a stored billing configuration.
pub type ConfigurationId = i64;

/// Row id of an invoice.
pub type InvoiceId = i64;

/// A managed property (apartment, office, parking lot...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub name: String,
    /// Total area in square metres.
    pub total_area: Decimal,
    /// Breakdown of the total area by kind. May be empty.
    pub areas: Vec<AreaEntry>,
}

impl Property {
    /// First breakdown entry of the given kind.
    pub fn area_of(&self, kind: AreaKind) -> Option<Decimal> {
        self.areas
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.value)
    }
}

/// One entry of a property's area breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaEntry {
    pub kind: AreaKind,
    pub value: Decimal,
}

/// Kinds of area a property breakdown distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKind {
    /// Parking spaces.
    Parking,
    /// Usable (private) area.
    Usable,
    /// Anything else (storage, terraces, ...).
    Other,
}

impl AreaKind {
    /// Parse a breakdown label as stored by the back office
    /// ("Parqueadero", "Área útil", ...).
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        if label.contains("parque") || label.contains("estacionamiento") || label == "parking" {
            Self::Parking
        } else if label.contains("util") || label.contains("útil") || label == "usable" {
            Self::Usable
        } else {
            Self::Other
        }
    }
}

/// A billable catalog item. Read-only reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    /// Catalog code, e.g. "APAC" (parking) or "AOACO".
    pub code: String,
    pub name: String,
    /// Price per unit before tax.
    pub base_price: Decimal,
    /// Unit label, e.g. "m2" or "mensual".
    pub unit: String,
    /// Default tax percentage, stored either as fraction (0.12) or whole number (12).
    pub default_tax_percentage: Decimal,
}

/// Identifies the (property, client, service) triple a configuration applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigurationKey {
    pub property_id: i64,
    pub client_id: i64,
    pub service_id: i64,
}

impl ConfigurationKey {
    pub fn new(property_id: i64, client_id: i64, service_id: i64) -> Self {
        Self {
            property_id,
            client_id,
            service_id,
        }
    }
}

impl std::fmt::Display for ConfigurationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "property={} client={} service={}",
            self.property_id, self.client_id, self.service_id
        )
    }
}

/// Special billing terms for one (property, client, service) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingConfiguration {
    pub id: ConfigurationId,
    pub key: ConfigurationKey,
    #[serde(flatten)]
    pub fields: ConfigurationFields,
    /// True for a one-invoice-only override, false for a reusable configuration.
    pub invoice_only: bool,
    /// At most one active configuration exists per key.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The editable part of a billing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationFields {
    /// Replaces the service base price when set.
    pub special_base_rate: Option<Decimal>,
    /// `Some(true)`: charge `special_tax_percentage`; `Some(false)`: no tax;
    /// `None`: service default.
    pub applies_tax: Option<bool>,
    /// Tax percentage, fraction or whole number depending on who wrote the row.
    pub special_tax_percentage: Option<Decimal>,
    pub notes: Option<String>,
}

/// Invoice lifecycle. Approved invoices are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Approved,
}

/// An invoice issued to one client for one property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub property_id: i64,
    pub client_id: i64,
    pub status: InvoiceStatus,
    pub lines: Vec<InvoiceLine>,
    /// Derived: sum of line subtotals.
    pub subtotal: Decimal,
    /// Derived: sum of line taxes.
    pub tax: Decimal,
    /// Derived: `round2(subtotal + tax)`.
    pub total: Decimal,
    /// Id assigned by the invoicing provider on approval.
    pub external_document_id: Option<String>,
    /// Sequence number the invoice was approved under.
    pub sequence_number: Option<String>,
}

/// One invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub service_code: String,
    pub description: String,
    /// Quantity; the area for area-based services, 1 otherwise.
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Tax rate as a fraction (0.12 = 12%).
    pub tax_percentage: Decimal,
}

/// Special-terms form as submitted by an operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationForm {
    /// Replace the service base price with `special_base_rate`.
    pub special_rate_enabled: bool,
    pub special_base_rate: Option<Decimal>,
    /// Override the service tax with `tax_percentage`.
    pub tax_enabled: bool,
    /// Whole-number percentage as typed (12 = 12%).
    pub tax_percentage: Option<Decimal>,
    pub notes: Option<String>,
    /// Recalculate the originating invoice only; store nothing.
    pub invoice_only: bool,
}
