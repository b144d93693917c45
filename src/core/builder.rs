use chrono::Utc;
use rust_decimal::Decimal;

use super::error::CobranzaError;
use super::types::*;

/// Builder for [`Property`].
///
/// ```
/// use cobranza::core::*;
/// use rust_decimal_macros::dec;
///
/// let property = PropertyBuilder::new(1, "Torre A-302", dec!(120))
///     .area(AreaKind::Usable, dec!(95))
///     .area(AreaKind::Parking, dec!(12.5))
///     .build();
/// assert_eq!(property.area_of(AreaKind::Parking), Some(dec!(12.5)));
/// ```
pub struct PropertyBuilder {
    id: i64,
    name: String,
    total_area: Decimal,
    areas: Vec<AreaEntry>,
}

impl PropertyBuilder {
    pub fn new(id: i64, name: impl Into<String>, total_area: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            total_area,
            areas: Vec::new(),
        }
    }

    pub fn area(mut self, kind: AreaKind, value: Decimal) -> Self {
        self.areas.push(AreaEntry { kind, value });
        self
    }

    pub fn build(self) -> Property {
        Property {
            id: self.id,
            name: self.name,
            total_area: self.total_area,
            areas: self.areas,
        }
    }
}

/// Builder for [`Service`]. Defaults to a flat unit and no tax.
pub struct ServiceBuilder {
    id: i64,
    code: String,
    name: String,
    base_price: Decimal,
    unit: String,
    default_tax_percentage: Decimal,
}

impl ServiceBuilder {
    pub fn new(id: i64, code: impl Into<String>, base_price: Decimal) -> Self {
        let code = code.into();
        Self {
            id,
            name: code.clone(),
            code,
            base_price,
            unit: "unidad".to_string(),
            default_tax_percentage: Decimal::ZERO,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Default tax percentage, as fraction or whole number.
    pub fn tax(mut self, percentage: Decimal) -> Self {
        self.default_tax_percentage = percentage;
        self
    }

    pub fn build(self) -> Service {
        Service {
            id: self.id,
            code: self.code,
            name: self.name,
            base_price: self.base_price,
            unit: self.unit,
            default_tax_percentage: self.default_tax_percentage,
        }
    }
}

/// Builder for a stored [`BillingConfiguration`], mostly for tests and imports.
pub struct ConfigurationBuilder {
    id: ConfigurationId,
    key: ConfigurationKey,
    fields: ConfigurationFields,
    invoice_only: bool,
    active: bool,
}

impl ConfigurationBuilder {
    pub fn new(id: ConfigurationId, key: ConfigurationKey) -> Self {
        Self {
            id,
            key,
            fields: ConfigurationFields::default(),
            invoice_only: false,
            active: true,
        }
    }

    pub fn special_base_rate(mut self, rate: Decimal) -> Self {
        self.fields.special_base_rate = Some(rate);
        self
    }

    /// Charge tax at `percentage` (fraction or whole number).
    pub fn tax(mut self, percentage: Decimal) -> Self {
        self.fields.applies_tax = Some(true);
        self.fields.special_tax_percentage = Some(percentage);
        self
    }

    /// Set the applicability flag without a percentage.
    pub fn applies_tax(mut self, applies: bool) -> Self {
        self.fields.applies_tax = Some(applies);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.fields.notes = Some(notes.into());
        self
    }

    pub fn invoice_only(mut self, invoice_only: bool) -> Self {
        self.invoice_only = invoice_only;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn build(self) -> BillingConfiguration {
        let now = Utc::now();
        BillingConfiguration {
            id: self.id,
            key: self.key,
            fields: self.fields,
            invoice_only: self.invoice_only,
            active: self.active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Builder for a draft [`Invoice`].
pub struct InvoiceBuilder {
    id: InvoiceId,
    property_id: i64,
    client_id: i64,
    lines: Vec<InvoiceLine>,
}

impl InvoiceBuilder {
    pub fn new(id: InvoiceId, property_id: i64, client_id: i64) -> Self {
        Self {
            id,
            property_id,
            client_id,
            lines: Vec::new(),
        }
    }

    pub fn add_line(mut self, line: InvoiceLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Build the draft and derive its totals from the lines.
    pub fn build(self) -> Result<Invoice, CobranzaError> {
        if self.lines.len() > 1_000 {
            return Err(CobranzaError::InvalidInput(
                "invoice cannot have more than 1,000 lines".into(),
            ));
        }

        let mut invoice = Invoice {
            id: self.id,
            property_id: self.property_id,
            client_id: self.client_id,
            status: InvoiceStatus::Draft,
            lines: self.lines,
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            external_document_id: None,
            sequence_number: None,
        };
        invoice.recalculate_totals()?;
        Ok(invoice)
    }
}

/// Builder for [`InvoiceLine`]. Quantity defaults to 1, tax to 0.
pub struct InvoiceLineBuilder {
    service_code: String,
    description: String,
    quantity: Decimal,
    unit_price: Decimal,
    tax_percentage: Decimal,
}

impl InvoiceLineBuilder {
    pub fn new(
        service_code: impl Into<String>,
        description: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            service_code: service_code.into(),
            description: description.into(),
            quantity: Decimal::ONE,
            unit_price,
            tax_percentage: Decimal::ZERO,
        }
    }

    pub fn quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    /// Tax rate as a fraction (0.12 = 12%).
    pub fn tax(mut self, fraction: Decimal) -> Self {
        self.tax_percentage = fraction;
        self
    }

    pub fn build(self) -> InvoiceLine {
        InvoiceLine {
            service_code: self.service_code,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            tax_percentage: self.tax_percentage,
        }
    }
}
