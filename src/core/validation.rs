use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::ValidationError;
use super::types::*;

/// Maximum length of the free-text notes, in characters.
pub const MAX_NOTES_LEN: usize = 500;

/// Validate an operator's special-terms form.
/// Returns all validation errors found (not just the first).
pub fn validate_form(form: &ConfigurationForm) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !form.special_rate_enabled && !form.tax_enabled {
        errors.push(ValidationError::new(
            "form",
            "enable a special rate, a tax override, or both",
        ));
    }

    if form.tax_enabled {
        match form.tax_percentage {
            None => errors.push(ValidationError::new(
                "tax_percentage",
                "a numeric tax percentage is required when the tax override is enabled",
            )),
            Some(p) if p < Decimal::ZERO || p > dec!(100) => errors.push(ValidationError::new(
                "tax_percentage",
                format!("tax percentage must be between 0 and 100, got {p}"),
            )),
            Some(_) => {}
        }
    }

    if form.special_rate_enabled {
        match form.special_base_rate {
            None => errors.push(ValidationError::new(
                "special_base_rate",
                "a numeric base rate is required when the special rate is enabled",
            )),
            Some(r) if r < Decimal::ZERO => errors.push(ValidationError::new(
                "special_base_rate",
                format!("base rate must not be negative, got {r}"),
            )),
            Some(_) => {}
        }
    }

    if let Some(notes) = &form.notes {
        if notes.chars().count() > MAX_NOTES_LEN {
            errors.push(ValidationError::new(
                "notes",
                format!("notes cannot exceed {MAX_NOTES_LEN} characters"),
            ));
        }
    }

    errors
}

impl ConfigurationForm {
    /// Stored fields for this form. Tax percentages are stored as fractions.
    ///
    /// Call [`validate_form`] first; disabled sections map to `None`.
    pub fn to_fields(&self) -> ConfigurationFields {
        let special_base_rate = if self.special_rate_enabled {
            self.special_base_rate
        } else {
            None
        };

        let (applies_tax, special_tax_percentage) = match (self.tax_enabled, self.tax_percentage) {
            (true, Some(p)) if p > Decimal::ZERO => (Some(true), Some(p / dec!(100))),
            (true, _) => (Some(false), None),
            (false, _) => (None, None),
        };

        let notes = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from);

        ConfigurationFields {
            special_base_rate,
            applies_tax,
            special_tax_percentage,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ConfigurationForm {
        ConfigurationForm {
            special_rate_enabled: true,
            special_base_rate: Some(dec!(3.5)),
            tax_enabled: true,
            tax_percentage: Some(dec!(15)),
            notes: Some("  acuerdo 2024  ".into()),
            invoice_only: false,
        }
    }

    #[test]
    fn valid_form() {
        assert!(validate_form(&form()).is_empty());
    }

    #[test]
    fn nothing_enabled() {
        let f = ConfigurationForm::default();
        let errors = validate_form(&f);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "form");
    }

    #[test]
    fn tax_out_of_range() {
        let mut f = form();
        f.tax_percentage = Some(dec!(100.5));
        let errors = validate_form(&f);
        assert_eq!(errors[0].field, "tax_percentage");

        f.tax_percentage = Some(dec!(-1));
        assert_eq!(validate_form(&f).len(), 1);

        f.tax_percentage = Some(dec!(100));
        assert!(validate_form(&f).is_empty());
    }

    #[test]
    fn missing_numbers_reported_together() {
        let mut f = form();
        f.tax_percentage = None;
        f.special_base_rate = None;
        let fields: Vec<_> = validate_form(&f).into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["tax_percentage", "special_base_rate"]);
    }

    #[test]
    fn negative_rate() {
        let mut f = form();
        f.special_base_rate = Some(dec!(-0.01));
        assert_eq!(validate_form(&f)[0].field, "special_base_rate");
    }

    #[test]
    fn disabled_sections_ignore_values() {
        let mut f = form();
        f.tax_enabled = false;
        f.tax_percentage = Some(dec!(500));
        assert!(validate_form(&f).is_empty());
        assert_eq!(f.to_fields().applies_tax, None);
        assert_eq!(f.to_fields().special_tax_percentage, None);
    }

    #[test]
    fn fields_store_fractions() {
        let fields = form().to_fields();
        assert_eq!(fields.special_base_rate, Some(dec!(3.5)));
        assert_eq!(fields.applies_tax, Some(true));
        assert_eq!(fields.special_tax_percentage, Some(dec!(0.15)));
        assert_eq!(fields.notes.as_deref(), Some("acuerdo 2024"));
    }

    #[test]
    fn zero_percent_means_no_tax() {
        let mut f = form();
        f.tax_percentage = Some(dec!(0));
        let fields = f.to_fields();
        assert_eq!(fields.applies_tax, Some(false));
        assert_eq!(fields.special_tax_percentage, None);
    }

    #[test]
    fn notes_too_long() {
        let mut f = form();
        f.notes = Some("x".repeat(MAX_NOTES_LEN + 1));
        assert_eq!(validate_form(&f)[0].field, "notes");
    }
}
