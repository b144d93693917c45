//! Save special billing terms, gated behind explicit confirmation when an
//! active configuration would be replaced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::recalc::{InvoiceRecalculator, RecalculationRequest};
use super::store::ConfigurationStore;
use crate::core::{
    BillingConfiguration, Charge, CobranzaError, ConfigurationForm, ConfigurationId,
    ConfigurationKey, InvoiceId, Property, Service, into_validation_result, resolve_and_compute,
    validate_form,
};

/// A request to save special terms, made from an invoice being reviewed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRequest {
    pub key: ConfigurationKey,
    /// Invoice to recalculate once the terms are saved.
    pub invoice_id: InvoiceId,
    pub form: ConfigurationForm,
    pub property: Property,
    pub service: Service,
}

/// Proof that the caller saw the configuration it is about to replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementToken {
    pub configuration_id: ConfigurationId,
    pub updated_at: DateTime<Utc>,
}

impl ReplacementToken {
    fn for_configuration(configuration: &BillingConfiguration) -> Self {
        Self {
            configuration_id: configuration.id,
            updated_at: configuration.updated_at,
        }
    }

    fn matches(&self, configuration: &BillingConfiguration) -> bool {
        self.configuration_id == configuration.id && self.updated_at == configuration.updated_at
    }
}

/// First phase of a save.
#[derive(Debug, Clone)]
pub enum Proposal {
    /// Nothing would be replaced; confirm without a token.
    Ready(SaveRequest),
    /// An active configuration exists; confirm with the token to replace it.
    ConfirmationRequired {
        existing: BillingConfiguration,
        token: ReplacementToken,
        request: SaveRequest,
    },
}

/// Result of a confirmed save.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedConfiguration {
    /// Stored row, `None` for invoice-only overrides.
    pub configuration_id: Option<ConfigurationId>,
    /// Charge the invoice was recalculated with.
    pub charge: Charge,
}

/// Result of [`ConfigurationService::save_configuration`].
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(SavedConfiguration),
    /// Nothing was written; the caller must confirm replacing `existing`.
    ConfirmationRequired {
        existing: BillingConfiguration,
        token: ReplacementToken,
    },
}

/// Saves special billing terms and recalculates the originating invoice.
pub struct ConfigurationService<S, R> {
    store: S,
    recalculator: R,
}

impl<S, R> ConfigurationService<S, R>
where
    S: ConfigurationStore,
    R: InvoiceRecalculator,
{
    pub fn new(store: S, recalculator: R) -> Self {
        Self {
            store,
            recalculator,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate the request and report whether saving it would replace an
    /// active configuration. Writes nothing.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad form; store errors from the lookup.
    pub async fn propose(&self, request: SaveRequest) -> Result<Proposal, CobranzaError> {
        into_validation_result(validate_form(&request.form))?;

        if request.form.invoice_only {
            return Ok(Proposal::Ready(request));
        }

        match self.store.find_active(&request.key).await? {
            Some(existing) => {
                debug!(key = %request.key, configuration_id = existing.id, "active configuration found");
                let token = ReplacementToken::for_configuration(&existing);
                Ok(Proposal::ConfirmationRequired {
                    existing,
                    token,
                    request,
                })
            }
            None => Ok(Proposal::Ready(request)),
        }
    }

    /// Write the configuration (unless invoice-only) and recalculate the invoice.
    ///
    /// `token` must come from [`Self::propose`] when an active configuration
    /// exists, and must be `None` otherwise.
    ///
    /// # Errors
    ///
    /// - `Validation` for a bad form.
    /// - `Conflict` when the active configuration no longer matches `token`;
    ///   nothing is written.
    /// - `Persistence` when the write fails; the invoice is not recalculated.
    /// - Recalculation errors after a successful write; the stored
    ///   configuration is kept.
    pub async fn confirm(
        &self,
        request: SaveRequest,
        token: Option<&ReplacementToken>,
    ) -> Result<SavedConfiguration, CobranzaError> {
        into_validation_result(validate_form(&request.form))?;
        let fields = request.form.to_fields();

        let (configuration, configuration_id) = if request.form.invoice_only {
            let now = Utc::now();
            let transient = BillingConfiguration {
                id: 0,
                key: request.key,
                fields,
                invoice_only: true,
                active: false,
                created_at: now,
                updated_at: now,
            };
            (transient, None)
        } else {
            let existing = self.store.find_active(&request.key).await?;
            let stored = match (existing, token) {
                (Some(existing), Some(token)) if token.matches(&existing) => {
                    self.store.update(existing.id, &fields).await?
                }
                (Some(existing), _) => {
                    return Err(CobranzaError::Conflict(format!(
                        "configuration {} for {} must be confirmed before it is replaced",
                        existing.id, request.key
                    )));
                }
                (None, None) => self.store.insert(&request.key, &fields).await?,
                (None, Some(token)) => {
                    return Err(CobranzaError::Conflict(format!(
                        "configuration {} for {} is no longer active",
                        token.configuration_id, request.key
                    )));
                }
            };
            let id = stored.id;
            (stored, Some(id))
        };

        let charge = resolve_and_compute(
            &request.property,
            Some(&request.service),
            Some(&configuration),
        )?;

        let recalculation = RecalculationRequest::from_charge(
            request.invoice_id,
            configuration.fields.special_base_rate,
            &charge,
            request.form.invoice_only,
        );
        self.recalculator.recalculate(&recalculation).await?;

        info!(
            key = %request.key,
            invoice_id = request.invoice_id,
            configuration_id = ?configuration_id,
            invoice_only = request.form.invoice_only,
            total = %charge.total,
            "special terms saved"
        );

        Ok(SavedConfiguration {
            configuration_id,
            charge,
        })
    }

    /// Save in one call. Without `confirmed`, a request that would replace
    /// an active configuration writes nothing and returns
    /// [`SaveOutcome::ConfirmationRequired`].
    pub async fn save_configuration(
        &self,
        request: SaveRequest,
        confirmed: bool,
    ) -> Result<SaveOutcome, CobranzaError> {
        match self.propose(request).await? {
            Proposal::Ready(request) => self.confirm(request, None).await.map(SaveOutcome::Saved),
            Proposal::ConfirmationRequired { token, request, .. } if confirmed => self
                .confirm(request, Some(&token))
                .await
                .map(SaveOutcome::Saved),
            Proposal::ConfirmationRequired {
                existing, token, ..
            } => Ok(SaveOutcome::ConfirmationRequired { existing, token }),
        }
    }

    /// Deactivate the active configuration for `key`.
    /// Returns whether there was one.
    pub async fn deactivate_configuration(
        &self,
        key: &ConfigurationKey,
    ) -> Result<bool, CobranzaError> {
        match self.store.find_active(key).await? {
            Some(existing) => {
                self.store.deactivate(existing.id).await?;
                info!(key = %key, configuration_id = existing.id, "configuration deactivated");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
