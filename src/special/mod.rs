//! Special billing terms per (property, client, service).
//!
//! An operator reviewing a draft invoice can set a special base rate and/or
//! a tax override for the service, either for that invoice only or as a
//! reusable configuration. Replacing an active configuration is a two-phase
//! operation: [`ConfigurationService::propose`] returns a
//! [`ReplacementToken`], and [`ConfigurationService::confirm`] only writes
//! if the configuration is still the one the token was issued for.
//!
//! # Example
//!
//! ```ignore
//! use cobranza::special::*;
//!
//! let service = ConfigurationService::new(InMemoryConfigurationStore::new(), backend);
//! match service.save_configuration(request, false).await? {
//!     SaveOutcome::Saved(saved) => println!("total {}", saved.charge.total),
//!     SaveOutcome::ConfirmationRequired { existing, .. } => {
//!         println!("replace configuration {}?", existing.id)
//!     }
//! }
//! ```

mod recalc;
mod store;
mod upsert;

pub use recalc::{InvoiceRecalculator, RecalculationRequest};
pub use store::{ConfigurationStore, InMemoryConfigurationStore};
pub use upsert::{
    ConfigurationService, Proposal, ReplacementToken, SaveOutcome, SaveRequest, SavedConfiguration,
};
