//! # cobranza
//!
//! Billing and collections for a property-management back office:
//! special-rate and tax resolution per property and service, special
//! configurations saved behind an explicit replacement confirmation, and
//! batched invoice approval with gap-free sequence numbering.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use cobranza::core::*;
//! use rust_decimal_macros::dec;
//!
//! let property = PropertyBuilder::new(1, "Torre A-302", dec!(100)).build();
//! let service = ServiceBuilder::new(1, "ALIC", dec!(5))
//!     .unit("m2")
//!     .tax(dec!(0.12))
//!     .build();
//!
//! let charge = resolve_and_compute(&property, Some(&service), None).unwrap();
//! assert_eq!(charge.subtotal, dec!(500.00));
//! assert_eq!(charge.tax, dec!(60.00));
//! assert_eq!(charge.total, dec!(560.00));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Types, rate & tax resolution, validation, numbering |
//! | `workflow` | Configuration upsert, batch approval, notifications |
//! | `http` | reqwest backend client, REST configuration store, settings |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "workflow")]
pub mod approval;

#[cfg(feature = "workflow")]
pub mod notify;

#[cfg(feature = "workflow")]
pub mod special;

#[cfg(feature = "http")]
pub mod backend;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
