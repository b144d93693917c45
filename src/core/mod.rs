//! Core billing types, rate & tax resolution, validation, and numbering.
//!
//! Everything in this module is pure: no I/O, no clocks except the
//! timestamps builders stamp on new configurations.

mod builder;
mod error;
mod numbering;
mod pricing;
mod types;
pub mod units;
mod validation;

pub use builder::*;
pub use error::*;
pub use numbering::*;
pub use pricing::*;
pub use types::*;
pub use units::is_area_unit;
pub use validation::*;
