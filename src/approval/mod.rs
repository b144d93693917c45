//! Batched invoice approval with sequence-conflict retry.
//!
//! Draft invoices are submitted to the backend's approval endpoint, which
//! forwards them to the external invoicing provider. The provider numbers
//! documents from a sequence; when a number is already taken it answers
//! `Error 409: "Documento ya existe"` and the invoice is retried once with
//! the next free number.
//!
//! Per invoice: `Selected → Submitted → {Approved | Failed}`.

mod conflict;
mod run;
mod wire;

pub use conflict::{CONFLICT_STATUS, DOCUMENT_EXISTS, is_document_exists_conflict};
pub use run::{
    ApprovalPhase, ApprovalProgress, ApprovalReport, ApprovalRun, BATCH_SIZE, approve_invoices,
};
pub use wire::{ApprovalGateway, ApprovalRequest, ApprovalResponse, InvoiceFailure};
