//! Approve 25 draft invoices against a simulated provider where one
//! sequence number is already taken.
//!
//! Run with: `cargo run --example approve_batch --features workflow`

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use cobranza::approval::*;
use cobranza::core::*;
use tracing_subscriber::EnvFilter;

/// Rejects invoice 7 once with a duplicate-document error.
struct SimulatedProvider {
    collided: AtomicBool,
}

#[async_trait]
impl ApprovalGateway for SimulatedProvider {
    async fn submit(&self, request: &ApprovalRequest) -> Result<ApprovalResponse, CobranzaError> {
        let mut response = ApprovalResponse {
            success: true,
            ..Default::default()
        };
        for &id in &request.invoice_ids {
            if id == 7 && !self.collided.swap(true, Ordering::SeqCst) {
                response.failed += 1;
                response.failures.push(InvoiceFailure {
                    invoice_id: id,
                    error: r#"Error 409: "Documento ya existe""#.into(),
                });
            } else {
                response.approved += 1;
            }
        }
        Ok(response)
    }
}

#[tokio::main]
async fn main() -> Result<(), CobranzaError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let provider = SimulatedProvider {
        collided: AtomicBool::new(false),
    };
    let invoice_ids: Vec<InvoiceId> = (1..=25).collect();

    let report = ApprovalRun::new(&provider)
        .sequence(SequenceCounter::starting_at("001-001-", 121)?)
        .on_progress(|p| println!("{:?}: {} approved, {} errors", p.phase, p.approved, p.errors))
        .run(&invoice_ids)
        .await;

    println!(
        "approved={} errors={} retried={}",
        report.approved, report.errors, report.retried
    );
    if let Some(next) = report.next_sequence {
        println!("next document number: {}", next.peek());
    }
    for detail in &report.error_details {
        println!("  {detail}");
    }
    Ok(())
}
