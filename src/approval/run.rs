use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use super::conflict::is_document_exists_conflict;
use super::wire::{ApprovalGateway, ApprovalRequest, ApprovalResponse};
use crate::core::{InvoiceId, SequenceCounter};
use crate::notify::{Notification, NotificationKind, Notifier, notify_best_effort};

/// Invoices per approval request.
pub const BATCH_SIZE: usize = 10;

/// Outcome of an approval run. Partial success is the normal case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalReport {
    /// Invoices approved, across batches and retries.
    pub approved: u64,
    /// Invoices that ended in a hard failure.
    pub errors: u64,
    /// One human-readable line per failure.
    pub error_details: Vec<String>,
    /// Invoices resubmitted after a sequence conflict.
    pub retried: u64,
    /// Counter positioned after the last approved invoice.
    pub next_sequence: Option<SequenceCounter>,
}

/// Where an approval run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalPhase {
    /// Batch `index` (1-based) of `of` was submitted.
    Batch { index: usize, of: usize },
    /// A conflicting invoice was resubmitted.
    Retry { invoice_id: InvoiceId },
}

/// Progress snapshot handed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalProgress {
    pub phase: ApprovalPhase,
    pub approved: u64,
    pub errors: u64,
    /// Conflicts still waiting for their retry.
    pub pending_retries: usize,
}

type ProgressFn<'a> = Box<dyn FnMut(&ApprovalProgress) + Send + 'a>;

/// Batched invoice approval with one retry per sequence conflict.
///
/// Batches and retries go out strictly one at a time so that sequence
/// numbers are handed out in order and without gaps. Nothing is rolled back
/// when later batches fail.
///
/// ```ignore
/// let report = ApprovalRun::new(&backend)
///     .sequence(SequenceCounter::starting_at("001-001-", 121)?)
///     .on_progress(|p| println!("{p:?}"))
///     .run(&invoice_ids)
///     .await;
/// ```
pub struct ApprovalRun<'a, G: ?Sized> {
    gateway: &'a G,
    batch_size: usize,
    sequence: Option<SequenceCounter>,
    notifier: Option<&'a dyn Notifier>,
    on_progress: Option<ProgressFn<'a>>,
}

impl<'a, G> ApprovalRun<'a, G>
where
    G: ApprovalGateway + ?Sized,
{
    pub fn new(gateway: &'a G) -> Self {
        Self {
            gateway,
            batch_size: BATCH_SIZE,
            sequence: None,
            notifier: None,
            on_progress: None,
        }
    }

    /// Invoices per request (default [`BATCH_SIZE`], minimum 1).
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Number approved invoices from this counter.
    pub fn sequence(mut self, counter: SequenceCounter) -> Self {
        self.sequence = Some(counter);
        self
    }

    /// Send a summary once the run ends. Delivery failures are only logged.
    pub fn notifier(mut self, notifier: &'a dyn Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Called after every batch and every retry.
    pub fn on_progress(mut self, callback: impl FnMut(&ApprovalProgress) + Send + 'a) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Submit `invoice_ids` (duplicates are submitted once) and report the outcome.
    pub async fn run(mut self, invoice_ids: &[InvoiceId]) -> ApprovalReport {
        let mut seen = HashSet::with_capacity(invoice_ids.len());
        let ids: Vec<InvoiceId> = invoice_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let mut report = ApprovalReport::default();
        if ids.is_empty() {
            report.next_sequence = self.sequence;
            return report;
        }

        let batch_count = ids.len().div_ceil(self.batch_size);
        info!(
            invoices = ids.len(),
            batches = batch_count,
            sequence = ?self.sequence.as_ref().map(SequenceCounter::peek),
            "approval run started"
        );

        // Phase 1: batches.
        let mut conflicts: Vec<InvoiceId> = Vec::new();
        for (index, batch) in ids.chunks(self.batch_size).enumerate() {
            let number = index + 1;
            let request = self.request_for(batch);
            match self.gateway.submit(&request).await {
                Ok(response) if response.success => {
                    info!(
                        batch = number,
                        of = batch_count,
                        approved = response.approved,
                        failed = response.failed,
                        "batch submitted"
                    );
                    self.absorb_batch(number, batch.len(), response, &mut report, &mut conflicts);
                }
                Ok(response) => {
                    let reason = response
                        .message
                        .unwrap_or_else(|| "rejected without message".into());
                    warn!(batch = number, reason = %reason, "batch rejected");
                    report.errors += batch.len() as u64;
                    report
                        .error_details
                        .push(format!("batch {number}: {reason}"));
                }
                Err(e) => {
                    warn!(batch = number, error = %e, "batch submission failed");
                    report.errors += batch.len() as u64;
                    report.error_details.push(format!("batch {number}: {e}"));
                }
            }
            self.progress(
                ApprovalPhase::Batch {
                    index: number,
                    of: batch_count,
                },
                &report,
                conflicts.len(),
            );
        }

        // Phase 2: one retry per conflicting invoice, with the next free number.
        let mut pending = conflicts.len();
        for invoice_id in conflicts {
            pending -= 1;
            report.retried += 1;
            let request = self.request_for(&[invoice_id]);
            match self.gateway.submit(&request).await {
                Ok(response)
                    if response.success
                        && response.approved > 0
                        && !response.failures.iter().any(|f| f.invoice_id == invoice_id) =>
                {
                    if let Some(seq) = self.sequence.as_mut() {
                        seq.advance(1);
                    }
                    report.approved += 1;
                    info!(invoice_id, "invoice approved on retry");
                }
                Ok(response) => {
                    let reason = response
                        .failures
                        .into_iter()
                        .next()
                        .map(|f| f.error)
                        .or(response.message)
                        .unwrap_or_else(|| "rejected without detail".into());
                    warn!(invoice_id, reason = %reason, "retry failed");
                    report.errors += 1;
                    report
                        .error_details
                        .push(format!("invoice {invoice_id} (retry): {reason}"));
                }
                Err(e) => {
                    warn!(invoice_id, error = %e, "retry submission failed");
                    report.errors += 1;
                    report
                        .error_details
                        .push(format!("invoice {invoice_id} (retry): {e}"));
                }
            }
            self.progress(ApprovalPhase::Retry { invoice_id }, &report, pending);
        }

        info!(
            approved = report.approved,
            errors = report.errors,
            retried = report.retried,
            "approval run finished"
        );

        if let Some(notifier) = self.notifier {
            let notification = Notification {
                kind: NotificationKind::InvoicesApproved,
                title: "Invoice approval finished".into(),
                message: format!(
                    "{} approved, {} failed",
                    report.approved, report.errors
                ),
                references: ids,
            };
            notify_best_effort(notifier, &notification).await;
        }

        report.next_sequence = self.sequence;
        report
    }

    fn request_for(&self, invoice_ids: &[InvoiceId]) -> ApprovalRequest {
        ApprovalRequest {
            invoice_ids: invoice_ids.to_vec(),
            sequence_prefix: self
                .sequence
                .as_ref()
                .map(|s| s.prefix().to_string())
                .filter(|p| !p.is_empty()),
            sequence_start: self.sequence.as_ref().map(SequenceCounter::next_raw),
        }
    }

    fn absorb_batch(
        &mut self,
        number: usize,
        batch_len: usize,
        response: ApprovalResponse,
        report: &mut ApprovalReport,
        conflicts: &mut Vec<InvoiceId>,
    ) {
        let batch_len = batch_len as u64;
        let detailed = (response.failures.len() as u64).min(batch_len);

        // Never count more approvals than the batch can hold.
        let approved = response.approved.min(batch_len - detailed);
        if approved < response.approved {
            warn!(
                batch = number,
                reported = response.approved,
                counted = approved,
                "endpoint over-reported approvals"
            );
        }
        report.approved = report.approved.saturating_add(approved);
        if let Some(seq) = self.sequence.as_mut() {
            seq.advance(approved);
        }

        for failure in response.failures {
            if is_document_exists_conflict(&failure.error) {
                warn!(invoice_id = failure.invoice_id, "sequence conflict, queued for retry");
                if !conflicts.contains(&failure.invoice_id) {
                    conflicts.push(failure.invoice_id);
                }
            } else {
                report.errors = report.errors.saturating_add(1);
                report
                    .error_details
                    .push(format!("invoice {}: {}", failure.invoice_id, failure.error));
            }
        }

        let undetailed = response
            .failed
            .saturating_sub(detailed)
            .min(batch_len - detailed - approved);
        if undetailed > 0 {
            report.errors = report.errors.saturating_add(undetailed);
            report.error_details.push(format!(
                "batch {number}: {undetailed} invoice(s) failed without detail"
            ));
        }
    }

    fn progress(&mut self, phase: ApprovalPhase, report: &ApprovalReport, pending_retries: usize) {
        if let Some(callback) = self.on_progress.as_mut() {
            callback(&ApprovalProgress {
                phase,
                approved: report.approved,
                errors: report.errors,
                pending_retries,
            });
        }
    }
}

/// Approve `invoice_ids` in batches of [`BATCH_SIZE`].
///
/// Shorthand for [`ApprovalRun`] without notifier or progress callback.
pub async fn approve_invoices<G>(
    gateway: &G,
    invoice_ids: &[InvoiceId],
    sequence: Option<SequenceCounter>,
) -> ApprovalReport
where
    G: ApprovalGateway + ?Sized,
{
    let mut run = ApprovalRun::new(gateway);
    if let Some(counter) = sequence {
        run = run.sequence(counter);
    }
    run.run(invoice_ids).await
}
