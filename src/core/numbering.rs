use serde::{Deserialize, Serialize};

use super::error::CobranzaError;

/// Gap-free document sequence for the invoicing provider.
///
/// Sequence numbers are consumed only by invoices the provider actually
/// approved, so the counter is advanced by approved counts rather than by
/// submissions. Rendered as `{prefix}{number}`, e.g. "001-001-000000123".
///
/// The counter is a plain value owned by whoever runs an approval; pass it
/// in and read it back instead of sharing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceCounter {
    prefix: String,
    next_number: u64,
    zero_pad: usize,
}

impl SequenceCounter {
    /// Create a counter whose next number is `start`.
    ///
    /// # Errors
    ///
    /// `CobranzaError::Validation` if `start` is 0; provider sequences start at 1.
    pub fn starting_at(prefix: impl Into<String>, start: u64) -> Result<Self, CobranzaError> {
        if start == 0 {
            return Err(CobranzaError::Validation(
                "sequence numbers start at 1".into(),
            ));
        }
        Ok(Self {
            prefix: prefix.into(),
            next_number: start,
            zero_pad: 9,
        })
    }

    /// Set zero-padding width (default: 9, so "000000001").
    pub fn with_padding(mut self, width: usize) -> Self {
        self.zero_pad = width;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Next number that will be used (without prefix/formatting).
    pub fn next_raw(&self) -> u64 {
        self.next_number
    }

    /// Consume `count` numbers. Saturates at `u64::MAX`.
    pub fn advance(&mut self, count: u64) {
        self.next_number = self.next_number.saturating_add(count);
    }

    /// Preview the next number without consuming it.
    pub fn peek(&self) -> String {
        self.format(self.next_number)
    }

    /// Render an arbitrary number of this sequence.
    pub fn format(&self, number: u64) -> String {
        format!(
            "{}{:0>width$}",
            self.prefix,
            number,
            width = self.zero_pad
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_does_not_consume() {
        let seq = SequenceCounter::starting_at("001-001-", 1).unwrap();
        assert_eq!(seq.peek(), "001-001-000000001");
        assert_eq!(seq.peek(), "001-001-000000001");
        assert_eq!(seq.next_raw(), 1);
    }

    #[test]
    fn advance_by_approved_count() {
        let mut seq = SequenceCounter::starting_at("001-001-", 120).unwrap();
        seq.advance(10);
        assert_eq!(seq.next_raw(), 130);
        seq.advance(0);
        assert_eq!(seq.peek(), "001-001-000000130");
    }

    #[test]
    fn advance_saturates() {
        let mut seq = SequenceCounter::starting_at("001-001-", 5).unwrap();
        seq.advance(u64::MAX);
        assert_eq!(seq.next_raw(), u64::MAX);
    }

    #[test]
    fn custom_padding() {
        let seq = SequenceCounter::starting_at("F", 42).unwrap().with_padding(5);
        assert_eq!(seq.peek(), "F00042");
    }

    #[test]
    fn zero_start_rejected() {
        assert!(SequenceCounter::starting_at("001-001-", 0).is_err());
    }
}
