/// Status marker the provider puts in front of a duplicate-document error.
pub const CONFLICT_STATUS: &str = "Error 409";

/// Provider message for a sequence number that is already taken.
pub const DOCUMENT_EXISTS: &str = "Documento ya existe";

/// Check whether a provider error reports a sequence-number collision
/// (`Error 409: "Documento ya existe"`), the only failure worth a retry.
pub fn is_document_exists_conflict(error: &str) -> bool {
    error.contains(CONFLICT_STATUS) && error.contains(DOCUMENT_EXISTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_conflict() {
        assert!(is_document_exists_conflict(r#"Error 409: "Documento ya existe""#));
        assert!(is_document_exists_conflict(
            r#"Proveedor respondió Error 409: "Documento ya existe" (secuencial 000000123)"#
        ));
    }

    #[test]
    fn other_failures_are_hard() {
        assert!(!is_document_exists_conflict("Error 500: Internal Server Error"));
        assert!(!is_document_exists_conflict(r#"Error 409: "Cliente bloqueado""#));
        assert!(!is_document_exists_conflict("Documento ya existe"));
        assert!(!is_document_exists_conflict(""));
    }
}
