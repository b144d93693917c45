//! Service units and area resolution.
//!
//! A service priced per square metre is multiplied by an area of the
//! property; every other unit is billed flat (area 1). Which area is used
//! depends on the service code.

/// Service code billed on the parking area.
pub const PARKING_CODE: &str = "APAC";

/// Service codes billed on the usable area (falling back to total area).
pub const USABLE_AREA_CODES: &[&str] = &["AOACL", "AOACO"];

/// Which area of a property an area-based service multiplies by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaSource {
    /// Parking entry of the breakdown, 0 if absent.
    Parking,
    /// Usable entry of the breakdown, total area if absent.
    UsableOrTotal,
    /// Total area of the property.
    Total,
}

/// Check whether a service unit label denotes a per-square-metre price.
///
/// Accepts the spellings found in the catalog: "m2", "m²", "mt2",
/// "metros cuadrados", optionally prefixed with "per", "por", "x" or "/".
pub fn is_area_unit(unit: &str) -> bool {
    let normalized = normalize_unit(unit);
    AREA_UNIT_LABELS.binary_search(&normalized.as_str()).is_ok()
}

/// Area source for a service code.
pub fn area_source_for(code: &str) -> AreaSource {
    let code = code.trim();
    if code.eq_ignore_ascii_case(PARKING_CODE) {
        AreaSource::Parking
    } else if USABLE_AREA_CODES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(code))
    {
        AreaSource::UsableOrTotal
    } else {
        AreaSource::Total
    }
}

fn normalize_unit(unit: &str) -> String {
    let mut s = unit.trim().to_lowercase();
    for prefix in ["per ", "por ", "x ", "/"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start().to_string();
            break;
        }
    }
    s.trim_end_matches('.').to_string()
}

/// Normalized area unit labels. Sorted for binary search.
static AREA_UNIT_LABELS: &[&str] = &[
    "m2",
    "metro cuadrado",
    "metros cuadrados",
    "mt2",
    "mts2",
    "m²",
    "sqm",
];
