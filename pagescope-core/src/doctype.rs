use crate::config::DoctypeSignature;

pub const UNKNOWN_DOCTYPE: &str = "Unknown";

/// Label of the first signature contained in the markup, or `"Unknown"`.
///
/// Matching is exact, case-sensitive substring containment.
pub fn detect_doctype<'a>(markup: &str, signatures: &'a [DoctypeSignature]) -> &'a str {
    signatures
        .iter()
        .find(|doctype| markup.contains(doctype.signature.as_str()))
        .map(|doctype| doctype.label.as_str())
        .unwrap_or(UNKNOWN_DOCTYPE)
}
