//! TextNormalizer - OCR Text Cleanup
//!
//! ## Responsibilities
//!
//! - Fold recognized text to uppercase
//! - Strip everything that is not an ASCII letter or digit
//!
//! Registry lookups and the duplicate suppressor key on this canonical
//! form, so a plate re-hyphenated by an external tool still matches.

/// Reduce raw OCR output to canonical plate form: uppercase ASCII
/// alphanumerics only. Total and idempotent; garbage in, shorter
/// garbage out, never an error.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_uppercase)
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}
