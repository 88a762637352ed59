//! Structural patterns for recognized label text
//!
//! Two fixed patterns are applied to the recognizer's raw output:
//! an object identifier after a literal "Objeto:" label, and an address as
//! six whitespace-separated 3-digit groups mapped positionally.

use std::sync::OnceLock;

use regex::Regex;

/// Address fields read off a label, in the printed order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressText {
    pub city: String,
    pub district: String,
    pub street: String,
    pub building: String,
    pub level: String,
    pub unit: String,
}

fn object_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)Objeto:\s*(\d{8})").unwrap())
}

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{3})\s+(\d{3})\s+(\d{3})\s+(\d{3})\s+(\d{3})\s+(\d{3})").unwrap()
    })
}

/// Find an 8-digit object identifier after a case-insensitive "Objeto:" label
pub fn find_object_id(text: &str) -> Option<String> {
    object_pattern()
        .captures(text)
        .map(|captures| captures[1].to_string())
}

/// Find six whitespace-separated 3-digit groups and map them positionally
pub fn find_address(text: &str) -> Option<AddressText> {
    address_pattern().captures(text).map(|captures| AddressText {
        city: captures[1].to_string(),
        district: captures[2].to_string(),
        street: captures[3].to_string(),
        building: captures[4].to_string(),
        level: captures[5].to_string(),
        unit: captures[6].to_string(),
    })
}
