//! Deterministic tag colors.
//!
//! Hue comes from a polynomial rolling hash over the tag's UTF-16 code units:
//! `hash = Σ unit_i * 31^i mod 2^31`, `hue = hash mod 360`. Saturation and
//! lightness are fixed, so identical tags always share a color and distinct
//! tags spread around the wheel.

const HASH_BASE: u64 = 31;
const HASH_MODULUS: u64 = 1 << 31;
const SATURATION_PCT: u32 = 65;
const LIGHTNESS_PCT: u32 = 55;

/// Rolling hash of `tag`, always in `0..2^31`.
pub fn tag_hash(tag: &str) -> u32 {
    let mut hash = 0u64;
    let mut power = 1u64;
    for unit in tag.encode_utf16() {
        hash = (hash + u64::from(unit) * power) % HASH_MODULUS;
        power = power * HASH_BASE % HASH_MODULUS;
    }
    // Bounded by the modulus above.
    hash as u32
}

/// Hue in `0..360` for `tag`.
pub fn tag_hue(tag: &str) -> u32 {
    tag_hash(tag) % 360
}

/// CSS `hsl(...)` color for `tag`.
pub fn hash_color(tag: &str) -> String {
    format!(
        "hsl({}, {SATURATION_PCT}%, {LIGHTNESS_PCT}%)",
        tag_hue(tag)
    )
}
