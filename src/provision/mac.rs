//! Hardware-address canonicalization.
//!
//! Every table the engine touches is keyed by the canonical form produced
//! here, so the portal, the accounting webhook, and the admin surface all
//! agree on what "the same device" means.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9a-f]").expect("valid regex"));

/// Normalize a raw hardware-address string into the canonical lookup key:
/// lowercase hex, colon-separated every two digits.
///
/// Malformed input degrades instead of failing: an odd number of hex digits
/// is returned cleaned but unseparated, and an empty or hex-free string
/// yields an empty string. The function is pure and idempotent.
pub fn canonical_mac(raw: &str) -> String {
    let cleaned = NON_HEX.replace_all(&raw.to_lowercase(), "").into_owned();

    if cleaned.len() % 2 != 0 {
        return cleaned;
    }

    let mut formatted = String::with_capacity(cleaned.len() + cleaned.len() / 2);
    for (index, digit) in cleaned.chars().enumerate() {
        if index > 0 && index % 2 == 0 {
            formatted.push(':');
        }
        formatted.push(digit);
    }

    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_windows_style_address() {
        assert_eq!(canonical_mac("AA-BB-CC-DD-EE-FF"), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn keeps_canonical_input_unchanged() {
        assert_eq!(canonical_mac("aa:bb:cc:dd:ee:ff"), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn strips_dots_and_whitespace() {
        assert_eq!(canonical_mac("aabb.ccdd.eeff"), "aa:bb:cc:dd:ee:ff");
        assert_eq!(canonical_mac(" AABBCCDDEEFF "), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn odd_digit_count_stays_unseparated() {
        assert_eq!(canonical_mac("abc"), "abc");
        assert_eq!(canonical_mac("AA-BB-C"), "aabbc");
    }

    #[test]
    fn degenerate_inputs_yield_empty_string() {
        assert_eq!(canonical_mac(""), "");
        assert_eq!(canonical_mac("zz--!!"), "");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        for input in [
            "AA-BB-CC-DD-EE-FF",
            "aabbccddeeff",
            "aa:bb:cc:dd:ee:ff",
            "abc",
            "",
            "02:00:4C:4F:4F:50",
        ] {
            let once = canonical_mac(input);
            assert_eq!(canonical_mac(&once), once, "input: {input:?}");
        }
    }
}
