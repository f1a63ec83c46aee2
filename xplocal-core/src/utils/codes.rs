// File: xplocal-core/src/utils/codes.rs

use rand::Rng;
use xplocal_common::models::redemption::CLAIM_CODE_LEN;

const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a random claim code: 6 uppercase base-36 characters.
///
/// Raw randomness alone does not guarantee uniqueness; the purchase path
/// inserts with a conflict guard on the code column and re-rolls on
/// collision.
pub fn generate_claim_code() -> String {
    let mut rng = rand::rng();
    (0..CLAIM_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Normalize a user-supplied code for lookup. Returns `None` unless the
/// trimmed input is exactly 6 alphanumeric characters.
pub fn normalize_claim_code(input: &str) -> Option<String> {
    let trimmed = input.trim().to_uppercase();
    if trimmed.len() != CLAIM_CODE_LEN {
        return None;
    }
    if !trimmed.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_uppercase_base36() {
        for _ in 0..1000 {
            let code = generate_claim_code();
            assert_eq!(code.len(), CLAIM_CODE_LEN);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase()));
        }
    }

    #[test]
    fn normalize_accepts_lowercase_and_whitespace() {
        assert_eq!(normalize_claim_code("  ab12cd "), Some("AB12CD".to_string()));
        assert_eq!(normalize_claim_code("XYZ789"), Some("XYZ789".to_string()));
    }

    #[test]
    fn normalize_rejects_wrong_length_or_symbols() {
        assert_eq!(normalize_claim_code("ABC12"), None);
        assert_eq!(normalize_claim_code("ABC1234"), None);
        assert_eq!(normalize_claim_code("AB-12C"), None);
        assert_eq!(normalize_claim_code(""), None);
    }
}
