//! Session public key material.

use rand::Rng;

/// Generate the per-session public key advertised in signature messages:
/// `0x` followed by `hex_len` random lowercase hex digits.
pub fn generate_public_key(hex_len: usize) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut rng = rand::thread_rng();
    let mut key = String::with_capacity(hex_len + 2);
    key.push_str("0x");
    for _ in 0..hex_len {
        key.push(DIGITS[rng.gen_range(0..16)] as char);
    }
    key
}
