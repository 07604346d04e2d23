//! Numeric field codec.
//!
//! `encode(v) = "FHE-" + base64(v as decimal text)`. Tokens without the
//! prefix are legacy plain numbers and are parsed directly.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::{CryptoError, Result};

/// Prefix marking a codec-produced token.
pub const TOKEN_PREFIX: &str = "FHE-";

/// Encode a number as a storage token.
///
/// Integral values render without a fractional part (`10` → `FHE-MTA=`).
pub fn encode(value: f64) -> String {
    format!("{TOKEN_PREFIX}{}", STANDARD.encode(value.to_string()))
}

/// Decode a storage token (or a legacy plain number) back to its value.
pub fn decode(token: &str) -> Result<f64> {
    let text = match token.strip_prefix(TOKEN_PREFIX) {
        Some(body) => {
            let bytes = STANDARD
                .decode(body)
                .map_err(|e| CryptoError::Format(format!("base64: {e}")))?;
            String::from_utf8(bytes).map_err(|e| CryptoError::Format(format!("utf-8: {e}")))?
        }
        None => token.to_string(),
    };

    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| CryptoError::Format(format!("not a number: {text:?}")))?;
    if !value.is_finite() {
        return Err(CryptoError::Format(format!("non-finite value: {text:?}")));
    }
    Ok(value)
}

/// Decode, substituting `fallback` for anything malformed.
pub fn decode_or(token: &str, fallback: f64) -> f64 {
    decode(token).unwrap_or(fallback)
}

/// Parse user-entered numeric text the way the create form does: anything
/// unparseable counts as zero.
pub fn parse_input(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
