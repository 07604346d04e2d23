//! # dmerge-crypto
//!
//! Value encoding and wallet signatures for dmerge.
//!
//! ## Modules
//!
//! - [`codec`] — `FHE-` prefixed numeric tokens for stored financial fields
//! - [`ed25519`] — Ed25519 account keys, signing and verification
//! - [`session`] — per-session public key material for signature messages
//!
//! The codec is a reversible text encoding, not encryption. Anyone holding a
//! token can read the number back without a key. Deployments that need
//! confidential computation over these fields must swap in a real
//! homomorphic-encryption client and key management.

pub mod codec;
pub mod ed25519;
pub mod session;

/// Error types for encoding and signature operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// A codec token or legacy numeric string could not be decoded.
    #[error("malformed token: {0}")]
    Format(String),

    /// Ed25519 signature verification failed.
    #[error("signature verification failed")]
    SignatureVerification,

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
