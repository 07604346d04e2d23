//! Ed25519 account keys.
//!
//! A local keypair stands in for the connected wallet: its public key
//! derives the account identifier, and its signatures authorize reveals
//! and ledger writes. This module wraps `ed25519-dalek` with dmerge types.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{CryptoError, Result};

/// An Ed25519 signing key (private key).
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

impl Clone for SigningKey {
    fn clone(&self) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(&self.inner.to_bytes()),
        }
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        let mut bytes = self.inner.to_bytes();
        bytes.zeroize();
    }
}

/// An Ed25519 verification key (public key).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

/// An Ed25519 signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    inner: ed25519_dalek::Signature,
}

/// A wallet keypair.
#[derive(Clone)]
pub struct KeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl SigningKey {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            inner: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a signing key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(bytes),
        }
    }

    /// Get the raw bytes of this signing key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Get the corresponding verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            inner: self.inner.sign(message),
        }
    }
}

impl VerifyingKey {
    /// Get the raw bytes as a slice.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.inner.as_bytes()
    }

    /// Verify a signature on a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        self.inner
            .verify(message, &signature.inner)
            .map_err(|_| CryptoError::SignatureVerification)
    }
}

impl KeyPair {
    /// Generate a new random Ed25519 keypair.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate())
    }

    /// Create a keypair from a signing key's raw bytes.
    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(secret))
    }

    /// Create a keypair from a hex-encoded 32-byte secret.
    pub fn from_hex(secret_hex: &str) -> Result<Self> {
        let raw = hex::decode(secret_hex.trim_start_matches("0x"))
            .map_err(|e| CryptoError::InvalidInput(format!("secret key hex: {e}")))?;
        let secret: [u8; 32] = raw.try_into().map_err(|v: Vec<u8>| {
            CryptoError::InvalidInput(format!("secret key must be 32 bytes, got {}", v.len()))
        })?;
        Ok(Self::from_bytes(&secret))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Account identifier of this keypair.
    pub fn account_id(&self) -> String {
        derive_account_id(&self.verifying_key)
    }
}

/// Derive an account identifier from a public key.
///
/// `account = "0x" || hex(BLAKE3(public_key)[12..32])` (20 bytes).
pub fn derive_account_id(public_key: &VerifyingKey) -> String {
    let digest = blake3::hash(public_key.as_bytes());
    format!("0x{}", hex::encode(&digest.as_bytes()[12..]))
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("public", &self.verifying_key())
            .finish()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("account", &self.account_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let kp = KeyPair::generate();
        let msg = b"publickey:0x00";
        let sig = kp.signing_key.sign(msg);
        assert!(kp.verifying_key.verify(msg, &sig).is_ok());
    }

    #[test]
    fn test_wrong_message_fails() {
        let kp = KeyPair::generate();
        let sig = kp.signing_key.sign(b"correct message");
        assert!(kp.verifying_key.verify(b"wrong message", &sig).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let sig = kp1.signing_key.sign(b"test");
        assert!(kp2.verifying_key.verify(b"test", &sig).is_err());
    }

    #[test]
    fn test_account_id_deterministic() {
        let kp1 = KeyPair::from_bytes(&[42u8; 32]);
        let kp2 = KeyPair::from_bytes(&[42u8; 32]);
        let kp3 = KeyPair::from_bytes(&[43u8; 32]);
        assert_eq!(kp1.account_id(), kp2.account_id());
        assert_ne!(kp1.account_id(), kp3.account_id());
        assert_eq!(kp1.account_id().len(), 2 + 40);
    }

    #[test]
    fn test_from_hex() {
        let secret = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
        let kp = KeyPair::from_hex(secret).expect("valid hex");
        let prefixed = KeyPair::from_hex(&format!("0x{secret}")).expect("valid hex");
        assert_eq!(kp.account_id(), prefixed.account_id());
        assert!(KeyPair::from_hex("abcd").is_err());
        assert!(KeyPair::from_hex("zz").is_err());
    }
}
