//! Request signing and response verification.
//!
//! The gateway protocol signs the canonical message of every payload with the
//! merchant's RSA private key (SHA-1 digest, PKCS#1 v1.5 padding) and carries
//! the signature as standard base64 text. Responses are signed the same way
//! with the gateway's key and verified here before any field reaches the
//! caller.
//!
//! Verification is deliberately boolean: a mismatching signature is a normal
//! `false` outcome, not an error. Only mechanically broken input is an
//! error: key material that does not parse, or signature text that is not
//! base64.
//!
//! # Examples
//!
//! ```no_run
//! use csob_client::crypto::{RequestSigner, keys};
//! use csob_client::payload::Payload;
//!
//! # fn example() -> csob_client::Result<()> {
//! let pem = keys::resolve_key_material("/etc/csob/merchant.key")?;
//! let signer = RequestSigner::from_pem(&pem)?;
//!
//! let mut payload = Payload::new();
//! payload.push("merchantId", "MERCHANT");
//! payload.push("dttm", "20230101120000");
//!
//! let signature = signer.sign(&payload)?;
//! # Ok(())
//! # }
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use tracing::{debug, instrument, warn};

use crate::error::{CsobError, Result};
use crate::payload::{Payload, SignedPayload};

pub mod keys;

#[cfg(test)]
#[path = "tests/proptest_signatures.rs"]
mod proptest_signatures;

/// Signs request payloads with the merchant private key.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    private_key: RsaPrivateKey,
}

impl RequestSigner {
    /// Wraps an already-parsed private key.
    #[must_use]
    pub fn new(private_key: RsaPrivateKey) -> Self {
        Self { private_key }
    }

    /// Parses PEM text and wraps the key.
    ///
    /// # Errors
    ///
    /// Returns [`CsobError::InvalidKey`] when the PEM does not hold an RSA
    /// private key.
    pub fn from_pem(pem: &str) -> Result<Self> {
        keys::load_private_key(pem).map(Self::new)
    }

    /// Signs the payload's canonical message.
    ///
    /// Returns the signature as standard base64 text, ready to travel as the
    /// payload's `signature` field.
    ///
    /// # Errors
    ///
    /// Returns [`CsobError::Crypto`] when the RSA operation itself fails.
    #[instrument(skip_all, fields(field_count = payload.len()))]
    pub fn sign(&self, payload: &Payload) -> Result<String> {
        let digest = Sha1::digest(payload.canonical_message());
        let signature = self
            .private_key
            .sign(Pkcs1v15Sign::new::<Sha1>(), digest.as_slice())
            .map_err(|e| CsobError::Crypto(format!("RSA signing failed: {e}")))?;
        Ok(BASE64.encode(signature))
    }

    /// Signs the payload and binds the signature to it.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`sign`](Self::sign).
    pub fn sign_payload(&self, payload: Payload) -> Result<SignedPayload> {
        let signature = self.sign(&payload)?;
        Ok(SignedPayload::new(payload, signature))
    }
}

/// Verifies gateway signatures with the gateway public key.
#[derive(Debug, Clone)]
pub struct ResponseVerifier {
    public_key: RsaPublicKey,
}

impl ResponseVerifier {
    /// Wraps an already-parsed public key.
    #[must_use]
    pub fn new(public_key: RsaPublicKey) -> Self {
        Self { public_key }
    }

    /// Parses PEM text and wraps the key.
    ///
    /// Accepts SPKI, PKCS#1 public, or a private-key PEM (public half is
    /// derived) per [`keys::load_public_key`].
    ///
    /// # Errors
    ///
    /// Returns [`CsobError::InvalidKey`] when no RSA key can be read from
    /// the PEM.
    pub fn from_pem(pem: &str) -> Result<Self> {
        keys::load_public_key(pem).map(Self::new)
    }

    /// Verifies a base64 signature against the payload's canonical message.
    ///
    /// A signature that simply does not match returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`CsobError::Crypto`] when the signature text is not valid
    /// base64.
    #[instrument(skip_all, fields(field_count = payload.len()))]
    pub fn verify(&self, payload: &Payload, signature: &str) -> Result<bool> {
        let signature_bytes = BASE64
            .decode(signature)
            .map_err(|e| CsobError::Crypto(format!("signature is not valid base64: {e}")))?;
        let digest = Sha1::digest(payload.canonical_message());

        match self
            .public_key
            .verify(Pkcs1v15Sign::new::<Sha1>(), digest.as_slice(), &signature_bytes)
        {
            Ok(()) => {
                debug!("signature verified");
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "signature verification failed");
                Ok(false)
            }
        }
    }
}
