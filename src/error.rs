//! Error types for gateway client operations.
//!
//! All errors implement the standard [`std::error::Error`] trait via
//! [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Transport errors** ([`CsobError::Transport`]): the gateway could not be
//!   reached, timed out, or answered with an HTTP error status
//! - **Decode errors** ([`CsobError::ResponseDecode`]): the gateway was reached
//!   but its body was not valid JSON
//! - **Verification errors** ([`CsobError::MissingSignature`],
//!   [`CsobError::ResponseSignature`], [`CsobError::ExtensionSignature`]): the
//!   gateway was reached but its response cannot be trusted
//! - **Key/crypto errors** ([`CsobError::InvalidKey`], [`CsobError::Crypto`]):
//!   malformed key material or a failing cryptographic primitive
//! - **Caller errors** ([`CsobError::InvalidRequest`], [`CsobError::Config`],
//!   [`CsobError::Url`]): rejected before any network traffic
//!
//! The split between transport/decode errors and verification errors is
//! deliberate: "could not reach or parse the gateway" may be retried by the
//! caller, while "response signature does not verify" must never be treated
//! as a successful payment outcome.
//!
//! # Examples
//!
//! ```
//! use csob_client::error::{CsobError, Result};
//!
//! fn check_description(description: &str) -> Result<()> {
//!     if description.len() > 255 {
//!         return Err(CsobError::InvalidRequest(
//!             "description length is over 255 chars".to_owned(),
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Result type alias for gateway client operations.
///
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, CsobError>;

/// Errors that can occur while talking to the payment gateway.
///
/// Verification variants are security-sensitive: they must abort the whole
/// call and must never be downgraded to a warning or a partial result.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum CsobError {
    /// HTTP request failed.
    ///
    /// Wraps [`reqwest::Error`] and covers both connection-level failures
    /// (refused, DNS, TLS, timeout) and HTTP error statuses surfaced through
    /// [`reqwest::Response::error_for_status`]. The two cases stay
    /// distinguishable through [`reqwest::Error::is_connect`] and
    /// [`reqwest::Error::is_status`]; for status failures the Display output
    /// includes the status code.
    ///
    /// # Recovery
    ///
    /// Transient by nature. The caller may retry with its own backoff policy;
    /// this crate never retries internally.
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body was not valid JSON.
    ///
    /// The gateway answered with a success status but the body could not be
    /// decoded. Typically a proxy error page or a gateway outage.
    #[error("cannot decode JSON in response")]
    ResponseDecode(#[source] serde_json::Error),

    /// Response carried no `signature` field.
    ///
    /// Without a signature the response cannot be verified, so it is rejected
    /// outright.
    #[error("response is missing a signature")]
    MissingSignature,

    /// Response signature did not verify against the gateway public key.
    ///
    /// Fatal and security-sensitive: nothing from the response payload is
    /// returned to the caller.
    #[error("cannot verify response")]
    ResponseSignature,

    /// A masked-card extension signature did not verify.
    ///
    /// Each extension block carries its own signature. A single failing
    /// extension invalidates the entire response, including extensions that
    /// verified before it.
    #[error("cannot verify masked card extension response")]
    ExtensionSignature,

    /// Key material could not be parsed.
    ///
    /// The PEM text (or the file it was read from) is not a usable RSA key.
    ///
    /// # Recovery
    ///
    /// Check that the configured value is either a readable PEM file path or
    /// literal PEM text, and that the key matches the expected format
    /// (PKCS#8 or PKCS#1).
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// Low-level cryptographic operation failed.
    ///
    /// Covers RSA signing failures and malformed base64 signature text.
    #[error("cryptographic operation failed: {0}")]
    Crypto(String),

    /// Caller-supplied request parameters were rejected.
    ///
    /// Raised before any network traffic, e.g. for an over-long payment
    /// description.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration could not be parsed or failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Gateway URL could not be parsed or composed.
    #[error("invalid gateway URL: {0}")]
    Url(#[from] url::ParseError),
}
