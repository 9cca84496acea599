//! Response validation: decode, canonical reorder, signature verification.
//!
//! Nothing from the gateway reaches the caller unverified. Every response
//! body goes through the same pipeline: decode JSON, pull out the signature,
//! rebuild the canonical payload from the recognized fields in
//! [`RESPONSE_KEYS`] order (never in transmitted order), verify the signature
//! against it, then verify any embedded masked-card extensions the same way.
//! A response that fails at any stage is rejected whole; there is no partial
//! success.
//!
//! The browser-redirect path ([`validate_gateway_return`]) runs the same
//! reorder-and-verify steps over form/query parameters, where every value
//! arrives as text and the integer fields must be re-typed before
//! verification.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::config::{
    INTEGER_RESPONSE_KEYS, MASKED_CARD_EXTENSION_KINDS, MASKED_CARD_KEYS, RESPONSE_KEYS,
    RETURN_CODE_OK,
};
use crate::crypto::ResponseVerifier;
use crate::error::{CsobError, Result};
use crate::payload::{Payload, Value};

/// A fully verified gateway response.
///
/// Holds the recognized response fields in canonical order plus any verified
/// masked-card extensions. Constructed only by the validation pipeline, so
/// its existence implies the signature checks passed.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    payload: Payload,
    extensions: Vec<MaskedCardExtension>,
}

impl GatewayResponse {
    /// Payment identifier assigned by the gateway.
    #[must_use]
    pub fn pay_id(&self) -> Option<&str> {
        self.text_field("payId")
    }

    /// Customer identifier echoed back by the gateway.
    #[must_use]
    pub fn customer_id(&self) -> Option<&str> {
        self.text_field("customerId")
    }

    /// Response timestamp in `YYYYMMDDHHMMSS` form.
    #[must_use]
    pub fn dttm(&self) -> Option<&str> {
        self.text_field("dttm")
    }

    /// Gateway result code.
    #[must_use]
    pub fn result_code(&self) -> Option<i64> {
        self.payload.get("resultCode").and_then(Value::as_int)
    }

    /// Human-readable result message.
    #[must_use]
    pub fn result_message(&self) -> Option<&str> {
        self.text_field("resultMessage")
    }

    /// Payment lifecycle state.
    #[must_use]
    pub fn payment_status(&self) -> Option<i64> {
        self.payload.get("paymentStatus").and_then(Value::as_int)
    }

    /// Authorization code for approved payments.
    #[must_use]
    pub fn auth_code(&self) -> Option<&str> {
        self.text_field("authCode")
    }

    /// Merchant data echoed back by the gateway.
    #[must_use]
    pub fn merchant_data(&self) -> Option<&str> {
        self.text_field("merchantData")
    }

    /// Looks up any recognized field by its wire name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    /// The verified fields in canonical order.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Verified masked-card extensions, in response order.
    #[must_use]
    pub fn extensions(&self) -> &[MaskedCardExtension] {
        &self.extensions
    }

    /// Whether the gateway accepted the operation (`resultCode == 0`).
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result_code() == Some(RETURN_CODE_OK)
    }

    fn text_field(&self, name: &str) -> Option<&str> {
        self.payload.get(name).and_then(Value::as_str)
    }
}

/// A verified masked-card extension block.
///
/// Carries the card number in masked form plus its expiration, from the
/// `maskCln` / `maskClnRP` extension entries of a payment-status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedCardExtension {
    /// Extension kind, `maskCln` or `maskClnRP`.
    pub kind: String,
    /// Extension timestamp.
    pub dttm: Option<String>,
    /// Short masked card number, e.g. `****1111`.
    pub masked_cln: Option<String>,
    /// Card expiration, e.g. `12/24`.
    pub expiration: Option<String>,
    /// Long masked card number, e.g. `423451****1111`.
    pub long_masked_cln: Option<String>,
}

impl MaskedCardExtension {
    fn from_verified(kind: &str, payload: &Payload) -> Self {
        let text = |name: &str| {
            payload
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
        };
        Self {
            kind: kind.to_owned(),
            dttm: text("dttm"),
            masked_cln: text("maskedCln"),
            expiration: text("expiration"),
            long_masked_cln: text("longMaskedCln"),
        }
    }
}

/// Consumes an HTTP response and validates its body.
///
/// Turns HTTP-level failures into [`CsobError::Transport`] first, then runs
/// the body through [`validate_body`].
///
/// # Errors
///
/// Returns [`CsobError::Transport`] for non-success HTTP statuses or body
/// read failures, plus everything [`validate_body`] can return.
pub async fn validate_response(
    response: reqwest::Response,
    verifier: &ResponseVerifier,
) -> Result<GatewayResponse> {
    let response = response.error_for_status()?;
    let body = response.bytes().await?;
    validate_body(&body, verifier)
}

/// Validates a raw response body.
///
/// # Errors
///
/// - [`CsobError::ResponseDecode`] when the body is not a JSON object.
/// - [`CsobError::MissingSignature`] when no `signature` field is present.
/// - [`CsobError::ResponseSignature`] when the signature does not verify.
/// - [`CsobError::ExtensionSignature`] when a recognized extension lacks a
///   signature or its signature does not verify.
#[instrument(skip_all)]
pub fn validate_body(body: &[u8], verifier: &ResponseVerifier) -> Result<GatewayResponse> {
    let mut data: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(body).map_err(CsobError::ResponseDecode)?;

    let signature = match data.remove("signature") {
        Some(serde_json::Value::String(signature)) => signature,
        _ => return Err(CsobError::MissingSignature),
    };

    let mut payload = Payload::new();
    for key in RESPONSE_KEYS {
        if let Some(value) = data.get(key).and_then(|raw| field_value(key, raw)) {
            payload.push(key, value);
        }
    }

    if !verifier.verify(&payload, &signature)? {
        warn!("response signature rejected");
        return Err(CsobError::ResponseSignature);
    }

    let extensions = validate_extensions(&data, verifier)?;
    debug!(
        field_count = payload.len(),
        extensions = extensions.len(),
        "response verified"
    );
    Ok(GatewayResponse {
        payload,
        extensions,
    })
}

/// Validates the signed parameters of a browser return redirect.
///
/// The gateway redirects the customer back to the merchant with the response
/// fields as POST form data or GET query parameters. Values all arrive as
/// text; the integer fields are re-typed before the canonical message is
/// rebuilt and verified. Redirects never carry extensions.
///
/// # Errors
///
/// - [`CsobError::MissingSignature`] when no `signature` parameter is
///   present.
/// - [`CsobError::ResponseSignature`] when the signature does not verify.
#[instrument(skip_all)]
pub fn validate_gateway_return(
    params: &HashMap<String, String>,
    verifier: &ResponseVerifier,
) -> Result<GatewayResponse> {
    let Some(signature) = params.get("signature") else {
        return Err(CsobError::MissingSignature);
    };

    let mut payload = Payload::new();
    for key in RESPONSE_KEYS {
        if let Some(raw) = params.get(key) {
            payload.push(key, text_field_value(key, raw));
        }
    }

    if !verifier.verify(&payload, signature)? {
        warn!("gateway return signature rejected");
        return Err(CsobError::ResponseSignature);
    }

    Ok(GatewayResponse {
        payload,
        extensions: Vec::new(),
    })
}

fn validate_extensions(
    data: &serde_json::Map<String, serde_json::Value>,
    verifier: &ResponseVerifier,
) -> Result<Vec<MaskedCardExtension>> {
    let Some(entries) = data.get("extensions").and_then(serde_json::Value::as_array) else {
        return Ok(Vec::new());
    };

    let mut extensions = Vec::new();
    for entry in entries {
        let Some(object) = entry.as_object() else {
            continue;
        };
        let Some(kind) = object.get("extension").and_then(serde_json::Value::as_str) else {
            continue;
        };
        if !MASKED_CARD_EXTENSION_KINDS.contains(&kind) {
            continue;
        }

        let Some(signature) = object.get("signature").and_then(serde_json::Value::as_str) else {
            warn!(kind, "masked-card extension carries no signature");
            return Err(CsobError::ExtensionSignature);
        };

        let mut payload = Payload::new();
        for key in MASKED_CARD_KEYS {
            if let Some(value) = object.get(key).and_then(|raw| field_value(key, raw)) {
                payload.push(key, value);
            }
        }

        if !verifier.verify(&payload, signature)? {
            warn!(kind, "masked-card extension signature rejected");
            return Err(CsobError::ExtensionSignature);
        }
        extensions.push(MaskedCardExtension::from_verified(kind, &payload));
    }
    Ok(extensions)
}

/// Converts a decoded JSON value into a payload value.
///
/// Integer fields accept a JSON number or a numeric string; anything else
/// stays text so the canonical message matches what the gateway signed.
/// Nulls and non-scalar values yield `None` and the field is omitted.
fn field_value(key: &str, raw: &serde_json::Value) -> Option<Value> {
    let integer = INTEGER_RESPONSE_KEYS.contains(&key);
    match raw {
        serde_json::Value::String(s) if integer => Some(
            s.parse::<i64>()
                .map_or_else(|_| Value::Str(s.clone()), Value::Int),
        ),
        serde_json::Value::String(s) => Some(Value::Str(s.clone())),
        serde_json::Value::Number(n) => Some(
            n.as_i64()
                .map_or_else(|| Value::Str(n.to_string()), Value::Int),
        ),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Null
        | serde_json::Value::Array(_)
        | serde_json::Value::Object(_) => None,
    }
}

/// Converts a redirect parameter into a payload value, re-typing the integer
/// fields when they parse.
fn text_field_value(key: &str, raw: &str) -> Value {
    if INTEGER_RESPONSE_KEYS.contains(&key) {
        raw.parse::<i64>()
            .map_or_else(|_| Value::Str(raw.to_owned()), Value::Int)
    } else {
        Value::Str(raw.to_owned())
    }
}
