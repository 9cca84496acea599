//! Shared helpers for gateway integration tests.
//!
//! One RSA key pair plays both roles: the merchant key the client signs
//! with and the "gateway" key the mock server's responses are signed with.

use std::sync::LazyLock;

use csob_client::config::ClientConfig;
use csob_client::crypto::RequestSigner;
use csob_client::payload::{Payload, Value};
use csob_client::transport::SessionMode;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use serde_json::json;

static PRIVATE_KEY: LazyLock<RsaPrivateKey> = LazyLock::new(|| {
    let mut rng = rand::thread_rng();
    RsaPrivateKey::new(&mut rng, 2048).expect("RSA test key generation")
});

pub const MERCHANT_ID: &str = "MERCHANT";
pub const RESPONSE_DTTM: &str = "20230101120000";

/// Client configuration pointed at a mock server.
///
/// Plain session mode, because the mock listens on loopback HTTP.
pub fn test_config(server_uri: &str) -> ClientConfig {
    let private_pem = PRIVATE_KEY
        .to_pkcs8_pem(LineEnding::LF)
        .expect("encode private key")
        .to_string();
    let public_pem = PRIVATE_KEY
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .expect("encode public key");

    let mut config = ClientConfig::new(
        MERCHANT_ID,
        format!("{server_uri}/api/v1.9/"),
        private_pem,
        public_pem,
    );
    config.http.session = SessionMode::Plain;
    config
}

/// Signs the canonical message of the given fields with the shared key.
pub fn gateway_sign(fields: &[(&str, Value)]) -> String {
    let mut payload = Payload::new();
    for (name, value) in fields {
        payload.push(*name, value.clone());
    }
    RequestSigner::new(PRIVATE_KEY.clone())
        .sign(&payload)
        .expect("sign test payload")
}

/// A signed response body for a successful payment operation.
pub fn signed_ok_body(pay_id: &str, payment_status: i64) -> serde_json::Value {
    let signature = gateway_sign(&[
        ("payId", Value::Str(pay_id.to_owned())),
        ("dttm", Value::Str(RESPONSE_DTTM.to_owned())),
        ("resultCode", Value::Int(0)),
        ("resultMessage", Value::Str("OK".to_owned())),
        ("paymentStatus", Value::Int(payment_status)),
    ]);
    json!({
        "payId": pay_id,
        "dttm": RESPONSE_DTTM,
        "resultCode": 0,
        "resultMessage": "OK",
        "paymentStatus": payment_status,
        "signature": signature,
    })
}

/// A signed masked-card extension entry.
pub fn masked_card_entry(kind: &str, long_masked_cln: &str) -> serde_json::Value {
    let signature = gateway_sign(&[
        ("extension", Value::Str(kind.to_owned())),
        ("dttm", Value::Str(RESPONSE_DTTM.to_owned())),
        ("maskedCln", Value::Str("****1111".to_owned())),
        ("expiration", Value::Str("12/24".to_owned())),
        ("longMaskedCln", Value::Str(long_masked_cln.to_owned())),
    ]);
    json!({
        "extension": kind,
        "dttm": RESPONSE_DTTM,
        "maskedCln": "****1111",
        "expiration": "12/24",
        "longMaskedCln": long_masked_cln,
        "signature": signature,
    })
}
