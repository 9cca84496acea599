//! Integration tests against a mock gateway.
//!
//! A wiremock server stands in for the ČSOB eAPI. Responses are signed with
//! the shared test key, so the full pipeline runs end to end: payload
//! assembly, signing, dispatch, and response verification.

mod common;

use csob_client::payload::Value;
use csob_client::{CsobClient, CsobError, OneclickInitParams, PaymentInitParams};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> CsobClient {
    CsobClient::new(&common::test_config(&server.uri())).expect("client construction")
}

fn signed_echo_body() -> serde_json::Value {
    let signature = common::gateway_sign(&[
        ("dttm", Value::Str(common::RESPONSE_DTTM.to_owned())),
        ("resultCode", Value::Int(0)),
        ("resultMessage", Value::Str("OK".to_owned())),
    ]);
    json!({
        "dttm": common::RESPONSE_DTTM,
        "resultCode": 0,
        "resultMessage": "OK",
        "signature": signature,
    })
}

#[tokio::test]
async fn test_echo_roundtrip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1.9/echo/"))
        .and(body_partial_json(json!({"merchantId": common::MERCHANT_ID})))
        .respond_with(ResponseTemplate::new(200).set_body_json(signed_echo_body()))
        .mount(&server)
        .await;

    let response = client_for(&server).echo().await.unwrap();
    assert!(response.is_ok());
    assert_eq!(response.result_message(), Some("OK"));
}

#[tokio::test]
async fn test_echo_get_builds_signed_path() {
    let server = MockServer::start().await;
    // merchantId / dttm / signature, each percent-encoded as one segment.
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v1\.9/echo/MERCHANT/[0-9]{14}/[A-Za-z0-9%]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(signed_echo_body()))
        .mount(&server)
        .await;

    let response = client_for(&server).echo_get().await.unwrap();
    assert!(response.is_ok());
}

#[tokio::test]
async fn test_payment_init_sends_ordered_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1.9/payment/init"))
        .and(body_partial_json(json!({
            "merchantId": common::MERCHANT_ID,
            "orderNo": "20230001",
            "payOperation": "payment",
            "payMethod": "card",
            "totalAmount": 12500,
            "currency": "CZK",
            "closePayment": true,
            "returnUrl": "https://shop.example.com/return/",
            "returnMethod": "POST",
            "cart": [{"name": "Order 20230001", "quantity": 1, "amount": 12500}],
            "description": "Order 20230001",
            "language": "CZ",
            "ttlSec": 600,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::signed_ok_body("pay-id-123", 1)))
        .mount(&server)
        .await;

    let params = PaymentInitParams::new(
        "20230001",
        12500,
        "https://shop.example.com/return/",
        "Order 20230001",
    );
    let response = client_for(&server).payment_init(&params).await.unwrap();

    assert!(response.is_ok());
    assert_eq!(response.pay_id(), Some("pay-id-123"));
    assert_eq!(response.payment_status(), Some(1));
}

#[tokio::test]
async fn test_payment_status_collects_masked_card_extensions() {
    let server = MockServer::start().await;

    let mut body = common::signed_ok_body("pay-id-123", 7);
    body["extensions"] = json!([
        common::masked_card_entry("maskCln", "423451****1111"),
        common::masked_card_entry("maskClnRP", "555544****4444"),
    ]);
    Mock::given(method("GET"))
        .and(path_regex(
            r"^/api/v1\.9/payment/status/MERCHANT/pay-id-123/[0-9]{14}/[A-Za-z0-9%]+$",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .payment_status("pay-id-123")
        .await
        .unwrap();

    assert_eq!(response.payment_status(), Some(7));
    assert_eq!(response.extensions().len(), 2);
    assert_eq!(response.extensions()[0].kind, "maskCln");
    assert_eq!(
        response.extensions()[0].long_masked_cln.as_deref(),
        Some("423451****1111"),
    );
    assert_eq!(response.extensions()[1].kind, "maskClnRP");
}

#[tokio::test]
async fn test_payment_close_sends_total_amount() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1.9/payment/close/"))
        .and(body_partial_json(json!({
            "merchantId": common::MERCHANT_ID,
            "payId": "pay-id-123",
            "totalAmount": 9900,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::signed_ok_body("pay-id-123", 8)))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .payment_close("pay-id-123", Some(9900))
        .await
        .unwrap();
    assert_eq!(response.payment_status(), Some(8));
}

#[tokio::test]
async fn test_payment_refund_sends_partial_amount() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1.9/payment/refund/"))
        .and(body_partial_json(json!({
            "payId": "pay-id-123",
            "amount": 500,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::signed_ok_body("pay-id-123", 9)))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .payment_refund("pay-id-123", Some(500))
        .await
        .unwrap();
    assert_eq!(response.payment_status(), Some(9));
}

#[tokio::test]
async fn test_oneclick_template_flow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1.9/payment/oneclick/init"))
        .and(body_partial_json(json!({
            "origPayId": "orig-123",
            "orderNo": "20230002",
            "totalAmount": 4200,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::signed_ok_body("oneclick-456", 1)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1.9/payment/oneclick/start"))
        .and(body_partial_json(json!({"payId": "oneclick-456"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::signed_ok_body("oneclick-456", 2)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let params = OneclickInitParams::new("orig-123", "20230002", 4200);
    let init = client.oneclick_init(&params).await.unwrap();
    let pay_id = init.pay_id().unwrap().to_owned();

    let started = client.oneclick_start(&pay_id).await.unwrap();
    assert_eq!(started.payment_status(), Some(2));
}

#[tokio::test]
async fn test_customer_info_uses_get_path() {
    let server = MockServer::start().await;

    let signature = common::gateway_sign(&[
        ("customerId", Value::Str("customer-42".to_owned())),
        ("dttm", Value::Str(common::RESPONSE_DTTM.to_owned())),
        ("resultCode", Value::Int(820)),
        (
            "resultMessage",
            Value::Str("Customer found with saved card(s)".to_owned()),
        ),
    ]);
    Mock::given(method("GET"))
        .and(path_regex(
            r"^/api/v1\.9/customer/info/MERCHANT/customer-42/[0-9]{14}/[A-Za-z0-9%]+$",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customerId": "customer-42",
            "dttm": common::RESPONSE_DTTM,
            "resultCode": 820,
            "resultMessage": "Customer found with saved card(s)",
            "signature": signature,
        })))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .customer_info("customer-42")
        .await
        .unwrap();

    assert_eq!(response.customer_id(), Some("customer-42"));
    assert_eq!(response.result_code(), Some(820));
    assert!(!response.is_ok());
}

#[tokio::test]
async fn test_http_500_maps_to_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1.9/echo/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client_for(&server).echo().await.unwrap_err();
    assert!(matches!(err, CsobError::Transport(_)));
    assert!(err.to_string().contains("500"), "unexpected error: {err}");
}

#[tokio::test]
async fn test_non_json_response_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1.9/echo/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("it is not even a json!"))
        .mount(&server)
        .await;

    let err = client_for(&server).echo().await.unwrap_err();
    assert!(matches!(err, CsobError::ResponseDecode(_)));
}

#[tokio::test]
async fn test_tampered_response_is_rejected() {
    let server = MockServer::start().await;

    // Signature covers resultCode 0; the body claims 900.
    let mut body = common::signed_ok_body("pay-id-123", 1);
    body["resultCode"] = json!(900);
    Mock::given(method("POST"))
        .and(path("/api/v1.9/echo/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let err = client_for(&server).echo().await.unwrap_err();
    assert!(matches!(err, CsobError::ResponseSignature));
}

#[tokio::test]
async fn test_missing_signature_is_rejected() {
    let server = MockServer::start().await;

    let mut body = common::signed_ok_body("pay-id-123", 1);
    body.as_object_mut().unwrap().remove("signature");
    Mock::given(method("POST"))
        .and(path("/api/v1.9/echo/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let err = client_for(&server).echo().await.unwrap_err();
    assert!(matches!(err, CsobError::MissingSignature));
}

#[tokio::test]
async fn test_tampered_extension_rejects_whole_response() {
    let server = MockServer::start().await;

    let mut tampered = common::masked_card_entry("maskClnRP", "555544****4444");
    tampered["longMaskedCln"] = json!("999999****9999");
    let mut body = common::signed_ok_body("pay-id-123", 7);
    body["extensions"] = json!([
        common::masked_card_entry("maskCln", "423451****1111"),
        tampered,
    ]);
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v1\.9/payment/status/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .payment_status("pay-id-123")
        .await
        .unwrap_err();
    assert!(matches!(err, CsobError::ExtensionSignature));
}

#[tokio::test]
async fn test_connection_refused_maps_to_transport_error() {
    // Nothing listens on port 1.
    let config = common::test_config("http://127.0.0.1:1");
    let client = CsobClient::new(&config).expect("client construction");

    let err = client.echo().await.unwrap_err();
    assert!(matches!(err, CsobError::Transport(_)));
    assert!(err.to_string().starts_with("gateway request failed"));
}
