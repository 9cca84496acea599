//! ČSOB Payment Gateway Client
//!
//! A Rust client for the ČSOB card-payment gateway eAPI: signed payment
//! lifecycle operations (init, status, reverse, close, refund, one-click),
//! customer queries, and mandatory cryptographic verification of everything
//! the gateway sends back.
//!
//! # How the gateway protocol works
//!
//! Every request is an ordered set of fields. The client joins the field
//! values with `|` in their declared order (the *canonical message*), signs
//! that message with the merchant's RSA private key (SHA-1, PKCS#1 v1.5), and
//! attaches the base64 signature. Responses carry the gateway's signature
//! over the same message shape, rebuilt from the recognized response fields
//! in canonical order, and are verified with the gateway's public key before
//! any field is exposed. Field order is load-bearing end to end.
//!
//! ```text
//! ┌──────────────┐   payment/init, status, ...    ┌─────────────────┐
//! │   E-shop     │ ───── signed JSON / URL ─────▶ │  ČSOB gateway   │
//! │ (this crate) │ ◀──── signed response ──────── │      eAPI       │
//! └──────┬───────┘                                └────────┬────────┘
//!        │                                                 │
//!        │ payment_process_url()                           │
//!        └────────────▶ customer's browser ◀───────────────┘
//!                       (returns to the e-shop with
//!                        signed parameters: gateway_return)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use csob_client::{ClientConfig, CsobClient, PaymentInitParams};
//!
//! # async fn example() -> csob_client::Result<()> {
//! let config = ClientConfig::new(
//!     "M1MIPS0000",
//!     "https://iapi.iplatebnibrana.csob.cz/api/v1.9/",
//!     "/etc/csob/rsa_M1MIPS0000.key",          // path or literal PEM
//!     "/etc/csob/mips_iplatebnibrana.csob.cz.pub",
//! );
//! let client = CsobClient::new(&config)?;
//!
//! // Create the payment. Amounts are in hundredths of the currency unit.
//! let params = PaymentInitParams::new(
//!     "20230001",
//!     12500,
//!     "https://shop.example.com/payment/return/",
//!     "Order 20230001",
//! );
//! let response = client.payment_init(&params).await?;
//! let pay_id = response.pay_id().unwrap_or_default().to_owned();
//!
//! // Redirect the customer to the payment page.
//! let redirect = client.payment_process_url(&pay_id)?;
//! println!("redirect to {redirect}");
//!
//! // Later: poll the payment state.
//! let status = client.payment_status(&pay_id).await?;
//! println!("status: {:?}", status.payment_status());
//! # Ok(())
//! # }
//! ```
//!
//! ## Handling the browser return
//!
//! When the gateway sends the customer back to the return URL, the request
//! parameters are a signed response of their own:
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! # use csob_client::CsobClient;
//!
//! # fn example(client: &CsobClient, form: HashMap<String, String>) -> csob_client::Result<()> {
//! let verified = client.gateway_return(&form)?;
//! if verified.is_ok() {
//!     println!("payment {} accepted", verified.pay_id().unwrap_or("?"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`client`]: [`CsobClient`] and every gateway operation
//! - [`config`]: [`ClientConfig`], TOML loading, protocol constants
//! - [`payload`]: ordered payloads and the canonical message
//! - [`crypto`]: RSA signing and verification, PEM key loading
//! - [`response`]: the response validation pipeline
//! - [`card`]: card provider lookup from masked card numbers
//! - [`transport`]: HTTP client construction and session hardening
//! - [`error`]: [`CsobError`] and the crate [`Result`]
//!
//! # Security Considerations
//!
//! - Responses are never exposed unverified. A [`GatewayResponse`] exists
//!   only after its signature (and every masked-card extension signature)
//!   has been checked against the gateway's public key.
//! - The default [`SessionMode::Hardened`](transport::SessionMode) refuses
//!   plain-HTTP gateways and negotiates TLS 1.2 or newer. The `Plain` mode
//!   exists for integration tests against local mock servers.
//! - Key material never appears in logs; tracing spans record field counts
//!   and order numbers, not payload contents.
//! - The SHA-1/PKCS#1 v1.5 signature scheme is the gateway's contract, not
//!   this crate's choice.
//!
//! # Error Handling
//!
//! All operations return [`Result`]. Signature failures are their own
//! variants so callers can distinguish a broken transport from a response
//! that failed verification:
//!
//! ```rust,no_run
//! use csob_client::{CsobClient, CsobError, PaymentInitParams};
//!
//! # async fn example(client: &CsobClient, params: PaymentInitParams) {
//! match client.payment_init(&params).await {
//!     Ok(response) => println!("result code {:?}", response.result_code()),
//!     Err(CsobError::InvalidRequest(msg)) => eprintln!("bad request: {msg}"),
//!     Err(CsobError::Transport(e)) => eprintln!("gateway unreachable: {e}"),
//!     Err(CsobError::ResponseSignature) => eprintln!("response failed verification"),
//!     Err(e) => eprintln!("error: {e}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and rsa"
)]

pub mod card;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod payload;
pub mod response;
pub mod transport;

pub use card::{CardProvider, card_provider};
pub use client::{CsobClient, OneclickInitParams, PayOperation, PaymentInitParams, ReturnMethod};
pub use config::ClientConfig;
pub use error::{CsobError, Result};
pub use payload::{CartItem, Payload, Value};
pub use response::{GatewayResponse, MaskedCardExtension};
