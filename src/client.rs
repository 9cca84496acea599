//! The gateway client and its payment operations.
//!
//! [`CsobClient`] owns the merchant identity, both RSA keys, and a shared
//! HTTP client. Every operation assembles its payload in the exact field
//! order the gateway's signature scheme prescribes, signs it, dispatches it
//! (JSON body for POST/PUT, signed values embedded in the URL path for GET),
//! and hands the response to the validation pipeline. Operations therefore
//! return only verified data or an error, never an unverified body.
//!
//! # Examples
//!
//! ```no_run
//! use csob_client::client::{CsobClient, PaymentInitParams};
//! use csob_client::config::ClientConfig;
//!
//! # async fn example() -> csob_client::Result<()> {
//! let config = ClientConfig::new(
//!     "M1MIPS0000",
//!     "https://iapi.iplatebnibrana.csob.cz/api/v1.9/",
//!     "/etc/csob/merchant.key",
//!     "/etc/csob/gateway.pub",
//! );
//! let client = CsobClient::new(&config)?;
//!
//! let params = PaymentInitParams::new("20230001", 12500, "https://shop.example.com/return/", "Order 20230001");
//! let response = client.payment_init(&params).await?;
//!
//! if let Some(pay_id) = response.pay_id() {
//!     let redirect = client.payment_process_url(pay_id)?;
//!     println!("send the customer to {redirect}");
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::instrument;
use url::Url;

use crate::config::{
    ClientConfig, DEFAULT_CURRENCY, DEFAULT_LANGUAGE, DEFAULT_TTL_SEC, MAX_DESCRIPTION_LENGTH,
    PAY_METHOD_CARD,
};
use crate::crypto::{RequestSigner, ResponseVerifier, keys};
use crate::error::{CsobError, Result};
use crate::payload::{CartItem, Payload, SignedPayload, dttm_now};
use crate::response::{self, GatewayResponse};

/// Path-segment encode set matching the gateway's URL scheme: everything but
/// ASCII alphanumerics and `-` `_` `.` `~` is percent-encoded, so base64
/// signatures survive as a single segment.
const PATH_SEGMENT_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Payment operation requested by payment/init.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayOperation {
    /// Ordinary one-off payment.
    #[default]
    Payment,
    /// Payment that also creates a one-click template; its `payId` becomes
    /// the `orig_pay_id` for [`CsobClient::oneclick_init`].
    OneClickPayment,
}

impl PayOperation {
    /// Wire name of the operation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::OneClickPayment => "oneclickPayment",
        }
    }
}

/// HTTP method the gateway uses to send the customer back to the return URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnMethod {
    /// Response fields arrive as POST form data.
    #[default]
    Post,
    /// Response fields arrive as GET query parameters.
    Get,
}

impl ReturnMethod {
    /// Wire name of the method.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Get => "GET",
        }
    }
}

/// Parameters for [`CsobClient::payment_init`].
///
/// [`new`](Self::new) fills the gateway defaults (CZK, Czech payment page,
/// close the payment automatically, POST return, ten-minute lifetime); the
/// public fields can be adjusted freely before the call.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInitParams {
    /// Merchant order number.
    pub order_no: String,
    /// Total amount in hundredths of the currency unit. Must equal the sum
    /// of the cart item amounts.
    pub total_amount: i64,
    /// URL the customer returns to after the payment page.
    pub return_url: String,
    /// Order description, at most 255 characters.
    pub description: String,
    /// Opaque merchant data echoed back in responses.
    pub merchant_data: Option<String>,
    /// Cart items shown on the payment page, at most two. When absent, a
    /// single item is synthesized from the description and total amount.
    pub cart: Option<Vec<CartItem>>,
    /// Customer identifier for saved-card features.
    pub customer_id: Option<String>,
    /// Payment currency.
    pub currency: String,
    /// Payment-page language.
    pub language: String,
    /// Whether to close the payment automatically after authorization.
    pub close_payment: bool,
    /// How the gateway redirects back to `return_url`.
    pub return_method: ReturnMethod,
    /// Payment or one-click template creation.
    pub pay_operation: PayOperation,
    /// Payment lifetime in seconds.
    pub ttl_sec: i64,
    /// Merchant logo version on the payment page.
    pub logo_version: Option<i64>,
    /// Payment-page color scheme version.
    pub color_scheme_version: Option<i64>,
}

impl PaymentInitParams {
    /// Creates init parameters with the gateway defaults.
    pub fn new(
        order_no: impl Into<String>,
        total_amount: i64,
        return_url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            order_no: order_no.into(),
            total_amount,
            return_url: return_url.into(),
            description: description.into(),
            merchant_data: None,
            cart: None,
            customer_id: None,
            currency: DEFAULT_CURRENCY.to_owned(),
            language: DEFAULT_LANGUAGE.to_owned(),
            close_payment: true,
            return_method: ReturnMethod::default(),
            pay_operation: PayOperation::default(),
            ttl_sec: DEFAULT_TTL_SEC,
            logo_version: None,
            color_scheme_version: None,
        }
    }

    /// Sets an explicit cart.
    #[must_use]
    pub fn with_cart(mut self, cart: Vec<CartItem>) -> Self {
        self.cart = Some(cart);
        self
    }

    /// Sets the customer identifier.
    #[must_use]
    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Sets the opaque merchant data.
    #[must_use]
    pub fn with_merchant_data(mut self, merchant_data: impl Into<String>) -> Self {
        self.merchant_data = Some(merchant_data.into());
        self
    }
}

/// Parameters for [`CsobClient::oneclick_init`].
#[derive(Debug, Clone, PartialEq)]
pub struct OneclickInitParams {
    /// `payId` of the template payment created with
    /// [`PayOperation::OneClickPayment`].
    pub orig_pay_id: String,
    /// Merchant order number for the new payment.
    pub order_no: String,
    /// Total amount in hundredths of the currency unit.
    pub total_amount: i64,
    /// Payment currency.
    pub currency: String,
    /// Optional order description.
    pub description: Option<String>,
}

impl OneclickInitParams {
    /// Creates one-click init parameters with the default currency.
    pub fn new(
        orig_pay_id: impl Into<String>,
        order_no: impl Into<String>,
        total_amount: i64,
    ) -> Self {
        Self {
            orig_pay_id: orig_pay_id.into(),
            order_no: order_no.into(),
            total_amount,
            currency: DEFAULT_CURRENCY.to_owned(),
            description: None,
        }
    }

    /// Sets the order description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Client for the ČSOB payment gateway eAPI.
///
/// Construction resolves and parses both RSA keys and builds the shared HTTP
/// client; the instance is cheap to clone and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct CsobClient {
    merchant_id: String,
    base_url: Url,
    signer: RequestSigner,
    verifier: ResponseVerifier,
    http: reqwest::Client,
}

impl CsobClient {
    /// Builds a client from a validated configuration.
    ///
    /// Key material is resolved here: each key field is read as a file when
    /// a file exists at that path, otherwise treated as literal PEM text.
    ///
    /// # Errors
    ///
    /// Returns [`CsobError::Config`] for an invalid configuration,
    /// [`CsobError::InvalidKey`] for unreadable or unparseable key material,
    /// and [`CsobError::Transport`] when the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let private_pem = keys::resolve_key_material(&config.private_key)?;
        let public_pem = keys::resolve_key_material(&config.gateway_public_key)?;
        let signer = RequestSigner::from_pem(&private_pem)?;
        let verifier = ResponseVerifier::from_pem(&public_pem)?;

        // Endpoint paths resolve under the base URL, which requires the
        // trailing slash.
        let mut base_url = config.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url)?;

        Ok(Self {
            merchant_id: config.merchant_id.clone(),
            base_url,
            signer,
            verifier,
            http: config.http.build_client()?,
        })
    }

    /// Initializes a payment and returns the verified gateway response.
    ///
    /// On success the response carries the `payId` to use with
    /// [`payment_process_url`](Self::payment_process_url) and the rest of the
    /// payment lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`CsobError::InvalidRequest`] when the description exceeds
    /// 255 characters, plus the transport and verification errors every
    /// operation shares.
    #[instrument(skip(self, params), fields(order_no = %params.order_no))]
    pub async fn payment_init(&self, params: &PaymentInitParams) -> Result<GatewayResponse> {
        let payload = self.build_init_payload(params, &dttm_now())?;
        self.post("payment/init", payload).await
    }

    /// Queries the current payment state.
    ///
    /// # Errors
    ///
    /// Transport and verification errors.
    #[instrument(skip(self))]
    pub async fn payment_status(&self, pay_id: &str) -> Result<GatewayResponse> {
        let payload = self.pay_id_payload(pay_id, &dttm_now());
        self.get("payment/status/", payload).await
    }

    /// Reverses an authorized, not yet closed payment.
    ///
    /// # Errors
    ///
    /// Transport and verification errors.
    #[instrument(skip(self))]
    pub async fn payment_reverse(&self, pay_id: &str) -> Result<GatewayResponse> {
        let payload = self.pay_id_payload(pay_id, &dttm_now());
        self.put("payment/reverse/", payload).await
    }

    /// Closes an authorized payment, optionally for a lower amount.
    ///
    /// # Errors
    ///
    /// Transport and verification errors.
    #[instrument(skip(self))]
    pub async fn payment_close(
        &self,
        pay_id: &str,
        total_amount: Option<i64>,
    ) -> Result<GatewayResponse> {
        let mut payload = self.pay_id_payload(pay_id, &dttm_now());
        payload.push_opt("totalAmount", total_amount);
        self.put("payment/close/", payload).await
    }

    /// Refunds a settled payment, fully or partially.
    ///
    /// # Errors
    ///
    /// Transport and verification errors.
    #[instrument(skip(self))]
    pub async fn payment_refund(
        &self,
        pay_id: &str,
        amount: Option<i64>,
    ) -> Result<GatewayResponse> {
        let mut payload = self.pay_id_payload(pay_id, &dttm_now());
        payload.push_opt("amount", amount);
        self.put("payment/refund/", payload).await
    }

    /// Asks whether a customer has saved cards.
    ///
    /// The answer travels in the result code
    /// ([`RETURN_CODE_CUSTOMER_HAS_SAVED_CARDS`] and friends).
    ///
    /// [`RETURN_CODE_CUSTOMER_HAS_SAVED_CARDS`]: crate::config::RETURN_CODE_CUSTOMER_HAS_SAVED_CARDS
    ///
    /// # Errors
    ///
    /// Transport and verification errors.
    #[instrument(skip(self))]
    pub async fn customer_info(&self, customer_id: &str) -> Result<GatewayResponse> {
        let payload = self.customer_payload(customer_id, &dttm_now());
        self.get("customer/info/", payload).await
    }

    /// Initializes a payment from a one-click template.
    ///
    /// # Errors
    ///
    /// Transport and verification errors.
    #[instrument(skip(self, params), fields(order_no = %params.order_no))]
    pub async fn oneclick_init(&self, params: &OneclickInitParams) -> Result<GatewayResponse> {
        let payload = self.build_oneclick_payload(params, &dttm_now());
        self.post("payment/oneclick/init", payload).await
    }

    /// Starts a one-click payment initialized by
    /// [`oneclick_init`](Self::oneclick_init).
    ///
    /// # Errors
    ///
    /// Transport and verification errors.
    #[instrument(skip(self))]
    pub async fn oneclick_start(&self, pay_id: &str) -> Result<GatewayResponse> {
        let payload = self.pay_id_payload(pay_id, &dttm_now());
        self.post("payment/oneclick/start", payload).await
    }

    /// Verifies connectivity and signing against the gateway, POST variant.
    ///
    /// # Errors
    ///
    /// Transport and verification errors.
    #[instrument(skip(self))]
    pub async fn echo(&self) -> Result<GatewayResponse> {
        let payload = self.base_payload(&dttm_now());
        self.post("echo/", payload).await
    }

    /// Verifies connectivity and signing against the gateway, GET variant.
    ///
    /// # Errors
    ///
    /// Transport and verification errors.
    #[instrument(skip(self))]
    pub async fn echo_get(&self) -> Result<GatewayResponse> {
        let payload = self.base_payload(&dttm_now());
        self.get("echo/", payload).await
    }

    /// Builds the signed payment-page URL for a payment.
    ///
    /// The customer's browser is redirected here after a successful
    /// [`payment_init`](Self::payment_init).
    ///
    /// # Errors
    ///
    /// Returns [`CsobError::Crypto`] when signing fails and
    /// [`CsobError::Url`] when the segments do not form a valid URL.
    pub fn payment_process_url(&self, pay_id: &str) -> Result<Url> {
        let signed = self
            .signer
            .sign_payload(self.pay_id_payload(pay_id, &dttm_now()))?;
        self.signed_url("payment/process/", &signed)
    }

    /// Verifies the signed parameters of the browser return redirect.
    ///
    /// # Errors
    ///
    /// Returns [`CsobError::MissingSignature`] or
    /// [`CsobError::ResponseSignature`] for absent or failing signatures.
    #[instrument(skip_all)]
    pub fn gateway_return(&self, params: &HashMap<String, String>) -> Result<GatewayResponse> {
        response::validate_gateway_return(params, &self.verifier)
    }

    fn build_init_payload(&self, params: &PaymentInitParams, dttm: &str) -> Result<Payload> {
        if params.description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(CsobError::InvalidRequest(format!(
                "description length is over {MAX_DESCRIPTION_LENGTH} chars"
            )));
        }

        // Without an explicit cart the payment page still needs one item.
        let cart = match &params.cart {
            Some(cart) if !cart.is_empty() => cart.clone(),
            _ => vec![CartItem::new(
                params.description.chars().take(20).collect::<String>(),
                1,
                params.total_amount,
            )],
        };

        let mut payload = Payload::new();
        payload.push("merchantId", self.merchant_id.as_str());
        payload.push("orderNo", params.order_no.as_str());
        payload.push("dttm", dttm);
        payload.push("payOperation", params.pay_operation.as_str());
        payload.push("payMethod", PAY_METHOD_CARD);
        payload.push("totalAmount", params.total_amount);
        payload.push("currency", params.currency.as_str());
        payload.push("closePayment", params.close_payment);
        payload.push("returnUrl", params.return_url.as_str());
        payload.push("returnMethod", params.return_method.as_str());
        payload.push("cart", cart);
        payload.push("description", params.description.as_str());
        payload.push_opt("merchantData", params.merchant_data.as_deref());
        payload.push_opt("customerId", params.customer_id.as_deref());
        payload.push("language", params.language.as_str());
        payload.push("ttlSec", params.ttl_sec);
        payload.push_opt("logoVersion", params.logo_version);
        payload.push_opt("colorSchemeVersion", params.color_scheme_version);
        Ok(payload)
    }

    fn build_oneclick_payload(&self, params: &OneclickInitParams, dttm: &str) -> Payload {
        let mut payload = Payload::new();
        payload.push("merchantId", self.merchant_id.as_str());
        payload.push("origPayId", params.orig_pay_id.as_str());
        payload.push("orderNo", params.order_no.as_str());
        payload.push("dttm", dttm);
        payload.push("totalAmount", params.total_amount);
        payload.push("currency", params.currency.as_str());
        payload.push_opt("description", params.description.as_deref());
        payload
    }

    fn customer_payload(&self, customer_id: &str, dttm: &str) -> Payload {
        let mut payload = Payload::new();
        payload.push("merchantId", self.merchant_id.as_str());
        payload.push("customerId", customer_id);
        payload.push("dttm", dttm);
        payload
    }

    fn pay_id_payload(&self, pay_id: &str, dttm: &str) -> Payload {
        let mut payload = Payload::new();
        payload.push("merchantId", self.merchant_id.as_str());
        payload.push("payId", pay_id);
        payload.push("dttm", dttm);
        payload
    }

    fn base_payload(&self, dttm: &str) -> Payload {
        let mut payload = Payload::new();
        payload.push("merchantId", self.merchant_id.as_str());
        payload.push("dttm", dttm);
        payload
    }

    async fn post(&self, endpoint: &str, payload: Payload) -> Result<GatewayResponse> {
        let signed = self.signer.sign_payload(payload)?;
        let url = self.endpoint_url(endpoint)?;
        let response = self.http.post(url).json(&signed).send().await?;
        response::validate_response(response, &self.verifier).await
    }

    async fn put(&self, endpoint: &str, payload: Payload) -> Result<GatewayResponse> {
        let signed = self.signer.sign_payload(payload)?;
        let url = self.endpoint_url(endpoint)?;
        let response = self.http.put(url).json(&signed).send().await?;
        response::validate_response(response, &self.verifier).await
    }

    async fn get(&self, endpoint: &str, payload: Payload) -> Result<GatewayResponse> {
        let signed = self.signer.sign_payload(payload)?;
        let url = self.signed_url(endpoint, &signed)?;
        let response = self.http.get(url).send().await?;
        response::validate_response(response, &self.verifier).await
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint)?)
    }

    /// Appends the signed payload's values, percent-encoded, as path
    /// segments under the endpoint. The signature is the final segment.
    fn signed_url(&self, endpoint: &str, signed: &SignedPayload) -> Result<Url> {
        let segments: Vec<String> = signed
            .path_values()
            .iter()
            .map(|value| utf8_percent_encode(value, PATH_SEGMENT_ENCODE).to_string())
            .collect();
        Ok(self.endpoint_url(endpoint)?.join(&segments.join("/"))?)
    }
}
