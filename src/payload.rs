//! Ordered request payloads and canonical message construction.
//!
//! Every gateway call signs an ordered set of named fields. The signature is
//! computed over the *canonical message*: the `|`-joined stringified values of
//! the payload in insertion order, encoded as UTF-8. Field order is therefore
//! load-bearing. The gateway reconstructs the same message on its side, and
//! any reordering produces a different message and a failed verification.
//!
//! [`Payload`] keeps fields as an explicit vector of name/value pairs rather
//! than any hash-ordered map, so insertion order is exactly signing order.
//! Empty values (none, empty string, empty cart) are excluded at insertion
//! and again defensively during message construction.
//!
//! # Examples
//!
//! ```
//! use csob_client::payload::Payload;
//!
//! let mut payload = Payload::new();
//! payload.push("merchantId", "MERCHANT");
//! payload.push("dttm", "20230101120000");
//! payload.push("closePayment", true);
//!
//! assert_eq!(
//!     payload.canonical_message(),
//!     b"MERCHANT|20230101120000|true".to_vec(),
//! );
//! ```

use chrono::{Local, NaiveDateTime};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::config::DTTM_FORMAT;

/// A single cart entry.
///
/// The gateway accepts at most two cart items per payment. When the cart is
/// flattened into the canonical message, each item contributes its field
/// values in declaration order: name, quantity, amount, then the optional
/// description when present (an absent description simply contributes one
/// segment fewer).
///
/// # Examples
///
/// ```
/// use csob_client::payload::CartItem;
///
/// let item = CartItem::new("Wild apples", 1, 12500).with_description("1 kg");
/// assert_eq!(item.values(), vec!["Wild apples", "1", "12500", "1 kg"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    /// Item name shown on the payment page.
    pub name: String,
    /// Number of units.
    pub quantity: i64,
    /// Item amount in hundredths of the currency unit.
    pub amount: i64,
    /// Optional item description.
    pub description: Option<String>,
}

impl CartItem {
    /// Creates a cart item without a description.
    pub fn new(name: impl Into<String>, quantity: i64, amount: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
            amount,
            description: None,
        }
    }

    /// Attaches an item description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the item's stringified field values in canonical order.
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        let mut values = vec![
            self.name.clone(),
            self.quantity.to_string(),
            self.amount.to_string(),
        ];
        if let Some(description) = &self.description {
            values.push(description.clone());
        }
        values
    }
}

impl Serialize for CartItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = 3 + usize::from(self.description.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("quantity", &self.quantity)?;
        map.serialize_entry("amount", &self.amount)?;
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        map.end()
    }
}

/// A payload field value.
///
/// The gateway protocol uses three scalar shapes plus the nested cart list.
/// Each variant stringifies explicitly for the canonical message: booleans
/// render lowercase (`true`/`false`) to match the gateway's JSON view of the
/// payload, integers in their natural decimal form, and carts flatten to the
/// `|`-join of every item value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text value.
    Str(String),
    /// Integer value (amounts in hundredths, TTLs, versions).
    Int(i64),
    /// Boolean value; stringifies lowercase.
    Bool(bool),
    /// Nested cart list; flattens to a single canonical segment.
    Cart(Vec<CartItem>),
}

impl Value {
    /// Returns true for values the protocol treats as "omit this field":
    /// the empty string and the empty cart.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Str(s) => s.is_empty(),
            Self::Cart(items) => items.is_empty(),
            Self::Int(_) | Self::Bool(_) => false,
        }
    }

    /// Stringifies the value for the canonical message.
    #[must_use]
    pub fn stringify(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Bool(b) => if *b { "true" } else { "false" }.to_owned(),
            Self::Cart(items) => {
                let segments: Vec<String> =
                    items.iter().flat_map(CartItem::values).collect();
                segments.join("|")
            }
        }
    }

    /// Returns the text content for string values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content for integer values.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<CartItem>> for Value {
    fn from(value: Vec<CartItem>) -> Self {
        Self::Cart(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Str(s) => serializer.serialize_str(s),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Cart(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// An ordered set of named fields awaiting signature.
///
/// Backed by a vector of pairs; insertion order is signing order. Payloads
/// are built fresh per gateway call and never reused.
///
/// Serializes as a JSON object with fields in insertion order, which is what
/// the gateway receives in POST/PUT bodies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: Vec<(String, Value)>,
}

impl Payload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, silently skipping values the protocol treats as
    /// empty (empty string, empty cart).
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        self.fields.push((name.into(), value));
    }

    /// Appends an optional field; `None` is skipped entirely.
    pub fn push_opt<V: Into<Value>>(&mut self, name: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.push(name, value);
        }
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Number of fields present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the payload holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Builds the canonical message: stringified values in field order,
    /// joined with `|`, as UTF-8 bytes.
    ///
    /// Empty values are filtered here as well, so a payload assembled by
    /// other means still signs the same message the gateway derives.
    ///
    /// # Examples
    ///
    /// ```
    /// use csob_client::payload::{CartItem, Payload};
    ///
    /// let mut payload = Payload::new();
    /// payload.push("merchantId", "MERCHANT");
    /// payload.push("totalAmount", 12500_i64);
    /// payload.push("cart", vec![CartItem::new("Apples", 1, 12500)]);
    ///
    /// assert_eq!(
    ///     payload.canonical_message(),
    ///     b"MERCHANT|12500|Apples|1|12500".to_vec(),
    /// );
    /// ```
    #[must_use]
    pub fn canonical_message(&self) -> Vec<u8> {
        let segments: Vec<String> = self
            .fields
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(_, value)| value.stringify())
            .collect();
        segments.join("|").into_bytes()
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A payload together with its computed signature.
///
/// The signature lives outside the field list, so it can never leak into the
/// canonical message that produced it. Serializes as the payload's fields
/// followed by a final `signature` field, the wire form the gateway expects.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedPayload {
    payload: Payload,
    signature: String,
}

impl SignedPayload {
    pub(crate) fn new(payload: Payload, signature: String) -> Self {
        Self { payload, signature }
    }

    /// The signed fields.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The base64 signature text.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Stringified payload values followed by the signature, in order.
    ///
    /// GET-style gateway endpoints embed the whole signed payload in the URL
    /// path; this is the segment list to encode there.
    #[must_use]
    pub fn path_values(&self) -> Vec<String> {
        let mut values: Vec<String> = self
            .payload
            .fields
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(_, value)| value.stringify())
            .collect();
        values.push(self.signature.clone());
        values
    }
}

impl Serialize for SignedPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.payload.fields.len() + 1))?;
        for (name, value) in &self.payload.fields {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry("signature", &self.signature)?;
        map.end()
    }
}

/// Current gateway timestamp in `YYYYMMDDHHMMSS` form (local time).
#[must_use]
pub fn dttm_now() -> String {
    Local::now().format(DTTM_FORMAT).to_string()
}

/// Parses a gateway `dttm` timestamp back into a [`NaiveDateTime`].
///
/// Returns `None` when the text does not match the `YYYYMMDDHHMMSS` shape.
#[must_use]
pub fn parse_dttm(dttm: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(dttm, DTTM_FORMAT).ok()
}
