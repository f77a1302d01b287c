//! Request payloads.

use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubAccountRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWebhookRequest {
    pub callback_url: Option<String>,
    pub webhook_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditSubAccountRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SwapQuotationRequest {
    pub from_currency: String,
    pub to_currency: String,
    #[serde(with = "lenient_decimal")]
    pub from_amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateWithdrawalRequest {
    pub fund_uid: String,
    pub currency: String,
    #[serde(with = "lenient_decimal")]
    pub amount: Decimal,
    #[serde(default)]
    pub transaction_note: String,
    #[serde(default)]
    pub narration: String,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    #[serde(with = "lenient_decimal")]
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalsQuery {
    pub currency: Option<String>,
    pub state: Option<String>,
}

/// Amounts arrive as either JSON strings or bare numbers; both forms have
/// always been accepted on this wire.
mod lenient_decimal {
    use rust_decimal::Decimal;
    use serde::de::{self, Deserializer, Visitor};
    use std::fmt;
    use std::str::FromStr;

    struct LenientDecimal;

    impl Visitor<'_> for LenientDecimal {
        type Value = Decimal;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal number or a numeric string")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Decimal, E> {
            Decimal::from_str(value.trim()).map_err(de::Error::custom)
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Decimal, E> {
            Decimal::try_from(value).map_err(de::Error::custom)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Decimal, E> {
            Ok(Decimal::from(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Decimal, E> {
            Ok(Decimal::from(value))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        deserializer.deserialize_any(LenientDecimal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn amounts_accept_strings_and_numbers() {
        let from_string: DepositRequest = serde_json::from_str(r#"{"amount": "10.5"}"#).unwrap();
        assert_eq!(from_string.amount, Decimal::from_str("10.5").unwrap());

        let from_number: DepositRequest = serde_json::from_str(r#"{"amount": 10.5}"#).unwrap();
        assert_eq!(from_number.amount, Decimal::from_str("10.5").unwrap());

        let from_integer: DepositRequest = serde_json::from_str(r#"{"amount": 7}"#).unwrap();
        assert_eq!(from_integer.amount, Decimal::from(7));

        assert!(serde_json::from_str::<DepositRequest>(r#"{"amount": "ten"}"#).is_err());
    }
}
