//! Serializable views returned by the service layer.
//!
//! Amounts serialize as strings (the wire format predates this
//! implementation and is kept byte-compatible). Ledger-backed identifiers
//! are 32-digit hex; metadata identifiers are UUIDs.

use chrono::{DateTime, Utc};
use nairex_db::DbAccount;
use rust_decimal::Decimal;
use serde::Serialize;

/// Public account representation.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sn: Option<String>,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserView {
    pub fn from_account(account: &DbAccount) -> Self {
        Self {
            id: account.id.clone(),
            sn: Some(account.sn.clone()),
            display_name: account.display_name.clone(),
            email: Some(account.email.clone()),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            parent_id: account.parent_id.clone(),
            callback_url: account.callback_url.clone(),
            created_at: Some(account.created_at),
            updated_at: Some(account.updated_at),
        }
    }

    /// The public attributes an unrelated viewer is allowed to see.
    pub fn stripped(account: &DbAccount) -> Self {
        Self {
            id: account.id.clone(),
            sn: None,
            display_name: account.display_name.clone(),
            email: None,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            parent_id: account.parent_id.clone(),
            callback_url: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// A wallet with its ledger-derived balances.
#[derive(Debug, Clone, Serialize)]
pub struct WalletView {
    pub id: String,
    pub name: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    #[serde(rename = "locked", with = "rust_decimal::serde::str")]
    pub locked_balance: Decimal,
    pub deposit_address: Option<String>,
    pub default_network: Option<String>,
    pub networks: Vec<serde_json::Value>,
    pub user: UserView,
}

/// First phase of a swap: a priced quotation with an expiry.
#[derive(Debug, Clone, Serialize)]
pub struct QuotationView {
    pub id: String,
    pub from_currency: String,
    pub to_currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub quoted_price: Decimal,
    pub quoted_currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub from_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub to_amount: Decimal,
    pub confirmed: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub user: UserView,
}

/// A swap transaction, embedding the quotation it executed.
#[derive(Debug, Clone, Serialize)]
pub struct SwapView {
    pub id: String,
    pub from_currency: String,
    pub to_currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub from_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub received_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub execution_price: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub swap_quotation: QuotationView,
    pub user: UserView,
}

/// A throwaway quote with no ledger effect.
#[derive(Debug, Clone, Serialize)]
pub struct TemporaryQuoteView {
    pub from_currency: String,
    pub to_currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub quoted_price: Decimal,
    pub quoted_currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub from_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub to_amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipientDetailsView {
    pub name: Option<String>,
    pub destination_tag: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipientView {
    #[serde(rename = "type")]
    pub recipient_type: String,
    pub details: RecipientDetailsView,
}

/// A withdrawal as seen by some viewer. `wallet` is withheld from viewers
/// outside the sender's account family.
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalView {
    pub id: String,
    pub reference: String,
    #[serde(rename = "type")]
    pub withdrawal_type: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    #[serde(rename = "txid")]
    pub transaction_id: String,
    pub transaction_note: String,
    pub narration: String,
    pub status: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub done_at: DateTime<Utc>,
    pub recipient: RecipientView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<WalletView>,
    pub user: UserView,
}

/// An inbound credit from the currency's system account.
#[derive(Debug, Clone, Serialize)]
pub struct DepositView {
    pub id: String,
    #[serde(rename = "type")]
    pub deposit_type: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub fee: Decimal,
    pub status: String,
    #[serde(rename = "txid")]
    pub tx_id: String,
    pub created_at: DateTime<Utc>,
    pub done_at: DateTime<Utc>,
    pub wallet: WalletView,
    pub user: UserView,
}
