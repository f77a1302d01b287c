//! Row models, mapped one-to-one onto the schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An account row. Main accounts carry credentials and webhook settings;
/// sub-accounts reference their parent and inherit its webhook.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbAccount {
    pub id: String,
    pub sn: String,
    pub display_name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub is_main: bool,
    pub parent_id: Option<String>,
    pub callback_url: Option<String>,
    pub webhook_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Opaque bearer token granting access as `account_id`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbAccessToken {
    pub id: String,
    pub name: String,
    pub description: String,
    pub account_id: String,
    pub token: String,
}

/// Wallet reference. The id equals the ledger account id (hex); the ledger
/// holds the balances.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbWallet {
    pub id: String,
    pub account_id: String,
    pub currency: String,
}

/// An instant-swap record. All four ledger transfer ids are pre-allocated
/// at creation so confirm and reversal are idempotent.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbInstantSwap {
    pub id: String,
    pub quotation_id: String,
    pub from_wallet_id: String,
    pub to_wallet_id: String,
    /// Rate scaled by 1e9.
    pub quotation_rate: i64,
    /// Rate scaled by 1e9; equals the quotation rate in this deployment.
    pub execution_rate: i64,
    pub quote_tx_id_0: String,
    pub quote_tx_id_1: String,
    pub swap_tx_id_0: String,
    pub swap_tx_id_1: String,
    pub created_at: DateTime<Utc>,
}

/// A withdrawal row with denormalized recipient details.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbWithdrawal {
    pub id: String,
    pub wallet_id: String,
    pub reference: String,
    pub tx_id: String,
    pub transaction_note: String,
    pub narration: String,
    pub status: String,
    pub recipient_type: String,
    pub recipient_name: Option<String>,
    pub recipient_destination_tag: Option<String>,
    pub recipient_address: Option<String>,
    pub created_at: DateTime<Utc>,
}
