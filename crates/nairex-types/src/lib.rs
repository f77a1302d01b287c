//! Shared domain types for the Nairex exchange backend.
//!
//! Everything that is common to the ledger gateway, the metadata store and
//! the service layer lives here: the closed currency set with its precision
//! policy, the display/ledger amount codec, the injected exchange-rate
//! table, 128-bit ledger identifiers and the wire-facing error taxonomy.

pub mod amount;
pub mod currency;
pub mod error;
pub mod id;
pub mod rates;
pub mod response;

pub use amount::{approximate, display_amount, to_ledger_units, LEDGER_SCALE};
pub use currency::Currency;
pub use error::{Error, ErrorKind, Result};
pub use id::LedgerId;
pub use rates::RateTable;
pub use response::ApiResponse;
