//! 128-bit ledger identifiers.
//!
//! Ledger accounts and transfers are addressed by opaque 128-bit ids,
//! rendered on the wire as 32-digit lowercase hex. Metadata rows (accounts,
//! tokens, withdrawals) use UUIDs instead; the difference is observable in
//! the wire format and deliberate.

use uuid::Uuid;

use crate::error::Error;

/// An opaque 128-bit ledger identifier.
pub type LedgerId = u128;

/// Allocate a fresh, globally unique ledger id.
pub fn new_ledger_id() -> LedgerId {
    Uuid::new_v4().as_u128()
}

/// Render a ledger id as its canonical 32-digit hex form.
pub fn encode_hex(id: LedgerId) -> String {
    format!("{id:032x}")
}

/// Parse a hex-encoded ledger id. Leading zeroes are optional on input.
pub fn decode_hex(s: &str) -> Result<LedgerId, Error> {
    if s.is_empty() || s.len() > 32 {
        return Err(Error::validation("invalid id provided"));
    }
    u128::from_str_radix(s, 16).map_err(|_| Error::validation("invalid id provided"))
}

/// The low 64 bits of an id, used to tag ledger transfers that belong to
/// the same logical operation.
pub fn low_bits(id: LedgerId) -> u64 {
    id as u64
}

/// A UUID rendered as a ledger user-data tag.
pub fn uuid_to_u128(id: Uuid) -> u128 {
    id.as_u128()
}

/// Recover a UUID from a ledger user-data tag.
pub fn u128_to_uuid(raw: u128) -> Uuid {
    Uuid::from_u128(raw)
}
