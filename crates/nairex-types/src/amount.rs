//! Currency-aware fixed-point conversion.
//!
//! Two representations exist: the display form users see (a decimal floored
//! to the currency's precision) and the integer form the ledger books
//! (display value x 1e9, floored). All balance arithmetic and comparisons
//! happen on the integer form; the display form is derived on the way out.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::currency::Currency;
use crate::error::Error;

/// Universal ledger scale: one display unit is 1e9 ledger units.
pub const LEDGER_SCALE: u128 = 1_000_000_000;

/// Floor a user-visible amount to the currency's display precision. The
/// result always carries exactly that many fractional digits on the wire.
pub fn approximate(currency: Currency, amount: Decimal) -> Decimal {
    let decimals = currency.display_decimals();
    let mut floored = amount.trunc_with_scale(decimals);
    floored.rescale(decimals);
    floored
}

/// Encode a display amount as ledger integer units (floor of amount x 1e9).
///
/// Rejects negative amounts and values too large for the ledger word.
pub fn to_ledger_units(amount: Decimal) -> Result<u128, Error> {
    if amount.is_sign_negative() {
        return Err(Error::validation("amount must be greater than 0"));
    }
    let scaled = amount
        .checked_mul(Decimal::from(LEDGER_SCALE as u64))
        .ok_or_else(|| Error::validation("amount out of range"))?;
    scaled
        .floor()
        .to_u128()
        .ok_or_else(|| Error::validation("amount out of range"))
}

/// Decode ledger integer units back into the currency's display form.
pub fn display_amount(currency: Currency, units: u128) -> Decimal {
    let raw = Decimal::try_from_i128_with_scale(units as i128, 9)
        .unwrap_or(Decimal::MAX);
    approximate(currency, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn approximation_floors_per_currency() {
        assert_eq!(approximate(Currency::Ngn, dec("10.999")), dec("10.99"));
        assert_eq!(approximate(Currency::Btc, dec("0.123456789")), dec("0.12345678"));
        assert_eq!(approximate(Currency::Eth, dec("1.9999999")), dec("1.999999"));
        assert_eq!(approximate(Currency::Bnb, dec("2.000001")), dec("2.00000"));
    }

    #[test]
    fn ledger_encoding_is_floor_of_1e9() {
        assert_eq!(to_ledger_units(dec("1")).unwrap(), 1_000_000_000);
        assert_eq!(to_ledger_units(dec("0.000000001")).unwrap(), 1);
        assert_eq!(to_ledger_units(dec("10.5")).unwrap(), 10_500_000_000);
        // Sub-nano residue is floored away.
        assert_eq!(to_ledger_units(dec("0.0000000019")).unwrap(), 1);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(to_ledger_units(dec("-1")).is_err());
    }

    #[test]
    fn decode_floors_to_display_precision() {
        assert_eq!(display_amount(Currency::Ngn, 1_234_567_890), dec("1.23"));
        assert_eq!(display_amount(Currency::Btc, 1_234_567_890), dec("1.23456789"));
        assert_eq!(display_amount(Currency::Ngn, 0), dec("0.00"));
    }

    #[test]
    fn round_trip_is_stable_at_display_precision() {
        for raw in ["100.00", "0.01", "15000.00"] {
            let amount = dec(raw);
            let units = to_ledger_units(amount).unwrap();
            assert_eq!(display_amount(Currency::Ngn, units), amount);
        }
    }
}
