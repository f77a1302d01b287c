//! The closed set of supported currencies.
//!
//! Each currency doubles as a ledger index: the double-entry engine keeps
//! one ledger per currency, numbered 1..=7, and the per-currency system
//! account reuses the index as its account id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Supported currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Ngn,
    Usdt,
    Usdc,
    Eth,
    Bnb,
    Sol,
    Btc,
}

impl Currency {
    /// Every supported currency, in ledger-index order.
    pub const ALL: [Currency; 7] = [
        Currency::Ngn,
        Currency::Usdt,
        Currency::Usdc,
        Currency::Eth,
        Currency::Bnb,
        Currency::Sol,
        Currency::Btc,
    ];

    /// The ledger index this currency is booked under.
    pub fn ledger_index(&self) -> u32 {
        match self {
            Self::Ngn => 1,
            Self::Usdt => 2,
            Self::Usdc => 3,
            Self::Eth => 4,
            Self::Bnb => 5,
            Self::Sol => 6,
            Self::Btc => 7,
        }
    }

    /// Resolve a ledger index back to its currency.
    pub fn from_ledger_index(index: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.ledger_index() == index)
    }

    /// Lowercase wire code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ngn => "ngn",
            Self::Usdt => "usdt",
            Self::Usdc => "usdc",
            Self::Eth => "eth",
            Self::Bnb => "bnb",
            Self::Sol => "sol",
            Self::Btc => "btc",
        }
    }

    /// Fractional digits shown to users. All ledger bookkeeping uses the
    /// universal 1e9 integer scale regardless of this value.
    pub fn display_decimals(&self) -> u32 {
        match self {
            Self::Btc => 8,
            Self::Sol | Self::Eth => 6,
            Self::Bnb => 5,
            Self::Ngn | Self::Usdt | Self::Usdc => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ngn" => Ok(Self::Ngn),
            "usdt" => Ok(Self::Usdt),
            "usdc" => Ok(Self::Usdc),
            "eth" => Ok(Self::Eth),
            "bnb" => Ok(Self::Bnb),
            "sol" => Ok(Self::Sol),
            "btc" => Ok(Self::Btc),
            other => Err(Error::validation(format!(
                "currency must be one of values: (ngn usdt usdc eth bnb sol btc), value received: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_indices_are_stable() {
        assert_eq!(Currency::Ngn.ledger_index(), 1);
        assert_eq!(Currency::Btc.ledger_index(), 7);
        for c in Currency::ALL {
            assert_eq!(Currency::from_ledger_index(c.ledger_index()), Some(c));
        }
        assert_eq!(Currency::from_ledger_index(0), None);
        assert_eq!(Currency::from_ledger_index(8), None);
    }

    #[test]
    fn parse_round_trips() {
        for c in Currency::ALL {
            assert_eq!(c.code().parse::<Currency>().unwrap(), c);
        }
        assert!("doge".parse::<Currency>().is_err());
    }

    #[test]
    fn display_decimals_follow_policy() {
        assert_eq!(Currency::Btc.display_decimals(), 8);
        assert_eq!(Currency::Eth.display_decimals(), 6);
        assert_eq!(Currency::Sol.display_decimals(), 6);
        assert_eq!(Currency::Bnb.display_decimals(), 5);
        assert_eq!(Currency::Ngn.display_decimals(), 2);
        assert_eq!(Currency::Usdt.display_decimals(), 2);
    }
}
