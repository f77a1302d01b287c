//! The exchange-rate policy.
//!
//! Rates are a static matrix in this deployment. The table is injected into
//! the swap engine rather than read from a global so tests can pin their
//! own values.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::amount::approximate;
use crate::currency::Currency;

/// A quoted price together with the currency it is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub price: Decimal,
    pub currency: Currency,
}

/// Exchange-rate table derived from a per-currency mid price.
///
/// `rate(a, b)` is how many units of `b` one unit of `a` buys.
#[derive(Debug, Clone)]
pub struct RateTable {
    prices: HashMap<Currency, Decimal>,
}

impl RateTable {
    /// Build a table from usdt-denominated mid prices.
    pub fn from_prices(prices: HashMap<Currency, Decimal>) -> Self {
        Self { prices }
    }

    /// Units of `to` bought by one unit of `from`. Rounded to 12 decimal
    /// places so that anchor pairs (usdt/ngn) come out exact.
    pub fn rate(&self, from: Currency, to: Currency) -> Decimal {
        if from == to {
            return Decimal::ONE;
        }
        let from_price = self.prices.get(&from).copied().unwrap_or(Decimal::ONE);
        let to_price = self.prices.get(&to).copied().unwrap_or(Decimal::ONE);
        (from_price / to_price).round_dp(12).normalize()
    }

    /// The user-facing quoted price for a swap.
    ///
    /// Quotes are denominated in the destination currency, except that ngn
    /// sources quote the inverse in ngn (the market convention the API
    /// inherited).
    pub fn quoted_price(&self, from: Currency, to: Currency) -> Quote {
        if from == Currency::Ngn {
            // The inverse market rate, not 1/rate: it re-rounds from the
            // mid prices and keeps anchor pairs exact.
            Quote { price: approximate(Currency::Ngn, self.rate(to, from)), currency: Currency::Ngn }
        } else {
            Quote { price: approximate(to, self.rate(from, to)), currency: to }
        }
    }
}

impl Default for RateTable {
    fn default() -> Self {
        let mut prices = HashMap::new();
        prices.insert(Currency::Ngn, Decimal::ONE / Decimal::from(1500));
        prices.insert(Currency::Usdt, Decimal::ONE);
        prices.insert(Currency::Usdc, Decimal::ONE);
        prices.insert(Currency::Eth, Decimal::from(2600));
        prices.insert(Currency::Bnb, Decimal::from(580));
        prices.insert(Currency::Sol, Decimal::from(150));
        prices.insert(Currency::Btc, Decimal::from(60_000));
        Self::from_prices(prices)
    }
}
