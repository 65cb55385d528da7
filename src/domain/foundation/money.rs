//! Money value object with exact decimal arithmetic.
//!
//! All monetary amounts flow through `Decimal`; floats never touch a
//! money path. Each currency declares the number of minor units it
//! supports, and rounding is always half-up to that scale.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Currencies the settlement engine charges in.
///
/// PYG is the platform's home currency; every catalog price is stored
/// in guaraníes and converted per gateway at charge time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Paraguayan guaraní. No minor unit in circulation.
    Pyg,

    /// US dollar, settlement currency of the card processor.
    Usd,

    /// Tether, charged for direct wallet transfers.
    Usdt,
}

impl Currency {
    /// ISO-style code used on the wire and in storage.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Pyg => "PYG",
            Currency::Usd => "USD",
            Currency::Usdt => "USDT",
        }
    }

    /// Number of decimal places the currency supports.
    pub fn minor_units(&self) -> u32 {
        match self {
            Currency::Pyg => 0,
            Currency::Usd => 2,
            Currency::Usdt => 2,
        }
    }

    /// True for crypto-denominated currencies.
    pub fn is_crypto(&self) -> bool {
        matches!(self, Currency::Usdt)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PYG" => Ok(Currency::Pyg),
            "USD" => Ok(Currency::Usd),
            "USDT" => Ok(Currency::Usdt),
            other => Err(ValidationError::invalid_format(
                "currency",
                format!("unknown currency code: {}", other),
            )),
        }
    }
}

/// An exact amount in a specific currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a money value, rounding half-up to the currency's minor unit.
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: round_half_up(amount, currency.minor_units()),
            currency,
        }
    }

    /// Zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// The numeric amount, already at the currency's scale.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// The currency of this amount.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// True if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency.code())
    }
}

/// Round to `scale` decimal places, half-up (midpoint away from zero).
pub(crate) fn round_half_up(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pyg_rounds_to_whole_guaranies() {
        let m = Money::new(Decimal::new(1505, 1), Currency::Pyg); // 150.5
        assert_eq!(m.amount(), Decimal::from(151));
    }

    #[test]
    fn usd_keeps_two_decimal_places() {
        let m = Money::new(Decimal::new(12345, 3), Currency::Usd); // 12.345
        assert_eq!(m.amount(), Decimal::new(1235, 2)); // 12.35, half-up
    }

    #[test]
    fn midpoint_rounds_away_from_zero() {
        let m = Money::new(Decimal::new(25, 1), Currency::Pyg); // 2.5
        assert_eq!(m.amount(), Decimal::from(3));
    }

    #[test]
    fn zero_is_not_positive() {
        assert!(!Money::zero(Currency::Pyg).is_positive());
        assert!(Money::new(Decimal::ONE, Currency::Pyg).is_positive());
    }

    #[test]
    fn currency_codes_round_trip() {
        for currency in [Currency::Pyg, Currency::Usd, Currency::Usdt] {
            let parsed: Currency = currency.code().parse().unwrap();
            assert_eq!(parsed, currency);
        }
    }

    #[test]
    fn unknown_currency_code_is_rejected() {
        assert!("BTC".parse::<Currency>().is_err());
    }

    #[test]
    fn display_includes_code() {
        let m = Money::new(Decimal::from(150_000), Currency::Pyg);
        assert_eq!(m.to_string(), "150000 PYG");
    }
}
