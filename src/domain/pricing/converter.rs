//! Charge-amount conversion per gateway.
//!
//! Pure arithmetic: given a home-currency (PYG) base amount, a gateway,
//! and the currency the caller wants to pay in, produce the exact
//! amount to charge. Every rate and the crypto discount come from the
//! injected rate table; nothing here is hard-coded.

use rust_decimal::Decimal;

use crate::domain::foundation::{Currency, DomainError, ErrorCode, Money};
use crate::domain::payment::Gateway;

/// Externally-configured rates and discounts.
///
/// Built from `GatewaysConfig` at startup and handed to the converter;
/// tests construct it directly.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    /// Guaraníes per US dollar, used when the card processor settles USD.
    pub pyg_per_usd: Decimal,

    /// Guaraníes per USDT unit.
    pub pyg_per_usdt: Decimal,

    /// Percentage knocked off the home amount for crypto payments.
    pub crypto_discount_percent: Decimal,
}

impl RateTable {
    /// Validates the table: rates strictly positive, discount in [0, 100).
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.pyg_per_usd <= Decimal::ZERO {
            return Err(DomainError::validation(
                "pyg_per_usd",
                "exchange rate must be strictly positive",
            ));
        }
        if self.pyg_per_usdt <= Decimal::ZERO {
            return Err(DomainError::validation(
                "pyg_per_usdt",
                "exchange rate must be strictly positive",
            ));
        }
        if self.crypto_discount_percent < Decimal::ZERO
            || self.crypto_discount_percent >= Decimal::from(100)
        {
            return Err(DomainError::validation(
                "crypto_discount_percent",
                "discount must be at least 0 and below 100",
            ));
        }
        Ok(())
    }
}

/// Converts home-currency prices into per-gateway charge amounts.
#[derive(Debug, Clone)]
pub struct RateConverter {
    rates: RateTable,
}

impl RateConverter {
    /// Creates a converter over a validated rate table.
    pub fn new(rates: RateTable) -> Result<Self, DomainError> {
        rates.validate()?;
        Ok(Self { rates })
    }

    /// Computes the amount to charge for `base` through `gateway` in
    /// `target` currency.
    ///
    /// - The local gateways settle PYG as-is.
    /// - The card processor settles PYG as-is or USD at the configured
    ///   rate.
    /// - Crypto applies the configured discount to the PYG amount, then
    ///   divides by the USDT rate.
    ///
    /// Results are rounded half-up to the target currency's minor unit.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `base` is not a positive PYG amount
    /// - `UnsupportedCurrency` for a gateway/currency pairing with no
    ///   configured rate
    pub fn convert(
        &self,
        base: &Money,
        gateway: Gateway,
        target: Currency,
    ) -> Result<Money, DomainError> {
        if base.currency() != Currency::Pyg {
            return Err(DomainError::new(
                ErrorCode::InvalidAmount,
                format!("base price must be in PYG, got {}", base.currency()),
            ));
        }
        if !base.is_positive() {
            return Err(DomainError::new(
                ErrorCode::InvalidAmount,
                format!("base price must be strictly positive, got {}", base.amount()),
            ));
        }

        match (gateway, target) {
            (Gateway::Pagopar, Currency::Pyg) | (Gateway::Bancard, Currency::Pyg) => {
                Ok(*base)
            }
            (Gateway::Card, Currency::Pyg) => Ok(*base),
            (Gateway::Card, Currency::Usd) => Ok(Money::new(
                base.amount() / self.rates.pyg_per_usd,
                Currency::Usd,
            )),
            (Gateway::Crypto, Currency::Usdt) => {
                let discounted = self.discounted_home_amount(base);
                Ok(Money::new(
                    discounted.amount() / self.rates.pyg_per_usdt,
                    Currency::Usdt,
                ))
            }
            (gateway, currency) => Err(DomainError::new(
                ErrorCode::UnsupportedCurrency,
                format!("gateway {} does not settle {}", gateway, currency),
            )
            .with_detail("gateway", gateway.as_str())
            .with_detail("currency", currency.code())),
        }
    }

    /// The home-currency amount after the crypto discount, before the
    /// crypto-unit division. Exposed so checkout pages can show the
    /// saving in guaraníes.
    pub fn discounted_home_amount(&self, base: &Money) -> Money {
        let factor =
            (Decimal::from(100) - self.rates.crypto_discount_percent) / Decimal::from(100);
        Money::new(base.amount() * factor, Currency::Pyg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pyg(amount: i64) -> Money {
        Money::new(Decimal::from(amount), Currency::Pyg)
    }

    fn converter() -> RateConverter {
        RateConverter::new(RateTable {
            pyg_per_usd: Decimal::from(7_300),
            pyg_per_usdt: Decimal::from(7_300),
            crypto_discount_percent: Decimal::from(25),
        })
        .unwrap()
    }

    #[test]
    fn local_gateways_pass_pyg_through() {
        let c = converter();
        for gateway in [Gateway::Pagopar, Gateway::Bancard] {
            let charged = c.convert(&pyg(150_000), gateway, Currency::Pyg).unwrap();
            assert_eq!(charged, pyg(150_000));
        }
    }

    #[test]
    fn card_settles_usd_at_configured_rate() {
        let c = converter();
        let charged = c.convert(&pyg(146_000), Gateway::Card, Currency::Usd).unwrap();
        assert_eq!(charged.amount(), Decimal::new(2000, 2)); // 20.00
        assert_eq!(charged.currency(), Currency::Usd);
    }

    #[test]
    fn crypto_discount_applies_before_unit_division() {
        let c = converter();
        let discounted = c.discounted_home_amount(&pyg(400_000));
        assert_eq!(discounted.amount(), Decimal::from(300_000));
    }

    #[test]
    fn crypto_charge_divides_discounted_amount_by_usdt_rate() {
        let c = converter();
        let charged = c
            .convert(&pyg(150_000), Gateway::Crypto, Currency::Usdt)
            .unwrap();
        // 150000 * 0.75 = 112500 PYG; / 7300 = 15.4109... -> 15.41
        assert_eq!(charged.amount(), Decimal::new(1541, 2));
        assert_eq!(charged.currency(), Currency::Usdt);
    }

    #[test]
    fn unconfigured_pairing_is_unsupported() {
        let c = converter();
        let result = c.convert(&pyg(150_000), Gateway::Pagopar, Currency::Usd);
        assert!(matches!(result, Err(e) if e.code == ErrorCode::UnsupportedCurrency));

        let result = c.convert(&pyg(150_000), Gateway::Crypto, Currency::Pyg);
        assert!(matches!(result, Err(e) if e.code == ErrorCode::UnsupportedCurrency));
    }

    #[test]
    fn non_positive_base_is_rejected_before_any_math() {
        let c = converter();
        let result = c.convert(&pyg(0), Gateway::Pagopar, Currency::Pyg);
        assert!(matches!(result, Err(e) if e.code == ErrorCode::InvalidAmount));
    }

    #[test]
    fn non_pyg_base_is_rejected() {
        let c = converter();
        let usd = Money::new(Decimal::from(20), Currency::Usd);
        let result = c.convert(&usd, Gateway::Card, Currency::Usd);
        assert!(matches!(result, Err(e) if e.code == ErrorCode::InvalidAmount));
    }

    #[test]
    fn discount_and_rates_are_validated_at_construction() {
        let bad = RateTable {
            pyg_per_usd: Decimal::ZERO,
            pyg_per_usdt: Decimal::from(7_300),
            crypto_discount_percent: Decimal::from(25),
        };
        assert!(RateConverter::new(bad).is_err());

        let bad = RateTable {
            pyg_per_usd: Decimal::from(7_300),
            pyg_per_usdt: Decimal::from(7_300),
            crypto_discount_percent: Decimal::from(100),
        };
        assert!(RateConverter::new(bad).is_err());
    }
}

#[cfg(test)]
mod arithmetic_props {
    use super::*;
    use proptest::prelude::*;

    fn table(discount: u32) -> RateConverter {
        RateConverter::new(RateTable {
            pyg_per_usd: Decimal::from(7_300),
            pyg_per_usdt: Decimal::from(7_300),
            crypto_discount_percent: Decimal::from(discount),
        })
        .unwrap()
    }

    proptest! {
        #[test]
        fn discounted_amount_never_exceeds_base(amount in 1i64..1_000_000_000, discount in 0u32..100) {
            let c = table(discount);
            let base = Money::new(Decimal::from(amount), Currency::Pyg);
            let discounted = c.discounted_home_amount(&base);
            prop_assert!(discounted.amount() <= base.amount());
        }

        #[test]
        fn quarter_discount_is_exact_to_one_minor_unit(amount in 1i64..1_000_000_000) {
            let c = table(25);
            let base = Money::new(Decimal::from(amount), Currency::Pyg);
            let discounted = c.discounted_home_amount(&base);
            let expected_times_four = Decimal::from(amount) * Decimal::from(3);
            let diff = (discounted.amount() * Decimal::from(4) - expected_times_four).abs();
            // Half-up rounding to whole guaraníes moves the x4 total by at most 2.
            prop_assert!(diff <= Decimal::from(2));
        }

        #[test]
        fn pass_through_is_identity(amount in 1i64..1_000_000_000) {
            let c = table(25);
            let base = Money::new(Decimal::from(amount), Currency::Pyg);
            let charged = c.convert(&base, Gateway::Bancard, Currency::Pyg).unwrap();
            prop_assert_eq!(charged.amount(), base.amount());
        }
    }
}
