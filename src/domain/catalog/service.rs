//! Service catalog read model.
//!
//! Catalog management lives upstream; the settlement engine only reads
//! services by slug to resolve price, trial length, and recurrence.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, ServiceId};

/// How a service bills once active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingKind {
    /// Charged every month while active.
    Recurring,

    /// Single charge, indefinite access.
    OneTime,
}

/// A sellable automation service, as the catalog exposes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Unique identifier for this service.
    pub id: ServiceId,

    /// URL-safe name used in checkout requests.
    pub slug: String,

    /// Human-readable name.
    pub name: String,

    /// List price in the platform's home currency (PYG).
    pub price: Money,

    /// Days of free trial offered at sign-up; zero means no trial.
    pub trial_days: u32,

    /// Billing model.
    pub billing: BillingKind,

    /// Inactive services cannot be purchased.
    pub active: bool,
}

impl Service {
    /// True if the catalog offers a trial for this service.
    pub fn offers_trial(&self) -> bool {
        self.trial_days > 0
    }

    /// True for monthly-billed services.
    pub fn is_recurring(&self) -> bool {
        self.billing == BillingKind::Recurring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Currency;
    use rust_decimal::Decimal;

    fn service(trial_days: u32, billing: BillingKind) -> Service {
        Service {
            id: ServiceId::new(),
            slug: "lead-scraper".to_string(),
            name: "Lead Scraper".to_string(),
            price: Money::new(Decimal::from(150_000), Currency::Pyg),
            trial_days,
            billing,
            active: true,
        }
    }

    #[test]
    fn trial_requires_nonzero_days() {
        assert!(service(7, BillingKind::Recurring).offers_trial());
        assert!(!service(0, BillingKind::Recurring).offers_trial());
    }

    #[test]
    fn recurrence_follows_billing_kind() {
        assert!(service(0, BillingKind::Recurring).is_recurring());
        assert!(!service(0, BillingKind::OneTime).is_recurring());
    }
}
