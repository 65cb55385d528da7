//! Pure pricing arithmetic.

mod converter;

pub use converter::{RateConverter, RateTable};
