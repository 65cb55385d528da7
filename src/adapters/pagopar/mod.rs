//! Pagopar gateway (Paraguay-local aggregator).

mod adapter;

pub use adapter::{PagoparAdapter, PagoparConfig};
