//! Bancard vPOS gateway (Paraguay-local card processor).

mod adapter;

pub use adapter::{BancardAdapter, BancardConfig};
