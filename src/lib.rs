//! Suscribot Settlement Engine
//!
//! Payment initiation, gateway callback settlement, and subscription
//! provisioning for the Suscribot automation platform. Four payment
//! rails (card checkout, Pagopar, Bancard, direct USDT transfer) plug
//! into one orchestrator through the gateway adapter port.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
