//! F1r3fly wallet connectors
//!
//! Interchangeable wallet connectors (simulated ledger, Bitcoin, F1r3fly)
//! behind one async interface, with faucet-driven balance top-ups.

pub mod amount;
pub mod cli;
pub mod client;
pub mod config;
pub mod connectors;
pub mod derivation;
pub mod error;
pub mod funding;
pub mod ledger;
pub mod manager;
pub mod storage;
