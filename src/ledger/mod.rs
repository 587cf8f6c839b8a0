//! Simulated address ledger used by the in-memory connector

pub mod account;

pub use account::{Debit, LedgerAccount, LedgerError, TransferReceipt};
