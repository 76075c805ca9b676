//! Foundation types for Tally.
//!
//! Every other Tally crate depends on `tally-types`.
//!
//! # Key Types
//!
//! - [`AccountId`] — Ledger account identity derived from seed material (BLAKE3)
//! - [`Timestamp`] — Unix-seconds instant used by issuance gating and records
//! - [`Clock`] — Time source injected into engines ([`SystemClock`], [`ManualClock`])
//! - [`Amount`] — Balance quantity in smallest units

pub mod account;
pub mod error;
pub mod temporal;

pub use account::{AccountId, AccountMaterial};
pub use error::TypeError;
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};

/// Balance quantity in the smallest indivisible unit.
pub type Amount = u64;
