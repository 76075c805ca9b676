//! Fungible token ledger for Tally.
//!
//! This crate provides:
//! - Per-account balances and total supply with administrator-only minting
//! - The pledge sub-ledger: deposits that lock part of a holder's balance on
//!   behalf of a beneficiary without moving it
//! - `TokenReader` / `TokenWriter` trait boundaries and the read-only
//!   `BalanceSource` capability consumed by the dividend engine
//! - `InMemoryToken` implementation for tests and embedding
//! - Supply auditing (conservation and free-balance checks)

pub mod audit;
pub mod error;
pub mod memory;
pub mod records;
pub mod traits;

pub use audit::{SupplyAuditor, SupplyReport, Violation, ViolationKind};
pub use error::TokenError;
pub use memory::InMemoryToken;
pub use records::{BalanceSnapshot, Pledge, PledgeState};
pub use traits::{BalanceSource, TokenReader, TokenWriter};
