//! Dividend distribution engine for Tally.
//!
//! A [`DividendManager`] collects external value into a pool and, once the
//! issuance gate opens (minimum amount reached and minimum interval elapsed),
//! splits the whole pool among token holders in proportion to a balance
//! snapshot read through the injected [`tally_token::BalanceSource`]. Holders
//! later claim their accumulated entitlement in one withdrawal.
//!
//! Rounding residue from the proportional split is never lost: it is kept in
//! an explicit dust counter so the engine's books can be audited with
//! [`DividendAuditor`].

pub mod audit;
pub mod config;
pub mod error;
pub mod manager;
pub mod records;

pub use audit::{DividendAuditReport, DividendAuditor, PoolTotals, Violation, ViolationKind};
pub use config::DividendConfig;
pub use error::{DividendError, NotReadyReason};
pub use manager::DividendManager;
pub use records::{ClaimReceipt, Entitlement, IssuanceRecord};
