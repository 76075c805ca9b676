use std::time::Duration;

use tally_token::TokenError;
use tally_types::{AccountId, Amount};

/// Why the issuance gate is closed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotReadyReason {
    #[error("pool {pool} is below the minimum issuance amount {minimum}")]
    BelowMinimumAmount { pool: Amount, minimum: Amount },

    #[error("{elapsed:?} elapsed since last issuance, {required:?} required")]
    IntervalNotElapsed { elapsed: Duration, required: Duration },

    #[error("token supply is zero; no holders to allocate to")]
    NoSupply,
}

/// Errors produced by the dividend engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DividendError {
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("issuance not ready: {0}")]
    IssuanceNotReady(NotReadyReason),

    #[error("nothing to claim for {account}")]
    NothingToClaim { account: AccountId },

    /// Held value cannot cover a claim. Unreachable while the books balance.
    #[error("insufficient contract balance: held {held}, requested {requested}")]
    InsufficientContractBalance { held: Amount, requested: Amount },

    #[error("issuance index {index} out of range for {account} ({len} entries)")]
    IndexOutOfRange {
        account: AccountId,
        index: usize,
        len: usize,
    },

    #[error("balance snapshot allocates {allocated} from a pool of {pool}")]
    InconsistentSnapshot { pool: Amount, allocated: Amount },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("dividend state lock poisoned")]
    LockPoisoned,

    #[error("balance source error: {0}")]
    Source(#[from] TokenError),
}

impl DividendError {
    /// Stable snake-case label for the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "invalid_amount",
            Self::IssuanceNotReady(_) => "issuance_not_ready",
            Self::NothingToClaim { .. } => "nothing_to_claim",
            Self::InsufficientContractBalance { .. } => "insufficient_contract_balance",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::InconsistentSnapshot { .. } => "inconsistent_snapshot",
            Self::Overflow => "overflow",
            Self::InvalidConfig(_) => "invalid_config",
            Self::LockPoisoned => "lock_poisoned",
            Self::Source(inner) => inner.kind(),
        }
    }
}
