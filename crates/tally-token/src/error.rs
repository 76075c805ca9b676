use tally_types::{AccountId, Amount};

use crate::records::PledgeState;

/// Errors produced by token ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("{caller} is not authorized to {action}")]
    Unauthorized {
        caller: AccountId,
        action: &'static str,
    },

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("insufficient free balance for {account}: requested {requested}, available {available}")]
    InsufficientFreeBalance {
        account: AccountId,
        requested: Amount,
        available: Amount,
    },

    #[error("deposit index {index} out of range for {account} ({len} deposits)")]
    IndexOutOfRange {
        account: AccountId,
        index: usize,
        len: usize,
    },

    #[error("deposit {index} of {account} is {state:?}, not submitted")]
    DepositNotActive {
        account: AccountId,
        index: usize,
        state: PledgeState,
    },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("token state lock poisoned")]
    LockPoisoned,
}

impl TokenError {
    /// Stable snake-case label for the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidAmount => "invalid_amount",
            Self::InsufficientFreeBalance { .. } => "insufficient_free_balance",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::DepositNotActive { .. } => "deposit_not_active",
            Self::Overflow => "overflow",
            Self::LockPoisoned => "lock_poisoned",
        }
    }
}
