use serde::{Deserialize, Serialize};
use tally_types::{AccountId, Amount, Timestamp};

/// Lifecycle state of a pledge.
///
/// `Submitted` is the only non-terminal state. While a pledge is submitted its
/// amount counts against the pledgor's free balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PledgeState {
    Submitted,
    /// Lock lifted; the amount is free again for the pledgor.
    Released,
    /// The pledged amount was handed over to the beneficiary.
    Forfeited,
}

impl PledgeState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    /// Numeric code of the state (`Submitted` = 0).
    pub fn code(&self) -> u8 {
        match self {
            Self::Submitted => 0,
            Self::Released => 1,
            Self::Forfeited => 2,
        }
    }
}

/// A deposit that earmarks part of the pledgor's balance for a beneficiary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pledge {
    /// Position in the pledgor's deposit list.
    pub index: usize,
    pub pledgor: AccountId,
    pub beneficiary: AccountId,
    pub amount: Amount,
    pub state: PledgeState,
    pub created_at: Timestamp,
    /// When the pledge left `Submitted`.
    pub settled_at: Option<Timestamp>,
}

impl Pledge {
    /// Amount still locked by this pledge.
    pub fn locked_amount(&self) -> Amount {
        if self.state.is_active() {
            self.amount
        } else {
            0
        }
    }
}

/// A consistent view of every non-zero balance and the supply they sum to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub total_supply: Amount,
    /// Holders with a non-zero total balance, ordered by account id.
    pub holders: Vec<(AccountId, Amount)>,
}
