use std::sync::Arc;

use tally_types::{AccountId, Amount};

use crate::error::TokenError;
use crate::records::{BalanceSnapshot, Pledge};

/// Write boundary for token ledger mutations.
///
/// `caller` is the account on whose authority the call is made.
pub trait TokenWriter: Send + Sync {
    fn mint(&self, caller: &AccountId, account: &AccountId, amount: Amount)
        -> Result<(), TokenError>;

    fn burn(&self, caller: &AccountId, amount: Amount) -> Result<(), TokenError>;

    fn transfer(&self, caller: &AccountId, to: &AccountId, amount: Amount)
        -> Result<(), TokenError>;

    fn submit_deposit(
        &self,
        caller: &AccountId,
        beneficiary: &AccountId,
        amount: Amount,
    ) -> Result<Pledge, TokenError>;

    fn release_deposit(
        &self,
        caller: &AccountId,
        pledgor: &AccountId,
        index: usize,
    ) -> Result<Pledge, TokenError>;

    fn forfeit_deposit(
        &self,
        caller: &AccountId,
        pledgor: &AccountId,
        index: usize,
    ) -> Result<Pledge, TokenError>;
}

/// Read boundary for token ledger queries.
pub trait TokenReader: Send + Sync {
    fn administrator(&self) -> &AccountId;

    fn total_supply(&self) -> Result<Amount, TokenError>;

    fn balance_of(&self, account: &AccountId) -> Result<Amount, TokenError>;

    fn free_balance_of(&self, account: &AccountId) -> Result<Amount, TokenError>;

    fn get_deposit(&self, account: &AccountId, index: usize) -> Result<Pledge, TokenError>;

    fn deposit_count(&self, account: &AccountId) -> Result<usize, TokenError>;

    /// Sum of amounts over the account's `Submitted` pledges.
    fn total_deposits(&self, account: &AccountId) -> Result<Amount, TokenError>;

    /// Accounts with a non-zero balance, ordered by account id.
    fn holders(&self) -> Result<Vec<(AccountId, Amount)>, TokenError>;
}

/// Read-only balance capability handed to the dividend engine.
pub trait BalanceSource: Send + Sync {
    /// Supply and holder balances observed atomically.
    fn balance_snapshot(&self) -> Result<BalanceSnapshot, TokenError>;
}

impl<T: BalanceSource + ?Sized> BalanceSource for Arc<T> {
    fn balance_snapshot(&self) -> Result<BalanceSnapshot, TokenError> {
        (**self).balance_snapshot()
    }
}
