use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tally_types::{AccountId, Amount, Clock, SystemClock};
use tracing::debug;

use crate::error::TokenError;
use crate::records::{BalanceSnapshot, Pledge, PledgeState};
use crate::traits::{BalanceSource, TokenReader, TokenWriter};

/// In-memory token ledger for tests, local simulations, and embedding.
///
/// All state sits behind a single lock. Each mutation validates every
/// precondition before touching state, so a failed call leaves the ledger
/// exactly as it was.
pub struct InMemoryToken {
    administrator: AccountId,
    clock: Arc<dyn Clock>,
    inner: RwLock<TokenState>,
}

#[derive(Default)]
struct TokenState {
    total_supply: Amount,
    accounts: BTreeMap<AccountId, AccountState>,
    pledges: BTreeMap<AccountId, Vec<Pledge>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct AccountState {
    balance: Amount,
    /// Sum of the account's submitted pledge amounts. Never exceeds `balance`.
    locked: Amount,
}

impl AccountState {
    fn free(&self) -> Amount {
        self.balance.saturating_sub(self.locked)
    }
}

impl TokenState {
    fn account(&self, account: &AccountId) -> AccountState {
        self.accounts.get(account).copied().unwrap_or_default()
    }

    fn require_free(
        &self,
        account: &AccountId,
        amount: Amount,
    ) -> Result<AccountState, TokenError> {
        let state = self.account(account);
        if amount > state.free() {
            return Err(TokenError::InsufficientFreeBalance {
                account: account.clone(),
                requested: amount,
                available: state.free(),
            });
        }
        Ok(state)
    }

    fn deposits(&self, account: &AccountId) -> &[Pledge] {
        self.pledges.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    fn deposit(&self, account: &AccountId, index: usize) -> Result<&Pledge, TokenError> {
        let deposits = self.deposits(account);
        deposits.get(index).ok_or_else(|| TokenError::IndexOutOfRange {
            account: account.clone(),
            index,
            len: deposits.len(),
        })
    }

    fn active_deposit(&self, account: &AccountId, index: usize) -> Result<Pledge, TokenError> {
        let pledge = self.deposit(account, index)?;
        if !pledge.state.is_active() {
            return Err(TokenError::DepositNotActive {
                account: account.clone(),
                index,
                state: pledge.state,
            });
        }
        Ok(pledge.clone())
    }

    fn settle(
        &mut self,
        account: &AccountId,
        index: usize,
        state: PledgeState,
        at: tally_types::Timestamp,
    ) -> Result<Pledge, TokenError> {
        let len = self.deposits(account).len();
        let pledge = self
            .pledges
            .get_mut(account)
            .and_then(|list| list.get_mut(index))
            .ok_or_else(|| TokenError::IndexOutOfRange {
                account: account.clone(),
                index,
                len,
            })?;
        pledge.state = state;
        pledge.settled_at = Some(at);
        Ok(pledge.clone())
    }

    fn holders(&self) -> Vec<(AccountId, Amount)> {
        self.accounts
            .iter()
            .filter(|(_, state)| state.balance > 0)
            .map(|(id, state)| (id.clone(), state.balance))
            .collect()
    }
}

impl InMemoryToken {
    /// Create an empty ledger administered by `administrator`.
    pub fn new(administrator: AccountId) -> Self {
        Self::with_clock(administrator, Arc::new(SystemClock))
    }

    /// Create an empty ledger that stamps pledges with `clock`.
    pub fn with_clock(administrator: AccountId, clock: Arc<dyn Clock>) -> Self {
        Self {
            administrator,
            clock,
            inner: RwLock::new(TokenState::default()),
        }
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, TokenState>, TokenError> {
        self.inner.read().map_err(|_| TokenError::LockPoisoned)
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, TokenState>, TokenError> {
        self.inner.write().map_err(|_| TokenError::LockPoisoned)
    }

    fn require_administrator(
        &self,
        caller: &AccountId,
        action: &'static str,
    ) -> Result<(), TokenError> {
        if caller != &self.administrator {
            return Err(TokenError::Unauthorized {
                caller: caller.clone(),
                action,
            });
        }
        Ok(())
    }
}

impl TokenWriter for InMemoryToken {
    fn mint(
        &self,
        caller: &AccountId,
        account: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.require_administrator(caller, "mint")?;
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }

        let mut state = self.write_state()?;
        let supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        let current = state.account(account);
        let balance = current
            .balance
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;

        state
            .accounts
            .insert(account.clone(), AccountState { balance, ..current });
        state.total_supply = supply;

        debug!(account = %account, amount, supply, "minted");
        Ok(())
    }

    fn burn(&self, caller: &AccountId, amount: Amount) -> Result<(), TokenError> {
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }

        let mut state = self.write_state()?;
        let current = state.require_free(caller, amount)?;
        let supply = state
            .total_supply
            .checked_sub(amount)
            .ok_or(TokenError::Overflow)?;

        state.accounts.insert(
            caller.clone(),
            AccountState {
                balance: current.balance - amount,
                ..current
            },
        );
        state.total_supply = supply;

        debug!(account = %caller, amount, supply, "burned");
        Ok(())
    }

    fn transfer(
        &self,
        caller: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }

        let mut state = self.write_state()?;
        let sender = state.require_free(caller, amount)?;
        if caller == to {
            debug!(account = %caller, amount, "self-transfer");
            return Ok(());
        }

        let recipient = state.account(to);
        let credited = recipient
            .balance
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;

        state.accounts.insert(
            caller.clone(),
            AccountState {
                balance: sender.balance - amount,
                ..sender
            },
        );
        state.accounts.insert(
            to.clone(),
            AccountState {
                balance: credited,
                ..recipient
            },
        );

        debug!(from = %caller, to = %to, amount, "transferred");
        Ok(())
    }

    fn submit_deposit(
        &self,
        caller: &AccountId,
        beneficiary: &AccountId,
        amount: Amount,
    ) -> Result<Pledge, TokenError> {
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }
        let now = self.clock.now();

        let mut state = self.write_state()?;
        let pledgor = state.require_free(caller, amount)?;

        let list = state.pledges.entry(caller.clone()).or_default();
        let pledge = Pledge {
            index: list.len(),
            pledgor: caller.clone(),
            beneficiary: beneficiary.clone(),
            amount,
            state: PledgeState::Submitted,
            created_at: now,
            settled_at: None,
        };
        list.push(pledge.clone());

        state.accounts.insert(
            caller.clone(),
            AccountState {
                locked: pledgor.locked + amount,
                ..pledgor
            },
        );

        debug!(
            pledgor = %caller,
            beneficiary = %beneficiary,
            index = pledge.index,
            amount,
            "deposit submitted"
        );
        Ok(pledge)
    }

    fn release_deposit(
        &self,
        caller: &AccountId,
        pledgor: &AccountId,
        index: usize,
    ) -> Result<Pledge, TokenError> {
        let now = self.clock.now();
        let mut state = self.write_state()?;

        let pledge = state.deposit(pledgor, index)?.clone();
        if caller != &pledge.beneficiary && caller != &self.administrator {
            return Err(TokenError::Unauthorized {
                caller: caller.clone(),
                action: "release deposit",
            });
        }
        let pledge = state.active_deposit(pledgor, index)?;

        let account = state.account(pledgor);
        let locked = account
            .locked
            .checked_sub(pledge.amount)
            .ok_or(TokenError::Overflow)?;

        let released = state.settle(pledgor, index, PledgeState::Released, now)?;
        state
            .accounts
            .insert(pledgor.clone(), AccountState { locked, ..account });

        debug!(pledgor = %pledgor, index, amount = pledge.amount, "deposit released");
        Ok(released)
    }

    fn forfeit_deposit(
        &self,
        caller: &AccountId,
        pledgor: &AccountId,
        index: usize,
    ) -> Result<Pledge, TokenError> {
        self.require_administrator(caller, "forfeit deposit")?;
        let now = self.clock.now();
        let mut state = self.write_state()?;

        let pledge = state.active_deposit(pledgor, index)?;
        let from = state.account(pledgor);
        let locked = from
            .locked
            .checked_sub(pledge.amount)
            .ok_or(TokenError::Overflow)?;

        if &pledge.beneficiary == pledgor {
            let forfeited = state.settle(pledgor, index, PledgeState::Forfeited, now)?;
            state
                .accounts
                .insert(pledgor.clone(), AccountState { locked, ..from });
            debug!(pledgor = %pledgor, index, "self-pledge forfeited");
            return Ok(forfeited);
        }

        let debited = from
            .balance
            .checked_sub(pledge.amount)
            .ok_or(TokenError::Overflow)?;
        let to = state.account(&pledge.beneficiary);
        let credited = to
            .balance
            .checked_add(pledge.amount)
            .ok_or(TokenError::Overflow)?;

        let forfeited = state.settle(pledgor, index, PledgeState::Forfeited, now)?;
        state.accounts.insert(
            pledgor.clone(),
            AccountState {
                balance: debited,
                locked,
            },
        );
        state.accounts.insert(
            pledge.beneficiary.clone(),
            AccountState {
                balance: credited,
                ..to
            },
        );

        debug!(
            pledgor = %pledgor,
            beneficiary = %pledge.beneficiary,
            index,
            amount = pledge.amount,
            "deposit forfeited"
        );
        Ok(forfeited)
    }
}

impl TokenReader for InMemoryToken {
    fn administrator(&self) -> &AccountId {
        &self.administrator
    }

    fn total_supply(&self) -> Result<Amount, TokenError> {
        Ok(self.read_state()?.total_supply)
    }

    fn balance_of(&self, account: &AccountId) -> Result<Amount, TokenError> {
        Ok(self.read_state()?.account(account).balance)
    }

    fn free_balance_of(&self, account: &AccountId) -> Result<Amount, TokenError> {
        Ok(self.read_state()?.account(account).free())
    }

    fn get_deposit(&self, account: &AccountId, index: usize) -> Result<Pledge, TokenError> {
        self.read_state()?.deposit(account, index).cloned()
    }

    fn deposit_count(&self, account: &AccountId) -> Result<usize, TokenError> {
        Ok(self.read_state()?.deposits(account).len())
    }

    fn total_deposits(&self, account: &AccountId) -> Result<Amount, TokenError> {
        let state = self.read_state()?;
        state
            .deposits(account)
            .iter()
            .try_fold(0u64, |sum, pledge| sum.checked_add(pledge.locked_amount()))
            .ok_or(TokenError::Overflow)
    }

    fn holders(&self) -> Result<Vec<(AccountId, Amount)>, TokenError> {
        Ok(self.read_state()?.holders())
    }
}

impl BalanceSource for InMemoryToken {
    fn balance_snapshot(&self) -> Result<BalanceSnapshot, TokenError> {
        let state = self.read_state()?;
        Ok(BalanceSnapshot {
            total_supply: state.total_supply,
            holders: state.holders(),
        })
    }
}
