use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tally_token::BalanceSource;
use tally_types::{AccountId, Amount, Clock, SystemClock, Timestamp};
use tracing::{debug, error, info};

use crate::audit::{DividendAuditReport, DividendAuditor, PoolTotals};
use crate::config::DividendConfig;
use crate::error::{DividendError, NotReadyReason};
use crate::records::{ClaimReceipt, Entitlement, IssuanceRecord};

/// Pools external value and distributes it to token holders.
///
/// The balance source is read only when an issuance runs. Every call takes the
/// state lock once and checks all preconditions before mutating, so each
/// operation is all-or-nothing.
pub struct DividendManager<S: BalanceSource> {
    source: S,
    clock: Arc<dyn Clock>,
    config: DividendConfig,
    inner: RwLock<PoolState>,
}

#[derive(Default)]
struct PoolState {
    /// Value received but not yet allocated.
    unissued: Amount,
    /// Value in custody: unissued + Σ unclaimed + dust.
    held: Amount,
    /// Rounding residue left over by issuances.
    dust: Amount,
    total_received: Amount,
    last_issued: Option<Timestamp>,
    issuances: Vec<IssuanceRecord>,
    holders: BTreeMap<AccountId, HolderLedger>,
}

#[derive(Default)]
struct HolderLedger {
    entitlements: Vec<Entitlement>,
    unclaimed: Amount,
    claimed: Amount,
}

impl PoolState {
    fn holder_totals(&self, account: &AccountId) -> (Amount, Amount) {
        self.holders
            .get(account)
            .map(|h| (h.unclaimed, h.claimed))
            .unwrap_or((0, 0))
    }
}

impl<S: BalanceSource> DividendManager<S> {
    /// Create an engine over `source`, gated by `config`, timed by `clock`.
    pub fn new(
        source: S,
        config: DividendConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DividendError> {
        config.validate()?;
        Ok(Self {
            source,
            clock,
            config,
            inner: RwLock::new(PoolState::default()),
        })
    }

    /// Create an engine that reads the operating-system clock.
    pub fn with_system_clock(source: S, config: DividendConfig) -> Result<Self, DividendError> {
        Self::new(source, config, Arc::new(SystemClock))
    }

    pub fn config(&self) -> &DividendConfig {
        &self.config
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, PoolState>, DividendError> {
        self.inner.read().map_err(|_| DividendError::LockPoisoned)
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, PoolState>, DividendError> {
        self.inner.write().map_err(|_| DividendError::LockPoisoned)
    }

    /// Receive external value into the pool. Returns the new unissued balance.
    pub fn deposit(&self, from: &AccountId, amount: Amount) -> Result<Amount, DividendError> {
        if amount == 0 {
            return Err(DividendError::InvalidAmount);
        }

        let mut state = self.write_state()?;
        let unissued = state
            .unissued
            .checked_add(amount)
            .ok_or(DividendError::Overflow)?;
        let held = state
            .held
            .checked_add(amount)
            .ok_or(DividendError::Overflow)?;
        let total_received = state
            .total_received
            .checked_add(amount)
            .ok_or(DividendError::Overflow)?;

        state.unissued = unissued;
        state.held = held;
        state.total_received = total_received;

        debug!(from = %from, amount, unissued, "value received");
        Ok(unissued)
    }

    /// Allocate the whole pool to holders of the current balance snapshot.
    ///
    /// Each holder receives `floor(pool * balance / supply)`; the remainder is
    /// added to the dust counter.
    pub fn issue_dividend(&self) -> Result<IssuanceRecord, DividendError> {
        let now = self.clock.now();
        let mut state = self.write_state()?;

        let pool = state.unissued;
        if pool < self.config.min_issuance_amount {
            return Err(DividendError::IssuanceNotReady(
                NotReadyReason::BelowMinimumAmount {
                    pool,
                    minimum: self.config.min_issuance_amount,
                },
            ));
        }
        if let Some(last) = state.last_issued {
            let elapsed = now.saturating_elapsed_since(last);
            let required = self.config.min_issuance_interval();
            if elapsed < required {
                return Err(DividendError::IssuanceNotReady(
                    NotReadyReason::IntervalNotElapsed { elapsed, required },
                ));
            }
        }

        let snapshot = self.source.balance_snapshot()?;
        if snapshot.total_supply == 0 {
            return Err(DividendError::IssuanceNotReady(NotReadyReason::NoSupply));
        }

        let index = state.issuances.len();
        let mut shares = Vec::with_capacity(snapshot.holders.len());
        let mut allocated: u128 = 0;
        for (account, balance) in &snapshot.holders {
            let share = u128::from(pool) * u128::from(*balance) / u128::from(snapshot.total_supply);
            allocated = allocated
                .checked_add(share)
                .ok_or(DividendError::Overflow)?;
            let share = Amount::try_from(share).map_err(|_| DividendError::Overflow)?;
            let (unclaimed, _) = state.holder_totals(account);
            let unclaimed = unclaimed
                .checked_add(share)
                .ok_or(DividendError::Overflow)?;
            shares.push((account, *balance, share, unclaimed));
        }

        if allocated > u128::from(pool) {
            return Err(DividendError::InconsistentSnapshot {
                pool,
                allocated: Amount::try_from(allocated).unwrap_or(Amount::MAX),
            });
        }
        let total_allocated = allocated as Amount;
        let residue = pool - total_allocated;
        let dust = state
            .dust
            .checked_add(residue)
            .ok_or(DividendError::Overflow)?;

        for (account, balance, share, unclaimed) in shares {
            let holder = state.holders.entry(account.clone()).or_default();
            holder.entitlements.push(Entitlement {
                issuance: index,
                amount: share,
                balance_at_snapshot: balance,
                issued_at: now,
            });
            holder.unclaimed = unclaimed;
        }

        let record = IssuanceRecord {
            index,
            issued_at: now,
            pool_amount: pool,
            total_allocated,
            dust: residue,
            total_supply: snapshot.total_supply,
            holder_count: snapshot.holders.len(),
        };
        state.issuances.push(record.clone());
        state.unissued = 0;
        state.dust = dust;
        state.last_issued = Some(now);

        info!(
            index,
            pool,
            total_allocated,
            dust = residue,
            holders = record.holder_count,
            "dividend issued"
        );
        Ok(record)
    }

    /// Pay out the caller's entire unclaimed total.
    pub fn claim_dividend(&self, caller: &AccountId) -> Result<ClaimReceipt, DividendError> {
        let now = self.clock.now();
        let mut state = self.write_state()?;

        let (unclaimed, claimed) = state.holder_totals(caller);
        if unclaimed == 0 {
            return Err(DividendError::NothingToClaim {
                account: caller.clone(),
            });
        }
        if state.held < unclaimed {
            error!(
                account = %caller,
                held = state.held,
                requested = unclaimed,
                "held value cannot cover claim; dividend books are inconsistent"
            );
            return Err(DividendError::InsufficientContractBalance {
                held: state.held,
                requested: unclaimed,
            });
        }
        let claimed_total = claimed
            .checked_add(unclaimed)
            .ok_or(DividendError::Overflow)?;

        state.held -= unclaimed;
        if let Some(holder) = state.holders.get_mut(caller) {
            holder.unclaimed = 0;
            holder.claimed = claimed_total;
        }

        debug!(account = %caller, amount = unclaimed, claimed_total, "dividend claimed");
        Ok(ClaimReceipt {
            account: caller.clone(),
            amount: unclaimed,
            claimed_at: now,
            claimed_total,
        })
    }

    pub fn unissued_balance(&self) -> Result<Amount, DividendError> {
        Ok(self.read_state()?.unissued)
    }

    /// Value currently in the engine's custody.
    pub fn held_balance(&self) -> Result<Amount, DividendError> {
        Ok(self.read_state()?.held)
    }

    pub fn undistributed_dust(&self) -> Result<Amount, DividendError> {
        Ok(self.read_state()?.dust)
    }

    pub fn last_issued_at(&self) -> Result<Option<Timestamp>, DividendError> {
        Ok(self.read_state()?.last_issued)
    }

    pub fn unclaimed_for(&self, account: &AccountId) -> Result<Amount, DividendError> {
        Ok(self.read_state()?.holder_totals(account).0)
    }

    pub fn claimed_for(&self, account: &AccountId) -> Result<Amount, DividendError> {
        Ok(self.read_state()?.holder_totals(account).1)
    }

    /// The `index`-th entitlement recorded for `account`.
    pub fn issued_for(
        &self,
        account: &AccountId,
        index: usize,
    ) -> Result<Entitlement, DividendError> {
        let state = self.read_state()?;
        let entitlements = state
            .holders
            .get(account)
            .map(|h| h.entitlements.as_slice())
            .unwrap_or(&[]);
        entitlements
            .get(index)
            .cloned()
            .ok_or_else(|| DividendError::IndexOutOfRange {
                account: account.clone(),
                index,
                len: entitlements.len(),
            })
    }

    pub fn issued_count(&self, account: &AccountId) -> Result<usize, DividendError> {
        Ok(self
            .read_state()?
            .holders
            .get(account)
            .map(|h| h.entitlements.len())
            .unwrap_or(0))
    }

    pub fn issuance(&self, index: usize) -> Result<Option<IssuanceRecord>, DividendError> {
        Ok(self.read_state()?.issuances.get(index).cloned())
    }

    pub fn issuance_count(&self) -> Result<usize, DividendError> {
        Ok(self.read_state()?.issuances.len())
    }

    /// Aggregate figures for auditing, observed under one lock.
    pub fn totals(&self) -> Result<PoolTotals, DividendError> {
        let state = self.read_state()?;
        Ok(PoolTotals {
            held: u128::from(state.held),
            unissued: u128::from(state.unissued),
            dust: u128::from(state.dust),
            total_received: u128::from(state.total_received),
            total_issued: state
                .issuances
                .iter()
                .map(|r| u128::from(r.pool_amount))
                .sum(),
            total_unclaimed: state.holders.values().map(|h| u128::from(h.unclaimed)).sum(),
            total_claimed: state.holders.values().map(|h| u128::from(h.claimed)).sum(),
            total_entitled: state
                .holders
                .values()
                .flat_map(|h| h.entitlements.iter())
                .map(|e| u128::from(e.amount))
                .sum(),
        })
    }

    /// Check the engine's conservation relations.
    pub fn audit(&self) -> Result<DividendAuditReport, DividendError> {
        Ok(DividendAuditor::audit(&self.totals()?))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;
    use tally_token::{BalanceSnapshot, InMemoryToken, TokenError, TokenReader, TokenWriter};
    use tally_types::ManualClock;

    use super::*;

    fn admin() -> AccountId {
        AccountId::named("admin")
    }

    fn alice() -> AccountId {
        AccountId::named("alice")
    }

    fn bob() -> AccountId {
        AccountId::named("bob")
    }

    struct Fixture {
        token: Arc<InMemoryToken>,
        clock: Arc<ManualClock>,
        dividends: DividendManager<Arc<InMemoryToken>>,
    }

    fn fixture(interval_secs: u64, min_amount: Amount) -> Fixture {
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(1_000)));
        let token = Arc::new(InMemoryToken::with_clock(admin(), clock.clone()));
        let dividends = DividendManager::new(
            token.clone(),
            DividendConfig::new(Duration::from_secs(interval_secs), min_amount),
            clock.clone(),
        )
        .unwrap();
        Fixture {
            token,
            clock,
            dividends,
        }
    }

    fn not_ready(result: Result<IssuanceRecord, DividendError>) -> NotReadyReason {
        match result {
            Err(DividendError::IssuanceNotReady(reason)) => reason,
            other => panic!("expected IssuanceNotReady, got {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let token = Arc::new(InMemoryToken::new(admin()));
        let config = DividendConfig::new(Duration::ZERO, 0);
        let result = DividendManager::with_system_clock(token, config);
        assert!(matches!(result, Err(DividendError::InvalidConfig(_))));
    }

    #[test]
    fn fresh_engine_is_empty() {
        let f = fixture(1, 1);
        assert_eq!(f.dividends.held_balance().unwrap(), 0);
        assert_eq!(f.dividends.unissued_balance().unwrap(), 0);
        assert_eq!(f.dividends.unclaimed_for(&alice()).unwrap(), 0);
        assert_eq!(f.dividends.claimed_for(&alice()).unwrap(), 0);
        assert_eq!(f.dividends.last_issued_at().unwrap(), None);
    }

    #[test]
    fn end_to_end_issue_and_claim() {
        let f = fixture(1, 1);
        f.token.mint(&admin(), &alice(), 750).unwrap();
        f.token.mint(&admin(), &bob(), 250).unwrap();

        f.dividends.deposit(&alice(), 10).unwrap();
        assert_eq!(f.dividends.unissued_balance().unwrap(), 10);
        assert_eq!(f.dividends.held_balance().unwrap(), 10);

        let record = f.dividends.issue_dividend().unwrap();
        assert_eq!(record.pool_amount, 10);
        assert_eq!(record.total_allocated, 9);
        assert_eq!(record.dust, 1);
        assert_eq!(record.total_supply, 1000);
        assert_eq!(record.holder_count, 2);

        assert_eq!(f.dividends.unclaimed_for(&alice()).unwrap(), 7);
        assert_eq!(f.dividends.unclaimed_for(&bob()).unwrap(), 2);
        assert_eq!(f.dividends.unissued_balance().unwrap(), 0);
        assert_eq!(f.dividends.undistributed_dust().unwrap(), 1);

        let receipt = f.dividends.claim_dividend(&alice()).unwrap();
        assert_eq!(receipt.amount, 7);
        assert_eq!(receipt.claimed_total, 7);
        assert_eq!(f.dividends.unclaimed_for(&alice()).unwrap(), 0);
        assert_eq!(f.dividends.claimed_for(&alice()).unwrap(), 7);
        assert_eq!(f.dividends.held_balance().unwrap(), 3);

        let entry = f.dividends.issued_for(&alice(), 0).unwrap();
        assert_eq!(entry.amount, 7);
        assert_eq!(entry.balance_at_snapshot, 750);

        assert!(matches!(
            not_ready(f.dividends.issue_dividend()),
            NotReadyReason::BelowMinimumAmount { pool: 0, minimum: 1 }
        ));
        assert!(f.dividends.audit().unwrap().is_valid());
    }

    #[test]
    fn interval_gate_blocks_until_elapsed() {
        let f = fixture(60, 1);
        f.token.mint(&admin(), &alice(), 1).unwrap();

        f.dividends.deposit(&bob(), 5).unwrap();
        f.dividends.issue_dividend().unwrap();

        f.dividends.deposit(&bob(), 5).unwrap();
        f.clock.advance(Duration::from_secs(59));
        assert_eq!(
            not_ready(f.dividends.issue_dividend()),
            NotReadyReason::IntervalNotElapsed {
                elapsed: Duration::from_secs(59),
                required: Duration::from_secs(60),
            }
        );
        assert_eq!(f.dividends.unissued_balance().unwrap(), 5);

        f.clock.advance(Duration::from_secs(1));
        let record = f.dividends.issue_dividend().unwrap();
        assert_eq!(record.index, 1);
        assert_eq!(f.dividends.unclaimed_for(&alice()).unwrap(), 10);
        assert_eq!(f.dividends.last_issued_at().unwrap(), Some(Timestamp::from_secs(1_060)));
    }

    #[test]
    fn amount_gate_blocks_small_pools() {
        let f = fixture(0, 100);
        f.token.mint(&admin(), &alice(), 1).unwrap();
        f.dividends.deposit(&bob(), 99).unwrap();
        assert!(matches!(
            not_ready(f.dividends.issue_dividend()),
            NotReadyReason::BelowMinimumAmount { pool: 99, minimum: 100 }
        ));
        f.dividends.deposit(&bob(), 1).unwrap();
        assert!(f.dividends.issue_dividend().is_ok());
    }

    #[test]
    fn zero_supply_keeps_the_pool() {
        let f = fixture(0, 1);
        f.dividends.deposit(&bob(), 10).unwrap();
        assert_eq!(not_ready(f.dividends.issue_dividend()), NotReadyReason::NoSupply);
        assert_eq!(f.dividends.unissued_balance().unwrap(), 10);
        assert_eq!(f.dividends.issuance_count().unwrap(), 0);
    }

    #[test]
    fn claim_without_entitlement_fails() {
        let f = fixture(1, 1);
        assert_eq!(
            f.dividends.claim_dividend(&alice()).unwrap_err(),
            DividendError::NothingToClaim { account: alice() }
        );
    }

    #[test]
    fn second_claim_has_nothing_left() {
        let f = fixture(0, 1);
        f.token.mint(&admin(), &alice(), 1).unwrap();
        f.dividends.deposit(&bob(), 3).unwrap();
        f.dividends.issue_dividend().unwrap();

        f.dividends.claim_dividend(&alice()).unwrap();
        assert_eq!(f.dividends.claim_dividend(&alice()).unwrap_err().kind(), "nothing_to_claim");
        assert_eq!(f.dividends.claimed_for(&alice()).unwrap(), 3);
    }

    #[test]
    fn entitlements_accumulate_across_issuances() {
        let f = fixture(0, 1);
        f.token.mint(&admin(), &alice(), 1).unwrap();
        f.token.mint(&admin(), &bob(), 1).unwrap();

        f.dividends.deposit(&admin(), 4).unwrap();
        f.dividends.issue_dividend().unwrap();
        f.token.transfer(&bob(), &alice(), 1).unwrap();
        f.dividends.deposit(&admin(), 6).unwrap();
        f.dividends.issue_dividend().unwrap();

        assert_eq!(f.dividends.unclaimed_for(&alice()).unwrap(), 2 + 6);
        assert_eq!(f.dividends.unclaimed_for(&bob()).unwrap(), 2);
        assert_eq!(f.dividends.issued_count(&alice()).unwrap(), 2);
        assert_eq!(f.dividends.issued_count(&bob()).unwrap(), 1);
        assert_eq!(f.dividends.issued_for(&alice(), 1).unwrap().issuance, 1);
        assert_eq!(
            f.dividends.issued_for(&bob(), 1).unwrap_err(),
            DividendError::IndexOutOfRange {
                account: bob(),
                index: 1,
                len: 1
            }
        );
    }

    #[test]
    fn pledged_balances_still_earn_dividends() {
        let f = fixture(0, 1);
        f.token.mint(&admin(), &alice(), 50).unwrap();
        f.token.mint(&admin(), &bob(), 50).unwrap();
        f.token.submit_deposit(&bob(), &alice(), 50).unwrap();

        f.dividends.deposit(&admin(), 100).unwrap();
        f.dividends.issue_dividend().unwrap();
        assert_eq!(f.dividends.unclaimed_for(&bob()).unwrap(), 50);
    }

    #[test]
    fn zero_deposit_is_rejected() {
        let f = fixture(0, 1);
        assert_eq!(f.dividends.deposit(&bob(), 0).unwrap_err(), DividendError::InvalidAmount);
    }

    struct Skewed;

    impl BalanceSource for Skewed {
        fn balance_snapshot(&self) -> Result<BalanceSnapshot, TokenError> {
            Ok(BalanceSnapshot {
                total_supply: 2,
                holders: vec![(alice(), 2), (bob(), 2)],
            })
        }
    }

    #[test]
    fn over_allocating_snapshot_aborts_issuance() {
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(1)));
        let dividends = DividendManager::new(Skewed, DividendConfig::default(), clock).unwrap();
        dividends.deposit(&admin(), 10).unwrap();

        assert_eq!(
            dividends.issue_dividend().unwrap_err(),
            DividendError::InconsistentSnapshot {
                pool: 10,
                allocated: 20
            }
        );
        assert_eq!(dividends.unissued_balance().unwrap(), 10);
        assert_eq!(dividends.unclaimed_for(&alice()).unwrap(), 0);
        assert_eq!(dividends.issuance_count().unwrap(), 0);
        assert_eq!(dividends.last_issued_at().unwrap(), None);
        assert!(dividends.audit().unwrap().is_valid());
    }

    #[test]
    fn issuance_records_are_kept_in_order() {
        let f = fixture(30, 2);
        assert_eq!(f.dividends.config().min_issuance_amount, 2);
        assert_eq!(f.dividends.config().min_issuance_interval(), Duration::from_secs(30));
        f.token.mint(&admin(), &alice(), 2).unwrap();
        f.token.mint(&admin(), &bob(), 1).unwrap();

        f.dividends.deposit(&bob(), 10).unwrap();
        let first = f.dividends.issue_dividend().unwrap();
        f.clock.advance(Duration::from_secs(30));
        f.dividends.deposit(&bob(), 4).unwrap();
        let second = f.dividends.issue_dividend().unwrap();

        assert_eq!(f.dividends.issuance(0).unwrap(), Some(first.clone()));
        assert_eq!(f.dividends.issuance(1).unwrap(), Some(second.clone()));
        assert_eq!(f.dividends.issuance(2).unwrap(), None);
        assert_eq!(first.issued_at, Timestamp::from_secs(1_000));
        assert_eq!(second.issued_at, Timestamp::from_secs(1_030));
        assert_eq!((first.total_allocated, first.dust), (9, 1));
        assert_eq!((second.total_allocated, second.dust), (3, 1));
        assert_eq!(f.dividends.undistributed_dust().unwrap(), 2);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Mint(usize, Amount),
        Transfer(usize, usize, Amount),
        Pledge(usize, usize, Amount),
        Deposit(Amount),
        Advance(u64),
        Issue,
        Claim(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..4usize, 0..500u64).prop_map(|(a, n)| Op::Mint(a, n)),
            (0..4usize, 0..4usize, 0..500u64).prop_map(|(a, b, n)| Op::Transfer(a, b, n)),
            (0..4usize, 0..4usize, 0..200u64).prop_map(|(a, b, n)| Op::Pledge(a, b, n)),
            (0..1_000u64).prop_map(Op::Deposit),
            (0..20u64).prop_map(Op::Advance),
            Just(Op::Issue),
            (0..4usize).prop_map(Op::Claim),
        ]
    }

    proptest! {
        #[test]
        fn books_balance_across_mixed_sequences(ops in prop::collection::vec(op(), 1..80)) {
            let f = fixture(10, 5);
            let accounts: Vec<AccountId> =
                (0..4).map(|i| AccountId::named(&format!("acct-{i}"))).collect();

            for op in ops {
                let pool_before = f.dividends.unissued_balance().unwrap();
                let dust_before = f.dividends.undistributed_dust().unwrap();
                let unclaimed_before: Vec<Amount> = accounts
                    .iter()
                    .map(|a| f.dividends.unclaimed_for(a).unwrap())
                    .collect();
                let claimed_before: Vec<Amount> = accounts
                    .iter()
                    .map(|a| f.dividends.claimed_for(a).unwrap())
                    .collect();

                match op {
                    Op::Mint(a, n) => {
                        let _ = f.token.mint(&admin(), &accounts[a], n);
                    }
                    Op::Transfer(a, b, n) => {
                        let _ = f.token.transfer(&accounts[a], &accounts[b], n);
                    }
                    Op::Pledge(a, b, n) => {
                        let _ = f.token.submit_deposit(&accounts[a], &accounts[b], n);
                    }
                    Op::Deposit(n) => {
                        let _ = f.dividends.deposit(&admin(), n);
                    }
                    Op::Advance(secs) => {
                        f.clock.advance(Duration::from_secs(secs));
                    }
                    Op::Issue => match f.dividends.issue_dividend() {
                        Ok(record) => {
                            let handed_out: Amount = accounts
                                .iter()
                                .zip(&unclaimed_before)
                                .map(|(a, before)| {
                                    f.dividends.unclaimed_for(a).unwrap() - before
                                })
                                .sum();
                            prop_assert_eq!(record.pool_amount, pool_before);
                            prop_assert_eq!(handed_out, record.total_allocated);
                            prop_assert_eq!(handed_out + record.dust, pool_before);
                            prop_assert_eq!(
                                f.dividends.undistributed_dust().unwrap(),
                                dust_before + record.dust
                            );
                            prop_assert_eq!(f.dividends.unissued_balance().unwrap(), 0);
                        }
                        Err(e) => {
                            prop_assert_eq!(e.kind(), "issuance_not_ready");
                            prop_assert_eq!(f.dividends.unissued_balance().unwrap(), pool_before);
                        }
                    },
                    Op::Claim(a) => match f.dividends.claim_dividend(&accounts[a]) {
                        Ok(receipt) => {
                            prop_assert_eq!(receipt.amount, unclaimed_before[a]);
                            prop_assert_eq!(
                                f.dividends.claimed_for(&accounts[a]).unwrap(),
                                claimed_before[a] + unclaimed_before[a]
                            );
                            prop_assert_eq!(f.dividends.unclaimed_for(&accounts[a]).unwrap(), 0);
                        }
                        Err(e) => {
                            prop_assert_eq!(unclaimed_before[a], 0);
                            prop_assert_eq!(e.kind(), "nothing_to_claim");
                        }
                    },
                }

                let supply: Amount = accounts
                    .iter()
                    .map(|a| f.token.balance_of(a).unwrap())
                    .sum();
                prop_assert_eq!(supply, f.token.total_supply().unwrap());
                prop_assert!(f.dividends.audit().unwrap().is_valid());
            }
        }

        #[test]
        fn issuance_allocates_pool_exactly_once(
            balances in prop::collection::vec(1u64..1_000_000, 1..12),
            pool in 1u64..10_000_000,
        ) {
            let f = fixture(0, 1);
            let accounts: Vec<AccountId> =
                (0..balances.len()).map(|i| AccountId::named(&format!("holder-{i}"))).collect();
            for (account, balance) in accounts.iter().zip(&balances) {
                f.token.mint(&admin(), account, *balance).unwrap();
            }
            f.dividends.deposit(&admin(), pool).unwrap();

            let record = f.dividends.issue_dividend().unwrap();
            let entitled: Amount = accounts
                .iter()
                .map(|a| f.dividends.unclaimed_for(a).unwrap())
                .sum();

            prop_assert_eq!(entitled, record.total_allocated);
            prop_assert_eq!(entitled + record.dust, pool);
            prop_assert!(record.dust < balances.len() as u64);
            prop_assert_eq!(f.dividends.unissued_balance().unwrap(), 0);

            for account in &accounts {
                let before = f.dividends.unclaimed_for(account).unwrap();
                if before > 0 {
                    let receipt = f.dividends.claim_dividend(account).unwrap();
                    prop_assert_eq!(receipt.amount, before);
                    prop_assert_eq!(f.dividends.claimed_for(account).unwrap(), before);
                    prop_assert_eq!(f.dividends.unclaimed_for(account).unwrap(), 0);
                }
            }
            prop_assert_eq!(f.dividends.held_balance().unwrap(), record.dust);
            prop_assert!(f.dividends.audit().unwrap().is_valid());
        }
    }
}
