use tally_types::{AccountId, Amount};

use crate::error::TokenError;
use crate::traits::TokenReader;

/// Result of a supply audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupplyReport {
    pub total_supply: Amount,
    pub sum_of_balances: Amount,
    pub holder_count: usize,
    pub violations: Vec<Violation>,
}

impl SupplyReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific accounting violation detected during an audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub account: Option<AccountId>,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// Σ balances differs from the recorded supply.
    SupplyMismatch,
    /// Submitted pledges lock more than the account holds.
    PledgesExceedBalance,
    /// free balance + pledged amount differs from total balance.
    FreeBalanceMismatch,
}

/// Conservation checker over any [`TokenReader`].
pub struct SupplyAuditor;

impl SupplyAuditor {
    /// Check supply conservation and the free-balance relation for every holder.
    pub fn audit<R: TokenReader + ?Sized>(reader: &R) -> Result<SupplyReport, TokenError> {
        let total_supply = reader.total_supply()?;
        let holders = reader.holders()?;
        let mut violations = Vec::new();
        let mut sum_of_balances: u128 = 0;

        for (account, balance) in &holders {
            sum_of_balances += u128::from(*balance);

            let pledged = reader.total_deposits(account)?;
            let free = reader.free_balance_of(account)?;

            if pledged > *balance {
                violations.push(Violation {
                    account: Some(account.clone()),
                    kind: ViolationKind::PledgesExceedBalance,
                    description: format!("pledged {pledged} exceeds balance {balance}"),
                });
            }

            if u128::from(free) + u128::from(pledged) != u128::from(*balance) {
                violations.push(Violation {
                    account: Some(account.clone()),
                    kind: ViolationKind::FreeBalanceMismatch,
                    description: format!(
                        "free {free} + pledged {pledged} != balance {balance}"
                    ),
                });
            }
        }

        if sum_of_balances != u128::from(total_supply) {
            violations.push(Violation {
                account: None,
                kind: ViolationKind::SupplyMismatch,
                description: format!(
                    "sum of balances {sum_of_balances} != total supply {total_supply}"
                ),
            });
        }

        Ok(SupplyReport {
            total_supply,
            sum_of_balances: Amount::try_from(sum_of_balances).unwrap_or(Amount::MAX),
            holder_count: holders.len(),
            violations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryToken;
    use crate::records::Pledge;
    use crate::traits::TokenWriter;

    fn admin() -> AccountId {
        AccountId::named("admin")
    }

    #[test]
    fn empty_ledger_is_valid() {
        let token = InMemoryToken::new(admin());
        let report = SupplyAuditor::audit(&token).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.holder_count, 0);
        assert_eq!(report.total_supply, 0);
    }

    #[test]
    fn ledger_with_pledges_is_valid() {
        let token = InMemoryToken::new(admin());
        let a = AccountId::named("a");
        let b = AccountId::named("b");
        token.mint(&admin(), &a, 700).unwrap();
        token.mint(&admin(), &b, 300).unwrap();
        token.submit_deposit(&a, &b, 200).unwrap();
        token.transfer(&b, &a, 100).unwrap();
        token.forfeit_deposit(&admin(), &a, 0).unwrap();

        let report = SupplyAuditor::audit(&token).unwrap();
        assert!(report.is_valid(), "{:?}", report.violations);
        assert_eq!(report.sum_of_balances, 1000);
        assert_eq!(report.holder_count, 2);
    }

    /// Reader that reports a supply its balances do not add up to.
    struct Skewed;

    impl TokenReader for Skewed {
        fn administrator(&self) -> &AccountId {
            unimplemented!()
        }
        fn total_supply(&self) -> Result<Amount, TokenError> {
            Ok(10)
        }
        fn balance_of(&self, _: &AccountId) -> Result<Amount, TokenError> {
            Ok(4)
        }
        fn free_balance_of(&self, _: &AccountId) -> Result<Amount, TokenError> {
            Ok(4)
        }
        fn get_deposit(&self, account: &AccountId, index: usize) -> Result<Pledge, TokenError> {
            Err(TokenError::IndexOutOfRange {
                account: account.clone(),
                index,
                len: 0,
            })
        }
        fn deposit_count(&self, _: &AccountId) -> Result<usize, TokenError> {
            Ok(0)
        }
        fn total_deposits(&self, _: &AccountId) -> Result<Amount, TokenError> {
            Ok(1)
        }
        fn holders(&self) -> Result<Vec<(AccountId, Amount)>, TokenError> {
            Ok(vec![(AccountId::named("x"), 4)])
        }
    }

    #[test]
    fn detects_supply_and_free_balance_mismatch() {
        let report = SupplyAuditor::audit(&Skewed).unwrap();
        let kinds: Vec<_> = report.violations.iter().map(|v| v.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![ViolationKind::FreeBalanceMismatch, ViolationKind::SupplyMismatch]
        );
    }
}
