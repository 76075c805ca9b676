use serde::{Deserialize, Serialize};

/// Aggregate dividend figures, widened so sums cannot overflow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTotals {
    pub held: u128,
    pub unissued: u128,
    pub dust: u128,
    pub total_received: u128,
    /// Σ pool amounts over all issuances.
    pub total_issued: u128,
    pub total_unclaimed: u128,
    pub total_claimed: u128,
    /// Σ of every recorded entitlement.
    pub total_entitled: u128,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DividendAuditReport {
    pub totals: PoolTotals,
    pub violations: Vec<Violation>,
}

impl DividendAuditReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// held != unissued + unclaimed + dust
    CustodyMismatch,
    /// issued != unclaimed + claimed + dust
    AllocationMismatch,
    /// recorded entitlements != unclaimed + claimed
    EntitlementMismatch,
    /// received != issued + unissued
    ReceiptMismatch,
}

/// Checks the conservation relations of a dividend engine.
pub struct DividendAuditor;

impl DividendAuditor {
    pub fn audit(totals: &PoolTotals) -> DividendAuditReport {
        let mut violations = Vec::new();
        let t = totals;

        let custody = t.unissued + t.total_unclaimed + t.dust;
        if t.held != custody {
            violations.push(Violation {
                kind: ViolationKind::CustodyMismatch,
                description: format!(
                    "held {} != unissued {} + unclaimed {} + dust {}",
                    t.held, t.unissued, t.total_unclaimed, t.dust
                ),
            });
        }

        let allocated = t.total_unclaimed + t.total_claimed + t.dust;
        if t.total_issued != allocated {
            violations.push(Violation {
                kind: ViolationKind::AllocationMismatch,
                description: format!(
                    "issued {} != unclaimed {} + claimed {} + dust {}",
                    t.total_issued, t.total_unclaimed, t.total_claimed, t.dust
                ),
            });
        }

        if t.total_entitled != t.total_unclaimed + t.total_claimed {
            violations.push(Violation {
                kind: ViolationKind::EntitlementMismatch,
                description: format!(
                    "entitled {} != unclaimed {} + claimed {}",
                    t.total_entitled, t.total_unclaimed, t.total_claimed
                ),
            });
        }

        if t.total_received != t.total_issued + t.unissued {
            violations.push(Violation {
                kind: ViolationKind::ReceiptMismatch,
                description: format!(
                    "received {} != issued {} + unissued {}",
                    t.total_received, t.total_issued, t.unissued
                ),
            });
        }

        DividendAuditReport {
            totals: totals.clone(),
            violations,
        }
    }
}
