use serde::{Deserialize, Serialize};
use tally_types::{AccountId, Amount, Timestamp};

/// One successful issuance event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceRecord {
    pub index: usize,
    pub issued_at: Timestamp,
    /// Pool size at the moment of issuance.
    pub pool_amount: Amount,
    /// Sum of entitlements handed out. `pool_amount - total_allocated == dust`.
    pub total_allocated: Amount,
    pub dust: Amount,
    /// Token supply used as the denominator of the split.
    pub total_supply: Amount,
    pub holder_count: usize,
}

/// A holder's share of one issuance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    /// Index of the [`IssuanceRecord`] this share came from.
    pub issuance: usize,
    pub amount: Amount,
    pub balance_at_snapshot: Amount,
    pub issued_at: Timestamp,
}

/// Proof of a completed claim; the payout leaves the engine with it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub account: AccountId,
    pub amount: Amount,
    pub claimed_at: Timestamp,
    /// The holder's claimed total after this claim.
    pub claimed_total: Amount,
}

