use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tally_dividend::{DividendConfig, DividendError, DividendManager, IssuanceRecord};
use tally_token::{InMemoryToken, SupplyAuditor, TokenError, TokenReader, TokenWriter};
use tally_types::{AccountId, Amount, ManualClock, Timestamp};
use tracing::debug;

/// A scripted sequence of ledger and dividend operations.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default = "default_administrator")]
    pub administrator: String,
    /// Clock reading, in unix seconds, before the first step.
    #[serde(default)]
    pub start_time: u64,
    #[serde(default)]
    pub dividend: DividendConfig,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

fn default_administrator() -> String {
    "admin".into()
}

#[derive(Debug, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,
    /// Error kind the step must fail with, e.g. `"insufficient_free_balance"`.
    #[serde(default)]
    pub expect_error: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    Mint {
        account: String,
        amount: Amount,
        /// Defaults to the administrator.
        #[serde(default)]
        caller: Option<String>,
    },
    Burn {
        account: String,
        amount: Amount,
    },
    Transfer {
        from: String,
        to: String,
        amount: Amount,
    },
    Pledge {
        pledgor: String,
        beneficiary: String,
        amount: Amount,
    },
    Release {
        caller: String,
        pledgor: String,
        index: usize,
    },
    Forfeit {
        pledgor: String,
        index: usize,
        #[serde(default)]
        caller: Option<String>,
    },
    Deposit {
        from: String,
        amount: Amount,
    },
    Advance {
        secs: u64,
    },
    Issue,
    Claim {
        account: String,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Burn { .. } => "burn",
            Self::Transfer { .. } => "transfer",
            Self::Pledge { .. } => "pledge",
            Self::Release { .. } => "release",
            Self::Forfeit { .. } => "forfeit",
            Self::Deposit { .. } => "deposit",
            Self::Advance { .. } => "advance",
            Self::Issue => "issue",
            Self::Claim { .. } => "claim",
        }
    }
}

impl Scenario {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let scenario: Self = toml::from_str(input)?;
        scenario.dividend.validate()?;
        Ok(scenario)
    }

    /// Replay every step against fresh engines.
    pub fn run(&self) -> anyhow::Result<RunReport> {
        let mut runner = Runner::new(self)?;
        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| runner.step(index, step))
            .collect();
        runner.report(steps)
    }
}

#[derive(Debug)]
enum StepError {
    Token(TokenError),
    Dividend(DividendError),
}

impl StepError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Token(e) => e.kind(),
            Self::Dividend(e) => e.kind(),
        }
    }
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(e) => write!(f, "{e}"),
            Self::Dividend(e) => write!(f, "{e}"),
        }
    }
}

impl From<TokenError> for StepError {
    fn from(e: TokenError) -> Self {
        Self::Token(e)
    }
}

impl From<DividendError> for StepError {
    fn from(e: DividendError) -> Self {
        Self::Dividend(e)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: &'static str,
    pub detail: String,
    pub error_kind: Option<String>,
    pub expected_error: Option<String>,
    pub passed: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct AccountRow {
    pub name: String,
    pub account: String,
    pub balance: Amount,
    pub free: Amount,
    pub pledged: Amount,
    pub unclaimed: Amount,
    pub claimed: Amount,
}

#[derive(Clone, Debug, Serialize)]
pub struct PoolRow {
    pub total_supply: Amount,
    pub held: Amount,
    pub unissued: Amount,
    pub dust: Amount,
    pub issuances: usize,
    pub min_issuance_interval_secs: u64,
    pub min_issuance_amount: Amount,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepOutcome>,
    pub accounts: Vec<AccountRow>,
    pub pool: PoolRow,
    pub issuances: Vec<IssuanceRecord>,
    pub violations: Vec<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.violations.is_empty() && self.steps.iter().all(|s| s.passed)
    }
}

struct Runner {
    administrator: AccountId,
    names: BTreeMap<AccountId, String>,
    clock: Arc<ManualClock>,
    token: Arc<InMemoryToken>,
    dividends: DividendManager<Arc<InMemoryToken>>,
}

impl Runner {
    fn new(scenario: &Scenario) -> anyhow::Result<Self> {
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(scenario.start_time)));
        let administrator = AccountId::named(&scenario.administrator);
        let token = Arc::new(InMemoryToken::with_clock(administrator.clone(), clock.clone()));
        let dividends =
            DividendManager::new(token.clone(), scenario.dividend.clone(), clock.clone())?;

        let mut names = BTreeMap::new();
        names.insert(administrator.clone(), scenario.administrator.clone());
        Ok(Self {
            administrator,
            names,
            clock,
            token,
            dividends,
        })
    }

    fn account(&mut self, name: &str) -> AccountId {
        let id = AccountId::named(name);
        self.names.entry(id.clone()).or_insert_with(|| name.to_string());
        id
    }

    fn caller_or_admin(&mut self, caller: &Option<String>) -> AccountId {
        match caller {
            Some(name) => self.account(name),
            None => self.administrator.clone(),
        }
    }

    fn step(&mut self, index: usize, step: &Step) -> StepOutcome {
        let result = self.apply(&step.action);
        let (detail, error_kind) = match &result {
            Ok(detail) => (detail.clone(), None),
            Err(e) => (e.to_string(), Some(e.kind().to_string())),
        };
        let passed = error_kind == step.expect_error;
        debug!(index, op = step.action.name(), passed, %detail, "scenario step");

        StepOutcome {
            index,
            op: step.action.name(),
            detail,
            error_kind,
            expected_error: step.expect_error.clone(),
            passed,
        }
    }

    fn apply(&mut self, action: &Action) -> Result<String, StepError> {
        match action {
            Action::Mint {
                account,
                amount,
                caller,
            } => {
                let caller = self.caller_or_admin(caller);
                let to = self.account(account);
                self.token.mint(&caller, &to, *amount)?;
                Ok(format!("minted {amount} to {account}"))
            }
            Action::Burn { account, amount } => {
                let who = self.account(account);
                self.token.burn(&who, *amount)?;
                Ok(format!("{account} burned {amount}"))
            }
            Action::Transfer { from, to, amount } => {
                let sender = self.account(from);
                let recipient = self.account(to);
                self.token.transfer(&sender, &recipient, *amount)?;
                Ok(format!("{from} sent {amount} to {to}"))
            }
            Action::Pledge {
                pledgor,
                beneficiary,
                amount,
            } => {
                let from = self.account(pledgor);
                let to = self.account(beneficiary);
                let pledge = self.token.submit_deposit(&from, &to, *amount)?;
                Ok(format!(
                    "{pledgor} pledged {amount} to {beneficiary} (deposit #{})",
                    pledge.index
                ))
            }
            Action::Release {
                caller,
                pledgor,
                index,
            } => {
                let caller = self.account(caller);
                let owner = self.account(pledgor);
                let pledge = self.token.release_deposit(&caller, &owner, *index)?;
                Ok(format!("released {} from {pledgor} deposit #{index}", pledge.amount))
            }
            Action::Forfeit {
                pledgor,
                index,
                caller,
            } => {
                let caller = self.caller_or_admin(caller);
                let owner = self.account(pledgor);
                let pledge = self.token.forfeit_deposit(&caller, &owner, *index)?;
                let beneficiary = self
                    .names
                    .get(&pledge.beneficiary)
                    .cloned()
                    .unwrap_or_else(|| pledge.beneficiary.short_id());
                Ok(format!(
                    "forfeited {} from {pledgor} to {beneficiary}",
                    pledge.amount
                ))
            }
            Action::Deposit { from, amount } => {
                let sender = self.account(from);
                let pool = self.dividends.deposit(&sender, *amount)?;
                Ok(format!("{from} deposited {amount}; pool is {pool}"))
            }
            Action::Advance { secs } => {
                let now = self.clock.advance(Duration::from_secs(*secs));
                Ok(format!("clock advanced to {now}"))
            }
            Action::Issue => {
                let record = self.dividends.issue_dividend()?;
                Ok(format!(
                    "issuance #{} allocated {} of {} (dust {})",
                    record.index, record.total_allocated, record.pool_amount, record.dust
                ))
            }
            Action::Claim { account } => {
                let holder = self.account(account);
                let receipt = self.dividends.claim_dividend(&holder)?;
                Ok(format!("{account} claimed {}", receipt.amount))
            }
        }
    }

    fn report(&self, steps: Vec<StepOutcome>) -> anyhow::Result<RunReport> {
        let mut accounts = Vec::with_capacity(self.names.len());
        for (id, name) in &self.names {
            accounts.push(AccountRow {
                name: name.clone(),
                account: id.short_id(),
                balance: self.token.balance_of(id)?,
                free: self.token.free_balance_of(id)?,
                pledged: self.token.total_deposits(id)?,
                unclaimed: self.dividends.unclaimed_for(id)?,
                claimed: self.dividends.claimed_for(id)?,
            });
        }
        accounts.sort_by(|a, b| a.name.cmp(&b.name));

        let config = self.dividends.config();
        let pool = PoolRow {
            total_supply: self.token.total_supply()?,
            held: self.dividends.held_balance()?,
            unissued: self.dividends.unissued_balance()?,
            dust: self.dividends.undistributed_dust()?,
            issuances: self.dividends.issuance_count()?,
            min_issuance_interval_secs: config.min_issuance_interval_secs,
            min_issuance_amount: config.min_issuance_amount,
        };

        let mut issuances = Vec::with_capacity(pool.issuances);
        for index in 0..pool.issuances {
            if let Some(record) = self.dividends.issuance(index)? {
                issuances.push(record);
            }
        }

        let mut violations: Vec<String> = SupplyAuditor::audit(self.token.as_ref())?
            .violations
            .into_iter()
            .map(|v| v.description)
            .collect();
        violations.extend(
            self.dividends
                .audit()?
                .violations
                .into_iter()
                .map(|v| v.description),
        );

        Ok(RunReport {
            steps,
            accounts,
            pool,
            issuances,
            violations,
        })
    }
}
