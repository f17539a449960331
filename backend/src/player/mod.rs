//! Player ledger: balance, reputation, experience, and loans.
//!
//! Every balance change appends an immutable transaction record and
//! recomputes net worth. The bankruptcy condition is raised exactly once,
//! when the balance first drops below the fixed threshold. Reputation is
//! tracked per scope; non-global adjustments bleed 20% into the global
//! score. Leveling supports multi-level jumps from one XP award.

use crate::models::notification::{Notification, NotificationLog};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Balance below this raises the bankruptcy condition.
pub const BANKRUPTCY_THRESHOLD: i64 = -50_000;

/// Fraction of a non-global reputation change applied to the global score.
const GLOBAL_REPUTATION_BLEED: f64 = 0.2;

/// Feature unlocks per level. Levels without an entry unlock nothing new.
const LEVEL_UNLOCKS: &[(u32, &str)] = &[
    (2, "lane_upgrades"),
    (3, "carrier_negotiation"),
    (4, "loans"),
    (5, "premium_contracts"),
    (7, "multi_region_routes"),
];

/// Ledger operation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Loan principal must be positive")]
    InvalidPrincipal,

    #[error("Loan term must be at least one day")]
    InvalidTerm,
}

/// Reputation scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReputationScope {
    Global,
    Customer,
    Carrier,
    Legal,
}

/// Per-scope reputation scores, each 0..100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reputation {
    pub global: f64,
    pub customer: f64,
    pub carrier: f64,
    pub legal: f64,
}

impl Default for Reputation {
    fn default() -> Self {
        Self {
            global: 50.0,
            customer: 50.0,
            carrier: 50.0,
            legal: 50.0,
        }
    }
}

impl Reputation {
    pub fn get(&self, scope: ReputationScope) -> f64 {
        match scope {
            ReputationScope::Global => self.global,
            ReputationScope::Customer => self.customer,
            ReputationScope::Carrier => self.carrier,
            ReputationScope::Legal => self.legal,
        }
    }
}

/// Immutable record of one balance change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub time: f64,
    pub delta: i64,
    pub balance_after: i64,
    pub reason: String,
}

/// An outstanding loan with fixed daily amortized payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub principal: i64,
    /// Total interest rate over the loan's life (0.1 = 10%)
    pub rate: f64,
    pub term_days: u32,
    /// Fixed payment: principal × (1 + rate) / term
    pub daily_payment: i64,
    /// Amount still owed
    pub remaining: i64,
    pub days_remaining: u32,
}

/// The player's financial and progression state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerLedger {
    balance: i64,
    transactions: Vec<TransactionRecord>,
    reputation: Reputation,
    /// Residual XP toward the next level
    experience: u64,
    level: u32,
    unlocked_features: Vec<String>,
    loans: Vec<Loan>,
    net_worth: i64,
    bankrupt: bool,
    next_loan_id: u64,
}

impl PlayerLedger {
    pub fn new(starting_balance: i64) -> Self {
        Self {
            balance: starting_balance,
            transactions: Vec::new(),
            reputation: Reputation::default(),
            experience: 0,
            level: 1,
            unlocked_features: Vec::new(),
            loans: Vec::new(),
            net_worth: starting_balance,
            bankrupt: false,
            next_loan_id: 1,
        }
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    pub fn reputation(&self) -> &Reputation {
        &self.reputation
    }

    pub fn experience(&self) -> u64 {
        self.experience
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn unlocked_features(&self) -> &[String] {
        &self.unlocked_features
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.unlocked_features.iter().any(|f| f == feature)
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn total_debt(&self) -> i64 {
        self.loans.iter().map(|l| l.remaining).sum()
    }

    pub fn net_worth(&self) -> i64 {
        self.net_worth
    }

    pub fn is_bankrupt(&self) -> bool {
        self.bankrupt
    }

    /// XP required to advance from `level` to `level + 1`:
    /// 1000 × 1.5^(level − 1).
    pub fn xp_for_next_level(level: u32) -> u64 {
        (1000.0 * 1.5f64.powi(level as i32 - 1)).round() as u64
    }

    // ========================================================================
    // Balance
    // ========================================================================

    /// Apply a balance delta, append the transaction record, and raise the
    /// bankruptcy condition (once) if the balance fell below the threshold.
    ///
    /// Returns the new balance.
    pub fn adjust_balance(
        &mut self,
        delta: i64,
        reason: &str,
        time: f64,
        log: &mut NotificationLog,
    ) -> i64 {
        self.balance += delta;
        self.transactions.push(TransactionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            time,
            delta,
            balance_after: self.balance,
            reason: reason.to_string(),
        });

        log.push(Notification::BalanceChanged {
            time,
            delta,
            balance: self.balance,
            reason: reason.to_string(),
        });

        if self.balance < BANKRUPTCY_THRESHOLD && !self.bankrupt {
            self.bankrupt = true;
            log.push(Notification::Bankruptcy {
                time,
                balance: self.balance,
            });
        }

        self.balance
    }

    /// Can the player afford `amount` right now?
    pub fn can_afford(&self, amount: i64) -> bool {
        self.balance >= amount
    }

    /// Recompute net worth from balance plus externally supplied components:
    /// discounted lane assets and expected contract profit, minus debt.
    pub fn recompute_net_worth(&mut self, lane_asset_value: i64, expected_contract_profit: i64) -> i64 {
        self.net_worth = self.balance + lane_asset_value + expected_contract_profit - self.total_debt();
        self.net_worth
    }

    // ========================================================================
    // Reputation
    // ========================================================================

    /// Adjust reputation in a scope, clamped to [0, 100]. Non-global scopes
    /// bleed 20% of the adjustment into the global score.
    pub fn adjust_reputation(
        &mut self,
        scope: ReputationScope,
        amount: f64,
        time: f64,
        log: &mut NotificationLog,
    ) {
        let slot = match scope {
            ReputationScope::Global => &mut self.reputation.global,
            ReputationScope::Customer => &mut self.reputation.customer,
            ReputationScope::Carrier => &mut self.reputation.carrier,
            ReputationScope::Legal => &mut self.reputation.legal,
        };
        *slot = (*slot + amount).clamp(0.0, 100.0);
        let new_value = *slot;

        log.push(Notification::ReputationChanged {
            time,
            scope,
            value: new_value,
        });

        if scope != ReputationScope::Global {
            self.reputation.global =
                (self.reputation.global + amount * GLOBAL_REPUTATION_BLEED).clamp(0.0, 100.0);
            log.push(Notification::ReputationChanged {
                time,
                scope: ReputationScope::Global,
                value: self.reputation.global,
            });
        }
    }

    // ========================================================================
    // Experience and leveling
    // ========================================================================

    /// Award XP. Supports multi-level jumps: the level-up check loops until
    /// the residual XP no longer covers the next threshold.
    ///
    /// Returns the number of levels gained.
    pub fn award_experience(&mut self, xp: u64, time: f64, log: &mut NotificationLog) -> u32 {
        self.experience += xp;

        let mut gained = 0;
        while self.experience >= Self::xp_for_next_level(self.level) {
            self.experience -= Self::xp_for_next_level(self.level);
            self.level += 1;
            gained += 1;

            for (level, feature) in LEVEL_UNLOCKS {
                if *level == self.level && !self.has_feature(feature) {
                    self.unlocked_features.push(feature.to_string());
                }
            }

            log.push(Notification::LevelUp {
                time,
                level: self.level,
            });
        }

        gained
    }

    // ========================================================================
    // Loans
    // ========================================================================

    /// Take a loan: the principal lands on the balance immediately, and a
    /// fixed daily payment of principal × (1 + rate) / term is charged by
    /// the daily update until retired.
    pub fn take_loan(
        &mut self,
        principal: i64,
        rate: f64,
        term_days: u32,
        time: f64,
        log: &mut NotificationLog,
    ) -> Result<String, LedgerError> {
        if principal <= 0 {
            return Err(LedgerError::InvalidPrincipal);
        }
        if term_days == 0 {
            return Err(LedgerError::InvalidTerm);
        }

        let id = format!("loan_{:04}", self.next_loan_id);
        self.next_loan_id += 1;

        let total_owed = (principal as f64 * (1.0 + rate.max(0.0))).round() as i64;
        let daily_payment = (total_owed as f64 / term_days as f64).ceil() as i64;

        self.loans.push(Loan {
            id: id.clone(),
            principal,
            rate: rate.max(0.0),
            term_days,
            daily_payment,
            remaining: total_owed,
            days_remaining: term_days,
        });

        self.adjust_balance(principal, &format!("loan disbursement {id}"), time, log);
        Ok(id)
    }

    /// Daily pass: deduct min(payment, remaining) for each loan and retire
    /// loans that hit zero remaining or zero days.
    pub fn process_daily_update(&mut self, time: f64, log: &mut NotificationLog) {
        let mut payments = Vec::new();
        for loan in &mut self.loans {
            let payment = loan.daily_payment.min(loan.remaining);
            loan.remaining -= payment;
            loan.days_remaining = loan.days_remaining.saturating_sub(1);
            if payment > 0 {
                payments.push((loan.id.clone(), payment));
            }
        }

        for (loan_id, payment) in payments {
            self.adjust_balance(-payment, &format!("loan payment {loan_id}"), time, log);
        }

        self.loans.retain(|l| l.remaining > 0 && l.days_remaining > 0);
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    pub fn to_snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            balance: self.balance,
            transactions: self.transactions.clone(),
            reputation: self.reputation,
            experience: self.experience,
            level: self.level,
            unlocked_features: self.unlocked_features.clone(),
            loans: self.loans.clone(),
            net_worth: self.net_worth,
            bankrupt: self.bankrupt,
            next_loan_id: self.next_loan_id,
        }
    }

    pub fn from_snapshot(snapshot: PlayerSnapshot) -> Self {
        Self {
            balance: snapshot.balance,
            transactions: snapshot.transactions,
            reputation: snapshot.reputation,
            experience: snapshot.experience,
            level: snapshot.level,
            unlocked_features: snapshot.unlocked_features,
            loans: snapshot.loans,
            net_worth: snapshot.net_worth,
            bankrupt: snapshot.bankrupt,
            next_loan_id: snapshot.next_loan_id,
        }
    }
}

/// Serialized player state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub balance: i64,
    pub transactions: Vec<TransactionRecord>,
    pub reputation: Reputation,
    pub experience: u64,
    pub level: u32,
    pub unlocked_features: Vec<String>,
    pub loans: Vec<Loan>,
    pub net_worth: i64,
    pub bankrupt: bool,
    pub next_loan_id: u64,
}
