//! Player ledger tests
//!
//! Critical behaviors:
//! - Bankruptcy raised exactly once when crossing the fixed threshold
//! - Scoped reputation with 20% bleed into global
//! - Exponential leveling with multi-level jumps
//! - Amortized daily loan payments and retirement

use freight_simulator_core_rs::models::notification::{Notification, NotificationLog};
use freight_simulator_core_rs::player::BANKRUPTCY_THRESHOLD;
use freight_simulator_core_rs::{PlayerLedger, ReputationScope};

#[test]
fn test_bankruptcy_scenario() {
    // Balance 50000, adjustment −120000 ⇒ −70000 < −50000 ⇒ bankruptcy,
    // raised exactly once
    let mut ledger = PlayerLedger::new(50_000);
    let mut log = NotificationLog::new();

    ledger.adjust_balance(-120_000, "catastrophic loss", 10.0, &mut log);
    assert_eq!(ledger.balance(), -70_000);
    assert!(ledger.is_bankrupt());

    ledger.adjust_balance(-5_000, "further loss", 11.0, &mut log);
    ledger.adjust_balance(200_000, "bailout", 12.0, &mut log);
    ledger.adjust_balance(-300_000, "relapse", 13.0, &mut log);

    let bankruptcies = log
        .entries()
        .iter()
        .filter(|n| matches!(n, Notification::Bankruptcy { .. }))
        .count();
    assert_eq!(bankruptcies, 1, "bankruptcy must be raised exactly once");
}

#[test]
fn test_threshold_is_strictly_below() {
    let mut ledger = PlayerLedger::new(0);
    let mut log = NotificationLog::new();
    ledger.adjust_balance(BANKRUPTCY_THRESHOLD, "to the line", 1.0, &mut log);
    assert!(!ledger.is_bankrupt());
    ledger.adjust_balance(-1, "over the line", 2.0, &mut log);
    assert!(ledger.is_bankrupt());
}

#[test]
fn test_every_adjustment_appends_a_record() {
    let mut ledger = PlayerLedger::new(10_000);
    let mut log = NotificationLog::new();

    ledger.adjust_balance(-3_000, "maintenance", 1.0, &mut log);
    ledger.adjust_balance(8_000, "payout", 2.0, &mut log);

    let records = ledger.transactions();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].balance_after, 7_000);
    assert_eq!(records[1].balance_after, 15_000);
    // Record ids are unique
    assert_ne!(records[0].id, records[1].id);
}

#[test]
fn test_reputation_scopes_and_bleed() {
    let mut ledger = PlayerLedger::new(0);
    let mut log = NotificationLog::new();

    ledger.adjust_reputation(ReputationScope::Legal, -20.0, 1.0, &mut log);
    assert_eq!(ledger.reputation().legal, 30.0);
    assert_eq!(ledger.reputation().global, 46.0); // 50 − 20×0.2

    ledger.adjust_reputation(ReputationScope::Customer, 15.0, 2.0, &mut log);
    assert_eq!(ledger.reputation().customer, 65.0);
    assert_eq!(ledger.reputation().global, 49.0); // 46 + 15×0.2

    // Global-scope adjustments do not bleed anywhere
    ledger.adjust_reputation(ReputationScope::Global, 10.0, 3.0, &mut log);
    assert_eq!(ledger.reputation().global, 59.0);
    assert_eq!(ledger.reputation().legal, 30.0);
    assert_eq!(ledger.reputation().customer, 65.0);
}

#[test]
fn test_xp_curve_and_multi_level_jump() {
    assert_eq!(PlayerLedger::xp_for_next_level(1), 1000);
    assert_eq!(PlayerLedger::xp_for_next_level(2), 1500);
    assert_eq!(PlayerLedger::xp_for_next_level(3), 2250);

    let mut ledger = PlayerLedger::new(0);
    let mut log = NotificationLog::new();

    // 1000 + 1500 + 2250 = 4750 jumps three levels at once
    let gained = ledger.award_experience(4750, 1.0, &mut log);
    assert_eq!(gained, 3);
    assert_eq!(ledger.level(), 4);
    assert_eq!(ledger.experience(), 0);

    let level_ups = log
        .entries()
        .iter()
        .filter(|n| matches!(n, Notification::LevelUp { .. }))
        .count();
    assert_eq!(level_ups, 3);

    // Unlock table grants every level's features along the way
    assert!(ledger.has_feature("lane_upgrades"));
    assert!(ledger.has_feature("carrier_negotiation"));
    assert!(ledger.has_feature("loans"));
    assert!(!ledger.has_feature("premium_contracts"));
}

#[test]
fn test_loan_lifecycle() {
    let mut ledger = PlayerLedger::new(0);
    let mut log = NotificationLog::new();

    // 20000 at 20% over 20 days ⇒ owed 24000, payment 1200/day
    ledger.take_loan(20_000, 0.2, 20, 0.0, &mut log).unwrap();
    assert_eq!(ledger.balance(), 20_000);
    assert_eq!(ledger.total_debt(), 24_000);
    assert_eq!(ledger.loans()[0].daily_payment, 1_200);

    for day in 1..=19 {
        ledger.process_daily_update(day as f64 * 600.0, &mut log);
    }
    assert_eq!(ledger.loans().len(), 1);
    assert_eq!(ledger.total_debt(), 24_000 - 19 * 1_200);

    ledger.process_daily_update(20.0 * 600.0, &mut log);
    assert!(ledger.loans().is_empty(), "loan retired after the full term");
    assert_eq!(ledger.total_debt(), 0);
    assert_eq!(ledger.balance(), 20_000 - 24_000);
}

#[test]
fn test_net_worth_accounts_for_debt_and_assets() {
    let mut ledger = PlayerLedger::new(100_000);
    let mut log = NotificationLog::new();
    ledger.take_loan(50_000, 0.1, 30, 0.0, &mut log).unwrap();

    // balance 150000 + assets 70000 + profit 20000 − debt 55000
    let net_worth = ledger.recompute_net_worth(70_000, 20_000);
    assert_eq!(net_worth, 185_000);
    assert_eq!(ledger.net_worth(), 185_000);
}

#[test]
fn test_snapshot_round_trip_preserves_everything() {
    let mut ledger = PlayerLedger::new(42_000);
    let mut log = NotificationLog::new();
    ledger.adjust_balance(-2_000, "setup", 1.0, &mut log);
    ledger.adjust_reputation(ReputationScope::Carrier, 12.0, 2.0, &mut log);
    ledger.award_experience(1_700, 3.0, &mut log);
    ledger.take_loan(9_000, 0.15, 12, 4.0, &mut log).unwrap();

    let restored = PlayerLedger::from_snapshot(ledger.to_snapshot());

    assert_eq!(restored.balance(), ledger.balance());
    assert_eq!(restored.reputation(), ledger.reputation());
    assert_eq!(restored.level(), ledger.level());
    assert_eq!(restored.experience(), ledger.experience());
    assert_eq!(restored.unlocked_features(), ledger.unlocked_features());
    assert_eq!(restored.loans(), ledger.loans());
    assert_eq!(restored.transactions(), ledger.transactions());
    assert_eq!(restored.is_bankrupt(), ledger.is_bankrupt());
}
