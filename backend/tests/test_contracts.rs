//! Customer contract tests
//!
//! Covers tier derivation, contract generation and pricing, the
//! accept-by-expiration boundary, trust feedback, and the live blacklist
//! invariant.

use freight_simulator_core_rs::models::notification::NotificationLog;
use freight_simulator_core_rs::{
    Commodity, ContractEngine, ContractStatus, Customer, CustomerTier, MarketEngine, RngManager,
};

fn steel_market() -> MarketEngine {
    let mut market = MarketEngine::new();
    market.add_commodity(Commodity::new("STEEL", "Steel", "raw_materials", 6000.0));
    market
}

fn engine_with(trust: f64) -> ContractEngine {
    let mut engine = ContractEngine::new();
    let mut customer = Customer::new("cust_001", "Meyer Logistics", trust);
    customer.set_need("STEEL", 1.0);
    engine.add_customer(customer);
    engine
}

#[test]
fn test_tier_multiplier_monotonic_over_trust() {
    let multipliers: Vec<f64> = [10.0, 40.0, 70.0, 90.0, 99.0]
        .iter()
        .map(|trust| CustomerTier::from_trust(*trust).value_multiplier())
        .collect();

    assert_eq!(multipliers, vec![0.8, 1.0, 1.2, 1.5, 1.5]);
    assert!(
        multipliers.windows(2).all(|w| w[0] <= w[1]),
        "tier multiplier must be non-decreasing in trust"
    );
}

#[test]
fn test_value_scales_with_tier() {
    let market = steel_market();
    let mut rng = RngManager::new(11);
    let mut log = NotificationLog::new();

    // Same RNG seed ⇒ same cargo draw and amount for both customers
    let mut basic = engine_with(20.0); // Basic, ×0.8
    let basic_id = basic
        .generate_contract("cust_001", &market, 0.0, &mut rng, &mut log)
        .unwrap();
    let basic_value = basic.contract(&basic_id).unwrap().value();
    let basic_amount = basic.contract(&basic_id).unwrap().amount();

    let mut rng = RngManager::new(11);
    let mut premium = engine_with(95.0); // Premium, ×1.5
    let premium_id = premium
        .generate_contract("cust_001", &market, 0.0, &mut rng, &mut log)
        .unwrap();
    let premium_value = premium.contract(&premium_id).unwrap().value();
    let premium_amount = premium.contract(&premium_id).unwrap().amount();

    assert_eq!(basic_amount, premium_amount);
    // 1.5/0.8 value ratio for the same load
    assert!((premium_value as f64 / basic_value as f64 - 1.5 / 0.8).abs() < 0.01);
}

#[test]
fn test_deadline_shrinks_with_tier_level() {
    let market = steel_market();
    let mut log = NotificationLog::new();

    let mut deadline_for = |trust: f64| {
        let mut engine = engine_with(trust);
        let mut rng = RngManager::new(3);
        let id = engine
            .generate_contract("cust_001", &market, 0.0, &mut rng, &mut log)
            .unwrap();
        engine.contract(&id).unwrap().deadline()
    };

    // deadline = 300 + 60×(3 − tier_level)
    assert_eq!(deadline_for(20.0), 480.0); // Basic, level 0
    assert_eq!(deadline_for(50.0), 420.0); // Standard, level 1
    assert_eq!(deadline_for(75.0), 360.0); // Preferred, level 2
    assert_eq!(deadline_for(95.0), 300.0); // Premium, level 3
}

#[test]
fn test_expired_offer_rejected_with_trust_penalty() {
    // Scenario: expiration 60s after start; acceptance at 61s is rejected,
    // the contract is auto-expired, and the customer loses 2 trust.
    let market = steel_market();
    let mut engine = engine_with(50.0);
    let mut rng = RngManager::new(42);
    let mut log = NotificationLog::new();

    let id = engine
        .generate_contract("cust_001", &market, 0.0, &mut rng, &mut log)
        .unwrap();
    assert_eq!(engine.contract(&id).unwrap().expiration_time(), 60.0);

    // The tick's expiration sweep runs before the player's accept lands
    engine.sweep_expired(61.0, &mut log);
    assert!(engine.accept_contract(&id, 61.0, &mut log).is_err());

    assert_eq!(engine.contract(&id).unwrap().status(), ContractStatus::Failed);
    assert_eq!(engine.customer("cust_001").unwrap().trust(), 48.0);
}

#[test]
fn test_accept_at_exact_expiration_succeeds() {
    let market = steel_market();
    let mut engine = engine_with(50.0);
    let mut rng = RngManager::new(42);
    let mut log = NotificationLog::new();

    let id = engine
        .generate_contract("cust_001", &market, 0.0, &mut rng, &mut log)
        .unwrap();
    assert!(engine.accept_contract(&id, 60.0, &mut log).is_ok());
    assert_eq!(engine.contract(&id).unwrap().status(), ContractStatus::Active);
}

#[test]
fn test_blacklist_recomputed_after_every_trust_mutation() {
    let market = steel_market();
    let mut engine = engine_with(13.0);
    let mut rng = RngManager::new(42);
    let mut log = NotificationLog::new();

    // Two expirations: 13 → 11 → 9 crosses the blacklist threshold
    for _ in 0..2 {
        let id = engine
            .generate_contract("cust_001", &market, 0.0, &mut rng, &mut log)
            .unwrap();
        let expiry = engine.contract(&id).unwrap().expiration_time();
        engine.sweep_expired(expiry + 1.0, &mut log);
    }

    let customer = engine.customer("cust_001").unwrap();
    assert_eq!(customer.trust(), 9.0);
    assert!(customer.is_blacklisted());

    // Blacklisted customers get no further contracts
    assert!(engine
        .generate_contract("cust_001", &market, 200.0, &mut rng, &mut log)
        .is_err());

    // Trust recovery un-blacklists (live recomputation, not sticky)
    engine.customer_mut("cust_001").unwrap().adjust_trust(5.0);
    assert!(!engine.customer("cust_001").unwrap().is_blacklisted());
}

#[test]
fn test_contract_cap_blocks_generation() {
    let market = steel_market();
    let mut engine = engine_with(50.0);
    let mut rng = RngManager::new(42);
    let mut log = NotificationLog::new();

    // Fill the cap with three accepted contracts
    for i in 0..3 {
        let id = engine
            .generate_contract("cust_001", &market, i as f64, &mut rng, &mut log)
            .unwrap();
        engine.accept_contract(&id, i as f64 + 1.0, &mut log).unwrap();
    }

    assert!(engine.customer("cust_001").unwrap().is_at_contract_cap());
    assert!(engine
        .generate_contract("cust_001", &market, 10.0, &mut rng, &mut log)
        .is_err());

    // Resolving one frees a slot
    let active_id = engine
        .active_contracts()
        .next()
        .unwrap()
        .id()
        .to_string();
    engine
        .complete_contract(&active_id, true, 20.0, &mut log)
        .unwrap();
    assert!(engine
        .generate_contract("cust_001", &market, 30.0, &mut rng, &mut log)
        .is_ok());
}

#[test]
fn test_upfront_and_penalty_fractions() {
    let market = steel_market();
    let mut engine = engine_with(50.0);
    let mut rng = RngManager::new(42);
    let mut log = NotificationLog::new();

    let id = engine
        .generate_contract("cust_001", &market, 0.0, &mut rng, &mut log)
        .unwrap();
    let contract = engine.contract(&id).unwrap();

    assert_eq!(contract.upfront_cost(), contract.value() / 10);
    assert_eq!(contract.penalty(), contract.value() / 5);
}
