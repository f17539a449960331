//! Map state tests
//!
//! Critical invariants:
//! - Cost formulas derived from distance
//! - BLOCKED ⇒ no carrier assignment, atomically
//! - Assigned lanes cannot be sold
//! - Direct-connection lookup only (no multi-hop), memoized per pair
//! - Blocked lanes excluded from random condition drift

use freight_simulator_core_rs::models::lane::{Lane, LaneStatus, LaneUpgrade, RiskLevel};
use freight_simulator_core_rs::models::notification::NotificationLog;
use freight_simulator_core_rs::models::region::{City, Region};
use freight_simulator_core_rs::{MapState, RngManager};

fn build_map() -> MapState {
    let mut map = MapState::new();
    map.add_region(Region::new("west", "West", 0.3, 1.0, 0.5));
    map.add_region(Region::new("east", "East", 0.5, 0.8, 0.3));

    for (id, name, region, position, population) in [
        ("city_a", "Alphaville", "west", (0.0, 0.0), 500_000u64),
        ("city_b", "Betaburg", "west", (80.0, 10.0), 900_000),
        ("city_c", "Gammaton", "east", (200.0, 40.0), 300_000),
    ] {
        map.add_city(City::new(
            id,
            name,
            region,
            position,
            population,
            0.7,
            Default::default(),
            0.3,
        ))
        .unwrap();
    }

    map.add_lane(Lane::new("lane_ab", "city_a", "city_b", 1000.0, 0.2, RiskLevel::Medium));
    map.add_lane(Lane::new("lane_bc", "city_b", "city_c", 600.0, 0.1, RiskLevel::Low));
    map
}

#[test]
fn test_distance_1000_cost_formula() {
    let map = build_map();
    let lane = map.lane("lane_ab").unwrap();
    assert_eq!(lane.base_cost(), 100_000);
    assert_eq!(lane.maintenance_cost(), 5_000);
}

#[test]
fn test_lane_lifecycle_available_owned_assigned() {
    let mut map = build_map();
    assert_eq!(map.lane("lane_ab").unwrap().status(), LaneStatus::Available);

    map.purchase_lane("lane_ab").unwrap();
    assert_eq!(map.lane("lane_ab").unwrap().status(), LaneStatus::Owned);

    map.assign_carrier("lane_ab", "carrier_001").unwrap();
    assert_eq!(map.lane("lane_ab").unwrap().status(), LaneStatus::Assigned);

    // Double assignment rejected
    assert!(map.assign_carrier("lane_ab", "carrier_002").is_err());
    // Assigned lane cannot be sold
    assert!(map.sell_lane("lane_ab").is_err());

    let carrier = map.unassign_carrier("lane_ab").unwrap();
    assert_eq!(carrier, "carrier_001");
    map.sell_lane("lane_ab").unwrap();
    assert_eq!(map.lane("lane_ab").unwrap().status(), LaneStatus::Available);
}

#[test]
fn test_blocked_implies_no_assignment() {
    let mut map = build_map();
    map.purchase_lane("lane_ab").unwrap();
    map.purchase_lane("lane_bc").unwrap();
    map.assign_carrier("lane_ab", "carrier_001").unwrap();
    map.assign_carrier("lane_bc", "carrier_002").unwrap();

    // Blocking "west" hits both lanes (lane_bc touches city_b in west)
    let disrupted = map.block_lanes(&["west".to_string()], 3);
    assert_eq!(disrupted.len(), 2);

    for lane in map.lanes() {
        if lane.status() == LaneStatus::Blocked {
            assert_eq!(
                lane.assigned_carrier(),
                None,
                "blocked lane {} still assigned",
                lane.id()
            );
        }
    }
}

#[test]
fn test_block_decays_back_to_owned() {
    let mut map = build_map();
    map.purchase_lane("lane_ab").unwrap();
    map.block_lane("lane_ab", 2).unwrap();

    let mut rng = RngManager::new(1);
    let mut log = NotificationLog::new();
    map.process_daily_update(600.0, &mut rng, &mut log);
    assert!(map.lane("lane_ab").unwrap().is_blocked());

    map.process_daily_update(1200.0, &mut rng, &mut log);
    assert_eq!(map.lane("lane_ab").unwrap().status(), LaneStatus::Owned);
}

#[test]
fn test_connection_between_is_direct_only() {
    let mut map = build_map();

    assert_eq!(
        map.connection_between("city_a", "city_b"),
        Some("lane_ab".to_string())
    );
    assert_eq!(
        map.connection_between("city_c", "city_b"),
        Some("lane_bc".to_string())
    );
    // a—c is reachable via b, but there is no multi-hop routing
    assert_eq!(map.connection_between("city_a", "city_c"), None);

    // Cache answers stay stable and order-insensitive
    assert_eq!(
        map.connection_between("city_b", "city_a"),
        Some("lane_ab".to_string())
    );
    assert_eq!(map.connection_between("city_c", "city_a"), None);
}

#[test]
fn test_cache_invalidated_by_new_lane() {
    let mut map = build_map();
    assert_eq!(map.connection_between("city_a", "city_c"), None);

    map.add_lane(Lane::new("lane_ac", "city_a", "city_c", 1500.0, 0.0, RiskLevel::High));
    assert_eq!(
        map.connection_between("city_a", "city_c"),
        Some("lane_ac".to_string())
    );
}

#[test]
fn test_daily_drift_bounded_and_skips_blocked() {
    let mut map = build_map();
    map.purchase_lane("lane_ab").unwrap();
    map.block_lane("lane_ab", 100).unwrap();

    let blocked_congestion = map.lane("lane_ab").unwrap().congestion();
    let blocked_risk = map.lane("lane_ab").unwrap().risk();

    let mut rng = RngManager::new(5);
    let mut log = NotificationLog::new();
    for day in 1..=50 {
        map.process_daily_update(day as f64 * 600.0, &mut rng, &mut log);

        let lane = map.lane("lane_bc").unwrap();
        assert!((0.0..=1.0).contains(&lane.congestion()));

        // Blocked lane conditions frozen
        let blocked = map.lane("lane_ab").unwrap();
        assert_eq!(blocked.congestion(), blocked_congestion);
        assert_eq!(blocked.risk(), blocked_risk);
    }
}

#[test]
fn test_upgrade_idempotence_and_cost() {
    let mut map = build_map();
    map.purchase_lane("lane_ab").unwrap();

    let risk_before = map.lane("lane_ab").unwrap().risk();
    let cost = map
        .apply_lane_upgrade("lane_ab", LaneUpgrade::Reinforcement)
        .unwrap();
    assert_eq!(cost, 50_000); // 0.5 × base_cost
    assert_eq!(map.lane("lane_ab").unwrap().risk(), risk_before.step(-1));

    // Duplicate rejected, no further effect
    assert!(map
        .apply_lane_upgrade("lane_ab", LaneUpgrade::Reinforcement)
        .is_err());
    assert_eq!(map.lane("lane_ab").unwrap().risk(), risk_before.step(-1));

    // A different upgrade type is fine
    assert!(map
        .apply_lane_upgrade("lane_ab", LaneUpgrade::TrafficControl)
        .is_ok());
}

#[test]
fn test_delivery_time_scales_with_congestion_and_speed() {
    let map = build_map();
    // lane_bc: distance 600, congestion 0.1 ⇒ (600/60)×1.1 = 11.0
    let base = map.delivery_time("lane_bc", 1.0).unwrap();
    assert!((base - 11.0).abs() < 1e-9);

    let fast = map.delivery_time("lane_bc", 2.0).unwrap();
    assert!((fast - 5.5).abs() < 1e-9);
}

#[test]
fn test_snapshot_round_trip_preserves_conditions() {
    let mut map = build_map();
    map.purchase_lane("lane_ab").unwrap();
    map.lane_mut("lane_ab").unwrap().apply_temp_congestion(0.25, 3);
    map.lane_mut("lane_ab").unwrap().apply_temp_risk(1, 2);
    map.lane_mut("lane_ab").unwrap().add_restriction("LIVESTOCK");

    let mut restored = MapState::from_snapshot(map.to_snapshot());

    assert_eq!(restored.lane("lane_ab"), map.lane("lane_ab"));
    assert_eq!(restored.city("city_b"), map.city("city_b"));
    // Derived cache rebuilt from scratch still answers correctly
    assert_eq!(
        restored.connection_between("city_a", "city_b"),
        Some("lane_ab".to_string())
    );
}
