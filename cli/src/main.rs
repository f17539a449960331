//! Headless scenario runner for the freight simulation engine.
//!
//! Builds a small default world, runs it for a fixed number of game days at
//! one-second ticks, and prints a per-day summary. Useful for smoke-testing
//! the engine and eyeballing the economy without a frontend.
//!
//! Usage: `freight-sim [seed] [days]` (defaults: seed 42, 7 days)

use freight_simulator_core_rs::{
    CarrierSetup, CitySetup, CommoditySetup, CustomerSetup, GroupSetup, LaneSetup, Notification,
    RegionSetup, RiskLevel, Simulation, SimulationConfig, SECONDS_PER_DAY,
};

fn default_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        rng_seed: seed,
        time_scale: 1.0,
        starting_balance: 500_000,
        commodities: vec![
            CommoditySetup {
                id: "STEEL".to_string(),
                name: "Steel".to_string(),
                category: "raw_materials".to_string(),
                base_price: 6000.0,
            },
            CommoditySetup {
                id: "GRAIN".to_string(),
                name: "Grain".to_string(),
                category: "food".to_string(),
                base_price: 900.0,
            },
            CommoditySetup {
                id: "ELECTRONICS".to_string(),
                name: "Electronics".to_string(),
                category: "consumer_goods".to_string(),
                base_price: 14_000.0,
            },
        ],
        groups: vec![GroupSetup {
            id: "bulk".to_string(),
            members: vec!["STEEL".to_string(), "GRAIN".to_string()],
        }],
        regions: vec![
            RegionSetup {
                id: "west".to_string(),
                name: "Western Reach".to_string(),
                risk_factor: 0.3,
                economy_strength: 1.1,
                weather_susceptibility: 0.6,
                parent_market: Some("global_market".to_string()),
                influence: Some(0.85),
            },
            RegionSetup {
                id: "east".to_string(),
                name: "Eastern Basin".to_string(),
                risk_factor: 0.5,
                economy_strength: 0.9,
                weather_susceptibility: 0.3,
                parent_market: Some("global_market".to_string()),
                influence: Some(0.85),
            },
        ],
        cities: vec![
            CitySetup {
                id: "city_aldport".to_string(),
                name: "Aldport".to_string(),
                region_id: "west".to_string(),
                position: (0.0, 0.0),
                population: 1_200_000,
                infrastructure: 0.8,
                industries: vec!["STEEL".to_string()],
            },
            CitySetup {
                id: "city_brennen".to_string(),
                name: "Brennen".to_string(),
                region_id: "west".to_string(),
                position: (140.0, 60.0),
                population: 600_000,
                infrastructure: 0.6,
                industries: vec!["GRAIN".to_string()],
            },
            CitySetup {
                id: "city_corvand".to_string(),
                name: "Corvand".to_string(),
                region_id: "east".to_string(),
                position: (320.0, 20.0),
                population: 900_000,
                infrastructure: 0.7,
                industries: vec!["ELECTRONICS".to_string()],
            },
        ],
        lanes: vec![
            LaneSetup {
                id: "lane_aldport_brennen".to_string(),
                start_city: "city_aldport".to_string(),
                end_city: "city_brennen".to_string(),
                distance: 800.0,
                congestion: 0.15,
                risk: RiskLevel::Low,
            },
            LaneSetup {
                id: "lane_brennen_corvand".to_string(),
                start_city: "city_brennen".to_string(),
                end_city: "city_corvand".to_string(),
                distance: 1400.0,
                congestion: 0.25,
                risk: RiskLevel::Medium,
            },
        ],
        customers: vec![
            CustomerSetup {
                id: "cust_meyer".to_string(),
                name: "Meyer Logistics".to_string(),
                trust: 55.0,
                needs: [("STEEL".to_string(), 3.0), ("GRAIN".to_string(), 1.0)]
                    .into_iter()
                    .collect(),
            },
            CustomerSetup {
                id: "cust_hartmann".to_string(),
                name: "Hartmann & Sons".to_string(),
                trust: 82.0,
                needs: [
                    ("GRAIN".to_string(), 2.0),
                    ("ELECTRONICS".to_string(), 1.5),
                ]
                .into_iter()
                .collect(),
            },
        ],
        carriers: vec![
            CarrierSetup {
                id: "carrier_northwind".to_string(),
                name: "Northwind Haulage".to_string(),
                reputation: 62.0,
                fleet_size: 2,
                speed_factor: 1.0,
                risk_tolerance: 0.5,
                pricing_factor: 1.0,
                preferred_cargo: vec!["STEEL".to_string()],
            },
            CarrierSetup {
                id: "carrier_eastline".to_string(),
                name: "Eastline Express".to_string(),
                reputation: 87.0,
                fleet_size: 3,
                speed_factor: 1.4,
                risk_tolerance: 0.8,
                pricing_factor: 1.2,
                preferred_cargo: vec!["ELECTRONICS".to_string()],
            },
        ],
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or(42);
    let days: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(7);

    let mut sim = match Simulation::new(default_config(seed)) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("config error: {err}");
            std::process::exit(1);
        }
    };

    // Start with a small owned network so maintenance and offers flow
    if let Err(err) = sim.purchase_lane("lane_aldport_brennen") {
        eprintln!("setup error: {err}");
        std::process::exit(1);
    }

    println!("freight-sim: seed {seed}, {days} game days, 1s ticks");
    println!(
        "day 0  balance {:>9}  STEEL {:>8.1}",
        sim.ledger().balance(),
        sim.market().get_price("STEEL", 0.0, Some("west")),
    );

    let ticks_per_day = SECONDS_PER_DAY as u64;
    for day in 1..=days {
        let mut offered = 0usize;
        let mut events = 0usize;

        for _ in 0..ticks_per_day {
            sim.tick(1.0);
            for notification in sim.drain_notifications() {
                match notification {
                    Notification::ContractOffered { contract_id, .. } => {
                        offered += 1;
                        // Greedy player: accept anything affordable
                        let _ = sim.accept_contract(&contract_id);
                    }
                    Notification::EventTriggered { name, severity, .. } => {
                        events += 1;
                        println!("        event: {name} (severity {severity:.2})");
                    }
                    _ => {}
                }
            }
        }

        let now = sim.current_time();
        println!(
            "day {day}  balance {:>9}  net worth {:>9}  STEEL {:>8.1}  offers {offered}  events {events}",
            sim.ledger().balance(),
            sim.ledger().net_worth(),
            sim.market().get_price("STEEL", now, Some("west")),
        );

        if sim.ledger().is_bankrupt() {
            println!("bankrupt on day {day}; stopping");
            break;
        }
    }

    let ledger = sim.ledger();
    println!(
        "final: level {}, reputation {:.1}, {} transactions recorded",
        ledger.level(),
        ledger.reputation().global,
        ledger.transactions().len(),
    );
}
