//! End-to-end assembly tests over seeded worlds: determinism, cache
//! transparency, derived state over time, liquidation and requirement gates.

use kami_shapes::fixtures::DEMO_NOW;
use kami_shapes::prelude::*;
use kami_shapes::shapes::node::node_requirement_anchor;
use kami_shapes::shapes::trade::get_listing_by;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn full_account() -> AccountOptions {
    AccountOptions {
        kamis: true,
        kami: KamiOptions {
            harvest: true,
            traits: true,
            skills: true,
            flags: true,
            ..Default::default()
        },
        friends: true,
        inventory: true,
        stats: true,
        flags: true,
    }
}

fn account_json(world: &World, now: u64) -> serde_json::Value {
    let session = Session::new(world);
    let frame = session.frame(now);
    let account = get_account_by_index(&frame, 1, &full_account()).unwrap();
    serde_json::to_value(&account).unwrap()
}

/// A world with one resting kami and one harvester whose attacker's violence
/// is `violence`.
fn duel_world(violence: i64) -> World {
    let mut seed = Seeder::new();
    seed.default_config();
    let node = seed.node(NodeSeed {
        index: 1,
        name: "Field".into(),
        ..Default::default()
    });
    seed.kami(KamiSeed {
        index: 1,
        name: "attacker".into(),
        violence,
        harmony: 10,
        health: 100,
        health_sync: 100,
        last_time: DEMO_NOW,
        ..Default::default()
    });
    let defender = seed.kami(KamiSeed {
        index: 2,
        name: "defender".into(),
        state: "HARVESTING".into(),
        harmony: 10,
        power: 10,
        health: 100,
        health_sync: 30,
        ..Default::default()
    });
    seed.harvest(HarvestSeed {
        kami: defender,
        node,
        balance: 200,
        start: DEMO_NOW - 600,
        last: DEMO_NOW - 600,
        reset: DEMO_NOW - 600,
        ..Default::default()
    });
    seed.into_world()
}

// ---------------------------------------------------------------------------
// Determinism and caching
// ---------------------------------------------------------------------------

#[test]
fn assembly_is_deterministic_across_sessions() {
    let world = demo_world();
    assert_eq!(account_json(&world, DEMO_NOW), account_json(&world, DEMO_NOW));
}

#[test]
fn assembly_survives_snapshot_restore() {
    let world = demo_world();
    let restored = World::from_snapshot(&world.capture_snapshot()).unwrap();
    assert_eq!(account_json(&world, DEMO_NOW), account_json(&restored, DEMO_NOW));
}

#[test]
fn warm_caches_do_not_change_results() {
    let world = demo_world();
    let session = Session::new(&world);
    let frame = session.frame(DEMO_NOW);
    let cold = get_account_by_index(&frame, 1, &full_account()).unwrap();
    let warm = get_account_by_index(&frame, 1, &full_account()).unwrap();
    assert_eq!(cold, warm);

    let report = session.diagnostics();
    assert!(report.index_cache_hits > 0);
    assert!(report.id_cache_hits > 0);

    session.reset_caches();
    let reset = get_account_by_index(&frame, 1, &full_account()).unwrap();
    assert_eq!(cold, reset);
    assert_eq!(session.diagnostics().cache_resets, 1);
}

#[test]
fn absent_branches_serialize_as_null() {
    let world = demo_world();
    let session = Session::new(&world);
    let frame = session.frame(DEMO_NOW);
    let kami = get_kami_by_index(&frame, 1, &KamiOptions::default()).unwrap();
    let json = serde_json::to_value(&kami).unwrap();
    assert!(json["traits"].is_null());
    assert!(json["skills"].is_null());
    assert_eq!(json["name"], "Zephyr");
}

#[test]
fn missing_entities_are_sentinels() {
    let world = demo_world();
    let session = Session::new(&world);
    let frame = session.frame(DEMO_NOW);
    assert!(get_kami_or_sentinel(&frame, 404, &KamiOptions::default()).is_sentinel());
    assert!(get_account_or_sentinel(&frame, 404, &AccountOptions::default()).is_sentinel());
    assert!(get_node_or_sentinel(&frame, 404, &NodeOptions::default()).is_sentinel());
    assert!(session.diagnostics().unique_misses >= 3);
}

// ---------------------------------------------------------------------------
// Derived state
// ---------------------------------------------------------------------------

#[test]
fn resting_health_regenerates_up_to_total() {
    let world = demo_world();
    let session = Session::new(&world);
    let opts = KamiOptions::default();
    let mut previous = 0;
    for hours in 0..48 {
        let frame = session.frame(DEMO_NOW + hours * 3_600);
        let kami = get_kami_by_index(&frame, 1, &opts).unwrap();
        assert!(kami.current_health >= previous);
        assert!(kami.current_health as f64 <= kami.stats.health.total);
        previous = kami.current_health;
    }
    assert_eq!(previous as f64, 120.0);
}

#[test]
fn harvest_bounty_grows_and_health_drains() {
    let world = demo_world();
    let session = Session::new(&world);
    let opts = KamiOptions {
        harvest: true,
        ..Default::default()
    };
    let early = get_kami_by_index(&session.frame(DEMO_NOW - 3_600), 2, &opts).unwrap();
    let late = get_kami_by_index(&session.frame(DEMO_NOW), 2, &opts).unwrap();
    let (early_h, late_h) = (early.harvest.unwrap(), late.harvest.unwrap());
    assert!(late_h.bounty >= early_h.bounty);
    assert_eq!(late_h.current_balance, late_h.balance + late_h.bounty);
    assert!(late.current_health <= early.current_health);
    // the harvesting room is the node's
    assert_eq!(late.room, 1);
}

#[test]
fn liquidation_threshold_rises_with_violence() {
    let mut previous = 0;
    for violence in [1, 5, 10, 20, 40, 80] {
        let world = duel_world(violence);
        let session = Session::new(&world);
        let frame = session.frame(DEMO_NOW);
        let attacker = frame.kami_by_index(1).unwrap();
        let defender = frame.kami_by_index(2).unwrap();
        let report = analyze_liquidation(&frame, attacker, defender);
        assert!(report.threshold >= previous, "violence {violence}");
        assert!(report.salvage + report.spoils <= report.bounty);
        previous = report.threshold;
    }
    assert!(previous > 0);
}

#[test]
fn resting_defender_cannot_be_liquidated() {
    let world = demo_world();
    let session = Session::new(&world);
    let frame = session.frame(DEMO_NOW);
    let thorn = frame.kami_by_index(3).unwrap();
    let zephyr = frame.kami_by_index(1).unwrap();
    let report = analyze_liquidation(&frame, thorn, zephyr);
    assert!(!report.can_liquidate);
    assert_eq!(report.bounty, 0);
}

// ---------------------------------------------------------------------------
// Requirements
// ---------------------------------------------------------------------------

#[test]
fn node_requirements_gate_by_level() {
    let world = demo_world();
    let session = Session::new(&world);
    let frame = session.frame(DEMO_NOW);
    let anchor = node_requirement_anchor(&session, 3).unwrap();
    let requirements = session.conditions_for(anchor);
    assert_eq!(requirements.len(), 1);

    let opts = KamiOptions::default();
    let zephyr = get_kami_by_index(&frame, 1, &opts).unwrap();
    let pebble = get_kami_by_index(&frame, 2, &opts).unwrap();
    assert!(check_all(&frame, Holder::Kami(&zephyr), &requirements));
    assert!(check_all(&frame, Holder::Kami(&pebble), &requirements));

    let status = check(&frame, Holder::Kami(&zephyr), &requirements[0]);
    assert_eq!(status.current, Some(3));
    assert_eq!(status.target, Some(2));
}

#[test]
fn listing_requirement_reads_quest_progress() {
    let world = demo_world();
    let session = Session::new(&world);
    let frame = session.frame(DEMO_NOW);
    let listing = get_listing_by(&session, 1, 11).unwrap();
    assert_eq!(listing.sell_price, Some(30));

    let opts = AccountOptions::default();
    let ava = get_account_by_index(&frame, 1, &opts).unwrap();
    let bo = get_account_by_index(&frame, 2, &opts).unwrap();
    assert!(check_all(&frame, Holder::Account(&ava), &listing.requirements));
    assert!(!check_all(&frame, Holder::Account(&bo), &listing.requirements));
}
