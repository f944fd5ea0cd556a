//! Assembly benchmarks.
//!
//! Measures full account assembly over a populated world, cold (fresh
//! session) against warm (caches primed), plus the raw cost of content
//! addressing.
//!
//! Run with: `cargo bench --bench shapes_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use kami_shapes::fixtures::DEMO_NOW;
use kami_shapes::ids::{hash_id, Arg};
use kami_shapes::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `accounts` accounts with four kamis each, half of them harvesting.
fn populated_world(accounts: u32) -> World {
    let mut seed = Seeder::new();
    seed.default_config();
    seed.item(1, "MUSU", "CURRENCY");
    seed.trait_entry("BODY", 1, "Bulb", "EERIE");
    seed.trait_entry("HAND", 1, "Claws", "SCRAP");
    let node = seed.node(NodeSeed {
        index: 1,
        name: "Field".into(),
        affinity: "EERIE".into(),
        ..Default::default()
    });
    for a in 1..=accounts {
        let owner = seed.account(AccountSeed {
            index: a,
            name: format!("acct{a}"),
            stamina: 20,
            ..Default::default()
        });
        seed.inventory(owner, 1, u64::from(a) * 10);
        for k in 0..4 {
            let index = a * 4 + k;
            let harvesting = k % 2 == 0;
            let kami = seed.kami(KamiSeed {
                index,
                owner,
                name: format!("kami{index}"),
                state: if harvesting { "HARVESTING" } else { "RESTING" }.into(),
                health: 100,
                health_sync: 80,
                power: 12,
                harmony: 10,
                violence: 8,
                body: Some(1),
                hand: Some(1),
                ..Default::default()
            });
            if harvesting {
                seed.harvest(HarvestSeed {
                    kami,
                    node,
                    start: DEMO_NOW - 3_600,
                    last: DEMO_NOW - 3_600,
                    reset: DEMO_NOW - 3_600,
                    ..Default::default()
                });
            }
        }
    }
    seed.into_world()
}

fn options() -> AccountOptions {
    AccountOptions {
        kamis: true,
        kami: KamiOptions {
            harvest: true,
            traits: true,
            ..Default::default()
        },
        inventory: true,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_account_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("account_assembly");
    for accounts in [10u32, 100] {
        let world = populated_world(accounts);
        let opts = options();

        group.bench_with_input(BenchmarkId::new("cold", accounts), &accounts, |b, &n| {
            b.iter(|| {
                let session = Session::new(&world);
                let frame = session.frame(DEMO_NOW);
                for index in 1..=n {
                    black_box(get_account_by_index(&frame, index, &opts));
                }
            });
        });

        let session = Session::new(&world);
        group.bench_with_input(BenchmarkId::new("warm", accounts), &accounts, |b, &n| {
            b.iter(|| {
                let frame = session.frame(DEMO_NOW);
                for index in 1..=n {
                    black_box(get_account_by_index(&frame, index, &opts));
                }
            });
        });
    }
    group.finish();
}

fn bench_content_ids(c: &mut Criterion) {
    c.bench_function("hash_id_inventory", |b| {
        let holder = EntityId::from(0xacc0_0001u64);
        b.iter(|| {
            for item in 0..64u32 {
                black_box(hash_id(
                    "inventory.instance",
                    &[holder.into(), Arg::U32(black_box(item))],
                ));
            }
        });
    });
}

criterion_group!(benches, bench_account_assembly, bench_content_ids);
criterion_main!(benches);
