//! DHAT heap profiler for lfukit.
//!
//! Run with: cargo run --bin dhat_profile --release --features dhat-heap
//! View results: Open dhat-heap.json in <https://nnethercote.github.io/dh_view/dh_view.html>

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use lfukit::builder::{MultiClockOptions, O1Options};
use lfukit::lfu::{ClockLfu, LfuCache, RangeClockLfu, RangeLfu};
use lfukit::store::RangeListFactory;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Key source for a hotset workload: 90% of accesses hit 10% of keys.
fn hotset_keys(operations: usize, universe: u64, seed: u64) -> impl Iterator<Item = u64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let hot_size = (universe / 10).max(1);
    (0..operations).map(move |_| {
        if rng.random_bool(0.9) {
            rng.random_range(0..hot_size)
        } else {
            rng.random_range(hot_size..universe)
        }
    })
}

fn main() {
    let _profiler = dhat::Profiler::new_heap();

    let capacity = 4096usize;
    let operations = 100_000usize;
    let universe = 16_384u64;

    println!("=== lfukit DHAT Heap Profile ===\n");
    println!("Capacity: {capacity}");
    println!("Operations per workload: {operations}");
    println!("Key universe: {universe}\n");

    // O1 over a hash map
    {
        println!("Profiling LfuCache...");
        let mut cache: LfuCache<u64, u64> = LfuCache::with_options(&O1Options {
            capacity,
            ..O1Options::default()
        });
        for key in hotset_keys(operations, universe, 42) {
            if cache.get(&key).is_none() {
                cache.put(key, key);
            }
        }
        for i in 0..operations as u64 {
            cache.put(universe + i, i);
        }
        println!("  final len: {}", cache.len());
    }

    // MultiClock over hash maps
    {
        println!("Profiling ClockLfu...");
        let mut cache: ClockLfu<u64, u64> = ClockLfu::with_options(&MultiClockOptions {
            capacity,
            slots_per_hand: 64,
            seed: Some(42),
            ..MultiClockOptions::default()
        });
        for key in hotset_keys(operations, universe, 42) {
            if cache.get(&key).is_none() {
                cache.put(key, key);
            }
        }
        println!("  final len: {} in {} shards", cache.len(), cache.engine().shard_count());
    }

    // O1 over a skip list
    {
        println!("Profiling RangeLfu...");
        let mut zones: RangeLfu<u64> = RangeLfu::with_factory(
            &O1Options {
                capacity,
                ..O1Options::default()
            },
            &RangeListFactory::with_seed(42),
        );
        let mut cursor = None;
        for key in hotset_keys(operations, universe, 7) {
            let lo = key as i64 * 8;
            let found = zones.find(lo, cursor);
            let hit = found.value.is_some();
            cursor = Some(found.cursor);
            if !hit {
                zones.put(lo, lo + 3, key);
            }
        }
        println!("  final len: {}", zones.len());
    }

    // MultiClock over skip lists
    {
        println!("Profiling RangeClockLfu...");
        let mut zones: RangeClockLfu<u64> = RangeClockLfu::with_factory(
            &MultiClockOptions {
                capacity,
                slots_per_hand: 64,
                seed: Some(42),
                ..MultiClockOptions::default()
            },
            RangeListFactory::with_seed(42),
        );
        for key in hotset_keys(operations, universe, 7) {
            let lo = key as i64 * 8;
            if zones.get(lo).is_none() {
                zones.put(lo, lo + 3, key);
            }
        }
        println!("  final len: {}", zones.len());
    }

    println!("\n=== Profile complete ===");
    println!("Results written to dhat-heap.json");
}
