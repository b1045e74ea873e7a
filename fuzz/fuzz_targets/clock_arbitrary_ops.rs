#![no_main]

use libfuzzer_sys::fuzz_target;
use lfukit::builder::ClockOptions;
use lfukit::policy::clock::Clock;
use lfukit::store::HashMapStore;

// Fuzz arbitrary put/val/remove/clear sequences on a small Clock.
//
// The first byte picks the vitality cap; every following triple is
// (op, key, boost). Invariants are checked after each operation.
fuzz_target!(|data: &[u8]| {
    let Some((&cap, ops)) = data.split_first() else {
        return;
    };

    let mut clock = Clock::with_options(
        &ClockOptions {
            capacity: 64,
            slots_per_hand: 16,
            max_vitality: u32::from(cap % 32),
            seed: Some(u64::from(cap)),
        },
        HashMapStore::new(),
    );

    for chunk in ops.chunks_exact(3) {
        let key = u32::from(chunk[1]);
        let boost = u32::from(chunk[2] % 8);
        match chunk[0] % 5 {
            0 | 1 => {
                clock.put(key, key, boost);
            }
            2 => {
                let hit = clock.val(&key, boost).copied();
                if let Some(value) = hit {
                    assert_eq!(value, key);
                }
            }
            3 => {
                clock.remove(&key);
                assert!(!clock.contains(&key));
            }
            4 => {
                if chunk[2] == 0 {
                    clock.clear();
                    assert!(clock.is_empty());
                }
            }
            _ => unreachable!(),
        }

        assert!(clock.len() <= clock.capacity());
        clock.check_invariants().unwrap();
    }
});
