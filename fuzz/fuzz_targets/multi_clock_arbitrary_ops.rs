#![no_main]

use libfuzzer_sys::fuzz_target;
use lfukit::builder::MultiClockOptions;
use lfukit::policy::multi_clock::MultiClock;
use lfukit::store::HashMapStoreFactory;

// Fuzz arbitrary operation sequences on a MultiClock that can grow to
// eight shards, checking cross-shard key uniqueness after every step.
fuzz_target!(|data: &[u8]| {
    let Some((&seed, ops)) = data.split_first() else {
        return;
    };

    let mut engine = MultiClock::with_options(
        &MultiClockOptions {
            capacity: 256,
            slots_per_hand: 16,
            hands_per_clock: 2,
            max_vitality: 8,
            seed: Some(u64::from(seed)),
        },
        HashMapStoreFactory,
    );

    for chunk in ops.chunks_exact(3) {
        let key = u16::from_le_bytes([chunk[1], chunk[2] & 0x03]);
        let boost = u32::from(chunk[0] >> 4);
        match chunk[0] % 4 {
            0 | 1 => {
                let fresh = !engine.contains(&key);
                let len = engine.len();
                if engine.put(key, key, boost) && fresh && engine.expandable() {
                    assert!(engine.contains(&key));
                    assert!(engine.len() >= len);
                }
            }
            2 => {
                if let Some(&value) = engine.val(&key, boost) {
                    assert_eq!(value, key);
                }
            }
            3 => {
                engine.remove(&key);
                assert!(!engine.contains(&key));
            }
            _ => unreachable!(),
        }

        assert!(engine.len() <= engine.capacity());
        engine.check_invariants().unwrap();
    }
});
