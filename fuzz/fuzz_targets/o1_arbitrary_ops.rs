#![no_main]

use libfuzzer_sys::fuzz_target;
use lfukit::builder::O1Options;
use lfukit::policy::o1::O1;
use lfukit::store::HashMapStore;

// Fuzz arbitrary put/val/remove sequences on O1, checking that every entry
// sits in the bucket its frequency maps to and that size never exceeds
// capacity.
fuzz_target!(|data: &[u8]| {
    let Some((&classes, ops)) = data.split_first() else {
        return;
    };

    let mut cache = O1::with_options(
        &O1Options {
            capacity: 32,
            max_frequency: usize::from(classes),
        },
        HashMapStore::new(),
    );

    for chunk in ops.chunks_exact(3) {
        let key = chunk[1] % 96;
        let freq = u32::from(chunk[2] % 6);
        match chunk[0] % 4 {
            0 | 1 => {
                let had = cache.contains(&key);
                let len = cache.len();
                let stored = cache.put(key, chunk[2], freq);
                if had {
                    assert!(stored);
                    assert_eq!(cache.len(), len);
                }
            }
            2 => {
                let before = cache.frequency(&key);
                if cache.val(&key, freq).is_some() {
                    let after = cache.frequency(&key);
                    assert_eq!(after, before.map(|f| f + u64::from(freq)));
                }
            }
            3 => {
                cache.remove(&key);
                assert!(!cache.contains(&key));
            }
            _ => unreachable!(),
        }

        assert!(cache.len() <= cache.capacity());
        cache.check_invariants().unwrap();
    }
});
