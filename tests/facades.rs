// ==============================================
// FACADE TESTS (integration)
// ==============================================
//
// The public get/put/find surface as a client sees it, built through
// CacheBuilder.

use lfukit::builder::CacheBuilder;
use lfukit::lfu::{ClockLfu, LfuCache, RangeClockLfu, RangeLfu};

// ==============================================
// Hash-keyed facades
// ==============================================

mod hash_keyed {
    use super::*;

    #[test]
    fn lfu_cache_round_trip() {
        let mut cache: LfuCache<String, usize> = CacheBuilder::new(128).build_lfu();
        for i in 0..100 {
            assert!(cache.put(format!("key-{i}"), i));
        }
        for i in 0..100 {
            assert_eq!(cache.get(&format!("key-{i}")), Some(&i));
        }
        assert_eq!(cache.get(&"missing".to_string()), None);
        assert_eq!(cache.len(), 100);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn lfu_cache_keeps_frequent_keys_under_pressure() {
        let mut cache: LfuCache<u32, u32> = CacheBuilder::new(32).max_frequency(8).build_lfu();
        for k in 0..32 {
            cache.put(k, k);
        }
        for _ in 0..4 {
            for k in 0..8 {
                cache.get(&k);
            }
        }
        // one new key evicts one entry, and never a frequently read one
        assert!(cache.put(500, 500));
        assert_eq!(cache.len(), 32);
        assert!((0..8).all(|k| cache.contains(&k)));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn clock_lfu_round_trip() {
        // wide shard ceiling so growth never runs out and nothing is aged
        let mut cache: ClockLfu<u64, u64> = CacheBuilder::new(1 << 14)
            .slots_per_hand(64)
            .seed(12)
            .build_clock_lfu();
        for k in 0..300 {
            assert!(cache.put(k, k * 3));
        }
        for k in 0..300 {
            assert_eq!(cache.get(&k), Some(&(k * 3)));
        }
        assert!(cache.engine().shard_count() > 1);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn clock_lfu_saturates_instead_of_overflowing() {
        let mut cache: ClockLfu<u64, u64> = CacheBuilder::new(64)
            .slots_per_hand(16)
            .seed(1)
            .build_clock_lfu();
        let mut accepted = 0;
        for k in 0..10_000 {
            if cache.put(k, k) {
                accepted += 1;
            }
            assert!(cache.len() <= cache.capacity());
        }
        assert!(accepted > 0);
        cache.check_invariants().unwrap();
    }
}

// ==============================================
// Range-keyed facades
// ==============================================

mod range_keyed {
    use super::*;

    #[test]
    fn range_lfu_points_resolve_to_ranges() {
        let mut zones: RangeLfu<&str> = CacheBuilder::new(64).seed(2).build_range_lfu();
        assert!(zones.put(0, 9, "a"));
        assert!(zones.put(20, 29, "b"));
        assert_eq!(zones.get(5), Some(&"a"));
        assert_eq!(zones.get(25), Some(&"b"));
        assert_eq!(zones.get(15), None);
        assert!(zones.contains(29));
        assert!(!zones.contains(30));
        zones.check_invariants().unwrap();
    }

    #[test]
    fn range_lfu_find_matches_get() {
        let mut zones: RangeLfu<i64> = CacheBuilder::new(1024).seed(3).build_range_lfu();
        for i in 0..500i64 {
            assert!(zones.put(i * 16, i * 16 + 7, i));
        }
        let mut cursor = None;
        for n in (0..8_000i64).step_by(5) {
            let expected = if n % 16 < 8 { Some(n / 16) } else { None };
            let found = zones.find(n, cursor);
            assert_eq!(found.value.copied(), expected, "point {n}");
            cursor = Some(found.cursor);
        }
        zones.check_invariants().unwrap();
    }

    #[test]
    fn range_lfu_fixed_level_is_honored() {
        let zones: RangeLfu<u8> = CacheBuilder::new(1 << 20).max_level(6).build_range_lfu();
        assert_eq!(zones.engine().store().max_level(), 6);
    }

    #[test]
    fn range_clock_lfu_find_matches_get() {
        let mut zones: RangeClockLfu<i64> = CacheBuilder::new(1 << 14)
            .slots_per_hand(64)
            .seed(4)
            .build_range_clock_lfu();
        for i in 0..400i64 {
            assert!(zones.put(i * 16, i * 16 + 7, i));
        }
        let mut cursor = None;
        for n in (0..6_400i64).step_by(3) {
            let expected = if n % 16 < 8 { Some(n / 16) } else { None };
            let found = zones.find(n, cursor);
            assert_eq!(found.value.copied(), expected, "point {n}");
            cursor = found.cursor;
        }
        zones.check_invariants().unwrap();
    }
}
