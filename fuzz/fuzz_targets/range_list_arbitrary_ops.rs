#![no_main]

use std::collections::BTreeMap;

use libfuzzer_sys::fuzz_target;
use lfukit::ds::{Range, RangeList};

// Fuzz RangeList against a BTreeMap model. Ranges are carved from a grid of
// 64 disjoint cells so the no-overlap precondition always holds; point
// lookups, cursor searches and deletes must agree with the model.
fuzz_target!(|data: &[u8]| {
    let Some((&seed, ops)) = data.split_first() else {
        return;
    };

    let mut list = RangeList::with_seed(16, u64::from(seed));
    let mut model: BTreeMap<i64, (Range, u8)> = BTreeMap::new();
    let mut cursor = None;

    for chunk in ops.chunks_exact(3) {
        let cell = i64::from(chunk[1] % 64);
        let range = Range::new(cell * 16, cell * 16 + i64::from(chunk[2] % 16));
        let point = cell * 16 + i64::from(chunk[2] % 16);
        let expected = model
            .get(&cell)
            .filter(|(stored, _)| stored.contains(point))
            .map(|&(_, value)| value);

        match chunk[0] % 5 {
            0 => {
                if !model.contains_key(&cell) {
                    list.insert(range, chunk[2], chunk[0] & 0x80 != 0);
                    model.insert(cell, (range, chunk[2]));
                }
            }
            1 => {
                assert_eq!(list.get_point(point).copied(), expected);
            }
            2 => {
                let (value, next) = list.search(&Range::point(point), cursor);
                assert_eq!(value.copied(), expected);
                cursor = Some(next);
            }
            3 => {
                let removed = list.delete(&Range::point(cell * 16));
                assert_eq!(removed, model.remove(&cell).is_some());
            }
            4 => {
                if let Some((stored, _)) = model.get(&cell) {
                    let stored = *stored;
                    assert!(list.upsert(stored, chunk[2]).is_some());
                    model.insert(cell, (stored, chunk[2]));
                }
            }
            _ => unreachable!(),
        }

        assert_eq!(list.len(), model.len());
        list.check_invariants().unwrap();
    }
});
