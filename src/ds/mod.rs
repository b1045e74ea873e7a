pub mod clock_ring;
pub mod frequency_buckets;
pub mod range_list;
pub mod shard;
pub mod slot_arena;

pub use clock_ring::{ClockRing, Sweep};
pub use frequency_buckets::FrequencyBuckets;
pub use range_list::{Cursor, Range, RangeList, RangeListStats};
pub use shard::ShardOrder;
pub use slot_arena::{SlotArena, SlotId};
