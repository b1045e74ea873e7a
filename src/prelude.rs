pub use crate::builder::{CacheBuilder, ClockOptions, MultiClockOptions, O1Options};
pub use crate::ds::{Cursor, FrequencyBuckets, Range, RangeList, SlotArena, SlotId};
pub use crate::error::{ConfigError, InvariantError, RangeOverlapError};
pub use crate::lfu::{ClockLfu, Found, LfuCache, RangeClockLfu, RangeLfu};
pub use crate::policy::clock::{Clock, ClockEntry};
pub use crate::policy::multi_clock::MultiClock;
pub use crate::policy::o1::{O1, O1Entry};
pub use crate::store::{HashMapStore, HashMapStoreFactory, RangeListFactory};
pub use crate::store::traits::{SearchStore, StoreCore, StoreFactory, StoreMut};
pub use crate::traits::{CursorSearch, FrequencyEngine};
