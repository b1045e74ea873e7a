pub mod hashmap;
pub mod range;
pub mod traits;

pub use hashmap::{HashMapStore, HashMapStoreFactory};
pub use range::RangeListFactory;
pub use traits::{SearchStore, StoreCore, StoreFactory, StoreMetrics, StoreMut};
