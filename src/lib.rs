//! lfukit: frequency-based cache engines and a range-keyed skip list.
//!
//! Engines live in [`policy`] (`Clock`, `MultiClock`, `O1`), the structures
//! they are built from in [`ds`], pluggable key stores in [`store`], and
//! ready-to-use caches in [`lfu`]. See `DESIGN.md` for the architecture.

pub mod builder;
pub mod ds;
pub mod error;
pub mod lfu;
pub mod policy;
pub mod prelude;
pub mod store;
pub mod traits;
