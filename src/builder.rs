//! Engine options and a unified builder for the facade caches.
//!
//! Every engine has a plain options struct whose `Default` carries the
//! stock geometry. Engine constructors never fail: out-of-range values are
//! clamped (see each engine's docs). Use `validate()` or the builder's
//! `try_*` methods to reject nonsensical input such as zero hands instead.
//!
//! ## Defaults
//!
//! | Struct              | Field             | Default |
//! |---------------------|-------------------|---------|
//! | `ClockOptions`      | `capacity`        | 32      |
//! |                     | `slots_per_hand`  | 256     |
//! |                     | `max_vitality`    | 16      |
//! | `MultiClockOptions` | `capacity`        | 64      |
//! |                     | `slots_per_hand`  | 256     |
//! |                     | `hands_per_clock` | 2       |
//! |                     | `max_vitality`    | 32      |
//! | `O1Options`         | `capacity`        | 32      |
//! |                     | `max_frequency`   | 16      |
//!
//! `seed: None` draws randomness from the thread RNG; `Some(seed)` makes
//! every randomized choice reproducible.
//!
//! ## Example
//!
//! ```rust
//! use lfukit::builder::CacheBuilder;
//!
//! let mut cache = CacheBuilder::new(1024).seed(7).build_lfu::<u64, String>();
//! cache.put(1, "hello".to_string());
//! assert_eq!(cache.get(&1), Some(&"hello".to_string()));
//!
//! let mut ranges = CacheBuilder::new(1024).build_range_lfu::<&str>();
//! ranges.put(0, 9, "low");
//! assert_eq!(ranges.get(4), Some(&"low"));
//! ```

use std::hash::Hash;

use crate::error::ConfigError;
use crate::lfu::{ClockLfu, LfuCache, RangeClockLfu, RangeLfu};
use crate::store::RangeListFactory;

fn require_nonzero(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::new(format!("{field} must be greater than zero")));
    }
    Ok(())
}

/// Options for a single [`Clock`](crate::policy::clock::Clock).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockOptions {
    /// Requested slot count, clamped and rounded to a power of two.
    pub capacity: usize,
    pub slots_per_hand: usize,
    pub max_vitality: u32,
    pub seed: Option<u64>,
}

impl Default for ClockOptions {
    fn default() -> Self {
        Self {
            capacity: 32,
            slots_per_hand: 256,
            max_vitality: 16,
            seed: None,
        }
    }
}

impl ClockOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_nonzero("capacity", self.capacity as u64)?;
        require_nonzero("slots_per_hand", self.slots_per_hand as u64)?;
        require_nonzero("max_vitality", u64::from(self.max_vitality))
    }
}

/// Options for a [`MultiClock`](crate::policy::multi_clock::MultiClock).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiClockOptions {
    /// Total capacity across all shards.
    pub capacity: usize,
    pub slots_per_hand: usize,
    pub hands_per_clock: usize,
    pub max_vitality: u32,
    pub seed: Option<u64>,
}

impl Default for MultiClockOptions {
    fn default() -> Self {
        Self {
            capacity: 64,
            slots_per_hand: 256,
            hands_per_clock: 2,
            max_vitality: 32,
            seed: None,
        }
    }
}

impl MultiClockOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_nonzero("capacity", self.capacity as u64)?;
        require_nonzero("slots_per_hand", self.slots_per_hand as u64)?;
        require_nonzero("hands_per_clock", self.hands_per_clock as u64)?;
        require_nonzero("max_vitality", u64::from(self.max_vitality))
    }
}

/// Options for an [`O1`](crate::policy::o1::O1) cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct O1Options {
    pub capacity: usize,
    /// Number of frequency classes.
    pub max_frequency: usize,
}

impl Default for O1Options {
    fn default() -> Self {
        Self {
            capacity: 32,
            max_frequency: 16,
        }
    }
}

impl O1Options {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_nonzero("capacity", self.capacity as u64)?;
        require_nonzero("max_frequency", self.max_frequency as u64)
    }
}

/// Builder for the facade caches in [`crate::lfu`].
///
/// Unset knobs fall back to the engine option defaults, e.g. the clock
/// facades get a vitality cap of 32 from [`MultiClockOptions::default`].
#[derive(Debug, Clone, Default)]
pub struct CacheBuilder {
    capacity: usize,
    max_frequency: Option<usize>,
    slots_per_hand: Option<usize>,
    hands_per_clock: Option<usize>,
    max_vitality: Option<u32>,
    max_level: Option<usize>,
    seed: Option<u64>,
}

impl CacheBuilder {
    /// Starts a builder for a cache of roughly `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Frequency classes of the O1 facades.
    pub fn max_frequency(mut self, classes: usize) -> Self {
        self.max_frequency = Some(classes);
        self
    }

    pub fn slots_per_hand(mut self, slots: usize) -> Self {
        self.slots_per_hand = Some(slots);
        self
    }

    pub fn hands_per_clock(mut self, hands: usize) -> Self {
        self.hands_per_clock = Some(hands);
        self
    }

    pub fn max_vitality(mut self, cap: u32) -> Self {
        self.max_vitality = Some(cap);
        self
    }

    /// Fixed skip list height for the range facades. Without it the height
    /// is derived from the capacity.
    pub fn max_level(mut self, levels: usize) -> Self {
        self.max_level = Some(levels);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Options an O1-backed facade will be built with.
    pub fn o1_options(&self) -> O1Options {
        let defaults = O1Options::default();
        O1Options {
            capacity: self.capacity,
            max_frequency: self.max_frequency.unwrap_or(defaults.max_frequency),
        }
    }

    /// Options a clock-backed facade will be built with.
    pub fn multi_clock_options(&self) -> MultiClockOptions {
        let defaults = MultiClockOptions::default();
        MultiClockOptions {
            capacity: self.capacity,
            slots_per_hand: self.slots_per_hand.unwrap_or(defaults.slots_per_hand),
            hands_per_clock: self.hands_per_clock.unwrap_or(defaults.hands_per_clock),
            max_vitality: self.max_vitality.unwrap_or(defaults.max_vitality),
            seed: self.seed,
        }
    }

    fn range_factory(&self) -> RangeListFactory {
        let factory = match self.seed {
            Some(seed) => RangeListFactory::with_seed(seed),
            None => RangeListFactory::new(),
        };
        match self.max_level {
            Some(levels) => factory.with_max_level(levels),
            None => factory,
        }
    }

    fn validate_range(&self) -> Result<(), ConfigError> {
        if let Some(levels) = self.max_level {
            require_nonzero("max_level", levels as u64)?;
        }
        Ok(())
    }

    /// Exact LFU over a hash map.
    pub fn build_lfu<K, V>(&self) -> LfuCache<K, V>
    where
        K: Eq + Hash + Clone,
    {
        LfuCache::with_options(&self.o1_options())
    }

    /// Exact LFU over disjoint integer ranges.
    pub fn build_range_lfu<V>(&self) -> RangeLfu<V> {
        RangeLfu::with_factory(&self.o1_options(), &self.range_factory())
    }

    /// Approximate LFU over a hash map.
    pub fn build_clock_lfu<K, V>(&self) -> ClockLfu<K, V>
    where
        K: Eq + Hash + Clone,
    {
        ClockLfu::with_options(&self.multi_clock_options())
    }

    /// Approximate LFU over disjoint integer ranges.
    pub fn build_range_clock_lfu<V>(&self) -> RangeClockLfu<V> {
        RangeClockLfu::with_factory(&self.multi_clock_options(), self.range_factory())
    }

    pub fn try_build_lfu<K, V>(&self) -> Result<LfuCache<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone,
    {
        self.o1_options().validate()?;
        Ok(self.build_lfu())
    }

    pub fn try_build_range_lfu<V>(&self) -> Result<RangeLfu<V>, ConfigError> {
        self.o1_options().validate()?;
        self.validate_range()?;
        Ok(self.build_range_lfu())
    }

    pub fn try_build_clock_lfu<K, V>(&self) -> Result<ClockLfu<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone,
    {
        self.multi_clock_options().validate()?;
        Ok(self.build_clock_lfu())
    }

    pub fn try_build_range_clock_lfu<V>(&self) -> Result<RangeClockLfu<V>, ConfigError> {
        self.multi_clock_options().validate()?;
        self.validate_range()?;
        Ok(self.build_range_clock_lfu())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let clock = ClockOptions::default();
        assert_eq!((clock.slots_per_hand, clock.max_vitality), (256, 16));
        let multi = MultiClockOptions::default();
        assert_eq!(
            (multi.capacity, multi.slots_per_hand, multi.hands_per_clock, multi.max_vitality),
            (64, 256, 2, 32)
        );
        let o1 = O1Options::default();
        assert_eq!((o1.capacity, o1.max_frequency), (32, 16));
    }

    #[test]
    fn validate_names_the_offending_field() {
        let err = ClockOptions {
            slots_per_hand: 0,
            ..ClockOptions::default()
        }
        .validate()
        .unwrap_err();
        assert!(err.message().contains("slots_per_hand"));

        let err = O1Options {
            max_frequency: 0,
            ..O1Options::default()
        }
        .validate()
        .unwrap_err();
        assert!(err.message().contains("max_frequency"));

        assert!(MultiClockOptions::default().validate().is_ok());
    }

    #[test]
    fn builder_carries_settings_into_options() {
        let builder = CacheBuilder::new(4096)
            .slots_per_hand(64)
            .hands_per_clock(4)
            .max_vitality(8)
            .max_frequency(32)
            .seed(11);
        let multi = builder.multi_clock_options();
        assert_eq!(multi.capacity, 4096);
        assert_eq!(multi.slots_per_hand, 64);
        assert_eq!(multi.hands_per_clock, 4);
        assert_eq!(multi.max_vitality, 8);
        assert_eq!(multi.seed, Some(11));
        assert_eq!(builder.o1_options().max_frequency, 32);
    }

    #[test]
    fn try_build_rejects_zero_geometry() {
        assert!(CacheBuilder::new(0).try_build_lfu::<u32, u32>().is_err());
        assert!(
            CacheBuilder::new(64)
                .hands_per_clock(0)
                .try_build_clock_lfu::<u32, u32>()
                .is_err()
        );
        let err = CacheBuilder::new(64)
            .max_level(0)
            .try_build_range_lfu::<u32>()
            .unwrap_err();
        assert!(err.message().contains("max_level"));
        assert!(CacheBuilder::new(64).try_build_range_clock_lfu::<u32>().is_ok());
    }

    #[test]
    fn build_every_facade() {
        let builder = CacheBuilder::new(256).slots_per_hand(32).seed(3);

        let mut lfu = builder.build_lfu::<u32, u32>();
        assert!(lfu.put(1, 10));
        assert_eq!(lfu.get(&1), Some(&10));

        let mut clock = builder.build_clock_lfu::<u32, u32>();
        assert!(clock.put(1, 10));
        assert_eq!(clock.get(&1), Some(&10));

        let mut ranges = builder.build_range_lfu::<u32>();
        assert!(ranges.put(10, 19, 1));
        assert_eq!(ranges.get(15), Some(&1));

        let mut clock_ranges = builder.build_range_clock_lfu::<u32>();
        assert!(clock_ranges.put(10, 19, 1));
        assert_eq!(clock_ranges.get(15), Some(&1));
    }
}
