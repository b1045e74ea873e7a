//! Key streams and a hit-rate driver shared by the engine benchmarks.

use lfukit::traits::FrequencyEngine;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy)]
pub enum Workload {
    /// Uniform random keys in `[0, universe)`.
    Uniform,
    /// Hot/cold split with a configurable hot fraction and hot access probability.
    Hotset { hot_fraction: f64, hot_prob: f64 },
    /// Sequential scan in `[0, universe)`.
    Scan,
    /// Zipfian distribution; `theta` 0.0 is uniform, 0.99 is the YCSB default skew.
    Zipfian { theta: f64 },
}

#[derive(Debug, Clone, Copy)]
pub struct WorkloadSpec {
    pub universe: u64,
    pub workload: Workload,
    pub seed: u64,
}

impl WorkloadSpec {
    pub fn generator(self) -> WorkloadGenerator {
        WorkloadGenerator::new(self.universe, self.workload, self.seed)
    }
}

#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    universe: u64,
    workload: Workload,
    rng: SmallRng,
    scan_pos: u64,
    zipfian: Option<ZipfianState>,
}

impl WorkloadGenerator {
    pub fn new(universe: u64, workload: Workload, seed: u64) -> Self {
        let universe = universe.max(1);
        let zipfian = match workload {
            Workload::Zipfian { theta } => Some(ZipfianState::new(universe, theta)),
            _ => None,
        };
        Self {
            universe,
            workload,
            rng: SmallRng::seed_from_u64(seed),
            scan_pos: 0,
            zipfian,
        }
    }

    pub fn next_key(&mut self) -> u64 {
        match self.workload {
            Workload::Uniform => self.rng.random_range(0..self.universe),
            Workload::Hotset {
                hot_fraction,
                hot_prob,
            } => {
                let hot_size = ((self.universe as f64) * hot_fraction.clamp(0.0, 1.0)).round() as u64;
                let hot_size = hot_size.clamp(1, self.universe);
                if self.rng.random_bool(hot_prob.clamp(0.0, 1.0)) || hot_size == self.universe {
                    self.rng.random_range(0..hot_size)
                } else {
                    self.rng.random_range(hot_size..self.universe)
                }
            },
            Workload::Scan => {
                let key = self.scan_pos;
                self.scan_pos = (self.scan_pos + 1) % self.universe;
                key
            },
            Workload::Zipfian { .. } => {
                let u: f64 = self.rng.random();
                match &self.zipfian {
                    Some(zipf) => zipf.sample(u),
                    None => 0,
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HitRate {
    pub hits: u64,
    pub misses: u64,
}

impl HitRate {
    pub fn hit_rate(self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Runs `operations` lookups, inserting the key as its own value on a miss.
pub fn run_hit_rate<E>(engine: &mut E, generator: &mut WorkloadGenerator, operations: usize) -> HitRate
where
    E: FrequencyEngine<u64, u64>,
{
    let mut stats = HitRate::default();
    for _ in 0..operations {
        let key = generator.next_key();
        if engine.val(&key, 1).is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
            engine.put(key, key, 1);
        }
    }
    stats
}

/// Zipfian sampler over `[0, n)` by inverse CDF on a cumulative weight table.
#[derive(Debug, Clone)]
struct ZipfianState {
    cumulative: Vec<f64>,
}

impl ZipfianState {
    fn new(n: u64, theta: f64) -> Self {
        let theta = theta.max(0.0);
        let mut total = 0.0;
        let cumulative = (1..=n)
            .map(|rank| {
                total += (rank as f64).powf(-theta);
                total
            })
            .collect();
        Self { cumulative }
    }

    fn sample(&self, u: f64) -> u64 {
        let Some(&total) = self.cumulative.last() else {
            return 0;
        };
        let target = u * total;
        let idx = self.cumulative.partition_point(|&w| w <= target);
        idx.min(self.cumulative.len() - 1) as u64
    }
}
