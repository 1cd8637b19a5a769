//! Round-robin seed sources.
//!
//! A seed is the starting offset into a bucket's item list. Each call for a
//! bucket advances that bucket's stream by the number of replicas placed, so
//! consecutive placements walk the children cyclically.
//!
//! Two sources are provided:
//! - [`SharedRRSeed`]: one atomic counter per bucket shared by every
//!   thread. Strict fairness across callers, at the cost of contention on
//!   hot buckets.
//! - [`ThreadLocalRRSeed`]: per-thread counters. No contention; fairness
//!   holds only within each thread's own call sequence.

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use thread_local::ThreadLocal;

/// A provider of per-bucket round-robin offsets.
pub trait RRSeed: Send + Sync {
    /// Seed for `bucket_index`, advancing its stream by `n_replicas`.
    ///
    /// Returns `None` when `bucket_index >= num_seeds()`; callers are
    /// expected to have checked capacity beforehand.
    fn get(&self, bucket_index: usize, n_replicas: usize) -> Option<usize>;

    /// Number of independent seed streams.
    fn num_seeds(&self) -> usize;
}

/// Globally shared seed streams, one atomic counter per bucket.
#[derive(Debug)]
pub struct SharedRRSeed {
    seeds: Box<[AtomicUsize]>,
}

impl SharedRRSeed {
    pub fn new(max_buckets: usize) -> Self {
        Self {
            seeds: (0..max_buckets).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    /// Current value of a stream (for diagnostics).
    pub fn current(&self, bucket_index: usize) -> Option<usize> {
        self.seeds
            .get(bucket_index)
            .map(|seed| seed.load(Ordering::Relaxed))
    }
}

impl RRSeed for SharedRRSeed {
    fn get(&self, bucket_index: usize, n_replicas: usize) -> Option<usize> {
        let seed = self.seeds.get(bucket_index)?;
        Some(seed.fetch_add(n_replicas, Ordering::Relaxed))
    }

    fn num_seeds(&self) -> usize {
        self.seeds.len()
    }
}

/// One thread's streams for one source.
#[derive(Debug)]
struct Streams(RefCell<Vec<usize>>);

#[cfg(test)]
thread_local! {
    static LIVE_STREAMS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

impl Streams {
    fn new(max_buckets: usize) -> Self {
        #[cfg(test)]
        LIVE_STREAMS.set(LIVE_STREAMS.get() + 1);
        Streams(RefCell::new(vec![thread_start_offset(); max_buckets]))
    }
}

#[cfg(test)]
impl Drop for Streams {
    fn drop(&mut self) {
        LIVE_STREAMS.set(LIVE_STREAMS.get() - 1);
    }
}

/// Seed streams private to each calling thread.
///
/// Each thread starts its streams at an offset derived from its thread id,
/// so concurrent threads spread over different children from the start.
/// The per-thread tables belong to the source and are freed with it.
#[derive(Debug)]
pub struct ThreadLocalRRSeed {
    streams: ThreadLocal<Streams>,
    max_buckets: usize,
}

impl ThreadLocalRRSeed {
    pub fn new(max_buckets: usize) -> Self {
        Self {
            streams: ThreadLocal::new(),
            max_buckets,
        }
    }
}

fn thread_start_offset() -> usize {
    let mut hasher = DefaultHasher::new();
    std::thread::current().id().hash(&mut hasher);
    hasher.finish() as usize
}

impl RRSeed for ThreadLocalRRSeed {
    fn get(&self, bucket_index: usize, n_replicas: usize) -> Option<usize> {
        if bucket_index >= self.max_buckets {
            return None;
        }
        let streams = self.streams.get_or(|| Streams::new(self.max_buckets));
        let mut stream = streams.0.borrow_mut();
        let seed = stream[bucket_index];
        stream[bucket_index] = seed.wrapping_add(n_replicas);
        Some(seed)
    }

    fn num_seeds(&self) -> usize {
        self.max_buckets
    }
}
