//! Round-robin placement within a single bucket.
//!
//! Candidates are taken at `(seed + i) mod len(items)` for attempt `i`.
//! Sub-buckets are accepted as-is (the caller descends into them); disks
//! are accepted only if their status meets the requested minimum. The scan
//! is bounded by [`MAX_PLACEMENT_ATTEMPTS`], so a heavily degraded bucket
//! fails fast with `ENOSPC` instead of being scanned end to end.

use tracing::{debug, trace, warn};

use placegrid_cluster::ClusterData;
use placegrid_core::ItemRef;

use crate::error::PlacementError;
use crate::result::PlacementResult;
use crate::seed::{RRSeed, SharedRRSeed};
use crate::strategy::{PlacementStrategy, StrategyArgs};

/// Upper bound on candidate evaluations per `choose_items` call.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 20;

/// Element at cyclic position `seed` of `items`.
pub fn pick_index_rr<T: Copy>(items: &[T], seed: usize) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    Some(items[seed % items.len()])
}

/// Round-robin strategy over a pluggable seed source.
#[derive(Debug)]
pub struct RoundRobinPlacement<S = SharedRRSeed> {
    seed: S,
}

impl<S: RRSeed> RoundRobinPlacement<S> {
    pub fn new(seed: S) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> &S {
        &self.seed
    }

    /// Validate the request and run the bounded selection loop.
    pub fn try_choose(
        &self,
        data: &ClusterData,
        args: StrategyArgs,
    ) -> Result<Vec<ItemRef>, PlacementError> {
        if args.n_replicas == 0 {
            return Err(PlacementError::ZeroReplicas);
        }
        let bucket_index = args
            .bucket
            .bucket_index()
            .ok_or(PlacementError::InvalidBucket(args.bucket))?;

        let wanted = usize::from(args.n_replicas);
        let buckets = data.bucket_count();
        let seeds = self.seed.num_seeds();
        if buckets < wanted {
            return Err(PlacementError::ReplicasExceedBuckets {
                replicas: args.n_replicas,
                buckets,
            });
        }
        if buckets > seeds {
            return Err(PlacementError::BucketsExceedSeeds { buckets, seeds });
        }
        if bucket_index as usize >= buckets {
            return Err(PlacementError::BucketOutOfRange {
                bucket: args.bucket,
                buckets,
            });
        }

        let bucket = data
            .bucket(bucket_index)
            .ok_or(PlacementError::InvalidBucket(args.bucket))?;
        if bucket.items.is_empty() {
            return Err(PlacementError::EmptyBucket(args.bucket));
        }
        if bucket.items.len() < wanted {
            return Err(PlacementError::ReplicasExceedBucketSize {
                bucket: args.bucket,
                size: bucket.items.len(),
                replicas: args.n_replicas,
            });
        }

        let rr_seed = self
            .seed
            .get(bucket_index as usize, wanted)
            .ok_or(PlacementError::BucketsExceedSeeds { buckets, seeds })?;

        let mut ids = Vec::with_capacity(wanted);
        for attempt in 0..MAX_PLACEMENT_ATTEMPTS {
            if ids.len() == wanted {
                break;
            }
            let Some(item) = pick_index_rr(&bucket.items, rr_seed.wrapping_add(attempt)) else {
                break;
            };
            if ids.contains(&item) {
                continue;
            }
            if let ItemRef::Disk(disk_id) = item {
                let disk = data.disk(disk_id).ok_or(PlacementError::DiskOutOfRange {
                    disk: disk_id,
                    disks: data.disk_count(),
                })?;
                let status = disk.status();
                if status < args.status {
                    trace!(disk = disk_id, %status, attempt, "skipping unusable disk");
                    continue;
                }
            }
            ids.push(item);
        }

        if ids.len() != wanted {
            warn!(
                bucket = %args.bucket,
                placed = ids.len(),
                wanted,
                "attempt budget exhausted"
            );
            return Err(PlacementError::NotEnoughItems {
                bucket: args.bucket,
                placed: ids.len(),
                wanted: args.n_replicas,
            });
        }

        debug!(bucket = %args.bucket, seed = rr_seed, ?ids, "items chosen");
        Ok(ids)
    }
}

impl<S: RRSeed> PlacementStrategy for RoundRobinPlacement<S> {
    fn choose_items(&self, data: &ClusterData, args: StrategyArgs) -> PlacementResult {
        self.try_choose(data, args).into()
    }
}
