//! The placement strategy seam.

use placegrid_cluster::ClusterData;
use placegrid_core::{DiskStatus, ItemRef, PlacementStrategyKind};

use crate::result::PlacementResult;
use crate::round_robin::RoundRobinPlacement;
use crate::seed::{SharedRRSeed, ThreadLocalRRSeed};

/// Arguments for a single-bucket selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyArgs {
    /// Bucket whose children are candidates.
    pub bucket: ItemRef,
    /// Number of children to pick.
    pub n_replicas: u16,
    /// Minimum acceptable disk status.
    pub status: DiskStatus,
}

/// Picks `n_replicas` children of one bucket from a snapshot.
///
/// Implementations are shared between scheduling threads and must never
/// block.
pub trait PlacementStrategy: Send + Sync {
    fn choose_items(&self, data: &ClusterData, args: StrategyArgs) -> PlacementResult;
}

/// Build the strategy selected by configuration with `max_buckets` seed
/// streams.
pub fn make_placement_strategy(
    kind: PlacementStrategyKind,
    max_buckets: usize,
) -> Box<dyn PlacementStrategy> {
    match kind {
        PlacementStrategyKind::RoundRobin => {
            Box::new(RoundRobinPlacement::new(SharedRRSeed::new(max_buckets)))
        }
        PlacementStrategyKind::ThreadLocalRoundRobin => {
            Box::new(RoundRobinPlacement::new(ThreadLocalRRSeed::new(max_buckets)))
        }
    }
}
