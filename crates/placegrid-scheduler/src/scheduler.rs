//! FlatScheduler — turns a whole-tree placement request into disk ids.
//!
//! Two traversal modes:
//! - **General BFS**: every bucket on the queue picks as many children as
//!   its level's rule asks for; chosen sub-buckets are queued, chosen disks
//!   are collected. Supports fan-out at any level ("2 groups, N disks each").
//! - **Default placement**: a single path. Pick one child per level until the
//!   replica-bearing level (GROUP), which picks all replicas at once.
//!
//! Both are all-or-nothing: the first failing strategy call is returned
//! verbatim, and a successful result always holds exactly `n_replicas` disks.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use placegrid_cluster::ClusterData;
use placegrid_core::{
    BucketType, DiskStatus, ItemRef, LevelRule, PlacegridConfig, PlacementStrategyKind,
    ROOT_BUCKET, SchedulerConfig,
};
use placegrid_placement::{
    PlacementError, PlacementResult, PlacementStrategy, StrategyArgs, make_placement_strategy,
};

/// Level at which default placement requests all replicas at once.
pub const REPLICA_BEARING_LEVEL: BucketType = BucketType::Group;

/// A whole-tree placement request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementArguments {
    /// Subtree to place into.
    pub bucket: ItemRef,
    pub n_replicas: u16,
    /// Minimum acceptable disk status.
    pub status: DiskStatus,
    /// Items to pick per bucket type. Absent types delegate all replicas.
    pub rules: HashMap<BucketType, LevelRule>,
    pub default_placement: bool,
}

impl PlacementArguments {
    /// `n_replicas` read-write disks anywhere under the root, default path.
    pub fn new(n_replicas: u16) -> Self {
        Self {
            bucket: ItemRef::Bucket(ROOT_BUCKET),
            n_replicas,
            status: DiskStatus::Rw,
            rules: HashMap::new(),
            default_placement: true,
        }
    }

    /// Request shaped by the `[scheduler]` and `[rules]` config tables.
    pub fn from_config(n_replicas: u16, config: &PlacegridConfig) -> Self {
        Self {
            status: config.scheduler.min_status,
            rules: config.rules.clone(),
            default_placement: config.scheduler.default_placement,
            ..Self::new(n_replicas)
        }
    }

    pub fn with_bucket(mut self, bucket: ItemRef) -> Self {
        self.bucket = bucket;
        self
    }

    pub fn with_status(mut self, status: DiskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_rule(mut self, bucket_type: BucketType, rule: LevelRule) -> Self {
        self.rules.insert(bucket_type, rule);
        self
    }

    pub fn with_default_placement(mut self, default_placement: bool) -> Self {
        self.default_placement = default_placement;
        self
    }

    /// Items to pick when descending through a bucket of `bucket_type`.
    pub fn items_for(&self, bucket_type: BucketType) -> u16 {
        self.rules
            .get(&bucket_type)
            .copied()
            .unwrap_or_default()
            .items_for(self.n_replicas)
    }
}

/// Tree-descending scheduler over a pluggable placement strategy.
pub struct FlatScheduler {
    strategy: Box<dyn PlacementStrategy>,
}

impl FlatScheduler {
    /// Round-robin scheduler with `max_buckets` seed streams.
    pub fn new(kind: PlacementStrategyKind, max_buckets: usize) -> Self {
        Self::with_strategy(make_placement_strategy(kind, max_buckets))
    }

    pub fn with_strategy(strategy: Box<dyn PlacementStrategy>) -> Self {
        Self { strategy }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.strategy, config.max_buckets)
    }

    /// Place `args.n_replicas` replicas under `args.bucket`.
    pub fn schedule(&self, data: &ClusterData, args: &PlacementArguments) -> PlacementResult {
        if args.n_replicas == 0 {
            return PlacementError::ZeroReplicas.into();
        }
        if !data.is_valid_bucket(args.bucket) {
            return PlacementError::InvalidBucket(args.bucket).into();
        }

        let result = if args.default_placement {
            self.schedule_default(data, args)
        } else {
            self.schedule_bfs(data, args)
        };

        if result.is_ok() {
            debug!(
                epoch = data.epoch(),
                bucket = %args.bucket,
                ids = ?result.ids,
                "replicas placed"
            );
        }
        result
    }

    /// Shorthand for [`PlacementArguments::new`].
    pub fn schedule_replicas(&self, data: &ClusterData, n_replicas: u16) -> PlacementResult {
        self.schedule(data, &PlacementArguments::new(n_replicas))
    }

    fn schedule_bfs(&self, data: &ClusterData, args: &PlacementArguments) -> PlacementResult {
        let mut queue = VecDeque::from([args.bucket]);
        let mut placed = Vec::with_capacity(usize::from(args.n_replicas));
        let mut visited = 0;

        while let Some(bucket_ref) = queue.pop_front() {
            let Some(bucket) = data.resolve_bucket(bucket_ref) else {
                return PlacementError::InvalidBucket(bucket_ref).into();
            };
            visited += 1;
            if visited > data.bucket_count() {
                return PlacementError::DepthExceeded(data.bucket_count()).into();
            }

            let sub = self.strategy.choose_items(
                data,
                StrategyArgs {
                    bucket: bucket_ref,
                    n_replicas: args.items_for(bucket.bucket_type),
                    status: args.status,
                },
            );
            if !sub.is_ok() {
                return sub;
            }

            for item in sub.ids {
                match item {
                    ItemRef::Bucket(_) => queue.push_back(item),
                    ItemRef::Disk(_) => placed.push(item),
                }
            }
        }

        if placed.len() != usize::from(args.n_replicas) {
            warn!(
                placed = placed.len(),
                wanted = args.n_replicas,
                "placement rules do not match replica count"
            );
            return PlacementError::RuleMismatch {
                placed: placed.len(),
                wanted: args.n_replicas,
            }
            .into();
        }
        PlacementResult::success(placed)
    }

    fn schedule_default(&self, data: &ClusterData, args: &PlacementArguments) -> PlacementResult {
        let wanted = usize::from(args.n_replicas);
        let mut bucket_ref = args.bucket;

        for _ in 0..data.bucket_count() {
            let Some(bucket) = data.resolve_bucket(bucket_ref) else {
                return PlacementError::InvalidBucket(bucket_ref).into();
            };
            let n_replicas = if bucket.bucket_type == REPLICA_BEARING_LEVEL {
                args.n_replicas
            } else {
                1
            };

            let sub = self.strategy.choose_items(
                data,
                StrategyArgs {
                    bucket: bucket_ref,
                    n_replicas,
                    status: args.status,
                },
            );
            if !sub.is_ok() {
                return sub;
            }
            let Some(&first) = sub.ids.first() else {
                return PlacementError::NotEnoughItems {
                    bucket: bucket_ref,
                    placed: 0,
                    wanted: args.n_replicas,
                }
                .into();
            };

            if sub.ids.len() == wanted && sub.ids.iter().all(|item| item.is_disk()) {
                return sub;
            }
            match first {
                ItemRef::Bucket(_) => bucket_ref = first,
                ItemRef::Disk(_) => {
                    return PlacementError::DescentEnded {
                        disk: first,
                        placed: sub.ids.len(),
                        wanted: args.n_replicas,
                    }
                    .into();
                }
            }
        }

        PlacementError::DepthExceeded(data.bucket_count()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placegrid_cluster::{Bucket, ClusterMgr, Disk};
    use placegrid_placement::ErrorKind;

    fn two_level(mgr: &ClusterMgr) {
        let mut sh = mgr.storage_handler(16);
        sh.add_bucket(BucketType::Root, 0, None).unwrap();
        sh.add_bucket(BucketType::Group, 1, Some(0)).unwrap();
        sh.add_bucket(BucketType::Group, 2, Some(0)).unwrap();
        for id in 1..=3 {
            sh.add_disk(Disk::new(id, DiskStatus::Rw, 1), 1).unwrap();
        }
        for id in 4..=6 {
            sh.add_disk(Disk::new(id, DiskStatus::Rw, 1), 2).unwrap();
        }
    }

    fn scheduler() -> FlatScheduler {
        FlatScheduler::new(PlacementStrategyKind::RoundRobin, 16)
    }

    #[test]
    fn default_args_target_root() {
        let args = PlacementArguments::new(3);
        assert_eq!(args.bucket, ItemRef::Bucket(0));
        assert_eq!(args.status, DiskStatus::Rw);
        assert!(args.default_placement);
        assert_eq!(args.items_for(BucketType::Site), 3);

        let args = args.with_rule(BucketType::Site, LevelRule::Exactly(1));
        assert_eq!(args.items_for(BucketType::Site), 1);
    }

    #[test]
    fn args_from_config_copy_rules_and_status() {
        let mut config = PlacegridConfig::default();
        config.scheduler.min_status = DiskStatus::Ro;
        config.scheduler.default_placement = false;
        config.rules.insert(BucketType::Group, LevelRule::Exactly(2));

        let args = PlacementArguments::from_config(4, &config);
        assert_eq!(args.n_replicas, 4);
        assert_eq!(args.status, DiskStatus::Ro);
        assert!(!args.default_placement);
        assert_eq!(args.items_for(BucketType::Group), 2);
    }

    #[test]
    fn rejects_zero_replicas_before_any_work() {
        let empty = ClusterData::default();
        let result = scheduler().schedule_replicas(&empty, 0);
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidRequest));
        assert_eq!(result.err_msg, "zero replicas requested");
    }

    #[test]
    fn rejects_invalid_root() {
        let mgr = ClusterMgr::new();
        two_level(&mgr);
        let data = mgr.cluster_data();

        for bucket in [ItemRef::Bucket(9), ItemRef::Bucket(40), ItemRef::Disk(1)] {
            let args = PlacementArguments::new(1).with_bucket(bucket);
            let result = scheduler().schedule(&data, &args);
            assert_eq!(result.error_kind(), Some(ErrorKind::InvalidRequest));
            assert!(result.ids.is_empty());
        }
    }

    #[test]
    fn default_placement_descends_to_one_group() {
        let mgr = ClusterMgr::new();
        two_level(&mgr);
        let data = mgr.cluster_data();
        let s = scheduler();

        let first = s.schedule_replicas(&data, 2);
        assert!(first.is_ok(), "{}", first.err_msg);
        assert_eq!(first.ids, vec![ItemRef::Disk(1), ItemRef::Disk(2)]);

        // Root's seed advanced, so the next request lands in the other group.
        let second = s.schedule_replicas(&data, 2);
        assert_eq!(second.ids, vec![ItemRef::Disk(4), ItemRef::Disk(5)]);
    }

    #[test]
    fn default_placement_single_replica_returns_a_disk() {
        let mgr = ClusterMgr::new();
        two_level(&mgr);
        let data = mgr.cluster_data();

        let result = scheduler().schedule_replicas(&data, 1);
        assert_eq!(result.ids.len(), 1);
        assert!(result.ids[0].is_disk());
    }

    #[test]
    fn default_placement_fails_when_disks_hang_above_group_level() {
        let mgr = ClusterMgr::new();
        {
            let mut sh = mgr.storage_handler(4);
            sh.add_bucket(BucketType::Root, 0, None).unwrap();
            sh.add_bucket(BucketType::Site, 1, Some(0)).unwrap();
            sh.add_disk(Disk::new(1, DiskStatus::Rw, 1), 1).unwrap();
            sh.add_disk(Disk::new(2, DiskStatus::Rw, 1), 1).unwrap();
        }
        let data = mgr.cluster_data();

        let result = scheduler().schedule_replicas(&data, 2);
        assert_eq!(result.error_kind(), Some(ErrorKind::InsufficientCapacity));
        assert!(result.ids.is_empty());
    }

    #[test]
    fn bfs_fans_out_per_rules() {
        let mgr = ClusterMgr::new();
        two_level(&mgr);
        let data = mgr.cluster_data();

        let args = PlacementArguments::new(4)
            .with_default_placement(false)
            .with_rule(BucketType::Root, LevelRule::Exactly(2))
            .with_rule(BucketType::Group, LevelRule::Exactly(2));
        let result = scheduler().schedule(&data, &args);

        assert!(result.is_ok(), "{}", result.err_msg);
        assert_eq!(
            result.ids,
            vec![
                ItemRef::Disk(1),
                ItemRef::Disk(2),
                ItemRef::Disk(4),
                ItemRef::Disk(5)
            ]
        );
    }

    #[test]
    fn bfs_rejects_rules_that_miss_the_replica_count() {
        let mgr = ClusterMgr::new();
        two_level(&mgr);
        let data = mgr.cluster_data();

        let args = PlacementArguments::new(2)
            .with_default_placement(false)
            .with_rule(BucketType::Root, LevelRule::Exactly(2));
        let result = scheduler().schedule(&data, &args);

        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidRequest));
        assert!(result.err_msg.contains("produced 4 disks for 2 replicas"));
        assert!(result.ids.is_empty());
    }

    #[test]
    fn bfs_propagates_first_sub_failure_verbatim() {
        let mgr = ClusterMgr::new();
        two_level(&mgr);
        mgr.set_disk_status(5, DiskStatus::Off).unwrap();
        mgr.set_disk_status(6, DiskStatus::Off).unwrap();
        let data = mgr.cluster_data();

        let args = PlacementArguments::new(4)
            .with_default_placement(false)
            .with_rule(BucketType::Root, LevelRule::Exactly(2))
            .with_rule(BucketType::Group, LevelRule::Exactly(2));
        let result = scheduler().schedule(&data, &args);

        assert_eq!(result.error_kind(), Some(ErrorKind::InsufficientCapacity));
        assert_eq!(
            result.err_msg,
            "could not find enough items to place replicas: 1 of 2 in bucket -2"
        );
    }

    /// Root → site -1, where the site lists itself as its only child.
    fn self_referencing() -> ClusterData {
        let mut root = Bucket::new(ROOT_BUCKET, BucketType::Root);
        root.items.push(ItemRef::Bucket(1));
        let mut site = Bucket::new(1, BucketType::Site);
        site.items.push(ItemRef::Bucket(1));
        ClusterData::from_parts(1, vec![Some(root), Some(site)], vec![])
    }

    #[test]
    fn cyclic_topology_hits_depth_bound() {
        let data = self_referencing();

        for default_placement in [true, false] {
            let args = PlacementArguments::new(1).with_default_placement(default_placement);
            let result = scheduler().schedule(&data, &args);

            assert_eq!(result.error_kind(), Some(ErrorKind::Range));
            assert_eq!(result.err_msg, "placement descended more than 2 levels");
            assert!(result.ids.is_empty());
        }
    }
}
