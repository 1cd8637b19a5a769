//! Load a declarative `[topology]` table into a [`ClusterMgr`].

use tracing::info;

use placegrid_core::{BucketIndex, ItemRef, RawItemId, TopologyConfig};

use crate::error::{ClusterError, ClusterResult};
use crate::manager::ClusterMgr;
use crate::types::Disk;

fn bucket_index(raw: RawItemId) -> ClusterResult<BucketIndex> {
    ItemRef::from_raw(raw)
        .bucket_index()
        .ok_or(ClusterError::NotABucket(raw))
}

impl ClusterMgr {
    /// Build a manager whose first snapshot is `topology`.
    pub fn from_topology(topology: &TopologyConfig) -> ClusterResult<Self> {
        let mgr = Self::new();
        mgr.apply_topology(topology)?;
        Ok(mgr)
    }

    /// Add every bucket and disk of `topology` in one commit.
    ///
    /// Buckets may be listed in any order; each is inserted once its parent
    /// exists. On error nothing is published.
    pub fn apply_topology(&self, topology: &TopologyConfig) -> ClusterResult<()> {
        let mut sh = self.storage_handler(topology.required_capacity());

        let mut pending = Vec::with_capacity(topology.buckets.len());
        for entry in &topology.buckets {
            let parent = entry.parent.map(bucket_index).transpose()?;
            pending.push((bucket_index(entry.id)?, entry.bucket_type, parent));
        }

        while !pending.is_empty() {
            let before = pending.len();
            let mut blocked = Vec::new();
            for (id, bucket_type, parent) in pending {
                let ready = parent.is_none_or(|p| sh.data().bucket(p).is_some());
                if ready {
                    if let Err(e) = sh.add_bucket(bucket_type, id, parent) {
                        sh.discard();
                        return Err(e);
                    }
                } else {
                    blocked.push((id, bucket_type, parent));
                }
            }
            if blocked.len() == before {
                let (_, _, parent) = blocked[0];
                sh.discard();
                return Err(ClusterError::UnknownParent(parent.unwrap_or_default()));
            }
            pending = blocked;
        }

        for entry in &topology.disks {
            let result = bucket_index(entry.parent)
                .and_then(|parent| sh.add_disk(Disk::new(entry.id, entry.status, entry.weight), parent));
            if let Err(e) = result {
                sh.discard();
                return Err(e);
            }
        }

        info!(
            buckets = topology.buckets.len(),
            disks = topology.disks.len(),
            "topology loaded"
        );
        Ok(())
    }
}
