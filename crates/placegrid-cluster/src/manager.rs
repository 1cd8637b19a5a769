//! ClusterMgr — owns the topology and publishes snapshots.
//!
//! Writers go through a [`StorageHandler`], which holds the single-writer
//! lock for its whole lifetime and edits a private copy of the current
//! snapshot. Dropping the handler publishes the copy as a new `Arc`;
//! readers that already hold an older `Arc` keep using it undisturbed.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use placegrid_core::{BucketIndex, BucketType, DiskId, DiskStatus, ItemRef, MAX_ITEM_INDEX};

use crate::error::{ClusterError, ClusterResult};
use crate::types::{Bucket, ClusterData, Disk};

/// Thread-safe owner of the published topology.
#[derive(Debug, Default)]
pub struct ClusterMgr {
    current: RwLock<Arc<ClusterData>>,
    writer: Mutex<()>,
}

impl ClusterMgr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot. Cheap: one read lock and one refcount bump.
    pub fn cluster_data(&self) -> Arc<ClusterData> {
        self.current.read().clone()
    }

    /// Epoch of the current snapshot.
    pub fn epoch(&self) -> u64 {
        self.current.read().epoch
    }

    /// Open a scoped builder with at least `capacity` bucket slots.
    ///
    /// Blocks while another handler is alive.
    pub fn storage_handler(&self, capacity: usize) -> StorageHandler<'_> {
        let guard = self.writer.lock();
        let mut data = ClusterData::clone(&self.current.read());
        if data.buckets.len() < capacity {
            data.buckets.resize(capacity, None);
        }
        StorageHandler {
            mgr: self,
            _guard: guard,
            data,
            discarded: false,
        }
    }

    /// Update a disk's status in place.
    ///
    /// The status cell is shared by every snapshot holding the disk, so no
    /// new snapshot is published.
    pub fn set_disk_status(&self, id: DiskId, status: DiskStatus) -> ClusterResult<()> {
        let data = self.cluster_data();
        let disk = data.disk(id).ok_or(ClusterError::UnknownDisk(id))?;
        disk.set_status(status);
        debug!(disk = id, %status, "disk status updated");
        Ok(())
    }

    fn publish(&self, mut data: ClusterData) {
        let mut current = self.current.write();
        data.epoch = current.epoch + 1;
        info!(
            epoch = data.epoch,
            buckets = data.buckets().count(),
            disks = data.disks().count(),
            "cluster snapshot published"
        );
        *current = Arc::new(data);
    }
}

/// Scoped topology builder. Publishes its edits when dropped, unless it
/// was discarded or the thread is unwinding from a panic.
pub struct StorageHandler<'a> {
    mgr: &'a ClusterMgr,
    _guard: MutexGuard<'a, ()>,
    data: ClusterData,
    discarded: bool,
}

impl StorageHandler<'_> {
    /// Register a bucket and attach it to `parent`.
    ///
    /// Only root buckets may omit the parent.
    pub fn add_bucket(
        &mut self,
        bucket_type: BucketType,
        id: BucketIndex,
        parent: Option<BucketIndex>,
    ) -> ClusterResult<()> {
        if id > MAX_ITEM_INDEX {
            return Err(ClusterError::BucketIndexTooLarge(id));
        }
        let capacity = self.data.buckets.len();
        if id as usize >= capacity {
            return Err(ClusterError::BucketOutOfRange {
                index: id,
                capacity,
            });
        }
        if self.data.buckets[id as usize].is_some() {
            return Err(ClusterError::DuplicateBucket(id));
        }

        match parent {
            Some(parent) => {
                self.bucket_mut(parent)?.items.push(ItemRef::Bucket(id));
            }
            None if bucket_type != BucketType::Root => {
                return Err(ClusterError::MissingParent(id));
            }
            None => {}
        }

        self.data.buckets[id as usize] = Some(Bucket::new(id, bucket_type));
        debug!(bucket = %ItemRef::Bucket(id), %bucket_type, ?parent, "bucket added");
        Ok(())
    }

    /// Register a disk under `parent`.
    pub fn add_disk(&mut self, disk: Disk, parent: BucketIndex) -> ClusterResult<()> {
        if disk.id == 0 {
            return Err(ClusterError::InvalidDiskId);
        }
        if disk.id > MAX_ITEM_INDEX {
            return Err(ClusterError::DiskIdTooLarge(disk.id));
        }
        let slot = disk.id as usize - 1;
        if self.data.disks.get(slot).is_some_and(Option::is_some) {
            return Err(ClusterError::DuplicateDisk(disk.id));
        }

        self.bucket_mut(parent)?.items.push(disk.item_ref());

        if self.data.disks.len() <= slot {
            self.data.disks.resize(slot + 1, None);
        }
        debug!(disk = disk.id, parent = %ItemRef::Bucket(parent), "disk added");
        self.data.disks[slot] = Some(disk);
        Ok(())
    }

    pub fn set_disk_status(&mut self, id: DiskId, status: DiskStatus) -> ClusterResult<()> {
        self.data
            .disk(id)
            .ok_or(ClusterError::UnknownDisk(id))?
            .set_status(status);
        Ok(())
    }

    pub fn set_disk_weight(&mut self, id: DiskId, weight: u16) -> ClusterResult<()> {
        let disk = (id as usize)
            .checked_sub(1)
            .and_then(|slot| self.data.disks.get_mut(slot))
            .and_then(Option::as_mut)
            .ok_or(ClusterError::UnknownDisk(id))?;
        disk.weight = weight;
        Ok(())
    }

    /// The pending snapshot, including uncommitted edits.
    pub fn data(&self) -> &ClusterData {
        &self.data
    }

    /// Drop the handler without publishing its edits.
    pub fn discard(mut self) {
        self.discarded = true;
    }

    fn bucket_mut(&mut self, index: BucketIndex) -> ClusterResult<&mut Bucket> {
        self.data
            .buckets
            .get_mut(index as usize)
            .and_then(Option::as_mut)
            .ok_or(ClusterError::UnknownParent(index))
    }
}

impl Drop for StorageHandler<'_> {
    fn drop(&mut self) {
        if self.discarded {
            debug!("storage handler discarded");
            return;
        }
        if std::thread::panicking() {
            warn!("storage handler dropped during panic, edits abandoned");
            return;
        }
        self.mgr.publish(std::mem::take(&mut self.data));
    }
}
