//! Topology model: buckets, disks, and the immutable cluster snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use placegrid_core::{BucketIndex, BucketType, DiskId, DiskStatus, ItemRef};

// ── Disk ──────────────────────────────────────────────────────────

/// Lock-free status cell read by schedulers and written by the health
/// collaborator. Relaxed ordering: readers may observe a stale status.
#[derive(Debug)]
pub struct AtomicDiskStatus(AtomicU8);

impl AtomicDiskStatus {
    pub fn new(status: DiskStatus) -> Self {
        Self(AtomicU8::new(status as u8))
    }

    pub fn load(&self) -> DiskStatus {
        DiskStatus::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, status: DiskStatus) {
        self.0.store(status as u8, Ordering::Relaxed);
    }
}

/// A leaf storage unit.
///
/// Cloning a disk shares its status cell, so every snapshot that contains
/// the disk observes the same status.
#[derive(Debug, Clone)]
pub struct Disk {
    pub id: DiskId,
    pub weight: u16,
    status: Arc<AtomicDiskStatus>,
}

impl Disk {
    pub fn new(id: DiskId, status: DiskStatus, weight: u16) -> Self {
        Self {
            id,
            weight,
            status: Arc::new(AtomicDiskStatus::new(status)),
        }
    }

    /// Single relaxed load of the current status.
    pub fn status(&self) -> DiskStatus {
        self.status.load()
    }

    pub fn set_status(&self, status: DiskStatus) {
        self.status.store(status);
    }

    pub fn item_ref(&self) -> ItemRef {
        ItemRef::Disk(self.id)
    }
}

// ── Bucket ────────────────────────────────────────────────────────

/// An internal node of the topology tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub id: BucketIndex,
    pub bucket_type: BucketType,
    /// Children in insertion order: sub-buckets and disks.
    pub items: Vec<ItemRef>,
}

impl Bucket {
    pub fn new(id: BucketIndex, bucket_type: BucketType) -> Self {
        Self {
            id,
            bucket_type,
            items: Vec::new(),
        }
    }

    pub fn item_ref(&self) -> ItemRef {
        ItemRef::Bucket(self.id)
    }
}

// ── Snapshot ──────────────────────────────────────────────────────

/// Point-in-time view of the topology.
///
/// Built by a [`StorageHandler`](crate::StorageHandler) and published by
/// [`ClusterMgr`](crate::ClusterMgr) behind an `Arc`; never mutated once
/// published apart from the disks' atomic status cells.
#[derive(Debug, Clone, Default)]
pub struct ClusterData {
    pub(crate) epoch: u64,
    /// Indexed by bucket index; unregistered slots are `None`.
    pub(crate) buckets: Vec<Option<Bucket>>,
    /// Indexed by `disk_id - 1`.
    pub(crate) disks: Vec<Option<Disk>>,
}

impl ClusterData {
    /// Assemble a snapshot from raw tables without validation.
    ///
    /// Bucket `i` belongs in `buckets[i]`, disk `d` in `disks[d - 1]`.
    /// Prefer [`ClusterMgr`](crate::ClusterMgr), which keeps the tree
    /// consistent.
    pub fn from_parts(epoch: u64, buckets: Vec<Option<Bucket>>, disks: Vec<Option<Disk>>) -> Self {
        Self {
            epoch,
            buckets,
            disks,
        }
    }

    /// Generation of this snapshot, bumped on every committed edit.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of bucket slots, registered or not.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Size of the disk table (highest disk id).
    pub fn disk_count(&self) -> usize {
        self.disks.len()
    }

    pub fn bucket(&self, index: BucketIndex) -> Option<&Bucket> {
        self.buckets.get(index as usize)?.as_ref()
    }

    pub fn disk(&self, id: DiskId) -> Option<&Disk> {
        let slot = (id as usize).checked_sub(1)?;
        self.disks.get(slot)?.as_ref()
    }

    /// Resolve an item to its bucket if it names a registered bucket.
    pub fn resolve_bucket(&self, item: ItemRef) -> Option<&Bucket> {
        self.bucket(item.bucket_index()?)
    }

    pub fn is_valid_bucket(&self, item: ItemRef) -> bool {
        self.resolve_bucket(item).is_some()
    }

    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter().flatten()
    }

    pub fn disks(&self) -> impl Iterator<Item = &Disk> {
        self.disks.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloned_disk_shares_status() {
        let disk = Disk::new(1, DiskStatus::Rw, 1);
        let copy = disk.clone();

        copy.set_status(DiskStatus::Off);
        assert_eq!(disk.status(), DiskStatus::Off);
    }

    #[test]
    fn disk_lookup_rejects_zero_and_out_of_range() {
        let data = ClusterData {
            epoch: 0,
            buckets: vec![Some(Bucket::new(0, BucketType::Root))],
            disks: vec![Some(Disk::new(1, DiskStatus::Rw, 1)), None],
        };

        assert!(data.disk(0).is_none());
        assert_eq!(data.disk(1).map(|d| d.id), Some(1));
        assert!(data.disk(2).is_none());
        assert!(data.disk(3).is_none());
        assert_eq!(data.disk_count(), 2);
    }

    #[test]
    fn resolve_bucket_only_accepts_registered_buckets() {
        let data = ClusterData {
            epoch: 0,
            buckets: vec![Some(Bucket::new(0, BucketType::Root)), None],
            disks: Vec::new(),
        };

        assert!(data.is_valid_bucket(ItemRef::Bucket(0)));
        assert!(!data.is_valid_bucket(ItemRef::Bucket(1)));
        assert!(!data.is_valid_bucket(ItemRef::Bucket(5)));
        assert!(!data.is_valid_bucket(ItemRef::Disk(1)));
        assert_eq!(data.bucket_count(), 2);
        assert_eq!(data.buckets().count(), 1);
    }
}
