//! Error types for topology construction.

use placegrid_core::{BucketIndex, DiskId, MAX_ITEM_INDEX, RawItemId};
use thiserror::Error;

/// Result type alias for topology operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors raised while building or mutating the cluster topology.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClusterError {
    #[error("bucket -{index} exceeds reserved capacity of {capacity} slots")]
    BucketOutOfRange { index: BucketIndex, capacity: usize },

    #[error("bucket index {0} exceeds the largest representable index {max}", max = MAX_ITEM_INDEX)]
    BucketIndexTooLarge(BucketIndex),

    #[error("bucket -{0} already exists")]
    DuplicateBucket(BucketIndex),

    #[error("parent bucket -{0} does not exist")]
    UnknownParent(BucketIndex),

    #[error("bucket -{0} needs a parent, only root buckets may be detached")]
    MissingParent(BucketIndex),

    #[error("item {0} is not a bucket id")]
    NotABucket(RawItemId),

    #[error("disk id 0 is reserved")]
    InvalidDiskId,

    #[error("disk id {0} exceeds the largest representable id {max}", max = MAX_ITEM_INDEX)]
    DiskIdTooLarge(DiskId),

    #[error("disk {0} already exists")]
    DuplicateDisk(DiskId),

    #[error("disk {0} does not exist")]
    UnknownDisk(DiskId),
}
