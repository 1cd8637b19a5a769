//! Placement failure conditions.
//!
//! Every failure is returned as data. The request layer sees it as a
//! [`PlacementResult`](crate::PlacementResult) carrying an errno-class code
//! and the Display text of the variant.

use placegrid_core::{DiskId, ItemRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a placement failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request itself is malformed.
    InvalidRequest,
    /// A count or id falls outside the snapshot's bounds.
    Range,
    /// The targeted bucket has no children.
    EmptyBucket,
    /// The attempt budget ran out before enough usable items were found.
    InsufficientCapacity,
}

impl ErrorKind {
    /// Classify an errno-class return code. `None` for success or unknown codes.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            libc::EINVAL => Some(ErrorKind::InvalidRequest),
            libc::ERANGE => Some(ErrorKind::Range),
            libc::ENOENT => Some(ErrorKind::EmptyBucket),
            libc::ENOSPC => Some(ErrorKind::InsufficientCapacity),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ErrorKind::InvalidRequest => libc::EINVAL,
            ErrorKind::Range => libc::ERANGE,
            ErrorKind::EmptyBucket => libc::ENOENT,
            ErrorKind::InsufficientCapacity => libc::ENOSPC,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("zero replicas requested")]
    ZeroReplicas,

    #[error("invalid bucket id {0}")]
    InvalidBucket(ItemRef),

    #[error("more replicas than buckets: {replicas} requested, snapshot has {buckets}")]
    ReplicasExceedBuckets { replicas: u16, buckets: usize },

    #[error("more buckets than round-robin seeds: {buckets} buckets, {seeds} seeds")]
    BucketsExceedSeeds { buckets: usize, seeds: usize },

    #[error("bucket index out of range: {bucket} in a snapshot of {buckets} buckets")]
    BucketOutOfRange { bucket: ItemRef, buckets: usize },

    #[error("bucket {0} is empty")]
    EmptyBucket(ItemRef),

    #[error("more replicas than bucket size: bucket {bucket} holds {size} items, {replicas} requested")]
    ReplicasExceedBucketSize {
        bucket: ItemRef,
        size: usize,
        replicas: u16,
    },

    #[error("disk {disk} out of range: disk table holds {disks} entries")]
    DiskOutOfRange { disk: DiskId, disks: usize },

    #[error("could not find enough items to place replicas: {placed} of {wanted} in bucket {bucket}")]
    NotEnoughItems {
        bucket: ItemRef,
        placed: usize,
        wanted: u16,
    },

    #[error("placement reached disk {disk} with {placed} of {wanted} replicas placed")]
    DescentEnded {
        disk: ItemRef,
        placed: usize,
        wanted: u16,
    },

    #[error("placement descended more than {0} levels")]
    DepthExceeded(usize),

    #[error("placement rules produced {placed} disks for {wanted} replicas")]
    RuleMismatch { placed: usize, wanted: u16 },
}

impl PlacementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlacementError::ZeroReplicas
            | PlacementError::InvalidBucket(_)
            | PlacementError::RuleMismatch { .. } => ErrorKind::InvalidRequest,
            PlacementError::ReplicasExceedBuckets { .. }
            | PlacementError::BucketsExceedSeeds { .. }
            | PlacementError::BucketOutOfRange { .. }
            | PlacementError::ReplicasExceedBucketSize { .. }
            | PlacementError::DiskOutOfRange { .. }
            | PlacementError::DepthExceeded(_) => ErrorKind::Range,
            PlacementError::EmptyBucket(_) => ErrorKind::EmptyBucket,
            PlacementError::NotEnoughItems { .. } | PlacementError::DescentEnded { .. } => {
                ErrorKind::InsufficientCapacity
            }
        }
    }

    /// errno-class code for the request layer.
    pub fn code(&self) -> i32 {
        self.kind().code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_errno_classes() {
        assert_eq!(PlacementError::ZeroReplicas.code(), libc::EINVAL);
        assert_eq!(
            PlacementError::ReplicasExceedBuckets { replicas: 3, buckets: 2 }.code(),
            libc::ERANGE
        );
        assert_eq!(PlacementError::EmptyBucket(ItemRef::Bucket(1)).code(), libc::ENOENT);
        assert_eq!(
            PlacementError::NotEnoughItems {
                bucket: ItemRef::Bucket(1),
                placed: 1,
                wanted: 2
            }
            .code(),
            libc::ENOSPC
        );
    }

    #[test]
    fn kind_round_trips_through_code() {
        for kind in [
            ErrorKind::InvalidRequest,
            ErrorKind::Range,
            ErrorKind::EmptyBucket,
            ErrorKind::InsufficientCapacity,
        ] {
            assert_eq!(ErrorKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ErrorKind::from_code(0), None);
    }

    #[test]
    fn messages_name_the_bucket() {
        let msg = PlacementError::EmptyBucket(ItemRef::Bucket(42)).to_string();
        assert_eq!(msg, "bucket -42 is empty");
    }
}
