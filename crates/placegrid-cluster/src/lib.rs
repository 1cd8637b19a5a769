//! placegrid-cluster — topology model and snapshot publication.
//!
//! The topology is a tree of buckets (root → site → group → ...) whose
//! leaves are disks. Schedulers never see it mutate: they work on an
//! `Arc<ClusterData>` obtained from [`ClusterMgr::cluster_data`], while a
//! single writer edits a private copy through a [`StorageHandler`] and
//! publishes it on drop.
//!
//! Disk status is the one exception. It lives in an atomic cell shared by
//! every snapshot, so health changes are visible immediately without a
//! republish.

pub mod error;
pub mod manager;
pub mod topology;
pub mod types;

pub use error::{ClusterError, ClusterResult};
pub use manager::{ClusterMgr, StorageHandler};
pub use types::{AtomicDiskStatus, Bucket, ClusterData, Disk};
