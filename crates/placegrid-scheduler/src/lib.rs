//! placegrid-scheduler — hierarchical replica placement.
//!
//! Maps a `PlacementArguments` request onto a `ClusterData` snapshot by
//! descending the bucket tree and invoking a placement strategy per level.
//!
//! # Architecture
//!
//! ```text
//! ClusterMgr ──publishes──▶ Arc<ClusterData>
//!                                │
//! FlatScheduler::schedule(&data, &args)
//!   └── PlacementStrategy::choose_items (once per visited bucket)
//!         └── RRSeed (shared atomic or thread-local offsets)
//! ```
//!
//! Scheduling is synchronous CPU work and never blocks; many threads may
//! call `schedule` on the same snapshot concurrently.

pub mod scheduler;

pub use scheduler::{FlatScheduler, PlacementArguments, REPLICA_BEARING_LEVEL};
