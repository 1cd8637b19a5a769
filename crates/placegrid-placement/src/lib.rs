//! placegrid placement — choosing children of a single bucket.
//!
//! This crate decides which items of one bucket receive replicas. It does
//! NOT walk the topology tree (that's `placegrid-scheduler`); it is the
//! per-level step the scheduler invokes while descending.
//!
//! # Components
//!
//! - **`seed`** — Round-robin seed sources (shared atomic, thread-local)
//! - **`strategy`** — The `PlacementStrategy` trait and its factory
//! - **`round_robin`** — Bounded round-robin selection with status filtering
//! - **`result`** / **`error`** — Boundary result type and failure taxonomy

pub mod error;
pub mod result;
pub mod round_robin;
pub mod seed;
pub mod strategy;

pub use error::{ErrorKind, PlacementError};
pub use result::PlacementResult;
pub use round_robin::{MAX_PLACEMENT_ATTEMPTS, RoundRobinPlacement, pick_index_rr};
pub use seed::{RRSeed, SharedRRSeed, ThreadLocalRRSeed};
pub use strategy::{PlacementStrategy, StrategyArgs, make_placement_strategy};
