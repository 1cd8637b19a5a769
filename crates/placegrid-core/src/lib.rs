pub mod config;
pub mod types;

pub use config::{
    BucketEntry, ConfigError, ConfigResult, DiskEntry, PlacegridConfig, PlacementStrategyKind,
    SchedulerConfig, TopologyConfig,
};
pub use types::*;
