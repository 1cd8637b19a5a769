//! placegrid.toml configuration parser.
//!
//! The scheduler consumes only resolved values from here: which seed
//! strategy to run, how many seed streams to provision, the per-level
//! placement rules, and optionally a static topology to load at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::types::{BucketType, DiskId, DiskStatus, LevelRule, RawItemId};

/// Errors raised while loading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacegridConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Items to pick per bucket type; absent types delegate all replicas.
    #[serde(default)]
    pub rules: HashMap<BucketType, LevelRule>,
    pub topology: Option<TopologyConfig>,
}

/// Which round-robin seed source backs the placement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategyKind {
    /// One atomic counter per bucket shared by all threads.
    #[default]
    RoundRobin,
    /// Per-thread counters, no cross-thread contention.
    ThreadLocalRoundRobin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub strategy: PlacementStrategyKind,
    /// Number of seed streams; must cover every bucket slot in a snapshot.
    pub max_buckets: usize,
    pub default_placement: bool,
    pub min_status: DiskStatus,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            strategy: PlacementStrategyKind::RoundRobin,
            max_buckets: 256,
            default_placement: true,
            min_status: DiskStatus::Rw,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Bucket slots to reserve. Defaults to the largest bucket index + 1.
    pub capacity: Option<usize>,
    #[serde(rename = "bucket", default)]
    pub buckets: Vec<BucketEntry>,
    #[serde(rename = "disk", default)]
    pub disks: Vec<DiskEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketEntry {
    /// Raw id, zero or negative.
    pub id: RawItemId,
    #[serde(rename = "type")]
    pub bucket_type: BucketType,
    /// Raw id of the parent bucket. Only the root has none.
    pub parent: Option<RawItemId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskEntry {
    pub id: DiskId,
    pub parent: RawItemId,
    #[serde(default = "default_disk_status")]
    pub status: DiskStatus,
    #[serde(default = "default_disk_weight")]
    pub weight: u16,
}

fn default_disk_status() -> DiskStatus {
    DiskStatus::Rw
}

fn default_disk_weight() -> u16 {
    1
}

impl TopologyConfig {
    /// Slot count needed to hold every declared bucket.
    pub fn required_capacity(&self) -> usize {
        let needed = self
            .buckets
            .iter()
            .map(|b| b.id.unsigned_abs() as usize + 1)
            .max()
            .unwrap_or(0);
        self.capacity.unwrap_or(needed).max(needed)
    }
}

impl PlacegridConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rule for a bucket type, falling back to delegating all replicas.
    pub fn rule_for(&self, bucket_type: BucketType) -> LevelRule {
        self.rules.get(&bucket_type).copied().unwrap_or_default()
    }

    /// Scaffold the standard layout: one root, one site, `n_groups` groups
    /// of `disks_per_group` read-write disks each.
    ///
    /// Groups are numbered from -100 downwards, disks from 1 upwards.
    pub fn scaffold(n_groups: usize, disks_per_group: usize) -> Self {
        let capacity = n_groups + 101;

        let mut buckets = vec![
            BucketEntry {
                id: 0,
                bucket_type: BucketType::Root,
                parent: None,
            },
            BucketEntry {
                id: -1,
                bucket_type: BucketType::Site,
                parent: Some(0),
            },
        ];
        buckets.extend((0..n_groups).map(|i| BucketEntry {
            id: -100 - i as RawItemId,
            bucket_type: BucketType::Group,
            parent: Some(-1),
        }));

        let disks = (0..n_groups * disks_per_group)
            .map(|i| DiskEntry {
                id: (i + 1) as DiskId,
                parent: -100 - (i / disks_per_group) as RawItemId,
                status: DiskStatus::Rw,
                weight: 1,
            })
            .collect();

        let mut rules = HashMap::new();
        rules.insert(BucketType::Root, LevelRule::Exactly(1));
        rules.insert(BucketType::Site, LevelRule::Exactly(1));
        rules.insert(BucketType::Group, LevelRule::AllReplicas);

        PlacegridConfig {
            scheduler: SchedulerConfig {
                max_buckets: capacity,
                ..SchedulerConfig::default()
            },
            rules,
            topology: Some(TopologyConfig {
                capacity: Some(capacity),
                buckets,
                disks,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let config = PlacegridConfig::from_toml_str("").unwrap();
        assert_eq!(config.scheduler.strategy, PlacementStrategyKind::RoundRobin);
        assert_eq!(config.scheduler.min_status, DiskStatus::Rw);
        assert!(config.scheduler.default_placement);
        assert!(config.rules.is_empty());
        assert!(config.topology.is_none());
    }

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
[scheduler]
strategy = "thread_local_round_robin"
max_buckets = 64
default_placement = false
min_status = "ro"

[rules]
site = 2
group = -1

[topology]
[[topology.bucket]]
id = 0
type = "root"

[[topology.bucket]]
id = -1
type = "site"
parent = 0

[[topology.disk]]
id = 1
parent = -1

[[topology.disk]]
id = 2
parent = -1
status = "off"
weight = 4
"#;
        let config = PlacegridConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(
            config.scheduler.strategy,
            PlacementStrategyKind::ThreadLocalRoundRobin
        );
        assert_eq!(config.scheduler.max_buckets, 64);
        assert!(!config.scheduler.default_placement);
        assert_eq!(config.scheduler.min_status, DiskStatus::Ro);
        assert_eq!(config.rule_for(BucketType::Site), LevelRule::Exactly(2));
        assert_eq!(config.rule_for(BucketType::Group), LevelRule::AllReplicas);
        assert_eq!(config.rule_for(BucketType::Rack), LevelRule::AllReplicas);

        let topology = config.topology.unwrap();
        assert_eq!(topology.buckets.len(), 2);
        assert_eq!(topology.buckets[1].parent, Some(0));
        assert_eq!(topology.disks[0].status, DiskStatus::Rw);
        assert_eq!(topology.disks[0].weight, 1);
        assert_eq!(topology.disks[1].status, DiskStatus::Off);
        assert_eq!(topology.required_capacity(), 2);
    }

    #[test]
    fn test_rejects_zero_rule() {
        let result = PlacegridConfig::from_toml_str("[rules]\ngroup = 0\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_scaffold_layout() {
        let config = PlacegridConfig::scaffold(4, 12);
        let topology = config.topology.as_ref().unwrap();

        assert_eq!(topology.buckets.len(), 6);
        assert_eq!(topology.disks.len(), 48);
        assert_eq!(topology.disks[11].parent, -100);
        assert_eq!(topology.disks[12].parent, -101);
        assert_eq!(topology.required_capacity(), 105);
        assert_eq!(config.scheduler.max_buckets, 105);
    }

    #[test]
    fn test_scaffold_survives_file_round_trip() {
        let config = PlacegridConfig::scaffold(2, 3);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("placegrid.toml");
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = PlacegridConfig::from_file(&path).unwrap();
        let topology = loaded.topology.as_ref().unwrap();
        assert_eq!(topology.disks.len(), 6);
        assert_eq!(loaded.rule_for(BucketType::Site), LevelRule::Exactly(1));
        assert_eq!(loaded.scheduler.max_buckets, 103);
    }

    #[test]
    fn test_missing_file() {
        let result = PlacegridConfig::from_file(Path::new("/nonexistent/placegrid.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
