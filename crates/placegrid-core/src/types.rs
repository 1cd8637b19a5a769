//! Domain types shared by every placegrid layer.
//!
//! The external collaborators (namespace services, config loaders) speak a
//! signed item id where negative values name buckets and positive values name
//! disks. Inside placegrid that id space is the tagged [`ItemRef`]; the signed
//! form only appears at the serde boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Raw signed item id used by external collaborators.
pub type RawItemId = i32;

/// Index of a bucket (absolute value of its raw id).
pub type BucketIndex = u32;

/// Id of a disk (always positive in raw form).
pub type DiskId = u32;

/// Index of the root bucket.
pub const ROOT_BUCKET: BucketIndex = 0;

/// Largest bucket index or disk id expressible as a [`RawItemId`].
pub const MAX_ITEM_INDEX: u32 = RawItemId::MAX.unsigned_abs();

/// Failed to parse a textual name into a domain enum.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseNameError {
    pub kind: &'static str,
    pub value: String,
}

/// A bucket index or disk id above [`MAX_ITEM_INDEX`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("item index {0} exceeds the signed id range (max {max})", max = MAX_ITEM_INDEX)]
pub struct ItemIdOverflow(pub u32);

// ── Item references ───────────────────────────────────────────────

/// A child of a bucket: either another bucket or a leaf disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RawItemId")]
pub enum ItemRef {
    Bucket(BucketIndex),
    Disk(DiskId),
}

impl ItemRef {
    /// Decode a raw signed id. Zero and negative values are buckets.
    pub fn from_raw(raw: RawItemId) -> Self {
        if raw > 0 {
            ItemRef::Disk(raw.unsigned_abs())
        } else {
            ItemRef::Bucket(raw.unsigned_abs())
        }
    }

    /// Encode back into the signed form.
    ///
    /// Fails for indices above [`MAX_ITEM_INDEX`], which have no signed
    /// encoding.
    pub fn raw(self) -> Result<RawItemId, ItemIdOverflow> {
        match self {
            ItemRef::Bucket(index) => RawItemId::try_from(index)
                .map(|raw| -raw)
                .map_err(|_| ItemIdOverflow(index)),
            ItemRef::Disk(id) => RawItemId::try_from(id).map_err(|_| ItemIdOverflow(id)),
        }
    }

    pub fn is_bucket(self) -> bool {
        matches!(self, ItemRef::Bucket(_))
    }

    pub fn is_disk(self) -> bool {
        matches!(self, ItemRef::Disk(_))
    }

    pub fn bucket_index(self) -> Option<BucketIndex> {
        match self {
            ItemRef::Bucket(index) => Some(index),
            ItemRef::Disk(_) => None,
        }
    }

    pub fn disk_id(self) -> Option<DiskId> {
        match self {
            ItemRef::Disk(id) => Some(id),
            ItemRef::Bucket(_) => None,
        }
    }
}

impl From<RawItemId> for ItemRef {
    fn from(raw: RawItemId) -> Self {
        ItemRef::from_raw(raw)
    }
}

impl TryFrom<ItemRef> for RawItemId {
    type Error = ItemIdOverflow;

    fn try_from(item: ItemRef) -> Result<Self, Self::Error> {
        item.raw()
    }
}

impl Serialize for ItemRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Bucket(ROOT_BUCKET) => f.write_str("0"),
            ItemRef::Bucket(index) => write!(f, "-{index}"),
            ItemRef::Disk(id) => write!(f, "{id}"),
        }
    }
}

// ── Bucket types ──────────────────────────────────────────────────

/// Level of a bucket in the topology tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BucketType {
    Group,
    Rack,
    Room,
    Site,
    Root,
    /// Operator-defined level outside the standard set.
    Custom(u8),
}

impl fmt::Display for BucketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketType::Group => f.write_str("group"),
            BucketType::Rack => f.write_str("rack"),
            BucketType::Room => f.write_str("room"),
            BucketType::Site => f.write_str("site"),
            BucketType::Root => f.write_str("root"),
            BucketType::Custom(n) => write!(f, "custom:{n}"),
        }
    }
}

impl FromStr for BucketType {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseNameError {
            kind: "bucket type",
            value: s.to_string(),
        };
        match s.to_ascii_lowercase().as_str() {
            "group" => Ok(BucketType::Group),
            "rack" => Ok(BucketType::Rack),
            "room" => Ok(BucketType::Room),
            "site" => Ok(BucketType::Site),
            "root" => Ok(BucketType::Root),
            other => other
                .strip_prefix("custom:")
                .and_then(|n| n.parse::<u8>().ok())
                .map(BucketType::Custom)
                .ok_or_else(err),
        }
    }
}

impl TryFrom<String> for BucketType {
    type Error = ParseNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BucketType> for String {
    fn from(value: BucketType) -> Self {
        value.to_string()
    }
}

// ── Disk status ───────────────────────────────────────────────────

/// Usability of a disk, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DiskStatus {
    Off = 0,
    Ro = 1,
    Rw = 2,
}

impl DiskStatus {
    /// Decode the byte stored in an atomic status cell.
    ///
    /// Unknown values decode as `Off` so a corrupt cell is never selected.
    pub fn from_u8(value: u8) -> Self {
        match value {
            2 => DiskStatus::Rw,
            1 => DiskStatus::Ro,
            _ => DiskStatus::Off,
        }
    }
}

impl fmt::Display for DiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskStatus::Off => f.write_str("off"),
            DiskStatus::Ro => f.write_str("ro"),
            DiskStatus::Rw => f.write_str("rw"),
        }
    }
}

impl FromStr for DiskStatus {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(DiskStatus::Off),
            "ro" => Ok(DiskStatus::Ro),
            "rw" => Ok(DiskStatus::Rw),
            _ => Err(ParseNameError {
                kind: "disk status",
                value: s.to_string(),
            }),
        }
    }
}

// ── Level rules ───────────────────────────────────────────────────

/// How many items to pick when descending through a bucket of a given type.
///
/// Serialized as a signed integer: `-1` delegates the full replica count,
/// a positive value is an exact count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum LevelRule {
    #[default]
    AllReplicas,
    Exactly(u16),
}

impl LevelRule {
    /// Resolve the rule against the request's replica count.
    pub fn items_for(self, n_replicas: u16) -> u16 {
        match self {
            LevelRule::AllReplicas => n_replicas,
            LevelRule::Exactly(n) => n,
        }
    }
}

impl TryFrom<i64> for LevelRule {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(LevelRule::AllReplicas),
            n if n > 0 && n <= i64::from(u16::MAX) => Ok(LevelRule::Exactly(n as u16)),
            n => Err(format!("level rule must be -1 or in 1..=65535, got {n}")),
        }
    }
}

impl From<LevelRule> for i64 {
    fn from(rule: LevelRule) -> Self {
        match rule {
            LevelRule::AllReplicas => -1,
            LevelRule::Exactly(n) => i64::from(n),
        }
    }
}
