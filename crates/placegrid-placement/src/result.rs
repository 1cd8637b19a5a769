//! The boundary result type handed to the request layer.

use placegrid_core::ItemRef;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, PlacementError};

/// Outcome of a placement call.
///
/// Either `ret_code == 0` and `ids` holds exactly the requested items, or
/// `ret_code` is an errno-class code, `ids` is empty, and `err_msg`
/// describes the failure. Partial results are never returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub ids: Vec<ItemRef>,
    pub ret_code: i32,
    pub err_msg: String,
}

impl PlacementResult {
    pub fn success(ids: Vec<ItemRef>) -> Self {
        Self {
            ids,
            ret_code: 0,
            err_msg: String::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ret_code == 0
    }

    /// Failure classification, `None` on success.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        ErrorKind::from_code(self.ret_code)
    }

    /// Disk ids in selection order. Empty on failure.
    pub fn disk_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.ids.iter().filter_map(|item| item.disk_id())
    }
}

impl From<PlacementError> for PlacementResult {
    fn from(err: PlacementError) -> Self {
        Self {
            ids: Vec::new(),
            ret_code: err.code(),
            err_msg: err.to_string(),
        }
    }
}

impl From<Result<Vec<ItemRef>, PlacementError>> for PlacementResult {
    fn from(result: Result<Vec<ItemRef>, PlacementError>) -> Self {
        match result {
            Ok(ids) => Self::success(ids),
            Err(err) => err.into(),
        }
    }
}
