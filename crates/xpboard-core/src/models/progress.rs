//! Progress (grade) records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::transaction::ObjectRef;

/// Latest grade for a piece of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub id: i64,

    /// Absent while the work is still in progress
    #[serde(default)]
    pub grade: Option<f64>,

    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub object: Option<ObjectRef>,
}

impl ProgressRecord {
    /// A grade above zero counts as a pass
    pub fn is_completed(&self) -> bool {
        self.grade.is_some_and(|g| g > 0.0)
    }

    pub fn object_name(&self) -> &str {
        self.object
            .as_ref()
            .map(|o| o.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown Project")
    }
}
