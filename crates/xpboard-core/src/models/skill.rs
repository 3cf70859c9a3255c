//! Skill level records

use serde::{Deserialize, Serialize};

/// Raw skill transaction: a `skill_*` type code and its level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    #[serde(rename = "type")]
    pub code: String,

    /// Level, 0-100 by convention
    #[serde(rename = "amount")]
    pub level: i64,
}

impl SkillRecord {
    pub fn new(code: impl Into<String>, level: i64) -> Self {
        Self {
            code: code.into(),
            level,
        }
    }
}
