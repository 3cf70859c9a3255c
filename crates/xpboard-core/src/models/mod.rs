//! Data models for xpboard

pub mod progress;
pub mod skill;
pub mod transaction;

pub use progress::ProgressRecord;
pub use skill::SkillRecord;
pub use transaction::{ObjectRef, ObjectType, ParentRef, TransactionRecord};

use serde::{Deserialize, Serialize};

/// The `user` row every query response is wrapped in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub login: String,
}
