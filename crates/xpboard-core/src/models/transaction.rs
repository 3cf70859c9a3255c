//! Transaction model for experience-point grants
//!
//! Records arrive from the query service in camelCase JSON. Amounts are
//! decoded as unsigned integers, so a negative amount fails deserialization
//! and surfaces as a malformed response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of a platform object
///
/// Unknown tags are preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectType {
    Module,
    Piscine,
    Project,
    Exercise,
    Raid,
    Other(String),
}

impl ObjectType {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectType::Module => "module",
            ObjectType::Piscine => "piscine",
            ObjectType::Project => "project",
            ObjectType::Exercise => "exercise",
            ObjectType::Raid => "raid",
            ObjectType::Other(tag) => tag,
        }
    }

    /// Containers whose children contribute folders to the taxonomy
    pub fn is_folder_container(&self) -> bool {
        matches!(self, ObjectType::Module | ObjectType::Piscine)
    }
}

impl From<String> for ObjectType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "module" => ObjectType::Module,
            "piscine" => ObjectType::Piscine,
            "project" => ObjectType::Project,
            "exercise" => ObjectType::Exercise,
            "raid" => ObjectType::Raid,
            _ => ObjectType::Other(tag),
        }
    }
}

impl From<&str> for ObjectType {
    fn from(tag: &str) -> Self {
        ObjectType::from(tag.to_string())
    }
}

impl From<ObjectType> for String {
    fn from(kind: ObjectType) -> Self {
        match kind {
            ObjectType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One link of an object's parent chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentRef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectType,
}

/// Object a record is attached to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRef {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default = "unknown_type")]
    pub kind: ObjectType,

    /// Parent chain, nearest parent first
    #[serde(default, with = "parent_chain")]
    pub parents: Vec<ParentRef>,
}

fn unknown_type() -> ObjectType {
    ObjectType::Other(String::new())
}

impl ObjectRef {
    pub fn new(name: impl Into<String>, kind: impl Into<ObjectType>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            parents: Vec::new(),
        }
    }

    /// Append a parent (callers add the nearest parent first)
    pub fn with_parent(mut self, name: impl Into<String>, kind: impl Into<ObjectType>) -> Self {
        self.parents.push(ParentRef {
            name: name.into(),
            kind: kind.into(),
        });
        self
    }

    /// The object's direct container
    pub fn nearest_parent(&self) -> Option<&ParentRef> {
        self.parents.first()
    }
}

/// Wire form of the parent chain: `[{ "parent": { "name", "type" } }]`
mod parent_chain {
    use super::ParentRef;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Link<T> {
        parent: Option<T>,
    }

    pub fn serialize<S: Serializer>(parents: &[ParentRef], serializer: S) -> Result<S::Ok, S::Error> {
        let links: Vec<Link<&ParentRef>> = parents.iter().map(|p| Link { parent: Some(p) }).collect();
        links.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ParentRef>, D::Error> {
        let links: Option<Vec<Link<ParentRef>>> = Option::deserialize(deserializer)?;
        Ok(links
            .unwrap_or_default()
            .into_iter()
            .filter_map(|link| link.parent)
            .collect())
    }
}

/// An experience-point transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: i64,

    /// Raw amount in platform units (bytes of XP)
    pub amount: u64,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub object: Option<ObjectRef>,
}

impl TransactionRecord {
    /// Name of the attached object, if any
    pub fn object_name(&self) -> Option<&str> {
        self.object
            .as_ref()
            .map(|o| o.name.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn nearest_parent(&self) -> Option<&ParentRef> {
        self.object.as_ref().and_then(ObjectRef::nearest_parent)
    }
}
