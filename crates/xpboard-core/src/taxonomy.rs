//! Folder taxonomy derived from transaction paths
//!
//! Paths look like `/athens/div-01/piscine-js/quest-01/ex1`. The folder a
//! record belongs to depends on how deep it sits under the root segment; the
//! rules are declared in [`DEPTH_RULES`].

use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::TransactionRecord;

/// Sentinel folder meaning "no path restriction"
pub const ALL_FOLDERS: &str = "all";

/// Named depth rule, keyed by total segment count (root included)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DepthRule {
    /// `/root/division`: nothing to attribute
    TooShallow,
    /// `/root/division/project`: the division itself
    DivisionLeaf,
    /// `/root/division/folder/exercise`: the nested folder
    NestedLeaf,
    /// Deeper than four segments: collapses onto the nested folder
    CollapsedNested,
}

/// `(min_segments, rule, category segment index)`, checked in order
const DEPTH_RULES: &[(usize, DepthRule, Option<usize>)] = &[
    (5, DepthRule::CollapsedNested, Some(2)),
    (4, DepthRule::NestedLeaf, Some(2)),
    (3, DepthRule::DivisionLeaf, Some(1)),
    (0, DepthRule::TooShallow, None),
];

impl DepthRule {
    /// Rule for a path with `segments` non-empty segments
    pub fn for_depth(segments: usize) -> (DepthRule, Option<usize>) {
        DEPTH_RULES
            .iter()
            .find(|(min, _, _)| segments >= *min)
            .map(|&(_, rule, index)| (rule, index))
            .unwrap_or((DepthRule::TooShallow, None))
    }
}

/// Split a path on `/`, dropping empty segments
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Unique folder names, `"all"` always first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderTaxonomy {
    folders: BTreeSet<String>,
}

impl Default for FolderTaxonomy {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderTaxonomy {
    pub fn new() -> Self {
        Self {
            folders: BTreeSet::new(),
        }
    }

    /// Add a folder; the sentinel and duplicates are ignored
    pub fn insert(&mut self, folder: impl Into<String>) -> bool {
        let folder = folder.into();
        if folder == ALL_FOLDERS {
            return false;
        }
        self.folders.insert(folder)
    }

    pub fn contains(&self, folder: &str) -> bool {
        folder == ALL_FOLDERS || self.folders.contains(folder)
    }

    /// Discovered folders, excluding the sentinel
    pub fn discovered(&self) -> impl Iterator<Item = &str> {
        self.folders.iter().map(String::as_str)
    }

    /// Display order: `"all"` then the discovered folders sorted
    pub fn entries(&self) -> Vec<&str> {
        std::iter::once(ALL_FOLDERS).chain(self.discovered()).collect()
    }

    /// Number of entries including the sentinel
    pub fn len(&self) -> usize {
        self.folders.len() + 1
    }

    /// True when nothing beyond the sentinel was discovered
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}

/// Human-readable folder label
pub fn folder_display_name(folder: &str) -> &str {
    if folder == ALL_FOLDERS {
        "All Folders"
    } else {
        folder
    }
}

/// Derives folders from transaction paths under a fixed root
#[derive(Debug, Clone)]
pub struct TaxonomyExtractor {
    root: String,
}

impl TaxonomyExtractor {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into().trim_matches('/').to_string(),
        }
    }

    /// Apply the depth rules to a path. `None` when the path is outside the
    /// root or too shallow to name a folder.
    pub fn classify<'p>(&self, path: &'p str) -> Option<(DepthRule, &'p str)> {
        let segments = split_path(path);
        if segments.first() != Some(&self.root.as_str()) {
            return None;
        }

        let (rule, index) = DepthRule::for_depth(segments.len());
        index
            .and_then(|i| segments.get(i).copied())
            .map(|folder| (rule, folder))
    }

    /// Folder a record contributes to the taxonomy, if any
    ///
    /// Only records whose nearest parent is a module or piscine qualify.
    pub fn category_for<'r>(&self, record: &'r TransactionRecord) -> Option<&'r str> {
        let parent = record.nearest_parent()?;
        if !parent.kind.is_folder_container() {
            return None;
        }
        self.classify(&record.path).map(|(_, folder)| folder)
    }

    /// Build the taxonomy from a full record set
    pub fn extract(&self, records: &[TransactionRecord]) -> FolderTaxonomy {
        let mut taxonomy = FolderTaxonomy::new();
        let mut skipped = 0usize;

        for record in records {
            match self.category_for(record) {
                Some(folder) => {
                    taxonomy.insert(folder);
                }
                None => skipped += 1,
            }
        }

        tracing::debug!(
            folders = taxonomy.len(),
            records = records.len(),
            skipped,
            "Extracted folder taxonomy"
        );

        taxonomy
    }
}
