//! Query filters for a selected folder
//!
//! A [`FilterPredicate`] is a declarative description of which transactions
//! belong to a folder. It renders to the query service's `where` object and
//! can also be evaluated locally with the same `LIKE` semantics.

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::DashboardConfig;
use crate::taxonomy::ALL_FOLDERS;

/// Transaction type carrying experience points
pub const XP_TYPE: &str = "xp";

/// One alternative of a path union: must match `like`, and must not match
/// `not_like` when present
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathClause {
    pub like: String,
    pub not_like: Option<String>,
}

impl PathClause {
    pub fn like(pattern: impl Into<String>) -> Self {
        Self {
            like: pattern.into(),
            not_like: None,
        }
    }

    pub fn excluding(mut self, pattern: impl Into<String>) -> Self {
        self.not_like = Some(pattern.into());
        self
    }

    pub fn matches(&self, path: &str) -> bool {
        like_match(&self.like, path)
            && !self
                .not_like
                .as_deref()
                .is_some_and(|pattern| like_match(pattern, path))
    }

    fn to_where(&self) -> Value {
        let mut clause = json!({ "path": { "_like": self.like } });
        if let Some(pattern) = &self.not_like {
            clause["_not"] = json!({ "path": { "_like": pattern } });
        }
        clause
    }
}

/// Path restriction of a predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "clauses", rename_all = "snake_case")]
pub enum PathFilter {
    /// No restriction
    Any,
    /// Matches if any clause matches
    AnyOf(Vec<PathClause>),
}

/// Filter for the dataset query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterPredicate {
    pub record_type: String,
    pub paths: PathFilter,
}

impl FilterPredicate {
    /// Hasura-style `where` object (`transaction_bool_exp`)
    pub fn to_where(&self) -> Value {
        let mut clause = json!({ "type": { "_eq": self.record_type } });
        if let PathFilter::AnyOf(alternatives) = &self.paths {
            clause["_or"] = Value::Array(alternatives.iter().map(PathClause::to_where).collect());
        }
        clause
    }

    /// Evaluate the predicate against a record locally
    pub fn matches(&self, record_type: &str, path: &str) -> bool {
        if record_type != self.record_type {
            return false;
        }
        match &self.paths {
            PathFilter::Any => true,
            PathFilter::AnyOf(alternatives) => alternatives.iter().any(|c| c.matches(path)),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.paths == PathFilter::Any
    }
}

/// Builds predicates for folders under a fixed root
#[derive(Debug, Clone)]
pub struct FilterBuilder {
    root: String,
    root_division: String,
    checkpoint: String,
}

impl FilterBuilder {
    pub fn new(
        root: impl Into<String>,
        root_division: impl Into<String>,
        checkpoint: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into().trim_matches('/').to_string(),
            root_division: root_division.into(),
            checkpoint: checkpoint.into(),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(
            &config.root_segment,
            &config.root_division,
            &config.checkpoint_segment,
        )
    }

    /// Folder, root and checkpoint names are escaped, so `_` and `%` in a
    /// name match literally
    pub fn build(&self, folder: &str) -> FilterPredicate {
        let root = escape_like(&self.root);
        let paths = if folder == ALL_FOLDERS {
            PathFilter::Any
        } else if folder == self.root_division {
            // Direct children of the division are leaf exercises; checkpoint
            // exercises are nested one level deeper and kept explicitly.
            let base = format!("/{}/{}", root, escape_like(folder));
            PathFilter::AnyOf(vec![
                PathClause::like(format!("{base}/%")).excluding(format!("{base}/%/%")),
                PathClause::like(format!("{base}/{}/%", escape_like(&self.checkpoint))),
            ])
        } else {
            let folder = escape_like(folder);
            PathFilter::AnyOf(vec![
                PathClause::like(format!("/{root}/{folder}/%")),
                PathClause::like(format!("/{root}/%/{folder}/%")),
            ])
        };

        FilterPredicate {
            record_type: XP_TYPE.to_string(),
            paths,
        }
    }
}

/// Escape `\`, `%` and `_` so `literal` matches only itself inside a
/// `LIKE` pattern
pub fn escape_like(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Compile a SQL `LIKE` pattern: `%` matches any run of characters
/// (including `/`), `_` exactly one, `\` escapes the next character.
/// Case-sensitive and anchored at both ends.
pub fn like_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::from("(?s)^");
    let mut literal = String::new();
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '%' | '_' => {
                expr.push_str(&regex::escape(&literal));
                literal.clear();
                expr.push_str(if c == '%' { ".*" } else { "." });
            }
            '\\' => literal.push(chars.next().unwrap_or('\\')),
            _ => literal.push(c),
        }
    }
    expr.push_str(&regex::escape(&literal));
    expr.push('$');

    Regex::new(&expr)
}

/// Match `text` against a `LIKE` pattern; an uncompilable pattern matches
/// nothing
pub fn like_match(pattern: &str, text: &str) -> bool {
    match like_regex(pattern) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "Skipping uncompilable LIKE pattern");
            false
        }
    }
}
