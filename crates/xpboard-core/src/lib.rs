//! xpboard-core - Core library for xpboard
//!
//! Provides folder taxonomy, query filters, XP aggregation, skill
//! normalization, chart engines and the query client behind the dashboard.

pub mod aggregate;
pub mod auth;
pub mod chart;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod skills;
pub mod taxonomy;

pub use aggregate::{ActivityEntry, ActivityStats, ChartPoint, MonthlyTotal, XpAggregator};
pub use auth::{Credential, CredentialProvider, StaticCredentials};
pub use config::{DashboardConfig, RadarConfig, TimelineConfig};
pub use error::{CoreError, Result, ViewError};
pub use filter::{FilterBuilder, FilterPredicate};
pub use pipeline::{ActiveChart, AnalyticsPipeline, DashboardView, LoadOutcome, ViewState};
pub use query::{Dataset, HttpTransport, QueryRequest, QueryResponse, QueryService, QueryTransport};
pub use skills::{normalize_skills, Skill, SkillSummary};
pub use taxonomy::{FolderTaxonomy, TaxonomyExtractor, ALL_FOLDERS};
