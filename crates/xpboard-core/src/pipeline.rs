//! Analytics pipeline
//!
//! Sequences one dashboard refresh: taxonomy fetch, filtered dataset fetch,
//! then the pure computations. Shared state sits behind `parking_lot` locks so
//! the pipeline can be held in an `Arc` and driven from several tasks; a
//! dataset that arrives after the user switched folders is dropped.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::aggregate::{ActivityEntry, ActivityStats, ChartPoint, MonthlyTotal, XpAggregator};
use crate::auth::CredentialProvider;
use crate::chart::{layout_radar, ChartKind, RadarLayout, TimeSeriesChart};
use crate::config::DashboardConfig;
use crate::error::{CoreError, Result, ViewError};
use crate::filter::{FilterBuilder, FilterPredicate};
use crate::models::{ProgressRecord, UserProfile};
use crate::query::{Dataset, HttpTransport, QueryService, QueryTransport};
use crate::skills::{normalize_skills, SkillSummary};
use crate::taxonomy::{FolderTaxonomy, TaxonomyExtractor, ALL_FOLDERS};

/// Everything the dashboard shows for one folder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub category: String,
    pub user: UserProfile,
    /// Display units
    pub total_xp: u64,
    pub recent_activity: Vec<ActivityEntry>,
    pub skills: SkillSummary,
    pub progress: Vec<ProgressRecord>,
    pub series: Vec<ChartPoint>,
    pub stats: ActivityStats,
    pub monthly: Vec<MonthlyTotal>,
}

impl DashboardView {
    /// Derive every view field from a fetched dataset
    pub fn compute(
        category: impl Into<String>,
        dataset: &Dataset,
        config: &DashboardConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let aggregator = XpAggregator::new(config.xp_scale);
        let records = &dataset.xp_transactions;

        Self {
            category: category.into(),
            user: dataset.user.clone(),
            total_xp: aggregator.total_xp(records),
            recent_activity: aggregator.recent_activity(records, config.recent_count),
            skills: normalize_skills(&dataset.skill_transactions),
            progress: dataset.progresses.clone(),
            series: aggregator.cumulative_series(records),
            stats: aggregator.activity_stats(records, &dataset.progresses, now),
            monthly: aggregator.monthly_totals(records, XpAggregator::DEFAULT_MONTHS),
        }
    }
}

/// What the caller renders
#[derive(Debug, Clone, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading {
        category: String,
    },
    Ready(Arc<DashboardView>),
    Failed(ViewError),
}

impl ViewState {
    pub fn view(&self) -> Option<&Arc<DashboardView>> {
        match self {
            ViewState::Ready(view) => Some(view),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading { .. })
    }
}

/// Result of a dataset load
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(Arc<DashboardView>),
    /// The selection changed while the fetch was in flight; nothing was applied
    Stale { requested: String, current: String },
}

impl LoadOutcome {
    pub fn view(&self) -> Option<&Arc<DashboardView>> {
        match self {
            LoadOutcome::Loaded(view) => Some(view),
            LoadOutcome::Stale { .. } => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, LoadOutcome::Stale { .. })
    }
}

/// Geometry for the active chart
#[derive(Debug, Clone)]
pub enum ActiveChart {
    Timeline(TimeSeriesChart),
    Radar(RadarLayout),
}

pub struct AnalyticsPipeline {
    config: DashboardConfig,
    service: QueryService,
    extractor: TaxonomyExtractor,
    filters: FilterBuilder,
    taxonomy: RwLock<FolderTaxonomy>,
    selected: RwLock<String>,
    state: RwLock<ViewState>,
    chart_kind: RwLock<ChartKind>,
}

impl AnalyticsPipeline {
    pub fn new(
        config: DashboardConfig,
        transport: Arc<dyn QueryTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            extractor: TaxonomyExtractor::new(config.root_segment.clone()),
            filters: FilterBuilder::from_config(&config),
            service: QueryService::new(transport, credentials),
            taxonomy: RwLock::new(FolderTaxonomy::new()),
            selected: RwLock::new(ALL_FOLDERS.to_string()),
            state: RwLock::new(ViewState::Idle),
            chart_kind: RwLock::new(ChartKind::None),
            config,
        }
    }

    /// Pipeline talking HTTP to `config.endpoint`
    pub fn connect(config: DashboardConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let transport = HttpTransport::new(config.endpoint.clone())?;
        Ok(Self::new(config, Arc::new(transport), credentials))
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn taxonomy(&self) -> FolderTaxonomy {
        self.taxonomy.read().clone()
    }

    pub fn selected(&self) -> String {
        self.selected.read().clone()
    }

    pub fn state(&self) -> ViewState {
        self.state.read().clone()
    }

    pub fn chart_kind(&self) -> ChartKind {
        *self.chart_kind.read()
    }

    pub fn set_chart_kind(&self, kind: ChartKind) {
        *self.chart_kind.write() = kind;
    }

    /// Predicate for a folder, as the dataset query will send it
    pub fn predicate_for(&self, category: &str) -> FilterPredicate {
        self.filters.build(category)
    }

    /// Fetch every XP record and rebuild the folder taxonomy
    pub async fn refresh_taxonomy(&self) -> Result<FolderTaxonomy> {
        let start = Instant::now();

        let records = match self.service.fetch_taxonomy_records().await {
            Ok(records) => records,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        let taxonomy = self.extractor.extract(&records);
        tracing::info!(
            records = records.len(),
            folders = taxonomy.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Folder taxonomy loaded"
        );

        *self.taxonomy.write() = taxonomy.clone();
        Ok(taxonomy)
    }

    /// Make `category` the current selection and load its dataset
    pub async fn select_category(&self, category: &str) -> Result<LoadOutcome> {
        *self.selected.write() = category.to_string();
        self.load_category(category).await
    }

    /// Load `category`, applying the result only if it is still selected when
    /// the fetch completes
    pub async fn load_category(&self, category: &str) -> Result<LoadOutcome> {
        let start = Instant::now();
        let requested = category.to_string();

        // Only the selected folder may move the view into `Loading`
        {
            let selected = self.selected.read();
            if *selected == requested {
                *self.state.write() = ViewState::Loading {
                    category: requested.clone(),
                };
            }
        }

        let predicate = self.filters.build(&requested);
        let fetched = self.service.fetch_dataset(&predicate).await;
        let computed = fetched.map(|dataset| {
            let view = DashboardView::compute(requested.as_str(), &dataset, &self.config, Utc::now());
            (Arc::new(view), dataset.xp_transactions.len())
        });

        // Selection is held until the result is committed
        let selected = self.selected.read();
        if *selected != requested {
            let current = selected.clone();
            tracing::warn!(
                requested = %requested,
                current = %current,
                "Discarding dataset for a folder that is no longer selected"
            );
            return Ok(LoadOutcome::Stale { requested, current });
        }

        let (view, records) = match computed {
            Ok(computed) => computed,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };
        *self.state.write() = ViewState::Ready(Arc::clone(&view));
        drop(selected);

        tracing::info!(
            category = %requested,
            records,
            skills = view.skills.all.len(),
            total_xp = view.total_xp,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dashboard loaded"
        );

        Ok(LoadOutcome::Loaded(view))
    }

    /// Taxonomy, then the dataset for the current selection
    ///
    /// A selection that vanished from the new taxonomy falls back to `"all"`.
    pub async fn refresh(&self) -> Result<LoadOutcome> {
        let taxonomy = self.refresh_taxonomy().await?;

        let category = {
            let mut selected = self.selected.write();
            if selected.as_str() != ALL_FOLDERS && !taxonomy.contains(&selected) {
                tracing::debug!(folder = %selected, "Selected folder no longer exists");
                *selected = ALL_FOLDERS.to_string();
            }
            selected.clone()
        };

        self.load_category(&category).await
    }

    /// Time-series chart over the loaded view
    pub fn timeline_chart(&self) -> Option<TimeSeriesChart> {
        let state = self.state.read();
        let view = state.view()?;
        Some(TimeSeriesChart::new(view.series.clone(), &self.config.timeline))
    }

    /// Radar layout over the loaded view
    pub fn radar_layout(&self) -> Option<RadarLayout> {
        let state = self.state.read();
        let view = state.view()?;
        Some(layout_radar(&view.skills.all, &self.config.radar))
    }

    /// Geometry for whichever chart is selected
    pub fn active_chart(&self) -> Option<ActiveChart> {
        match self.chart_kind() {
            ChartKind::None => None,
            ChartKind::Timeline => self.timeline_chart().map(ActiveChart::Timeline),
            ChartKind::Radar => self.radar_layout().map(ActiveChart::Radar),
        }
    }

    fn fail(&self, error: &CoreError) {
        tracing::warn!(error = %error, "Dashboard refresh failed");
        *self.state.write() = ViewState::Failed(ViewError::from_core_error(error));
    }
}
