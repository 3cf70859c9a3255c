//! xpboard - Learning-platform XP dashboard

mod cli;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use xpboard_core::chart::{TokioDebounceTimer, ZoomController, ZoomEvent, ZoomSettings};
use xpboard_core::{
    AnalyticsPipeline, CoreError, DashboardConfig, DashboardView, LoadOutcome, StaticCredentials,
    ViewError,
};

#[derive(Parser)]
#[command(
    name = "xpboard",
    version,
    about = "Learning-platform XP dashboard",
    long_about = "Fetches your XP transactions, skills and progress from the platform's\n\
                  GraphQL endpoint and derives folders, totals, a cumulative timeline\n\
                  and a skill radar.\n\
                  \n\
                  Examples:\n\
                    xpboard folders                        # List discovered folders\n\
                    xpboard summary                        # Totals across all folders\n\
                    xpboard summary --folder piscine-js    # Totals for one folder\n\
                    xpboard timeline --hover 4             # Timeline frame zoomed on point 4\n\
                    xpboard radar                          # Skill radar layout\n\
                  \n\
                  Environment Variables:\n\
                    XPBOARD_ENDPOINT                       # Override the GraphQL endpoint\n\
                    XPBOARD_TOKEN                          # Bearer token\n\
                    XPBOARD_FORMAT                         # Force output format: json|table\n\
                    XPBOARD_NO_COLOR                       # Disable ANSI colors (log-friendly)\n\
                    RUST_LOG                               # Log filter (default: xpboard=info)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// GraphQL endpoint of the query service
    #[arg(long, env = "XPBOARD_ENDPOINT")]
    endpoint: Option<String>,

    /// Bearer token
    #[arg(long, env = "XPBOARD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Config file (default: <config dir>/xpboard/config.json)
    #[arg(long, env = "XPBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Force output format (json|table)
    #[arg(long, env = "XPBOARD_FORMAT", value_parser = ["json", "table"])]
    format: Option<String>,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, env = "XPBOARD_NO_COLOR")]
    no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List folders discovered from transaction paths
    Folders,
    /// Total XP, top skills, recent activity and progress
    Summary {
        /// Folder to restrict to
        #[arg(long, short = 'f', default_value = "all")]
        folder: String,
    },
    /// Cumulative XP timeline frame (JSON)
    Timeline {
        /// Folder to restrict to
        #[arg(long, short = 'f', default_value = "all")]
        folder: String,
        /// Replay a hover over this point index before rendering
        #[arg(long)]
        hover: Option<usize>,
        /// After hovering, leave the chart and wait for the exit delay
        #[arg(long, requires = "hover")]
        leave: bool,
    },
    /// Skill radar layout (JSON)
    Radar,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("xpboard=info,xpboard_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), cli.endpoint.as_deref())?;
    let json = cli.format.as_deref() == Some("json");
    let no_color = cli.no_color;

    let credentials = Arc::new(StaticCredentials::new(cli.token));
    let pipeline = AnalyticsPipeline::connect(config, credentials)
        .map_err(|e| user_error(&e))
        .context("Failed to initialize query client")?;

    match cli.command {
        Command::Folders => run_folders(&pipeline, json, no_color).await?,
        Command::Summary { folder } => run_summary(&pipeline, &folder, json, no_color).await?,
        Command::Timeline {
            folder,
            hover,
            leave,
        } => run_timeline(&pipeline, &folder, hover, leave).await?,
        Command::Radar => run_radar(&pipeline).await?,
    }

    Ok(())
}

/// Config file, then flag/environment overrides
fn load_config(path: Option<&std::path::Path>, endpoint: Option<&str>) -> Result<DashboardConfig> {
    let path = path
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("xpboard").join("config.json")));

    let mut config = match path {
        Some(path) => DashboardConfig::load(&path)
            .map_err(|e| user_error(&e))
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DashboardConfig::default(),
    };

    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint.to_string();
    }
    config.validate().map_err(|e| user_error(&e))?;

    Ok(config)
}

fn user_error(error: &CoreError) -> anyhow::Error {
    anyhow!(ViewError::from_core_error(error).to_string())
}

fn spinner(message: &str, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(message.to_string());
    spinner
}

async fn load_view(pipeline: &AnalyticsPipeline, folder: &str, quiet: bool) -> Result<Arc<DashboardView>> {
    let spinner = spinner("Loading folders...", quiet);

    let taxonomy = pipeline.refresh_taxonomy().await.map_err(|e| {
        spinner.finish_and_clear();
        user_error(&e)
    })?;

    if folder != xpboard_core::ALL_FOLDERS && !taxonomy.contains(folder) {
        tracing::warn!(folder, "Folder not found in taxonomy, querying anyway");
    }

    spinner.set_message(format!("Loading {}...", cli::folder_label(folder)));
    let outcome = pipeline.select_category(folder).await.map_err(|e| {
        spinner.finish_and_clear();
        user_error(&e)
    })?;
    spinner.finish_and_clear();

    match outcome {
        LoadOutcome::Loaded(view) => Ok(view),
        LoadOutcome::Stale { requested, current } => {
            bail!("Selection changed from {requested} to {current} while loading")
        }
    }
}

async fn run_folders(pipeline: &AnalyticsPipeline, json: bool, no_color: bool) -> Result<()> {
    let spinner = spinner("Loading folders...", json);
    let taxonomy = pipeline.refresh_taxonomy().await.map_err(|e| {
        spinner.finish_and_clear();
        user_error(&e)
    })?;
    spinner.finish_and_clear();

    println!("{}", cli::format_folders(&taxonomy, json, no_color));
    Ok(())
}

async fn run_summary(pipeline: &AnalyticsPipeline, folder: &str, json: bool, no_color: bool) -> Result<()> {
    let view = load_view(pipeline, folder, json).await?;
    println!("{}", cli::format_summary(&view, json, no_color));
    Ok(())
}

async fn run_timeline(
    pipeline: &AnalyticsPipeline,
    folder: &str,
    hover: Option<usize>,
    leave: bool,
) -> Result<()> {
    load_view(pipeline, folder, true).await?;
    let chart = pipeline
        .timeline_chart()
        .context("No dashboard data loaded")?;

    let (timer, mut fired) = TokioDebounceTimer::channel();
    let mut zoom = ZoomController::new(timer, ZoomSettings::from(&pipeline.config().timeline));

    if let Some(index) = hover {
        if index >= chart.len() {
            bail!("Point index {index} out of range (chart has {} points)", chart.len());
        }
        zoom.handle(ZoomEvent::Hover(index), &chart);

        if leave {
            zoom.handle(ZoomEvent::Leave, &chart);
            if let Some(event) = fired.recv().await {
                zoom.handle(event, &chart);
            }
        }
    }

    let frame = chart.frame(&zoom.zoom(), zoom.hovered(), Utc::now().year());
    println!("{}", cli::to_json(&frame));
    Ok(())
}

async fn run_radar(pipeline: &AnalyticsPipeline) -> Result<()> {
    load_view(pipeline, xpboard_core::ALL_FOLDERS, true).await?;
    let layout = pipeline.radar_layout().context("No dashboard data loaded")?;
    println!("{}", cli::to_json(&layout));
    Ok(())
}
