//! Hover/zoom state machine for the time-series chart
//!
//! Hovering a point that has a neighbour within the cluster window zooms the
//! chart about that point. Leaving starts a cancellable exit delay; a hover
//! that arrives before it fires cancels it. [`transition`] is pure and
//! returns at most one [`TimerCommand`]; [`ZoomController`] applies commands
//! to an injected [`DebounceTimer`].

use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::timeseries::TimeSeriesChart;
use crate::config::TimelineConfig;

/// Scale-about-a-point transform applied to base chart coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomState {
    pub scale: f64,
    pub focal_x: f64,
    pub focal_y: f64,
    pub zoomed: bool,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self::IDLE
    }
}

impl ZoomState {
    pub const IDLE: ZoomState = ZoomState {
        scale: 1.0,
        focal_x: 0.0,
        focal_y: 0.0,
        zoomed: false,
    };

    pub fn focused(scale: f64, focal_x: f64, focal_y: f64) -> Self {
        Self {
            scale,
            focal_x,
            focal_y,
            zoomed: true,
        }
    }

    pub fn apply_x(&self, x: f64) -> f64 {
        if self.zoomed {
            self.focal_x + (x - self.focal_x) * self.scale
        } else {
            x
        }
    }

    pub fn apply_y(&self, y: f64) -> f64 {
        if self.zoomed {
            self.focal_y + (y - self.focal_y) * self.scale
        } else {
            y
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.apply_x(x), self.apply_y(y))
    }
}

/// Input events, serialized by arrival order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomEvent {
    Hover(usize),
    Leave,
    /// Exit delay elapsed for the given ticket
    TimerFired(u64),
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start { ticket: u64, delay: Duration },
    Cancel,
}

/// Zoom parameters taken from the timeline config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomSettings {
    pub scale: f64,
    pub cluster_window: chrono::Duration,
    pub exit_delay: Duration,
}

impl From<&TimelineConfig> for ZoomSettings {
    fn from(config: &TimelineConfig) -> Self {
        Self {
            scale: config.zoom_scale,
            cluster_window: config.cluster_window(),
            exit_delay: config.exit_delay(),
        }
    }
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self::from(&TimelineConfig::default())
    }
}

/// Complete machine state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoomSnapshot {
    pub zoom: ZoomState,
    pub hovered: Option<usize>,
    /// Ticket of the outstanding exit timer
    pub pending_exit: Option<u64>,
    pub next_ticket: u64,
}

impl ZoomSnapshot {
    pub fn is_zoomed(&self) -> bool {
        self.zoom.zoomed
    }
}

/// Pure transition function
pub fn transition(
    snapshot: &ZoomSnapshot,
    event: ZoomEvent,
    chart: &TimeSeriesChart,
    settings: &ZoomSettings,
) -> (ZoomSnapshot, Option<TimerCommand>) {
    let mut next = *snapshot;

    match event {
        ZoomEvent::Hover(index) => {
            let Some((x, y)) = chart.base_coords(index) else {
                return (next, None);
            };

            let command = next.pending_exit.take().map(|_| TimerCommand::Cancel);
            next.hovered = Some(index);

            // Isolated points keep whatever zoom is active
            if chart.is_clustered(index, settings.cluster_window) {
                next.zoom = ZoomState::focused(settings.scale, x, y);
            }
            (next, command)
        }
        ZoomEvent::Leave => {
            let ticket = next.next_ticket;
            next.next_ticket += 1;
            next.pending_exit = Some(ticket);
            (
                next,
                Some(TimerCommand::Start {
                    ticket,
                    delay: settings.exit_delay,
                }),
            )
        }
        ZoomEvent::TimerFired(ticket) => {
            if next.pending_exit != Some(ticket) {
                // Cancelled or superseded
                return (next, None);
            }
            next.zoom = ZoomState::IDLE;
            next.hovered = None;
            next.pending_exit = None;
            (next, None)
        }
    }
}

/// Single outstanding cancellable timer
pub trait DebounceTimer {
    /// Arm the timer, replacing any outstanding one
    fn start(&mut self, ticket: u64, delay: Duration);

    /// Disarm the outstanding timer, if any
    fn cancel(&mut self);
}

/// Timer backed by a tokio task that delivers `TimerFired` over a channel
pub struct TokioDebounceTimer {
    events: mpsc::UnboundedSender<ZoomEvent>,
    pending: Option<JoinHandle<()>>,
}

impl TokioDebounceTimer {
    /// Create a timer and the receiver its events arrive on
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ZoomEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                events: tx,
                pending: None,
            },
            rx,
        )
    }

    pub fn is_armed(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl DebounceTimer for TokioDebounceTimer {
    fn start(&mut self, ticket: u64, delay: Duration) {
        self.cancel();
        let events = self.events.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(ZoomEvent::TimerFired(ticket));
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for TokioDebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Drives the state machine for one chart instance
pub struct ZoomController<T: DebounceTimer> {
    snapshot: ZoomSnapshot,
    settings: ZoomSettings,
    timer: T,
}

impl<T: DebounceTimer> ZoomController<T> {
    pub fn new(timer: T, settings: ZoomSettings) -> Self {
        Self {
            snapshot: ZoomSnapshot::default(),
            settings,
            timer,
        }
    }

    pub fn snapshot(&self) -> &ZoomSnapshot {
        &self.snapshot
    }

    pub fn zoom(&self) -> ZoomState {
        self.snapshot.zoom
    }

    pub fn hovered(&self) -> Option<usize> {
        self.snapshot.hovered
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Apply one event and execute the resulting timer command
    pub fn handle(&mut self, event: ZoomEvent, chart: &TimeSeriesChart) -> ZoomState {
        let (next, command) = transition(&self.snapshot, event, chart, &self.settings);

        if next.zoom != self.snapshot.zoom {
            tracing::debug!(?event, zoomed = next.zoom.zoomed, "Zoom state changed");
        }

        match command {
            Some(TimerCommand::Start { ticket, delay }) => self.timer.start(ticket, delay),
            Some(TimerCommand::Cancel) => self.timer.cancel(),
            None => {}
        }

        self.snapshot = next;
        self.snapshot.zoom
    }

    /// Drop zoom and any pending exit, e.g. when the dataset is replaced
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.snapshot = ZoomSnapshot {
            next_ticket: self.snapshot.next_ticket,
            ..ZoomSnapshot::default()
        };
    }
}
