//! Experience-point aggregation
//!
//! Totals, recent activity, cumulative series and monthly buckets over an
//! already-filtered record set. Raw amounts are bytes of XP; display units
//! divide by the configured scale (1000 → kB).

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{ProgressRecord, TransactionRecord};

/// Label used when a record has no attached object
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One point of the cumulative series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    /// Running total in display units (unrounded)
    pub value: f64,
    pub label: String,
    /// Raw amount of this record
    pub increment: u64,
}

/// Entry of the recent-activity list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub name: String,
    pub amount: u64,
    /// Amount in display units, rounded up
    pub display_amount: u64,
    pub created_at: DateTime<Utc>,
}

/// Headline numbers for the stats cards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityStats {
    /// Raw total
    pub total_xp: u64,
    /// Raw total over the trailing window
    pub recent_xp: u64,
    pub completed_projects: usize,
    pub total_projects: usize,
}

/// XP earned in one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    /// "YYYY-MM"
    pub month: String,
    /// Short month name ("Jan")
    pub label: String,
    pub amount: u64,
}

/// Aggregation with a fixed display scale
#[derive(Debug, Clone, Copy)]
pub struct XpAggregator {
    scale: u64,
}

impl Default for XpAggregator {
    fn default() -> Self {
        Self { scale: 1000 }
    }
}

impl XpAggregator {
    /// Trailing window for `ActivityStats::recent_xp`
    pub const RECENT_WINDOW_DAYS: i64 = 30;

    /// Months kept by `monthly_totals` by default
    pub const DEFAULT_MONTHS: usize = 9;

    /// A zero scale is treated as 1
    pub fn new(scale: u64) -> Self {
        Self {
            scale: scale.max(1),
        }
    }

    pub fn scale(&self) -> u64 {
        self.scale
    }

    /// Sum of amounts
    pub fn raw_total(records: &[TransactionRecord]) -> u64 {
        records.iter().map(|r| r.amount).sum()
    }

    /// Sum of amounts in display units, rounded to nearest
    pub fn total_xp(&self, records: &[TransactionRecord]) -> u64 {
        let sum: u128 = records.iter().map(|r| u128::from(r.amount)).sum();
        let scale = u128::from(self.scale);
        ((sum + scale / 2) / scale) as u64
    }

    /// The `n` most recent records, newest first
    pub fn recent_activity(&self, records: &[TransactionRecord], n: usize) -> Vec<ActivityEntry> {
        let mut sorted: Vec<&TransactionRecord> = records.iter().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        sorted
            .into_iter()
            .take(n)
            .map(|record| ActivityEntry {
                id: record.id,
                name: record.object_name().unwrap_or("Unknown Project").to_string(),
                amount: record.amount,
                display_amount: record.amount.div_ceil(self.scale),
                created_at: record.created_at,
            })
            .collect()
    }

    /// Running total per record in ascending time order
    pub fn cumulative_series(&self, records: &[TransactionRecord]) -> Vec<ChartPoint> {
        let mut sorted: Vec<&TransactionRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.created_at);

        let scale = self.scale as f64;
        let mut running: u64 = 0;

        sorted
            .into_iter()
            .map(|record| {
                running = running.saturating_add(record.amount);
                ChartPoint {
                    timestamp: record.created_at,
                    value: running as f64 / scale,
                    label: record.object_name().unwrap_or(UNKNOWN_LABEL).to_string(),
                    increment: record.amount,
                }
            })
            .collect()
    }

    /// Totals for the stats cards, relative to `now`
    pub fn activity_stats(
        &self,
        records: &[TransactionRecord],
        progress: &[ProgressRecord],
        now: DateTime<Utc>,
    ) -> ActivityStats {
        let cutoff = now - Duration::days(Self::RECENT_WINDOW_DAYS);

        ActivityStats {
            total_xp: Self::raw_total(records),
            recent_xp: records
                .iter()
                .filter(|r| r.created_at >= cutoff)
                .map(|r| r.amount)
                .sum(),
            completed_projects: progress.iter().filter(|p| p.is_completed()).count(),
            total_projects: progress.len(),
        }
    }

    /// Raw XP per calendar month (UTC), oldest first, last `limit` months
    pub fn monthly_totals(&self, records: &[TransactionRecord], limit: usize) -> Vec<MonthlyTotal> {
        let mut months: BTreeMap<(i32, u32), u64> = BTreeMap::new();
        for record in records {
            let key = (record.created_at.year(), record.created_at.month());
            *months.entry(key).or_default() += record.amount;
        }

        let skip = months.len().saturating_sub(limit);
        months
            .into_iter()
            .skip(skip)
            .map(|((year, month), amount)| MonthlyTotal {
                month: format!("{year}-{month:02}"),
                label: month_label(month).to_string(),
                amount,
            })
            .collect()
    }
}

fn month_label(month: u32) -> &'static str {
    const LABELS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    LABELS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?")
}
