//! Terminal formatters for the dashboard views
//!
//! Every formatter renders either a comfy-table (human) or pretty JSON.

use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use serde::Serialize;
use xpboard_core::models::ProgressRecord;
use xpboard_core::taxonomy::folder_display_name;
use xpboard_core::{DashboardView, FolderTaxonomy};

// ============================================================================
// Formatters
// ============================================================================

/// Pretty JSON, `{}` if serialization fails
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Folder list as table (human) or JSON array
pub fn format_folders(taxonomy: &FolderTaxonomy, json: bool, no_color: bool) -> String {
    let entries = taxonomy.entries();
    if json {
        return to_json(&entries);
    }

    if taxonomy.is_empty() {
        return "No folders found.".to_string();
    }

    let mut table = new_table(&["Folder", "Label"], no_color);
    for folder in entries {
        table.add_row(Row::from(vec![folder, folder_display_name(folder)]));
    }
    table.to_string()
}

/// Full dashboard summary (human) or the view as JSON
pub fn format_summary(view: &DashboardView, json: bool, no_color: bool) -> String {
    if json {
        return to_json(view);
    }

    let mut lines = vec![];
    lines.push(format!("User:             {} (#{})", view.user.login, view.user.id));
    lines.push(format!("Folder:           {}", folder_label(&view.category)));
    lines.push(format!("Total XP:         {} kB", view.total_xp));
    lines.push(format!(
        "Last 30 days:     {}",
        format_xp(view.stats.recent_xp)
    ));
    lines.push(format!(
        "Projects:         {}/{} completed",
        view.stats.completed_projects, view.stats.total_projects
    ));
    lines.push(String::new());

    lines.push("Top skills:".to_string());
    if view.skills.is_empty() {
        lines.push("  No skills yet.".to_string());
    } else {
        let mut table = new_table(&["Skill", "Level"], no_color);
        for skill in view.skills.top() {
            table.add_row(Row::from(vec![skill.name.clone(), format!("{}%", skill.level)]));
        }
        lines.push(table.to_string());
    }
    lines.push(String::new());

    lines.push("Recent activity:".to_string());
    if view.recent_activity.is_empty() {
        lines.push("  No activity yet.".to_string());
    } else {
        let mut table = new_table(&["Project", "XP", "Date"], no_color);
        for entry in &view.recent_activity {
            table.add_row(Row::from(vec![
                truncate(&entry.name, 40),
                format!("+{} kB", entry.display_amount),
                entry.created_at.format("%Y-%m-%d").to_string(),
            ]));
        }
        lines.push(table.to_string());
    }
    lines.push(String::new());

    lines.push("Recent progress:".to_string());
    if view.progress.is_empty() {
        lines.push("  No progress yet.".to_string());
    } else {
        let mut table = new_table(&["Project", "Status", "Updated"], no_color);
        for progress in &view.progress {
            table.add_row(Row::from(vec![
                truncate(progress.object_name(), 40),
                progress_status(progress).to_string(),
                progress.updated_at.format("%Y-%m-%d").to_string(),
            ]));
        }
        lines.push(table.to_string());
    }

    if !view.monthly.is_empty() {
        lines.push(String::new());
        lines.push("Monthly XP:".to_string());
        let mut table = new_table(&["Month", "XP"], no_color);
        for month in &view.monthly {
            table.add_row(Row::from(vec![
                format!("{} ({})", month.label, month.month),
                format_xp(month.amount),
            ]));
        }
        lines.push(table.to_string());
    }

    lines.join("\n")
}

// ============================================================================
// Utilities
// ============================================================================

/// Human label for a folder key
pub fn folder_label(folder: &str) -> &str {
    folder_display_name(folder)
}

fn new_table(headers: &[&str], no_color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    // Apply colors only if enabled
    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }
    table
}

fn progress_status(progress: &ProgressRecord) -> &'static str {
    match progress.grade {
        None => "In progress",
        Some(_) if progress.is_completed() => "Completed",
        Some(_) => "Failed",
    }
}

/// Raw XP amount with a decimal unit
fn format_xp(amount: u64) -> String {
    if amount >= 1_000_000 {
        format!("{:.2} MB", amount as f64 / 1_000_000.0)
    } else if amount >= 1_000 {
        format!("{:.1} kB", amount as f64 / 1_000.0)
    } else {
        format!("{} B", amount)
    }
}

fn truncate(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).collect::<String>() + "…"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use xpboard_core::models::{ObjectRef, SkillRecord, TransactionRecord, UserProfile};
    use xpboard_core::{DashboardConfig, Dataset, TaxonomyExtractor};

    fn view() -> DashboardView {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
        let dataset = Dataset {
            user: UserProfile {
                id: 7,
                login: "jdoe".to_string(),
            },
            xp_transactions: vec![TransactionRecord {
                id: 1,
                amount: 24_500,
                created_at,
                path: "/athens/div-01/groupie-tracker".to_string(),
                object: Some(ObjectRef::new("groupie-tracker", "project")),
            }],
            skill_transactions: vec![SkillRecord::new("skill_go", 70)],
            progresses: vec![ProgressRecord {
                id: 3,
                grade: None,
                updated_at: created_at,
                object: None,
            }],
        };
        DashboardView::compute("div-01", &dataset, &DashboardConfig::default(), created_at)
    }

    #[test]
    fn test_format_xp_units() {
        assert_eq!(format_xp(512), "512 B");
        assert_eq!(format_xp(24_500), "24.5 kB");
        assert_eq!(format_xp(1_250_000), "1.25 MB");
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate("groupie-tracker", 20), "groupie-tracker");
        assert_eq!(truncate("groupie-tracker", 8), "groupie…");
        assert_eq!(truncate("café", 3), "ca…");
    }

    #[test]
    fn test_truncate_zero_width() {
        assert_eq!(truncate("groupie-tracker", 0), "…");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    fn test_folder_label() {
        assert_eq!(folder_label("all"), "All Folders");
        assert_eq!(folder_label("piscine-js"), "piscine-js");
    }

    #[test]
    fn test_format_folders_json_lists_all_first() {
        let extractor = TaxonomyExtractor::new("athens");
        let taxonomy = extractor.extract(&[TransactionRecord {
            id: 1,
            amount: 100,
            created_at: Utc::now(),
            path: "/athens/div-01/piscine-js/ex1".to_string(),
            object: Some(ObjectRef::new("ex1", "exercise").with_parent("piscine-js", "piscine")),
        }]);

        let rendered = format_folders(&taxonomy, true, true);
        let parsed: Vec<String> = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, vec!["all", "piscine-js"]);

        let table = format_folders(&taxonomy, false, true);
        assert!(table.contains("All Folders"));
    }

    #[test]
    fn test_format_summary_table() {
        let rendered = format_summary(&view(), false, true);
        assert!(rendered.contains("jdoe"));
        assert!(rendered.contains("Total XP:         25 kB"));
        assert!(rendered.contains("Golang"));
        assert!(rendered.contains("+25 kB"));
        assert!(rendered.contains("Unknown Project"));
        assert!(rendered.contains("In progress"));
    }

    #[test]
    fn test_format_summary_json() {
        let rendered = format_summary(&view(), true, false);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["total_xp"], 25);
        assert_eq!(parsed["category"], "div-01");
    }
}
