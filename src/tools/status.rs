//! Macrotrack Status Tool
//!
//! Provides runtime status information about the Macrotrack service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Food logging instructions for AI assistants
pub const LOGGING_INSTRUCTIONS: &str = r#"
# Macrotrack Logging Instructions

This guide explains how to log food with the Macrotrack tools.

## Overview

Logging takes two records:
1. **Food** - A catalog item with calories, fat, carbs and protein
2. **Entry** - One thing eaten on one day: a food, a quantity and a meal

Totals, goal progress and charts are always computed from the entries and
the current food values. Nothing is stored pre-scaled.

---

## Food Units

Every food declares how its nutrient values are expressed:

| Unit         | Values are...            | Entry quantity is... |
|--------------|--------------------------|----------------------|
| `per100g`    | per 100 grams            | grams eaten          |
| `perServing` | per one serving          | number of servings   |

- `perServing` foods need a `serving_size` in grams (at least 1).
- Use `per100g` for anything weighed: meat, rice, vegetables, oils.
- Use `perServing` for packaged items with a label: bars, shakes, slices.

### Examples

Chicken breast, 165 kcal / 3.6 g fat / 0 g carbs / 31 g protein per 100 g.
Logging `quantity: 150` gives 247.5 kcal, 5.4 g fat, 46.5 g protein.

Protein bar, 200 kcal per bar, serving size 60 g.
Logging `quantity: 2` gives 400 kcal.

---

## Workflow

1. `search_foods` for the food first. Reuse an existing food when one fits.
2. If nothing fits, `add_food` with values from the label or a reliable source.
3. `log_entry` with the date (`YYYY-MM-DD` or `today`), `food_id`,
   `quantity` and `meal` (`breakfast`, `lunch`, `dinner`, `snack`, `other`).
4. `day_summary` to confirm totals and what is left for the day.

Quantities must be positive. Zero or negative quantities are rejected.

---

## Changing Units

- `update_entry` with a different `food_id` converts the quantity between
  grams and servings using the serving size, unless a new `quantity` is
  passed. 2 servings of a 30 g serving become 60 g.
- `update_food` switching a food's `unit` converts every entry that uses
  that food the same way.
- Changing only `serving_size` does NOT rescale existing entries.

---

## Goals and Budget

- `get_goals` / `set_goals` hold daily targets for kcal, fat, carbs, protein.
  Defaults are 2000 kcal, 70 g fat, 250 g carbs, 100 g protein.
- Percentages are not capped: 2400 kcal against a 2000 goal is 120%.
- The budget reads "N left" or "N over"; over-budget amounts are shown in
  dark red in charts and reports.

---

## Deleted Foods

Deleting a food keeps its entries. They count as zero and display as
"Unknown" until reassigned with `update_entry`.

---

## Dashboards

- `trend` gives one row per day in a range, including empty days, and
  averages over the days that have entries only.
- `top_foods` ranks foods by their contribution of one nutrient (default 5).
- `render_trend_chart`, `render_macro_donut` and `render_meal_split_chart`
  write PNG files; `generate_nutrition_report` writes a PDF.

---

## Backups

- `export_data` writes everything to a JSON file.
- `import_data` with `mode: "merge"` adds the file's foods and entries under
  new ids; `mode: "replace"` clears the store first and keeps the file's ids,
  goals and profile.
"#;

/// Runtime status of the Macrotrack service
#[derive(Debug, Clone, Serialize)]
pub struct MacrotrackStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub chart_dir: String,
    pub remote_configured: bool,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    chart_dir: PathBuf,
    remote_configured: bool,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf, chart_dir: PathBuf, remote_configured: bool) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            chart_dir,
            remote_configured,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> MacrotrackStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        MacrotrackStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            chart_dir: self.chart_dir.display().to_string(),
            remote_configured: self.remote_configured,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reports_paths() {
        let tracker = StatusTracker::new(
            PathBuf::from("/nonexistent/macrotrack.db"),
            PathBuf::from("/nonexistent/charts"),
            false,
        );
        let status = tracker.get_status();
        assert_eq!(status.database_path, "/nonexistent/macrotrack.db");
        assert!(status.database_size_bytes.is_none());
        assert!(!status.remote_configured);
        assert_eq!(status.process_id, std::process::id());
    }

    #[test]
    fn test_instructions_mention_every_logging_tool() {
        for tool in ["search_foods", "add_food", "log_entry", "update_entry", "day_summary"] {
            assert!(LOGGING_INSTRUCTIONS.contains(tool), "missing {}", tool);
        }
    }
}
