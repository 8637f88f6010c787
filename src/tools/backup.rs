//! Backup export and import
//!
//! The backup is one JSON document holding goals, profile, foods and
//! entries. Imports read it as loose JSON and coerce every number through
//! the sanitization boundary, so hand-edited or foreign files load as far as
//! they are usable; rows that cannot be used are skipped and counted.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::db::{Database, DbResult};
use crate::models::{
    BodyProfile, Entry, Food, FoodCategory, FoodDraft, Goals, GoalsUpdate, MealType,
};
use crate::nutrition::sanitize::{coerce_field, coerce_number, valid_quantity};
use crate::nutrition::{UnitMode, UNKNOWN_FOOD};

pub const BACKUP_VERSION: u32 = 1;

/// Food id that dangling entries point at after a merge; never allocated
pub const ORPHAN_FOOD_ID: i64 = 0;

// ============================================================================
// File Format
// ============================================================================

#[derive(Debug, Serialize)]
pub struct Backup {
    pub version: u32,
    pub exported_at: String,
    pub goals: Goals,
    pub profile: BodyProfile,
    pub foods: Vec<BackupFood>,
    pub entries: Vec<BackupEntry>,
}

#[derive(Debug, Serialize)]
pub struct BackupFood {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub category: FoodCategory,
    pub unit: UnitMode,
    pub serving_size: Option<f64>,
    pub kcal: f64,
    pub fat: f64,
    pub carbs: f64,
    pub protein: f64,
}

#[derive(Debug, Serialize)]
pub struct BackupEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub food_id: i64,
    pub food_label: String,
    pub quantity: f64,
    pub meal: MealType,
}

impl From<Food> for BackupFood {
    fn from(food: Food) -> Self {
        Self {
            id: food.id,
            name: food.name,
            brand: food.brand,
            category: food.category,
            unit: food.unit,
            serving_size: food.serving_size,
            kcal: food.nutrients.kcal,
            fat: food.nutrients.fat,
            carbs: food.nutrients.carbs,
            protein: food.nutrients.protein,
        }
    }
}

impl From<Entry> for BackupEntry {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id,
            date: entry.date,
            food_id: entry.food_id,
            food_label: entry.food_label,
            quantity: entry.quantity,
            meal: entry.meal,
        }
    }
}

/// How an import treats what is already stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Add the file's foods and entries under fresh ids
    Merge,
    /// Clear the store first and keep the file's ids, goals and profile
    Replace,
}

impl ImportMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "merge" => Some(ImportMode::Merge),
            "replace" => Some(ImportMode::Replace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Merge => "merge",
            ImportMode::Replace => "replace",
        }
    }
}

/// What an import writes over and what a `replace` clears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub mode: ImportMode,
    /// Keep row ids, overwriting stored rows that share them
    pub keep_ids: bool,
    /// Limits `replace` to the entries dated in this range; foods, goals
    /// and profile outside it are overwritten by id, never cleared
    pub range: Option<(NaiveDate, NaiveDate)>,
}

impl ImportOptions {
    /// Backup file: `replace` keeps the file's ids, `merge` allocates new ones
    pub fn file(mode: ImportMode) -> Self {
        Self {
            mode,
            keep_ids: mode == ImportMode::Replace,
            range: None,
        }
    }

    /// Remote pull: ids are shared with the backend, so rows are matched on
    /// id and pulling the same rows again changes nothing
    pub fn pull(mode: ImportMode, range: Option<(NaiveDate, NaiveDate)>) -> Self {
        Self {
            mode,
            keep_ids: true,
            range,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub foods_imported: usize,
    pub foods_skipped: usize,
    pub entries_imported: usize,
    pub entries_skipped: usize,
    pub goals_restored: bool,
    pub profile_restored: bool,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub success: bool,
    pub file_path: String,
    pub foods: usize,
    pub entries: usize,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub mode: &'static str,
    pub file_path: String,
    #[serde(flatten)]
    pub summary: ImportSummary,
}

// ============================================================================
// Export
// ============================================================================

/// Snapshot the whole store
pub fn build_backup(conn: &Connection) -> DbResult<Backup> {
    Ok(Backup {
        version: BACKUP_VERSION,
        exported_at: chrono::Utc::now().to_rfc3339(),
        goals: Goals::get(conn)?,
        profile: BodyProfile::get(conn)?,
        foods: Food::all(conn)?.into_iter().map(BackupFood::from).collect(),
        entries: Entry::all(conn)?.into_iter().map(BackupEntry::from).collect(),
    })
}

/// Write the store to a JSON backup file
pub fn export_data(db: &Database, output_path: &str) -> Result<ExportResponse, String> {
    let backup = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        build_backup(&conn).map_err(|e| format!("Failed to read store: {}", e))?
    };

    let json = serde_json::to_string_pretty(&backup).map_err(|e| e.to_string())?;

    let path = Path::new(output_path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
    }
    std::fs::write(path, json).map_err(|e| format!("Failed to write {}: {}", output_path, e))?;

    info!(path = output_path, foods = backup.foods.len(), entries = backup.entries.len(), "Exported backup");

    Ok(ExportResponse {
        success: true,
        file_path: output_path.to_string(),
        foods: backup.foods.len(),
        entries: backup.entries.len(),
    })
}

// ============================================================================
// Import
// ============================================================================

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

fn rows<'a>(backup: &'a Value, key: &str) -> &'a [Value] {
    backup.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

/// Read a food row; `None` when it has no usable name
fn food_draft(value: &Value) -> Option<FoodDraft> {
    let name = str_field(value, "name")?;
    Some(FoodDraft {
        name: name.to_string(),
        brand: str_field(value, "brand").map(str::to_string),
        category: str_field(value, "category").map(FoodCategory::from_str).unwrap_or_default(),
        unit: str_field(value, "unit").and_then(UnitMode::from_str).unwrap_or_default(),
        serving_size: Some(coerce_field(value, "serving_size")).filter(|s| *s > 0.0),
        kcal: coerce_field(value, "kcal"),
        fat: coerce_field(value, "fat"),
        carbs: coerce_field(value, "carbs"),
        protein: coerce_field(value, "protein"),
    })
}

fn goals_update(value: &Value) -> GoalsUpdate {
    let field = |key: &str| value.get(key).map(coerce_number);
    GoalsUpdate {
        kcal: field("kcal"),
        fat: field("fat"),
        carbs: field("carbs"),
        protein: field("protein"),
    }
}

/// Load a parsed backup document into the store, in one transaction
pub fn import_value(conn: &Connection, backup: &Value, options: &ImportOptions) -> DbResult<ImportSummary> {
    let mode = options.mode;
    let tx = conn.unchecked_transaction()?;
    let mut summary = ImportSummary::default();

    if mode == ImportMode::Replace {
        match options.range {
            Some((start, end)) => {
                let cleared = tx.execute(
                    "DELETE FROM entries WHERE date BETWEEN ?1 AND ?2",
                    rusqlite::params![start, end],
                )?;
                info!(%start, %end, entries = cleared, "Cleared entries in range");
            }
            None => tx.execute_batch(
                "DELETE FROM entries; DELETE FROM foods; DELETE FROM goals; DELETE FROM body_profile;",
            )?,
        }

        if let Some(goals) = backup.get("goals").filter(|g| g.is_object()) {
            Goals::set(&tx, &goals_update(goals))?;
            summary.goals_restored = true;
        }

        if let Some(profile) = backup.get("profile").filter(|p| p.is_object()) {
            match serde_json::from_value::<BodyProfile>(profile.clone()) {
                Ok(profile) => match BodyProfile::set(&tx, &profile) {
                    Ok(_) => summary.profile_restored = true,
                    Err(e) => warn!("Skipping profile: {}", e),
                },
                Err(e) => warn!("Skipping unreadable profile: {}", e),
            }
        }
    }

    // File food id -> stored food id
    let mut food_ids: HashMap<i64, i64> = HashMap::new();
    // Stored food id -> name, for entries that carry no label
    let mut food_names: HashMap<i64, String> = HashMap::new();

    for row in rows(backup, "foods") {
        let file_id = coerce_field(row, "id") as i64;
        let Some(draft) = food_draft(row) else {
            warn!(food_id = file_id, "Skipping food without a name");
            summary.foods_skipped += 1;
            continue;
        };

        let created = if options.keep_ids && file_id > 0 {
            Food::save_with_id(&tx, file_id, &draft)
        } else {
            Food::create(&tx, &draft)
        };

        match created {
            Ok(food) => {
                if file_id > 0 {
                    food_ids.insert(file_id, food.id);
                }
                food_names.insert(food.id, food.name);
                summary.foods_imported += 1;
            }
            Err(e) => {
                warn!(food_id = file_id, "Skipping food: {}", e);
                summary.foods_skipped += 1;
            }
        }
    }

    for row in rows(backup, "entries") {
        let file_id = coerce_field(row, "id") as i64;

        let date = str_field(row, "date").and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        let quantity = valid_quantity(coerce_field(row, "quantity"));
        let (Some(date), Some(quantity)) = (date, quantity) else {
            warn!(entry_id = file_id, "Skipping entry with an invalid date or quantity");
            summary.entries_skipped += 1;
            continue;
        };

        let file_food_id = coerce_field(row, "food_id") as i64;
        let food_id = if options.keep_ids {
            file_food_id
        } else {
            food_ids.get(&file_food_id).copied().unwrap_or(ORPHAN_FOOD_ID)
        };
        let food_label = str_field(row, "food_label")
            .map(str::to_string)
            .or_else(|| food_names.get(&food_id).cloned())
            .unwrap_or_else(|| UNKNOWN_FOOD.to_string());
        let meal = str_field(row, "meal").map(MealType::from_str).unwrap_or_default();
        let id = Some(file_id).filter(|id| options.keep_ids && *id > 0);

        match Entry::restore(&tx, id, date, food_id, &food_label, quantity, meal) {
            Ok(_) => summary.entries_imported += 1,
            Err(e) => {
                warn!(entry_id = file_id, "Skipping entry: {}", e);
                summary.entries_skipped += 1;
            }
        }
    }

    tx.commit()?;

    info!(
        mode = mode.as_str(),
        foods = summary.foods_imported,
        entries = summary.entries_imported,
        skipped = summary.foods_skipped + summary.entries_skipped,
        "Imported backup"
    );
    Ok(summary)
}

/// Load a JSON backup file into the store
pub fn import_data(db: &Database, input_path: &str, mode: &str) -> Result<ImportResponse, String> {
    let mode = ImportMode::from_str(mode)
        .ok_or_else(|| format!("Invalid mode '{}'. Valid values: merge, replace", mode))?;

    let text = std::fs::read_to_string(input_path)
        .map_err(|e| format!("Failed to read {}: {}", input_path, e))?;
    let backup: Value = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid backup file {}: {}", input_path, e))?;
    if !backup.is_object() {
        return Err(format!("Invalid backup file {}: expected a JSON object", input_path));
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let summary = import_value(&conn, &backup, &ImportOptions::file(mode)).map_err(|e| format!("Import failed: {}", e))?;

    Ok(ImportResponse {
        success: true,
        mode: mode.as_str(),
        file_path: input_path.to_string(),
        summary,
    })
}
