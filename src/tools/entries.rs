//! Entry MCP Tools
//!
//! Tools for logging what was eaten.

use serde::Serialize;

use crate::db::Database;
use crate::models::{Entry, EntryCreate, EntryDetail, EntryQuery, EntryUpdate, Food, Macros, MealType};
use crate::nutrition::totals;

use super::parse_date;

#[derive(Debug, Serialize)]
pub struct LogEntryResponse {
    pub success: bool,
    pub entry: EntryDetail,
}

#[derive(Debug, Serialize)]
pub struct ListEntriesResponse {
    pub entries: Vec<EntryDetail>,
    pub count: usize,
    pub totals: Macros,
}

#[derive(Debug, Serialize)]
pub struct UpdateEntryResponse {
    pub success: bool,
    /// Quantity before the update, for comparison after a food reassignment
    pub previous_quantity: f64,
    pub entry: EntryDetail,
}

fn detail(conn: &rusqlite::Connection, entry: &Entry) -> Result<EntryDetail, String> {
    let food = Food::get_by_id(conn, entry.food_id).map_err(|e| format!("Database error: {}", e))?;
    let resolver: std::collections::HashMap<i64, Food> =
        food.into_iter().map(|f| (f.id, f)).collect();
    Ok(entry.detail(&resolver))
}

/// Log an entry
pub fn log_entry(
    db: &Database,
    date: &str,
    food_id: i64,
    quantity: f64,
    meal: Option<&str>,
) -> Result<LogEntryResponse, String> {
    let data = EntryCreate {
        date: parse_date(date)?,
        food_id,
        quantity,
        meal: meal.map(MealType::from_str).unwrap_or_default(),
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let entry = Entry::create(&conn, &data).map_err(|e| format!("Failed to log entry: {}", e))?;

    Ok(LogEntryResponse {
        success: true,
        entry: detail(&conn, &entry)?,
    })
}

/// Get an entry by ID
pub fn get_entry(db: &Database, id: i64) -> Result<Option<EntryDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    match Entry::get_by_id(&conn, id).map_err(|e| format!("Failed to get entry: {}", e))? {
        Some(entry) => Ok(Some(detail(&conn, &entry)?)),
        None => Ok(None),
    }
}

/// List entries by date, range and/or meal, with their totals
pub fn list_entries(
    db: &Database,
    date: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    meal: Option<&str>,
    limit: Option<i64>,
) -> Result<ListEntriesResponse, String> {
    let query = EntryQuery {
        date: date.map(parse_date).transpose()?,
        start: start_date.map(parse_date).transpose()?,
        end: end_date.map(parse_date).transpose()?,
        meal: meal.map(MealType::from_str),
        food_id: None,
        limit: limit.map(|l| l.clamp(1, 1000)),
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let entries = Entry::list(&conn, &query).map_err(|e| format!("Failed to list entries: {}", e))?;
    let catalog = Food::load_catalog(&conn).map_err(|e| format!("Failed to load foods: {}", e))?;

    let details: Vec<EntryDetail> = entries.iter().map(|e| e.detail(&catalog)).collect();

    Ok(ListEntriesResponse {
        count: details.len(),
        totals: totals(&entries, &catalog),
        entries: details,
    })
}

/// Update an entry. Reassigning it to another food converts the quantity
/// unless a new quantity is given.
pub fn update_entry(
    db: &Database,
    id: i64,
    date: Option<&str>,
    food_id: Option<i64>,
    quantity: Option<f64>,
    meal: Option<&str>,
) -> Result<UpdateEntryResponse, String> {
    let data = EntryUpdate {
        date: date.map(parse_date).transpose()?,
        food_id,
        quantity,
        meal: meal.map(MealType::from_str),
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let previous = Entry::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get entry: {}", e))?
        .ok_or_else(|| format!("Entry not found with id: {}", id))?;

    let entry = Entry::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update entry: {}", e))?
        .ok_or_else(|| format!("Entry not found with id: {}", id))?;

    Ok(UpdateEntryResponse {
        success: true,
        previous_quantity: previous.quantity,
        entry: detail(&conn, &entry)?,
    })
}

/// Delete an entry
pub fn delete_entry(db: &Database, id: i64) -> Result<bool, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Entry::delete(&conn, id).map_err(|e| format!("Failed to delete entry: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::{FoodCategory, FoodDraft};
    use crate::nutrition::UnitMode;
    use crate::tools::foods::{add_food, delete_food};

    fn seed(db: &Database) -> i64 {
        add_food(
            db,
            FoodDraft {
                name: "Chicken Breast".to_string(),
                brand: None,
                category: FoodCategory::Meat,
                unit: UnitMode::Per100g,
                serving_size: None,
                kcal: 165.0,
                fat: 3.6,
                carbs: 0.0,
                protein: 31.0,
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_log_entry_scales() {
        let db = open_in_memory().unwrap();
        let food_id = seed(&db);
        let logged = log_entry(&db, "2025-01-10", food_id, 150.0, Some("lunch")).unwrap();
        assert_eq!(logged.entry.macros.kcal, 247.5);
        assert_eq!(logged.entry.macros.protein, 46.5);
        assert_eq!(logged.entry.meal, MealType::Lunch);
        assert_eq!(logged.entry.quantity_unit.as_deref(), Some("g"));
    }

    #[test]
    fn test_log_entry_rejects_zero_quantity() {
        let db = open_in_memory().unwrap();
        let food_id = seed(&db);
        assert!(log_entry(&db, "2025-01-10", food_id, 0.0, None).is_err());
        assert!(log_entry(&db, "not-a-date", food_id, 10.0, None).is_err());
    }

    #[test]
    fn test_list_after_food_deleted() {
        let db = open_in_memory().unwrap();
        let food_id = seed(&db);
        log_entry(&db, "2025-01-10", food_id, 100.0, None).unwrap();
        delete_food(&db, food_id).unwrap();

        let listed = list_entries(&db, Some("2025-01-10"), None, None, None, None).unwrap();
        assert_eq!(listed.count, 1);
        assert_eq!(listed.entries[0].name, "Unknown");
        assert_eq!(listed.entries[0].retained_label, "Chicken Breast");
        assert_eq!(listed.totals.kcal, 0.0);
    }

    #[test]
    fn test_update_and_delete_entry() {
        let db = open_in_memory().unwrap();
        let food_id = seed(&db);
        let logged = log_entry(&db, "2025-01-10", food_id, 100.0, None).unwrap();

        let updated = update_entry(&db, logged.entry.id, None, None, Some(200.0), Some("dinner")).unwrap();
        assert_eq!(updated.previous_quantity, 100.0);
        assert_eq!(updated.entry.quantity, 200.0);
        assert_eq!(updated.entry.meal, MealType::Dinner);

        assert!(update_entry(&db, logged.entry.id, None, None, Some(-1.0), None).is_err());
        assert!(delete_entry(&db, logged.entry.id).unwrap());
        assert!(get_entry(&db, logged.entry.id).unwrap().is_none());
    }
}
