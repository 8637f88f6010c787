//! Entry model
//!
//! One logged consumption event: a quantity of a food on a calendar day,
//! tagged with a meal.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::aggregate::{display_name, entry_macros};
use crate::nutrition::converter::convert_quantity;
use crate::nutrition::resolver::FoodResolver;
use crate::nutrition::sanitize::valid_quantity;
use super::{Food, Macros};

/// Meal tag
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    #[default]
    Other,
}

impl MealType {
    pub const ALL: [MealType; 5] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
        MealType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
            MealType::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => MealType::Breakfast,
            "lunch" => MealType::Lunch,
            "dinner" => MealType::Dinner,
            "snack" | "snacks" => MealType::Snack,
            _ => MealType::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
            MealType::Other => "Other",
        }
    }
}

/// A logged entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub date: NaiveDate,
    pub food_id: i64,
    /// Food name captured when the entry was last pointed at a food
    pub food_label: String,
    /// Grams for `per100g` foods, servings for `perServing` foods
    pub quantity: f64,
    pub meal: MealType,
    pub created_at: String,
    pub updated_at: String,
}

/// Entry with its resolved food and scaled nutrients
#[derive(Debug, Clone, Serialize)]
pub struct EntryDetail {
    pub id: i64,
    pub date: NaiveDate,
    pub meal: MealType,
    pub food_id: i64,
    /// Food name, or "Unknown" when the food was deleted
    pub name: String,
    /// Label kept from the food the entry last pointed at
    pub retained_label: String,
    pub resolved: bool,
    pub quantity: f64,
    pub quantity_unit: Option<String>,
    pub macros: Macros,
}

/// Data for creating an entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCreate {
    pub date: NaiveDate,
    pub food_id: i64,
    pub quantity: f64,
    #[serde(default)]
    pub meal: MealType,
}

/// Data for updating an entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryUpdate {
    pub date: Option<NaiveDate>,
    /// Moving to another food converts the quantity unless one is given
    pub food_id: Option<i64>,
    pub quantity: Option<f64>,
    pub meal: Option<MealType>,
}

/// Filter for listing entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryQuery {
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub meal: Option<MealType>,
    pub food_id: Option<i64>,
    pub limit: Option<i64>,
}

fn checked_quantity(quantity: f64) -> DbResult<f64> {
    valid_quantity(quantity).ok_or_else(|| {
        DbError::Invalid(format!(
            "quantity must be a positive number (got {})",
            quantity
        ))
    })
}

impl Entry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let meal: String = row.get("meal")?;
        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            food_id: row.get("food_id")?,
            food_label: row.get("food_label")?,
            quantity: row.get("quantity")?,
            meal: MealType::from_str(&meal),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Resolve the entry's food and scale it
    pub fn detail<R: FoodResolver + ?Sized>(&self, resolver: &R) -> EntryDetail {
        let food = resolver.resolve(self.food_id);
        EntryDetail {
            id: self.id,
            date: self.date,
            meal: self.meal,
            food_id: self.food_id,
            name: display_name(self, resolver),
            retained_label: self.food_label.clone(),
            resolved: food.is_some(),
            quantity: self.quantity,
            quantity_unit: food.map(|f| f.unit.quantity_label().to_string()),
            macros: entry_macros(self, resolver),
        }
    }

    /// Log a new entry against an existing food
    pub fn create(conn: &Connection, data: &EntryCreate) -> DbResult<Self> {
        let quantity = checked_quantity(data.quantity)?;
        let food = Food::get_by_id(conn, data.food_id)?
            .ok_or_else(|| DbError::NotFound(format!("Food {}", data.food_id)))?;

        conn.execute(
            r#"
            INSERT INTO entries (date, food_id, food_label, quantity, meal)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![data.date, food.id, food.name, quantity, data.meal.as_str()],
        )?;

        let id = conn.last_insert_rowid();
        tracing::info!(entry_id = id, food_id = food.id, date = %data.date, "Logged entry");
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("Entry {}", id)))
    }

    /// Insert an entry as recorded elsewhere (backup restore, remote pull).
    /// With an id, the entry already stored under it is overwritten. The
    /// food does not need to exist.
    pub fn restore(
        conn: &Connection,
        id: Option<i64>,
        date: NaiveDate,
        food_id: i64,
        food_label: &str,
        quantity: f64,
        meal: MealType,
    ) -> DbResult<Self> {
        let quantity = checked_quantity(quantity)?;
        conn.execute(
            r#"
            INSERT INTO entries (id, date, food_id, food_label, quantity, meal)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                date = excluded.date,
                food_id = excluded.food_id,
                food_label = excluded.food_label,
                quantity = excluded.quantity,
                meal = excluded.meal,
                updated_at = datetime('now')
            "#,
            params![id, date, food_id, food_label, quantity, meal.as_str()],
        )?;

        let id = id.unwrap_or_else(|| conn.last_insert_rowid());
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("Entry {}", id)))
    }

    /// Get an entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List entries matching a filter, oldest first
    pub fn list(conn: &Connection, query: &EntryQuery) -> DbResult<Vec<Self>> {
        let mut clauses = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(date) = query.date {
            clauses.push(format!("date = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(date));
        }
        if let Some(start) = query.start {
            clauses.push(format!("date >= ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(start));
        }
        if let Some(end) = query.end {
            clauses.push(format!("date <= ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(end));
        }
        if let Some(meal) = query.meal {
            clauses.push(format!("meal = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(meal.as_str()));
        }
        if let Some(food_id) = query.food_id {
            clauses.push(format!("food_id = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(food_id));
        }

        let mut sql = String::from("SELECT * FROM entries");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY date ASC, id ASC");
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(limit));
        }

        tracing::debug!(sql = %sql, "Listing entries");

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Entries for one day
    pub fn for_date(conn: &Connection, date: NaiveDate) -> DbResult<Vec<Self>> {
        Self::list(
            conn,
            &EntryQuery {
                date: Some(date),
                ..Default::default()
            },
        )
    }

    /// Entries in an inclusive date range
    pub fn for_range(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Self>> {
        Self::list(
            conn,
            &EntryQuery {
                start: Some(start),
                end: Some(end),
                ..Default::default()
            },
        )
    }

    /// Every entry
    pub fn all(conn: &Connection) -> DbResult<Vec<Self>> {
        Self::list(conn, &EntryQuery::default())
    }

    /// Update an entry.
    ///
    /// Pointing the entry at another food converts its quantity from the
    /// old food's unit to the new one, unless a quantity is supplied too.
    pub fn update(conn: &Connection, id: i64, data: &EntryUpdate) -> DbResult<Option<Self>> {
        let entry = match Self::get_by_id(conn, id)? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        let mut quantity = match data.quantity {
            Some(q) => Some(checked_quantity(q)?),
            None => None,
        };

        if let Some(food_id) = data.food_id.filter(|f| *f != entry.food_id) {
            let new_food = Food::get_by_id(conn, food_id)?
                .ok_or_else(|| DbError::NotFound(format!("Food {}", food_id)))?;
            if quantity.is_none() {
                let old_food = Food::get_by_id(conn, entry.food_id)?;
                let converted = convert_quantity(entry.quantity, old_food.as_ref(), Some(&new_food));
                tracing::debug!(
                    entry_id = id,
                    from = entry.quantity,
                    to = converted,
                    "Converted quantity for food reassignment"
                );
                quantity = Some(converted);
            }

            updates.push(format!("food_id = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(food_id));
            updates.push(format!("food_label = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(new_food.name));
        }
        if let Some(q) = quantity {
            updates.push(format!("quantity = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(q));
        }
        if let Some(date) = data.date {
            updates.push(format!("date = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(date));
        }
        if let Some(meal) = data.meal {
            updates.push(format!("meal = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(meal.as_str()));
        }

        if updates.is_empty() {
            return Ok(Some(entry));
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE entries SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        tracing::info!(entry_id = id, "Updated entry");
        Self::get_by_id(conn, id)
    }

    /// Delete an entry
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM entries WHERE id = ?1", [id])?;
        if rows > 0 {
            tracing::info!(entry_id = id, "Deleted entry");
        }
        Ok(rows > 0)
    }

    /// Count all entries
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{FoodCategory, FoodDraft};
    use crate::nutrition::resolver::Catalog;
    use crate::nutrition::units::UnitMode;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn add_food(conn: &Connection, name: &str, unit: UnitMode, serving: Option<f64>) -> Food {
        Food::create(
            conn,
            &FoodDraft {
                name: name.to_string(),
                brand: None,
                category: FoodCategory::Other,
                unit,
                serving_size: serving,
                kcal: 120.0,
                fat: 1.5,
                carbs: 3.0,
                protein: 24.0,
            },
        )
        .unwrap()
    }

    fn log(conn: &Connection, food_id: i64, quantity: f64) -> DbResult<Entry> {
        Entry::create(
            conn,
            &EntryCreate {
                date: day("2025-03-01"),
                food_id,
                quantity,
                meal: MealType::Breakfast,
            },
        )
    }

    #[test]
    fn test_meal_type_parsing() {
        assert_eq!(MealType::from_str("Dinner"), MealType::Dinner);
        assert_eq!(MealType::from_str("brunch"), MealType::Other);
    }

    #[test]
    fn test_create_snapshots_label() {
        let conn = test_conn();
        let food = add_food(&conn, "Whey", UnitMode::PerServing, Some(30.0));
        let entry = log(&conn, food.id, 1.0).unwrap();
        assert_eq!(entry.food_label, "Whey");
        assert_eq!(entry.date, day("2025-03-01"));
        assert_eq!(entry.meal, MealType::Breakfast);
    }

    #[test]
    fn test_create_rejects_bad_quantity() {
        let conn = test_conn();
        let food = add_food(&conn, "Whey", UnitMode::PerServing, Some(30.0));
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(log(&conn, food.id, bad), Err(DbError::Invalid(_))));
        }
        assert_eq!(Entry::count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_create_requires_food() {
        let conn = test_conn();
        assert!(matches!(log(&conn, 42, 1.0), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_reassign_converts_quantity() {
        let conn = test_conn();
        let whey = add_food(&conn, "Whey", UnitMode::PerServing, Some(30.0));
        let oats = add_food(&conn, "Oats", UnitMode::Per100g, None);
        let entry = log(&conn, whey.id, 2.0).unwrap();

        let moved = Entry::update(
            &conn,
            entry.id,
            &EntryUpdate {
                food_id: Some(oats.id),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(moved.quantity, 60.0);
        assert_eq!(moved.food_label, "Oats");

        let back = Entry::update(
            &conn,
            entry.id,
            &EntryUpdate {
                food_id: Some(whey.id),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(back.quantity, 2.0);
    }

    #[test]
    fn test_reassign_with_explicit_quantity() {
        let conn = test_conn();
        let whey = add_food(&conn, "Whey", UnitMode::PerServing, Some(30.0));
        let oats = add_food(&conn, "Oats", UnitMode::Per100g, None);
        let entry = log(&conn, whey.id, 2.0).unwrap();

        let moved = Entry::update(
            &conn,
            entry.id,
            &EntryUpdate {
                food_id: Some(oats.id),
                quantity: Some(80.0),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(moved.quantity, 80.0);
    }

    #[test]
    fn test_update_rejects_bad_quantity() {
        let conn = test_conn();
        let whey = add_food(&conn, "Whey", UnitMode::PerServing, Some(30.0));
        let entry = log(&conn, whey.id, 2.0).unwrap();

        let result = Entry::update(
            &conn,
            entry.id,
            &EntryUpdate {
                quantity: Some(0.0),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(DbError::Invalid(_))));
        assert_eq!(Entry::get_by_id(&conn, entry.id).unwrap().unwrap().quantity, 2.0);
    }

    #[test]
    fn test_list_filters() {
        let conn = test_conn();
        let whey = add_food(&conn, "Whey", UnitMode::PerServing, Some(30.0));
        log(&conn, whey.id, 1.0).unwrap();
        Entry::create(
            &conn,
            &EntryCreate {
                date: day("2025-03-04"),
                food_id: whey.id,
                quantity: 1.0,
                meal: MealType::Snack,
            },
        )
        .unwrap();

        assert_eq!(Entry::for_date(&conn, day("2025-03-01")).unwrap().len(), 1);
        assert_eq!(Entry::for_range(&conn, day("2025-03-01"), day("2025-03-31")).unwrap().len(), 2);
        let snacks = Entry::list(
            &conn,
            &EntryQuery {
                meal: Some(MealType::Snack),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(snacks.len(), 1);
        assert_eq!(snacks[0].date, day("2025-03-04"));
    }

    #[test]
    fn test_detail_of_deleted_food() {
        let conn = test_conn();
        let whey = add_food(&conn, "Whey", UnitMode::PerServing, Some(30.0));
        let entry = log(&conn, whey.id, 1.0).unwrap();
        Food::delete(&conn, whey.id).unwrap();

        let catalog: Catalog = Food::load_catalog(&conn).unwrap();
        let detail = entry.detail(&catalog);
        assert_eq!(detail.name, "Unknown");
        assert_eq!(detail.retained_label, "Whey");
        assert!(!detail.resolved);
        assert_eq!(detail.macros, Macros::zero());
    }
}
