//! Food model
//!
//! A catalog entry with nutrient values per 100g or per serving.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::converter::convert_quantity;
use crate::nutrition::resolver::Catalog;
use crate::nutrition::sanitize::non_negative;
use crate::nutrition::units::{UnitMode, MIN_SERVING_SIZE};
use super::Macros;

/// Display grouping for foods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    Meat,
    Fish,
    Dairy,
    Eggs,
    Grains,
    Legumes,
    Vegetables,
    Fruit,
    Nuts,
    Fats,
    Sweets,
    Drinks,
    Prepared,
    #[default]
    Other,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 14] = [
        FoodCategory::Meat,
        FoodCategory::Fish,
        FoodCategory::Dairy,
        FoodCategory::Eggs,
        FoodCategory::Grains,
        FoodCategory::Legumes,
        FoodCategory::Vegetables,
        FoodCategory::Fruit,
        FoodCategory::Nuts,
        FoodCategory::Fats,
        FoodCategory::Sweets,
        FoodCategory::Drinks,
        FoodCategory::Prepared,
        FoodCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Meat => "meat",
            FoodCategory::Fish => "fish",
            FoodCategory::Dairy => "dairy",
            FoodCategory::Eggs => "eggs",
            FoodCategory::Grains => "grains",
            FoodCategory::Legumes => "legumes",
            FoodCategory::Vegetables => "vegetables",
            FoodCategory::Fruit => "fruit",
            FoodCategory::Nuts => "nuts",
            FoodCategory::Fats => "fats",
            FoodCategory::Sweets => "sweets",
            FoodCategory::Drinks => "drinks",
            FoodCategory::Prepared => "prepared",
            FoodCategory::Other => "other",
        }
    }

    /// Unrecognized tags fall back to `other`
    pub fn from_str(s: &str) -> Self {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
            .unwrap_or(FoodCategory::Other)
    }
}

/// A food in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub category: FoodCategory,
    pub unit: UnitMode,
    /// Grams in one serving; only meaningful under `perServing`
    pub serving_size: Option<f64>,
    /// Nutrients per 100g or per serving, following `unit`
    pub nutrients: Macros,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodDraft {
    pub name: String,
    pub brand: Option<String>,
    #[serde(default)]
    pub category: FoodCategory,
    #[serde(default)]
    pub unit: UnitMode,
    pub serving_size: Option<f64>,
    #[serde(default)]
    pub kcal: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub protein: f64,
}

/// Data for updating a food; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodUpdate {
    pub name: Option<String>,
    /// An empty string clears the brand
    pub brand: Option<String>,
    pub category: Option<FoodCategory>,
    pub unit: Option<UnitMode>,
    pub serving_size: Option<f64>,
    pub kcal: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub protein: Option<f64>,
}

/// Result of a food update
#[derive(Debug, Clone, Serialize)]
pub struct FoodUpdateOutcome {
    pub food: Food,
    /// Entries whose quantity was converted to the food's new unit
    pub entries_converted: usize,
}

impl FoodDraft {
    /// Enforce the food invariants, returning the normalized draft
    pub fn validate(mut self) -> DbResult<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(DbError::Invalid("Food name cannot be empty".to_string()));
        }

        self.brand = self
            .brand
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        if self.unit == UnitMode::PerServing {
            match self.serving_size {
                Some(size) if size.is_finite() && size >= MIN_SERVING_SIZE => {}
                Some(size) => {
                    return Err(DbError::Invalid(format!(
                        "serving_size must be at least {} gram for perServing foods (got {})",
                        MIN_SERVING_SIZE, size
                    )));
                }
                None => {
                    return Err(DbError::Invalid(
                        "serving_size is required for perServing foods".to_string(),
                    ));
                }
            }
        } else if let Some(size) = self.serving_size {
            // Kept as metadata for a later switch to perServing
            if !size.is_finite() || size < MIN_SERVING_SIZE {
                self.serving_size = None;
            }
        }

        self.kcal = non_negative(self.kcal);
        self.fat = non_negative(self.fat);
        self.carbs = non_negative(self.carbs);
        self.protein = non_negative(self.protein);

        Ok(self)
    }

    fn from_food(food: &Food) -> Self {
        Self {
            name: food.name.clone(),
            brand: food.brand.clone(),
            category: food.category,
            unit: food.unit,
            serving_size: food.serving_size,
            kcal: food.nutrients.kcal,
            fat: food.nutrients.fat,
            carbs: food.nutrients.carbs,
            protein: food.nutrients.protein,
        }
    }

    fn apply(mut self, update: &FoodUpdate) -> Self {
        if let Some(ref name) = update.name {
            self.name = name.clone();
        }
        if let Some(ref brand) = update.brand {
            self.brand = Some(brand.clone());
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(unit) = update.unit {
            self.unit = unit;
        }
        if let Some(size) = update.serving_size {
            self.serving_size = Some(size);
        }
        if let Some(kcal) = update.kcal {
            self.kcal = kcal;
        }
        if let Some(fat) = update.fat {
            self.fat = fat;
        }
        if let Some(carbs) = update.carbs {
            self.carbs = carbs;
        }
        if let Some(protein) = update.protein {
            self.protein = protein;
        }
        self
    }

    /// Preview the food this draft would produce, for unit conversion
    fn preview(&self, id: i64) -> Food {
        Food {
            id,
            name: self.name.clone(),
            brand: self.brand.clone(),
            category: self.category,
            unit: self.unit,
            serving_size: self.serving_size,
            nutrients: Macros::new(self.kcal, self.fat, self.carbs, self.protein),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}

impl Food {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let category: String = row.get("category")?;
        let unit: String = row.get("unit")?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            brand: row.get("brand")?,
            category: FoodCategory::from_str(&category),
            unit: UnitMode::from_str(&unit).unwrap_or_default(),
            serving_size: row.get("serving_size")?,
            nutrients: Macros {
                kcal: row.get("kcal")?,
                fat: row.get("fat")?,
                carbs: row.get("carbs")?,
                protein: row.get("protein")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// "Name (Brand)" or just the name
    pub fn display_name(&self) -> String {
        match self.brand {
            Some(ref brand) => format!("{} ({})", self.name, brand),
            None => self.name.clone(),
        }
    }

    /// Insert a new food into the database
    pub fn create(conn: &Connection, data: &FoodDraft) -> DbResult<Self> {
        let data = data.clone().validate()?;
        conn.execute(
            r#"
            INSERT INTO foods (name, brand, category, unit, serving_size, kcal, fat, carbs, protein)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                data.name,
                data.brand,
                data.category.as_str(),
                data.unit.as_str(),
                data.serving_size,
                data.kcal,
                data.fat,
                data.carbs,
                data.protein,
            ],
        )?;

        let id = conn.last_insert_rowid();
        tracing::info!(food_id = id, name = %data.name, "Created food");
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("Food {}", id)))
    }

    /// Store a food under a caller-chosen id, overwriting the food already
    /// stored there (backup restore and remote pull)
    pub fn save_with_id(conn: &Connection, id: i64, data: &FoodDraft) -> DbResult<Self> {
        let data = data.clone().validate()?;
        conn.execute(
            r#"
            INSERT INTO foods (id, name, brand, category, unit, serving_size, kcal, fat, carbs, protein)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                brand = excluded.brand,
                category = excluded.category,
                unit = excluded.unit,
                serving_size = excluded.serving_size,
                kcal = excluded.kcal,
                fat = excluded.fat,
                carbs = excluded.carbs,
                protein = excluded.protein,
                updated_at = datetime('now')
            "#,
            params![
                id,
                data.name,
                data.brand,
                data.category.as_str(),
                data.unit.as_str(),
                data.serving_size,
                data.kcal,
                data.fat,
                data.carbs,
                data.protein,
            ],
        )?;
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("Food {}", id)))
    }

    /// Get a food by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM foods WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(food) => Ok(Some(food)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Search foods by name or brand
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", query.trim());
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM foods
            WHERE name LIKE ?1 OR brand LIKE ?1
            ORDER BY name ASC
            LIMIT ?2
            "#,
        )?;

        let foods = stmt
            .query_map(params![pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(foods)
    }

    /// List foods, optionally limited to one category, ordered by name
    pub fn list(
        conn: &Connection,
        category: Option<FoodCategory>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let foods = match category {
            Some(cat) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM foods WHERE category = ?1 ORDER BY name ASC LIMIT ?2 OFFSET ?3",
                )?;
                let rows = stmt
                    .query_map(params![cat.as_str(), limit, offset], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT * FROM foods ORDER BY name ASC LIMIT ?1 OFFSET ?2")?;
                let rows = stmt
                    .query_map(params![limit, offset], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(foods)
    }

    /// Every food, for building a resolver
    pub fn all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM foods ORDER BY id ASC")?;
        let foods = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(foods)
    }

    /// Load the whole catalog as an id -> food lookup
    pub fn load_catalog(conn: &Connection) -> DbResult<Catalog> {
        Ok(Catalog::from_foods(Self::all(conn)?))
    }

    /// Count foods (optionally filtered by category)
    pub fn count(conn: &Connection, category: Option<FoodCategory>) -> DbResult<i64> {
        let count: i64 = match category {
            Some(cat) => conn.query_row(
                "SELECT COUNT(*) FROM foods WHERE category = ?1",
                [cat.as_str()],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM foods", [], |row| row.get(0))?,
        };
        Ok(count)
    }

    /// Number of entries referencing this food
    pub fn entry_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE food_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Update a food.
    ///
    /// When the unit changes, quantities of every entry referencing the food
    /// are converted so the logged amount of substance stays the same. The
    /// retained label of those entries follows a rename.
    pub fn update(conn: &Connection, id: i64, data: &FoodUpdate) -> DbResult<Option<FoodUpdateOutcome>> {
        let old = match Self::get_by_id(conn, id)? {
            Some(food) => food,
            None => return Ok(None),
        };

        let draft = FoodDraft::from_food(&old).apply(data).validate()?;
        let new_shape = draft.preview(id);

        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            UPDATE foods SET
                name = ?1, brand = ?2, category = ?3, unit = ?4, serving_size = ?5,
                kcal = ?6, fat = ?7, carbs = ?8, protein = ?9,
                updated_at = datetime('now')
            WHERE id = ?10
            "#,
            params![
                draft.name,
                draft.brand,
                draft.category.as_str(),
                draft.unit.as_str(),
                draft.serving_size,
                draft.kcal,
                draft.fat,
                draft.carbs,
                draft.protein,
                id,
            ],
        )?;

        let mut entries_converted = 0;
        if old.unit != new_shape.unit {
            let quantities: Vec<(i64, f64)> = {
                let mut stmt = tx.prepare("SELECT id, quantity FROM entries WHERE food_id = ?1")?;
                let rows = stmt
                    .query_map([id], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            };

            for (entry_id, quantity) in quantities {
                let converted = convert_quantity(quantity, Some(&old), Some(&new_shape));
                tx.execute(
                    "UPDATE entries SET quantity = ?1, updated_at = datetime('now') WHERE id = ?2",
                    params![converted, entry_id],
                )?;
                entries_converted += 1;
            }
        }

        if old.name != draft.name {
            tx.execute(
                "UPDATE entries SET food_label = ?1 WHERE food_id = ?2",
                params![draft.name, id],
            )?;
        }

        tx.commit()?;

        if entries_converted > 0 {
            tracing::info!(
                food_id = id,
                from = %old.unit,
                to = %new_shape.unit,
                entries_converted,
                "Converted entry quantities after unit change"
            );
        }

        let food = Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("Food {}", id)))?;
        Ok(Some(FoodUpdateOutcome {
            food,
            entries_converted,
        }))
    }

    /// Delete a food. Entries referencing it are left in place and
    /// resolve to nothing from now on.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM foods WHERE id = ?1", [id])?;
        if rows > 0 {
            tracing::info!(food_id = id, "Deleted food");
        }
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn chicken() -> FoodDraft {
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
        }
    }

    fn whey() -> FoodDraft {
        FoodDraft {
            name: "Whey".to_string(),
            brand: Some("  ON ".to_string()),
            category: FoodCategory::Other,
            unit: UnitMode::PerServing,
            serving_size: Some(30.0),
            kcal: 120.0,
            fat: 1.5,
            carbs: 3.0,
            protein: 24.0,
        }
    }

    #[test]
    fn test_category_fallback() {
        assert_eq!(FoodCategory::from_str("Dairy"), FoodCategory::Dairy);
        assert_eq!(FoodCategory::from_str("spaceship"), FoodCategory::Other);
    }

    #[test]
    fn test_per_serving_requires_serving_size() {
        let mut draft = whey();
        draft.serving_size = None;
        assert!(matches!(draft.validate(), Err(DbError::Invalid(_))));

        let mut draft = whey();
        draft.serving_size = Some(0.5);
        assert!(matches!(draft.validate(), Err(DbError::Invalid(_))));
    }

    #[test]
    fn test_validate_sanitizes_nutrients_and_brand() {
        let mut draft = whey();
        draft.fat = -4.0;
        draft.carbs = f64::NAN;
        let draft = draft.validate().unwrap();
        assert_eq!(draft.fat, 0.0);
        assert_eq!(draft.carbs, 0.0);
        assert_eq!(draft.brand.as_deref(), Some("ON"));
    }

    #[test]
    fn test_create_get_and_search() {
        let conn = test_conn();
        let food = Food::create(&conn, &chicken()).unwrap();
        assert_eq!(food.unit, UnitMode::Per100g);
        assert_eq!(food.nutrients.protein, 31.0);

        let found = Food::search(&conn, "chick", 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(Food::count(&conn, Some(FoodCategory::Meat)).unwrap(), 1);
        assert_eq!(Food::count(&conn, Some(FoodCategory::Fish)).unwrap(), 0);
    }

    #[test]
    fn test_unit_change_converts_entries() {
        let conn = test_conn();
        let food = Food::create(&conn, &whey()).unwrap();
        conn.execute(
            "INSERT INTO entries (date, food_id, food_label, quantity, meal) VALUES ('2025-01-01', ?1, 'Whey', 2, 'snack')",
            [food.id],
        )
        .unwrap();

        let outcome = Food::update(
            &conn,
            food.id,
            &FoodUpdate {
                unit: Some(UnitMode::Per100g),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

        assert_eq!(outcome.entries_converted, 1);
        let quantity: f64 = conn
            .query_row("SELECT quantity FROM entries WHERE food_id = ?1", [food.id], |r| r.get(0))
            .unwrap();
        assert_eq!(quantity, 60.0);
    }

    #[test]
    fn test_serving_size_change_leaves_entries_alone() {
        let conn = test_conn();
        let food = Food::create(&conn, &whey()).unwrap();
        conn.execute(
            "INSERT INTO entries (date, food_id, food_label, quantity, meal) VALUES ('2025-01-01', ?1, 'Whey', 2, 'snack')",
            [food.id],
        )
        .unwrap();

        let outcome = Food::update(
            &conn,
            food.id,
            &FoodUpdate {
                serving_size: Some(45.0),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

        assert_eq!(outcome.entries_converted, 0);
        assert_eq!(outcome.food.serving_size, Some(45.0));
        let quantity: f64 = conn
            .query_row("SELECT quantity FROM entries WHERE food_id = ?1", [food.id], |r| r.get(0))
            .unwrap();
        assert_eq!(quantity, 2.0);
    }

    #[test]
    fn test_delete_does_not_cascade() {
        let conn = test_conn();
        let food = Food::create(&conn, &chicken()).unwrap();
        conn.execute(
            "INSERT INTO entries (date, food_id, food_label, quantity, meal) VALUES ('2025-01-01', ?1, 'Chicken Breast', 150, 'dinner')",
            [food.id],
        )
        .unwrap();

        assert!(Food::delete(&conn, food.id).unwrap());
        assert!(!Food::delete(&conn, food.id).unwrap());
        assert_eq!(Food::entry_count(&conn, food.id).unwrap(), 1);
        assert!(Food::get_by_id(&conn, food.id).unwrap().is_none());
    }

    #[test]
    fn test_update_missing_food_returns_none() {
        let conn = test_conn();
        let result = Food::update(&conn, 99, &FoodUpdate::default()).unwrap();
        assert!(result.is_none());
    }
}
