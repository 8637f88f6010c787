//! Food MCP Tools
//!
//! Tools for managing the food catalog.

use serde::Serialize;

use crate::db::Database;
use crate::models::{Food, FoodCategory, FoodDraft, FoodUpdate, Macros};
use crate::nutrition::UnitMode;

/// Response for add_food
#[derive(Debug, Serialize)]
pub struct AddFoodResponse {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub unit: UnitMode,
    pub created_at: String,
}

/// Summary of a food for list/search results
#[derive(Debug, Serialize)]
pub struct FoodSummary {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub category: FoodCategory,
    pub unit: UnitMode,
    pub serving_size: Option<f64>,
    pub kcal: f64,
}

impl From<&Food> for FoodSummary {
    fn from(food: &Food) -> Self {
        Self {
            id: food.id,
            name: food.name.clone(),
            brand: food.brand.clone(),
            category: food.category,
            unit: food.unit,
            serving_size: food.serving_size,
            kcal: food.nutrients.kcal,
        }
    }
}

/// Full food detail
#[derive(Debug, Serialize)]
pub struct FoodDetail {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub category: FoodCategory,
    pub unit: UnitMode,
    /// What an entry quantity for this food counts: grams or servings
    pub quantity_unit: String,
    pub serving_size: Option<f64>,
    pub nutrients: Macros,
    pub created_at: String,
    pub updated_at: String,
    pub entry_count: i64,
}

impl FoodDetail {
    pub fn from_food(food: Food, entry_count: i64) -> Self {
        Self {
            id: food.id,
            quantity_unit: food.unit.quantity_label().to_string(),
            name: food.name,
            brand: food.brand,
            category: food.category,
            unit: food.unit,
            serving_size: food.serving_size,
            nutrients: food.nutrients,
            created_at: food.created_at,
            updated_at: food.updated_at,
            entry_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchFoodsResponse {
    pub items: Vec<FoodSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ListFoodsResponse {
    pub items: Vec<FoodSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct UpdateFoodResponse {
    pub success: bool,
    pub food: FoodDetail,
    /// Entries whose quantity was rewritten for a unit change
    pub entries_converted: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteFoodResponse {
    pub success: bool,
    pub deleted_id: i64,
    /// Entries left referencing the deleted food; they now show as "Unknown"
    pub orphaned_entries: i64,
}

/// Add a new food
pub fn add_food(db: &Database, data: FoodDraft) -> Result<AddFoodResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let food = Food::create(&conn, &data).map_err(|e| format!("Failed to create food: {}", e))?;

    Ok(AddFoodResponse {
        id: food.id,
        name: food.name,
        brand: food.brand,
        unit: food.unit,
        created_at: food.created_at,
    })
}

/// Search foods by name or brand
pub fn search_foods(db: &Database, query: &str, limit: i64) -> Result<SearchFoodsResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let foods = Food::search(&conn, query, limit).map_err(|e| format!("Search failed: {}", e))?;

    let items: Vec<FoodSummary> = foods.iter().map(FoodSummary::from).collect();
    let total = items.len();

    Ok(SearchFoodsResponse { items, total })
}

/// Get a food by ID
pub fn get_food(db: &Database, id: i64) -> Result<Option<FoodDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let food = Food::get_by_id(&conn, id).map_err(|e| format!("Failed to get food: {}", e))?;

    match food {
        Some(food) => {
            let entry_count = Food::entry_count(&conn, id)
                .map_err(|e| format!("Failed to count entries: {}", e))?;
            Ok(Some(FoodDetail::from_food(food, entry_count)))
        }
        None => Ok(None),
    }
}

/// List foods with optional category filter and pagination
pub fn list_foods(
    db: &Database,
    category: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListFoodsResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);
    let category = category.map(FoodCategory::from_str);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let foods = Food::list(&conn, category, limit, offset)
        .map_err(|e| format!("Failed to list foods: {}", e))?;
    let total = Food::count(&conn, category).map_err(|e| format!("Failed to count foods: {}", e))?;

    Ok(ListFoodsResponse {
        items: foods.iter().map(FoodSummary::from).collect(),
        total,
        limit,
        offset,
    })
}

/// Update a food. Switching its unit converts the quantities of every entry
/// that references it.
pub fn update_food(db: &Database, id: i64, data: FoodUpdate) -> Result<UpdateFoodResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let outcome = Food::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update food: {}", e))?
        .ok_or_else(|| format!("Food not found with id: {}", id))?;

    let entry_count =
        Food::entry_count(&conn, id).map_err(|e| format!("Failed to count entries: {}", e))?;

    Ok(UpdateFoodResponse {
        success: true,
        food: FoodDetail::from_food(outcome.food, entry_count),
        entries_converted: outcome.entries_converted,
    })
}

/// Delete a food. Entries that reference it stay in place.
pub fn delete_food(db: &Database, id: i64) -> Result<DeleteFoodResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let orphaned_entries =
        Food::entry_count(&conn, id).map_err(|e| format!("Failed to count entries: {}", e))?;

    let deleted = Food::delete(&conn, id).map_err(|e| format!("Failed to delete food: {}", e))?;
    if !deleted {
        return Err(format!("Food not found with id: {}", id));
    }

    Ok(DeleteFoodResponse {
        success: true,
        deleted_id: id,
        orphaned_entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn yogurt() -> FoodDraft {
        FoodDraft {
            name: "Greek Yogurt".to_string(),
            brand: Some("Fage".to_string()),
            category: FoodCategory::Dairy,
            unit: UnitMode::Per100g,
            serving_size: Some(170.0),
            kcal: 97.0,
            fat: 5.0,
            carbs: 3.6,
            protein: 9.0,
        }
    }

    #[test]
    fn test_add_and_get_food() {
        let db = open_in_memory().unwrap();
        let added = add_food(&db, yogurt()).unwrap();
        let detail = get_food(&db, added.id).unwrap().unwrap();
        assert_eq!(detail.name, "Greek Yogurt");
        assert_eq!(detail.quantity_unit, "g");
        assert_eq!(detail.entry_count, 0);
        assert!(get_food(&db, added.id + 1).unwrap().is_none());
    }

    #[test]
    fn test_add_rejects_invalid_serving() {
        let db = open_in_memory().unwrap();
        let mut draft = yogurt();
        draft.unit = UnitMode::PerServing;
        draft.serving_size = None;
        let err = add_food(&db, draft).unwrap_err();
        assert!(err.contains("serving_size"));
    }

    #[test]
    fn test_list_by_category() {
        let db = open_in_memory().unwrap();
        add_food(&db, yogurt()).unwrap();
        let dairy = list_foods(&db, Some("dairy"), 50, 0).unwrap();
        assert_eq!(dairy.total, 1);
        let meat = list_foods(&db, Some("meat"), 50, 0).unwrap();
        assert_eq!(meat.total, 0);
        let search = search_foods(&db, "fage", 10).unwrap();
        assert_eq!(search.total, 1);
    }

    #[test]
    fn test_delete_missing_food() {
        let db = open_in_memory().unwrap();
        assert!(delete_food(&db, 5).is_err());
    }
}
