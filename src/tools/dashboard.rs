//! Dashboard MCP Tools
//!
//! Day view, trend view and top-foods ranking, all computed at read time
//! from entries and the current food catalog.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::models::{Entry, EntryDetail, Food, Goals, Macros, Nutrient};
use crate::nutrition::{
    daily_average, daily_series, goal_progress, meal_split, totals, Average, Catalog, DailyTotals,
    GoalProgress, MealTotals, RankedFood, DEFAULT_TOP_FOODS,
};
use crate::nutrition::top_foods as rank_foods;

use super::{parse_date, parse_range};

#[derive(Debug, Serialize)]
pub struct DaySummaryResponse {
    pub date: NaiveDate,
    pub entries: Vec<EntryDetail>,
    pub totals: Macros,
    pub goals: Macros,
    pub progress: Vec<GoalProgress>,
    pub meals: Vec<MealTotals>,
}

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub series: Vec<DailyTotals>,
    /// Mean over days with at least one entry
    pub average: Average,
    pub goals: Macros,
}

#[derive(Debug, Serialize)]
pub struct TopFoodsResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub nutrient: Nutrient,
    pub unit: &'static str,
    pub foods: Vec<RankedFood>,
}

/// Entries in a date range together with the catalog they resolve against
pub fn load_range(
    db: &Database,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(Vec<Entry>, Catalog), String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let entries =
        Entry::for_range(&conn, start, end).map_err(|e| format!("Failed to load entries: {}", e))?;
    let catalog = Food::load_catalog(&conn).map_err(|e| format!("Failed to load foods: {}", e))?;
    tracing::debug!(%start, %end, entries = entries.len(), foods = catalog.len(), "Loaded range");
    Ok((entries, catalog))
}

/// Current goals as a `Macros`
pub fn load_goals(db: &Database) -> Result<Macros, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Goals::get(&conn)
        .map(|g| g.as_macros())
        .map_err(|e| format!("Failed to get goals: {}", e))
}

/// Everything the daily view shows
pub fn day_summary(db: &Database, date: &str) -> Result<DaySummaryResponse, String> {
    let date = parse_date(date)?;
    let (entries, catalog) = load_range(db, date, date)?;
    let goals = load_goals(db)?;

    let day_totals = totals(&entries, &catalog);

    Ok(DaySummaryResponse {
        date,
        entries: entries.iter().map(|e| e.detail(&catalog)).collect(),
        progress: goal_progress(&day_totals, &goals),
        meals: meal_split(&entries, &catalog),
        totals: day_totals,
        goals,
    })
}

/// Zero-filled daily series plus averages over logged days
pub fn trend(db: &Database, start_date: &str, end_date: &str) -> Result<TrendResponse, String> {
    let (start, end) = parse_range(start_date, end_date)?;
    let (entries, catalog) = load_range(db, start, end)?;
    let goals = load_goals(db)?;

    Ok(TrendResponse {
        start_date: start,
        end_date: end,
        series: daily_series(&entries, &catalog, start, end),
        average: daily_average(&entries, &catalog, start, end),
        goals,
    })
}

/// Foods contributing most of one nutrient over a range
pub fn top_foods(
    db: &Database,
    start_date: &str,
    end_date: &str,
    nutrient: &str,
    limit: Option<usize>,
) -> Result<TopFoodsResponse, String> {
    let (start, end) = parse_range(start_date, end_date)?;
    let nutrient = Nutrient::from_str(nutrient).ok_or_else(|| {
        format!("Invalid nutrient '{}'. Valid values: kcal, fat, carbs, protein", nutrient)
    })?;
    let limit = limit.unwrap_or(DEFAULT_TOP_FOODS).clamp(1, 50);

    let (entries, catalog) = load_range(db, start, end)?;
    let foods = rank_foods(&entries, &catalog, nutrient, limit);

    Ok(TopFoodsResponse {
        start_date: start,
        end_date: end,
        nutrient,
        unit: nutrient.unit(),
        foods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::{FoodCategory, FoodDraft};
    use crate::nutrition::{BudgetStatus, UnitMode};
    use crate::tools::entries::log_entry;
    use crate::tools::foods::add_food;

    fn food(db: &Database, name: &str, unit: UnitMode, serving: Option<f64>, kcal: f64, protein: f64) -> i64 {
        add_food(
            db,
            FoodDraft {
                name: name.to_string(),
                brand: None,
                category: FoodCategory::Other,
                unit,
                serving_size: serving,
                kcal,
                fat: 0.0,
                carbs: 0.0,
                protein,
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_day_summary_reports_overage() {
        let db = open_in_memory().unwrap();
        let pizza = food(&db, "Pizza", UnitMode::PerServing, Some(120.0), 1200.0, 50.0);
        log_entry(&db, "2025-04-01", pizza, 2.0, Some("dinner")).unwrap();

        let summary = day_summary(&db, "2025-04-01").unwrap();
        assert_eq!(summary.totals.kcal, 2400.0);
        let kcal = &summary.progress[0];
        assert_eq!(kcal.percentage, 120);
        assert_eq!(kcal.budget.status, BudgetStatus::Over(400.0));
        assert_eq!(kcal.label, "400 over");
        assert_eq!(summary.meals[2].totals.kcal, 2400.0);
    }

    #[test]
    fn test_trend_averages_logged_days_only() {
        let db = open_in_memory().unwrap();
        let bar = food(&db, "Bar", UnitMode::PerServing, Some(50.0), 100.0, 0.0);
        log_entry(&db, "2025-04-01", bar, 20.0, None).unwrap();
        log_entry(&db, "2025-04-03", bar, 22.0, None).unwrap();

        let trend = trend(&db, "2025-04-01", "2025-04-03").unwrap();
        assert_eq!(trend.series.len(), 3);
        assert_eq!(trend.series[1].totals.kcal, 0.0);
        assert_eq!(trend.average.macros.kcal, 2100.0);
        assert_eq!(trend.average.days_logged, 2);
    }

    #[test]
    fn test_top_foods_by_protein() {
        let db = open_in_memory().unwrap();
        let chicken = food(&db, "Chicken", UnitMode::Per100g, None, 165.0, 31.0);
        let rice = food(&db, "Rice", UnitMode::Per100g, None, 130.0, 2.7);
        log_entry(&db, "2025-04-01", chicken, 200.0, None).unwrap();
        log_entry(&db, "2025-04-02", rice, 300.0, None).unwrap();

        let top = top_foods(&db, "2025-04-01", "2025-04-07", "protein", None).unwrap();
        assert_eq!(top.foods[0].name, "Chicken");
        assert_eq!(top.foods[0].value, 62.0);
        assert_eq!(top.unit, "g");
        assert!(top_foods(&db, "2025-04-01", "2025-04-07", "fiber", None).is_err());
    }
}
