//! Aggregation of logged entries
//!
//! Every view (day, range, meal split, trend, top foods) is a filter over
//! the same entry set followed by a field-wise sum of scaled entries.
//! Entries whose food no longer resolves contribute zero and display as
//! [`UNKNOWN_FOOD`].

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Entry, MealType, Macros, Nutrient};

use super::resolver::FoodResolver;
use super::scaler::scale;
use super::units::{round_kcal, round_macro, round_to};

/// Display name of an entry whose food was deleted
pub const UNKNOWN_FOOD: &str = "Unknown";

/// Number of foods in a top-foods ranking unless asked otherwise
pub const DEFAULT_TOP_FOODS: usize = 5;

/// Display color for an over-budget amount (dark red)
pub const OVER_BUDGET_COLOR: (u8, u8, u8) = (139, 0, 0);

/// How to slice an entry set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Grouping {
    All,
    Day { date: NaiveDate },
    Range { start: NaiveDate, end: NaiveDate },
    Meal { meal: MealType },
    DailySeries { start: NaiveDate, end: NaiveDate },
    TopFoods { nutrient: Nutrient, limit: usize },
}

/// Result of [`aggregate`]; the shape follows the grouping
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Aggregate {
    Totals(Macros),
    Series(Vec<DailyTotals>),
    Ranked(Vec<RankedFood>),
}

/// Totals for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub totals: Macros,
    pub entry_count: usize,
}

/// One row of a top-foods ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFood {
    pub name: String,
    pub value: f64,
}

/// Totals for one meal tag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealTotals {
    pub meal: MealType,
    pub totals: Macros,
    pub entry_count: usize,
}

/// Average daily intake over the days that have entries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Average {
    pub macros: Macros,
    pub days_logged: usize,
    pub days_in_range: usize,
}

/// Signed remaining budget
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "amount", rename_all = "lowercase")]
pub enum BudgetStatus {
    Left(f64),
    Over(f64),
}

/// Remaining budget for one nutrient
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Budget {
    pub goal: f64,
    pub actual: f64,
    pub remaining: f64,
    pub status: BudgetStatus,
}

/// Goal percentage and budget for one nutrient
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub nutrient: Nutrient,
    pub goal: f64,
    pub actual: f64,
    pub percentage: u64,
    pub budget: Budget,
    pub label: String,
}

impl Budget {
    pub fn new(goal: f64, actual: f64) -> Self {
        let remaining = goal - actual;
        let status = if remaining < 0.0 {
            BudgetStatus::Over(-remaining)
        } else {
            BudgetStatus::Left(remaining)
        };
        Self {
            goal,
            actual,
            remaining,
            status,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.status, BudgetStatus::Over(_))
    }

    /// "N left" or "N over"
    pub fn label(&self) -> String {
        match self.status {
            BudgetStatus::Left(amount) => format!("{} left", format_amount(amount)),
            BudgetStatus::Over(amount) => format!("{} over", format_amount(amount)),
        }
    }

    /// RGB color the amount is displayed in; `None` means the default color
    pub fn color(&self) -> Option<(u8, u8, u8)> {
        if self.is_over() {
            Some(OVER_BUDGET_COLOR)
        } else {
            None
        }
    }
}

/// Amount with at most one decimal, trailing ".0" dropped
pub fn format_amount(value: f64) -> String {
    let rounded = round_to(value, 1);
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.1}", rounded)
    }
}

/// Goal percentage, rounded to a whole number and not capped at 100.
/// A goal of zero or less yields 0.
pub fn percentage(actual: f64, goal: f64) -> u64 {
    if !(goal.is_finite() && goal > 0.0) {
        return 0;
    }
    let actual = if actual.is_finite() { actual.max(0.0) } else { 0.0 };
    (actual / goal * 100.0).round() as u64
}

/// Scaled nutrients of one entry; zero when its food is gone
pub fn entry_macros<R: FoodResolver + ?Sized>(entry: &Entry, resolver: &R) -> Macros {
    resolver
        .resolve(entry.food_id)
        .map(|food| scale(food, entry.quantity))
        .unwrap_or_default()
}

/// Name an entry is displayed under
pub fn display_name<R: FoodResolver + ?Sized>(entry: &Entry, resolver: &R) -> String {
    resolver
        .resolve(entry.food_id)
        .map(|food| food.name.clone())
        .unwrap_or_else(|| UNKNOWN_FOOD.to_string())
}

/// Field-wise sum of scaled entries
pub fn totals<'a, I, R>(entries: I, resolver: &R) -> Macros
where
    I: IntoIterator<Item = &'a Entry>,
    R: FoodResolver + ?Sized,
{
    entries
        .into_iter()
        .map(|e| entry_macros(e, resolver))
        .sum::<Macros>()
        .rounded()
}

/// Progress against each of the four goals
pub fn goal_progress(actual: &Macros, goals: &Macros) -> Vec<GoalProgress> {
    Nutrient::ALL
        .iter()
        .map(|&nutrient| {
            let goal = goals.get(nutrient);
            let value = actual.get(nutrient);
            let budget = Budget::new(goal, value);
            GoalProgress {
                nutrient,
                goal,
                actual: value,
                percentage: percentage(value, goal),
                label: budget.label(),
                budget,
            }
        })
        .collect()
}

/// One record per calendar day from `start` to `end` inclusive, zero-filled
/// for days without entries. An inverted range gives an empty series.
pub fn daily_series<R: FoodResolver + ?Sized>(
    entries: &[Entry],
    resolver: &R,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<DailyTotals> {
    if start > end {
        return Vec::new();
    }

    let mut by_day: HashMap<NaiveDate, (Macros, usize)> = HashMap::new();
    for entry in entries.iter().filter(|e| e.date >= start && e.date <= end) {
        let slot = by_day.entry(entry.date).or_default();
        slot.0 = slot.0 + entry_macros(entry, resolver);
        slot.1 += 1;
    }

    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| {
            let (sum, entry_count) = by_day.get(&date).copied().unwrap_or_default();
            DailyTotals {
                date,
                totals: sum.rounded(),
                entry_count,
            }
        })
        .collect()
}

/// Mean daily intake over the days in range that have at least one entry
pub fn daily_average<R: FoodResolver + ?Sized>(
    entries: &[Entry],
    resolver: &R,
    start: NaiveDate,
    end: NaiveDate,
) -> Average {
    let series = daily_series(entries, resolver, start, end);
    let days_in_range = series.len();
    let logged: Vec<&DailyTotals> = series.iter().filter(|d| d.entry_count > 0).collect();
    let days_logged = logged.len();

    let macros = if days_logged == 0 {
        Macros::zero()
    } else {
        logged
            .iter()
            .map(|d| d.totals)
            .sum::<Macros>()
            .scale(1.0 / days_logged as f64)
            .rounded()
    };

    Average {
        macros,
        days_logged,
        days_in_range,
    }
}

/// Foods ranked by their summed contribution of one nutrient.
///
/// Entries are grouped by food name, so variants of a food under separate
/// ids collapse together. Entries whose food is gone are left out.
pub fn top_foods<R: FoodResolver + ?Sized>(
    entries: &[Entry],
    resolver: &R,
    nutrient: Nutrient,
    limit: usize,
) -> Vec<RankedFood> {
    let mut by_name: BTreeMap<&str, f64> = BTreeMap::new();
    for entry in entries {
        if let Some(food) = resolver.resolve(entry.food_id) {
            *by_name.entry(food.name.as_str()).or_insert(0.0) +=
                scale(food, entry.quantity).get(nutrient);
        }
    }

    let mut ranked: Vec<RankedFood> = by_name
        .into_iter()
        .map(|(name, value)| RankedFood {
            name: name.to_string(),
            value: match nutrient {
                Nutrient::Kcal => round_kcal(value),
                _ => round_macro(value),
            },
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked.truncate(limit);
    ranked
}

/// Totals per meal, in breakfast, lunch, dinner, snack, other order
pub fn meal_split<R: FoodResolver + ?Sized>(entries: &[Entry], resolver: &R) -> Vec<MealTotals> {
    MealType::ALL
        .iter()
        .map(|&meal| {
            let in_meal: Vec<&Entry> = entries.iter().filter(|e| e.meal == meal).collect();
            MealTotals {
                meal,
                entry_count: in_meal.len(),
                totals: totals(in_meal, resolver),
            }
        })
        .collect()
}

/// Slice `entries` according to `grouping`
pub fn aggregate<R: FoodResolver + ?Sized>(
    entries: &[Entry],
    resolver: &R,
    grouping: &Grouping,
) -> Aggregate {
    match *grouping {
        Grouping::All => Aggregate::Totals(totals(entries, resolver)),
        Grouping::Day { date } => {
            Aggregate::Totals(totals(entries.iter().filter(|e| e.date == date), resolver))
        }
        Grouping::Range { start, end } => Aggregate::Totals(totals(
            entries.iter().filter(|e| e.date >= start && e.date <= end),
            resolver,
        )),
        Grouping::Meal { meal } => {
            Aggregate::Totals(totals(entries.iter().filter(|e| e.meal == meal), resolver))
        }
        Grouping::DailySeries { start, end } => {
            Aggregate::Series(daily_series(entries, resolver, start, end))
        }
        Grouping::TopFoods { nutrient, limit } => {
            Aggregate::Ranked(top_foods(entries, resolver, nutrient, limit))
        }
    }
}
