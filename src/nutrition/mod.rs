//! Nutrition calculation module
//!
//! Macro scaling, unit conversion and aggregation over logged entries.

pub mod aggregate;
pub mod converter;
pub mod resolver;
pub mod sanitize;
pub mod scaler;
pub mod units;

pub use aggregate::{
    aggregate, daily_average, daily_series, display_name, entry_macros, goal_progress, meal_split,
    percentage, top_foods, totals, Aggregate, Average, Budget, BudgetStatus, DailyTotals,
    GoalProgress, Grouping, MealTotals, RankedFood, DEFAULT_TOP_FOODS, UNKNOWN_FOOD,
};
pub use converter::convert_quantity;
pub use resolver::{Catalog, FoodResolver};
pub use scaler::{scale, scale_factor};
pub use units::UnitMode;
