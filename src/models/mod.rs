//! Data models
//!
//! Rust structs representing database entities.

mod entry;
mod food;
mod goals;
mod macros;

pub use entry::{Entry, EntryCreate, EntryDetail, EntryQuery, EntryUpdate, MealType};
pub use food::{Food, FoodCategory, FoodDraft, FoodUpdate, FoodUpdateOutcome};
pub use goals::{ActivityLevel, BodyProfile, Goals, GoalsUpdate, Sex, DEFAULT_GOALS};
pub use macros::{Macros, Nutrient};
