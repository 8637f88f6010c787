//! Food lookup used while aggregating entries

use std::collections::HashMap;

use crate::models::Food;

/// Resolves a food id to the food it names, if it still exists
pub trait FoodResolver {
    fn resolve(&self, id: i64) -> Option<&Food>;
}

impl FoodResolver for HashMap<i64, Food> {
    fn resolve(&self, id: i64) -> Option<&Food> {
        self.get(&id)
    }
}

impl<R: FoodResolver + ?Sized> FoodResolver for &R {
    fn resolve(&self, id: i64) -> Option<&Food> {
        (**self).resolve(id)
    }
}

/// In-memory snapshot of the food catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    foods: HashMap<i64, Food>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_foods(foods: impl IntoIterator<Item = Food>) -> Self {
        Self {
            foods: foods.into_iter().map(|f| (f.id, f)).collect(),
        }
    }

    pub fn insert(&mut self, food: Food) {
        self.foods.insert(food.id, food);
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    pub fn foods(&self) -> impl Iterator<Item = &Food> {
        self.foods.values()
    }
}

impl FoodResolver for Catalog {
    fn resolve(&self, id: i64) -> Option<&Food> {
        self.foods.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoodCategory, Macros};
    use crate::nutrition::units::UnitMode;

    fn food(id: i64, name: &str) -> Food {
        Food {
            id,
            name: name.to_string(),
            brand: None,
            category: FoodCategory::Other,
            unit: UnitMode::Per100g,
            serving_size: None,
            nutrients: Macros::zero(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_catalog_resolves_by_id() {
        let catalog = Catalog::from_foods(vec![food(1, "Rice"), food(2, "Beans")]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.resolve(2).map(|f| f.name.as_str()), Some("Beans"));
        assert!(catalog.resolve(3).is_none());
    }

    #[test]
    fn test_hash_map_and_reference_resolvers() {
        let mut map = HashMap::new();
        map.insert(7, food(7, "Apple"));
        let by_ref = &map;
        assert!(by_ref.resolve(7).is_some());
        assert!(FoodResolver::resolve(&map, 8).is_none());
    }
}
