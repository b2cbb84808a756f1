mod usda;

use async_trait::async_trait;

pub use usda::FoodDataClient;

/// Energy data for the food-composition entry matched to an ingredient name.
#[derive(Debug, Clone, PartialEq)]
pub struct NutritionMatch {
    pub calories_per_100g: f64,
    pub match_id: String,
    pub description: String,
}

/// A food-composition database queried by ingredient name.
///
/// `None` is the normal "not found" outcome and also covers network
/// failures; roughly half of free-text names are expected to miss.
#[async_trait]
pub trait NutritionSource: Send + Sync {
    async fn lookup(&self, name: &str) -> Option<NutritionMatch>;
}
