use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::llm::prompts::calorie_estimate_prompt;
use crate::llm::{CompletionOptions, JsonShape};
use crate::models::{EstimateSource, FoodEstimate, Ingredient, Portion};
use crate::nutrition::NutritionSource;

use super::estimator::{Estimator, EstimatorError};
use super::number_from;

const CALORIE_TEMPERATURE: f32 = 0.1;

/// Calories per gram used when nothing better is available.
pub const HEURISTIC_KCAL_PER_GRAM: f64 = 1.5;

/// Largest calorie figure accepted for a single food.
pub const MAX_FOOD_CALORIES: u32 = 50_000;

/// Calorie tiers, tried in order until one answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalorieStrategy {
    Database,
    LanguageModel,
    Heuristic,
}

impl CalorieStrategy {
    /// The database tier is left out when no nutrition source is configured.
    pub fn chain(with_database: bool) -> Vec<CalorieStrategy> {
        let mut chain = Vec::with_capacity(3);
        if with_database {
            chain.push(CalorieStrategy::Database);
        }
        chain.push(CalorieStrategy::LanguageModel);
        chain.push(CalorieStrategy::Heuristic);
        chain
    }
}

#[derive(Debug, Deserialize)]
struct CalorieReply {
    calories: Value,
}

pub struct CalorieResolver {
    estimator: Arc<Estimator>,
    nutrition: Option<Arc<dyn NutritionSource>>,
    chain: Vec<CalorieStrategy>,
}

impl CalorieResolver {
    pub fn new(estimator: Arc<Estimator>, nutrition: Option<Arc<dyn NutritionSource>>) -> Self {
        let chain = CalorieStrategy::chain(nutrition.is_some());
        Self {
            estimator,
            nutrition,
            chain,
        }
    }

    pub fn chain(&self) -> &[CalorieStrategy] {
        &self.chain
    }

    pub async fn estimate(&self, ingredient: Ingredient<'_>, portion: &Portion) -> FoodEstimate {
        for &strategy in &self.chain {
            if let Some((calories, source)) = self.attempt(strategy, ingredient, portion).await {
                tracing::debug!(
                    ingredient = ingredient.name,
                    calories,
                    source = ?source,
                    "Calories resolved"
                );
                return FoodEstimate {
                    name: ingredient.name.to_string(),
                    calories,
                    portion: portion.human_portion.clone(),
                    grams: Some(portion.grams),
                    source,
                };
            }
        }

        FoodEstimate {
            name: ingredient.name.to_string(),
            calories: heuristic_calories(portion.grams),
            portion: portion.human_portion.clone(),
            grams: Some(portion.grams),
            source: EstimateSource::Heuristic,
        }
    }

    async fn attempt(
        &self,
        strategy: CalorieStrategy,
        ingredient: Ingredient<'_>,
        portion: &Portion,
    ) -> Option<(u32, EstimateSource)> {
        match strategy {
            CalorieStrategy::Database => {
                let source = self.nutrition.as_ref()?;
                let found = source.lookup(ingredient.name).await?;
                tracing::debug!(
                    ingredient = ingredient.name,
                    match_id = %found.match_id,
                    matched = %found.description,
                    "Nutrition database match"
                );
                Some((
                    round_calories(found.calories_per_100g * portion.grams / 100.0),
                    EstimateSource::Database,
                ))
            }
            CalorieStrategy::LanguageModel => match self.ask_model(ingredient, portion).await {
                Ok(calories) => Some((calories, EstimateSource::LanguageModel)),
                Err(error) => {
                    tracing::debug!(
                        ingredient = ingredient.name,
                        error = %error,
                        "Model calorie estimate failed"
                    );
                    None
                }
            },
            CalorieStrategy::Heuristic => {
                tracing::warn!(
                    ingredient = ingredient.name,
                    grams = portion.grams,
                    "Using heuristic calorie estimate"
                );
                Some((heuristic_calories(portion.grams), EstimateSource::Heuristic))
            }
        }
    }

    async fn ask_model(
        &self,
        ingredient: Ingredient<'_>,
        portion: &Portion,
    ) -> Result<u32, EstimatorError> {
        let reply: CalorieReply = self
            .estimator
            .query(
                "calories",
                &calorie_estimate_prompt(ingredient.name, &portion.human_portion, portion.grams),
                JsonShape::Object,
                &CompletionOptions::with_temperature(CALORIE_TEMPERATURE),
            )
            .await?;

        coerce_calories(ingredient.name, &reply.calories).ok_or_else(|| {
            EstimatorError::MalformedOutput {
                raw: reply.calories.to_string(),
            }
        })
    }
}

pub fn heuristic_calories(grams: f64) -> u32 {
    round_calories(grams * HEURISTIC_KCAL_PER_GRAM)
}

fn round_calories(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round().min(f64::from(MAX_FOOD_CALORIES)) as u32
}

/// Negative or non-numeric figures become 0 and the food is still recorded.
/// A figure above [`MAX_FOOD_CALORIES`] is rejected with `None`.
pub(crate) fn coerce_calories(food: &str, value: &Value) -> Option<u32> {
    match number_from(value) {
        Some(calories) if calories > f64::from(MAX_FOOD_CALORIES) => {
            tracing::warn!(food, value = %value, "Implausible calorie figure from model");
            None
        }
        Some(calories) if calories.is_finite() && calories >= 0.0 => Some(round_calories(calories)),
        _ => {
            tracing::warn!(food, value = %value, "Unusable calorie figure from model, recording 0");
            Some(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::pipeline::testing::{FakeNutrition, Reply, ScriptedGenerator};
    use crate::rate_limit::RateLimiter;
    use serde_json::json;

    const BREAD: Ingredient<'static> = Ingredient {
        name: "bread",
        dish: "toast",
        description: "2 eggs and toast",
    };

    fn portion(grams: f64) -> Portion {
        Portion {
            ingredient: "bread".to_string(),
            grams,
            human_portion: "1 slice".to_string(),
        }
    }

    fn resolver(
        generator: ScriptedGenerator,
        nutrition: Option<Arc<dyn NutritionSource>>,
    ) -> CalorieResolver {
        let estimator = Estimator::new(
            Arc::new(generator),
            Arc::new(RateLimiter::unlimited("test")),
            Duration::from_secs(1),
        );
        CalorieResolver::new(Arc::new(estimator), nutrition)
    }

    #[test]
    fn chain_skips_database_without_source() {
        assert_eq!(
            CalorieStrategy::chain(false),
            vec![CalorieStrategy::LanguageModel, CalorieStrategy::Heuristic]
        );
        assert_eq!(CalorieStrategy::chain(true)[0], CalorieStrategy::Database);
    }

    #[tokio::test]
    async fn database_match_scales_by_mass() {
        let nutrition: Arc<dyn NutritionSource> =
            Arc::new(FakeNutrition::new().with("bread", 265.0));
        let estimate = resolver(ScriptedGenerator::new(), Some(nutrition))
            .estimate(BREAD, &portion(30.0))
            .await;

        // 265 * 30 / 100 = 79.5
        assert_eq!(estimate.calories, 80);
        assert_eq!(estimate.source, EstimateSource::Database);
        assert_eq!(estimate.grams, Some(30.0));
    }

    #[tokio::test]
    async fn database_miss_asks_the_model() {
        let nutrition: Arc<dyn NutritionSource> = Arc::new(FakeNutrition::new());
        let generator = ScriptedGenerator::new().on(
            &["Estimate the calories", "\"bread\", 30 g"],
            Reply::text(r#"{"name": "bread", "calories": 79.4}"#),
        );

        let estimate = resolver(generator, Some(nutrition))
            .estimate(BREAD, &portion(30.0))
            .await;

        assert_eq!(estimate.calories, 79);
        assert_eq!(estimate.source, EstimateSource::LanguageModel);
        assert_eq!(estimate.portion, "1 slice");
    }

    #[tokio::test]
    async fn negative_model_calories_clamp_to_zero() {
        let generator = ScriptedGenerator::new().on(
            &["Estimate the calories"],
            Reply::text(r#"{"calories": -40}"#),
        );

        let estimate = resolver(generator, None).estimate(BREAD, &portion(30.0)).await;

        assert_eq!(estimate.calories, 0);
        assert_eq!(estimate.source, EstimateSource::LanguageModel);
    }

    #[tokio::test]
    async fn missing_calorie_field_falls_back_to_heuristic() {
        let generator = ScriptedGenerator::new().on(
            &["Estimate the calories"],
            Reply::text(r#"{"name": "bread"}"#),
        );

        let estimate = resolver(generator, None).estimate(BREAD, &portion(30.0)).await;

        assert_eq!(estimate.calories, 45);
        assert_eq!(estimate.source, EstimateSource::Heuristic);
    }

    #[tokio::test]
    async fn total_failure_uses_heuristic() {
        let nutrition: Arc<dyn NutritionSource> = Arc::new(FakeNutrition::new());
        let estimate = resolver(ScriptedGenerator::new(), Some(nutrition))
            .estimate(BREAD, &portion(5.0))
            .await;

        assert_eq!(estimate.calories, 8);
        assert_eq!(estimate.source, EstimateSource::Heuristic);
    }

    #[tokio::test]
    async fn implausible_model_calories_fall_back_to_heuristic() {
        let generator = ScriptedGenerator::new().on(
            &["Estimate the calories"],
            Reply::text(r#"{"calories": 4294967295}"#),
        );

        let estimate = resolver(generator, None).estimate(BREAD, &portion(30.0)).await;

        assert_eq!(estimate.calories, 45);
        assert_eq!(estimate.source, EstimateSource::Heuristic);
    }

    #[tokio::test]
    async fn database_tier_is_skipped_without_source() {
        let nutrition = Arc::new(FakeNutrition::new().with("bread", 265.0));
        let generator = ScriptedGenerator::new().on(
            &["Estimate the calories"],
            Reply::text(r#"{"calories": 70}"#),
        );

        let estimate = resolver(generator, None).estimate(BREAD, &portion(30.0)).await;
        assert_eq!(estimate.source, EstimateSource::LanguageModel);
        assert_eq!(nutrition.lookup_count(), 0);

        let with_database = resolver(ScriptedGenerator::new(), Some(nutrition.clone()));
        with_database.estimate(BREAD, &portion(30.0)).await;
        assert_eq!(nutrition.lookup_count(), 1);
    }

    #[test]
    fn coercion_accepts_numeric_strings() {
        assert_eq!(coerce_calories("x", &json!("120")), Some(120));
        assert_eq!(coerce_calories("x", &json!("lots")), Some(0));
        assert_eq!(coerce_calories("x", &json!(null)), Some(0));
        assert_eq!(coerce_calories("x", &json!(12.5)), Some(13));
    }

    #[test]
    fn coercion_rejects_implausible_figures() {
        assert_eq!(coerce_calories("x", &json!(50_000)), Some(MAX_FOOD_CALORIES));
        assert_eq!(coerce_calories("x", &json!(50_001)), None);
        assert_eq!(coerce_calories("x", &json!(1e300)), None);
    }

    #[test]
    fn rounding_is_capped_per_food() {
        assert_eq!(heuristic_calories(1e12), MAX_FOOD_CALORIES);
    }

    #[test]
    fn heuristic_rounds_half_up() {
        assert_eq!(heuristic_calories(50.0), 75);
        assert_eq!(heuristic_calories(5.0), 8);
        assert_eq!(heuristic_calories(30.0), 45);
    }
}
