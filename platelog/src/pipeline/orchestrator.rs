use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{LlmConfig, PipelineConfig, PipelineMode};
use crate::error::{PlatelogError, Result};
use crate::llm::TextGenerator;
use crate::models::{EstimateSource, Ingredient, MealResult};
use crate::nutrition::NutritionSource;
use crate::rate_limit::RateLimiter;

use super::calories::{CalorieResolver, CalorieStrategy};
use super::decompose::Decomposer;
use super::estimator::Estimator;
use super::portion::PortionResolver;
use super::single_shot;

/// Shortest accepted description, in characters, after trimming.
pub const MIN_DESCRIPTION_LEN: usize = 2;

pub const CLARIFICATION_QUESTION: &str = "Could you describe your meal in more detail? \
    For example, what size was it and how was it prepared?";

/// Description to resubmit after the user answers a clarification question.
pub fn merge_clarification(original: &str, answer: &str) -> String {
    format!("{} {}", original.trim(), answer.trim())
        .trim()
        .to_string()
}

pub struct MealPipeline {
    mode: PipelineMode,
    estimator: Arc<Estimator>,
    decomposer: Decomposer,
    portions: PortionResolver,
    calories: CalorieResolver,
    max_meal_calories: Option<u32>,
}

impl MealPipeline {
    /// `nutrition` is `None` when the database tier is disabled.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        llm_limiter: Arc<RateLimiter>,
        nutrition: Option<Arc<dyn NutritionSource>>,
        llm: &LlmConfig,
        pipeline: &PipelineConfig,
    ) -> Self {
        let estimator = Arc::new(Estimator::new(
            generator,
            llm_limiter,
            Duration::from_secs(llm.timeout_secs),
        ));

        Self {
            mode: pipeline.mode,
            decomposer: Decomposer::new(estimator.clone()),
            portions: PortionResolver::new(estimator.clone()),
            calories: CalorieResolver::new(estimator.clone(), nutrition),
            estimator,
            max_meal_calories: pipeline.max_meal_calories,
        }
    }

    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    pub fn calorie_chain(&self) -> &[CalorieStrategy] {
        self.calories.chain()
    }

    /// Estimate one meal.
    ///
    /// Only a blank or too-short description is an error. Upstream failures
    /// degrade into fallback estimates, or into a clarification question when
    /// nothing useful could be learned.
    pub async fn process_meal(&self, description: &str) -> Result<MealResult> {
        let description = description.trim();
        if description.chars().count() < MIN_DESCRIPTION_LEN {
            return Err(PlatelogError::Validation(
                "Please describe your meal".to_string(),
            ));
        }

        let started = Instant::now();
        let result = match self.mode {
            PipelineMode::Staged => self.run_staged(description).await,
            PipelineMode::SingleShot => single_shot::estimate(&self.estimator, description).await,
        };
        let result = self.check_total(result);

        match result.breakdown() {
            Some(breakdown) => tracing::info!(
                mode = %self.mode,
                foods = breakdown.foods().len(),
                total_calories = breakdown.total_calories(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Meal estimated"
            ),
            None => tracing::info!(
                mode = %self.mode,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Meal needs clarification"
            ),
        }

        Ok(result)
    }

    async fn run_staged(&self, description: &str) -> MealResult {
        let decomposition = self.decomposer.decompose(description).await;

        let mut foods = Vec::new();
        for dish in &decomposition.dishes {
            for name in &dish.ingredients {
                let ingredient = Ingredient {
                    name,
                    dish: &dish.name,
                    description,
                };
                let portion = self.portions.estimate(ingredient).await;
                foods.push(self.calories.estimate(ingredient, &portion).await);
            }
        }

        let all_guessed = foods
            .iter()
            .all(|food| food.source == EstimateSource::Heuristic);
        if decomposition.upstream_unreachable() && all_guessed {
            tracing::warn!("Model unreachable and no database matches, asking for clarification");
            return MealResult::clarification(CLARIFICATION_QUESTION);
        }

        MealResult::complete(foods)
    }

    fn check_total(&self, result: MealResult) -> MealResult {
        let Some(max) = self.max_meal_calories else {
            return result;
        };
        let Some(total) = result.breakdown().map(|b| b.total_calories()) else {
            return result;
        };

        if total <= max {
            return result;
        }

        tracing::warn!(
            total_calories = total,
            max_meal_calories = max,
            "Implausible meal total"
        );
        MealResult::clarification(format!(
            "That comes to about {total} calories, which is more than a typical meal. \
             Could you confirm the portion sizes or how many servings you had?"
        ))
    }
}
