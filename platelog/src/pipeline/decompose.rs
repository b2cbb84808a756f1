use std::sync::Arc;

use crate::llm::prompts::{dish_identification_prompt, ingredient_breakdown_prompt};
use crate::llm::{CompletionOptions, JsonShape};

use super::estimator::{Estimator, EstimatorError};

const DECOMPOSE_TEMPERATURE: f32 = 0.2;

/// A dish and the ingredients it was broken into, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DishPlan {
    pub name: String,
    pub ingredients: Vec<String>,
}

/// Dishes of a meal, plus the identification failure if the fallback was used.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub dishes: Vec<DishPlan>,
    pub identification_error: Option<EstimatorError>,
}

impl Decomposition {
    /// True when dish identification could not reach the language model.
    pub fn upstream_unreachable(&self) -> bool {
        self.identification_error
            .as_ref()
            .is_some_and(EstimatorError::is_unavailable)
    }
}

pub struct Decomposer {
    estimator: Arc<Estimator>,
}

impl Decomposer {
    pub fn new(estimator: Arc<Estimator>) -> Self {
        Self { estimator }
    }

    /// Never fails: the whole description stands in for a dish, and a dish
    /// stands in for its own ingredient, whenever the model cannot answer.
    pub async fn decompose(&self, description: &str) -> Decomposition {
        let (dish_names, identification_error) = match self.identify_dishes(description).await {
            Ok(dishes) => (dishes, None),
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    "Dish identification failed, using the whole description"
                );
                (vec![description.to_string()], Some(error))
            }
        };

        let mut dishes = Vec::with_capacity(dish_names.len());
        for dish in dish_names {
            let ingredients = match self.break_into_ingredients(&dish, description).await {
                Ok(ingredients) => ingredients,
                Err(error) => {
                    tracing::warn!(
                        dish = %dish,
                        error = %error,
                        "Ingredient breakdown failed, using the dish itself"
                    );
                    vec![dish.clone()]
                }
            };
            dishes.push(DishPlan {
                name: dish,
                ingredients,
            });
        }

        Decomposition {
            dishes,
            identification_error,
        }
    }

    pub async fn identify_dishes(&self, description: &str) -> Result<Vec<String>, EstimatorError> {
        let names: Vec<String> = self
            .estimator
            .query(
                "dishes",
                &dish_identification_prompt(description),
                JsonShape::Array,
                &CompletionOptions::with_temperature(DECOMPOSE_TEMPERATURE),
            )
            .await?;

        let dishes = non_empty_names(names)?;
        tracing::debug!(count = dishes.len(), "Identified dishes");
        Ok(dishes)
    }

    pub async fn break_into_ingredients(
        &self,
        dish: &str,
        description: &str,
    ) -> Result<Vec<String>, EstimatorError> {
        let names: Vec<String> = self
            .estimator
            .query(
                "ingredients",
                &ingredient_breakdown_prompt(dish, description),
                JsonShape::Array,
                &CompletionOptions::with_temperature(DECOMPOSE_TEMPERATURE),
            )
            .await?;

        non_empty_names(names)
    }
}

/// Blank entries are dropped; an answer with nothing left is malformed.
fn non_empty_names(names: Vec<String>) -> Result<Vec<String>, EstimatorError> {
    let cleaned: Vec<String> = names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    if cleaned.is_empty() {
        return Err(EstimatorError::MalformedOutput {
            raw: "[]".to_string(),
        });
    }
    Ok(cleaned)
}
