use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::llm::prompts::{portion_prompt, simple_portion_prompt};
use crate::llm::{CompletionOptions, JsonShape};
use crate::models::{Ingredient, Portion};

use super::estimator::{Estimator, EstimatorError};
use super::number_from;

const PORTION_TEMPERATURE: f32 = 0.2;

/// Largest mass accepted for one ingredient of one meal.
pub const MAX_PORTION_GRAMS: f64 = 5000.0;

/// Portion tiers, tried in order until one yields a positive mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortionStrategy {
    /// Full prompt with meal context and size guidelines.
    Detailed,
    /// Short prompt naming only the ingredient and dish.
    Simplified,
    /// Fixed default; cannot fail.
    StandardServing,
}

pub const PORTION_CHAIN: [PortionStrategy; 3] = [
    PortionStrategy::Detailed,
    PortionStrategy::Simplified,
    PortionStrategy::StandardServing,
];

#[derive(Debug, Deserialize)]
struct PortionReply {
    grams: Value,
    #[serde(default)]
    portion: Option<String>,
}

pub struct PortionResolver {
    estimator: Arc<Estimator>,
}

impl PortionResolver {
    pub fn new(estimator: Arc<Estimator>) -> Self {
        Self { estimator }
    }

    pub async fn estimate(&self, ingredient: Ingredient<'_>) -> Portion {
        for strategy in PORTION_CHAIN {
            match self.attempt(strategy, ingredient).await {
                Ok(portion) => {
                    tracing::debug!(
                        ingredient = ingredient.name,
                        grams = portion.grams,
                        tier = ?strategy,
                        "Portion resolved"
                    );
                    return portion;
                }
                Err(error) => {
                    tracing::debug!(
                        ingredient = ingredient.name,
                        tier = ?strategy,
                        error = %error,
                        "Portion tier failed"
                    );
                }
            }
        }

        Portion::standard_serving(ingredient.name)
    }

    async fn attempt(
        &self,
        strategy: PortionStrategy,
        ingredient: Ingredient<'_>,
    ) -> Result<Portion, EstimatorError> {
        let prompt = match strategy {
            PortionStrategy::Detailed => {
                portion_prompt(ingredient.name, ingredient.dish, ingredient.description)
            }
            PortionStrategy::Simplified => simple_portion_prompt(ingredient.name, ingredient.dish),
            PortionStrategy::StandardServing => {
                tracing::warn!(
                    ingredient = ingredient.name,
                    "Using standard serving for portion"
                );
                return Ok(Portion::standard_serving(ingredient.name));
            }
        };

        let reply: PortionReply = self
            .estimator
            .query(
                "portion",
                &prompt,
                JsonShape::Object,
                &CompletionOptions::with_temperature(PORTION_TEMPERATURE),
            )
            .await?;

        into_portion(ingredient.name, reply)
    }
}

/// A missing, non-numeric, non-positive or implausibly large mass fails the
/// tier.
fn into_portion(ingredient: &str, reply: PortionReply) -> Result<Portion, EstimatorError> {
    let grams = number_from(&reply.grams)
        .filter(|grams| grams.is_finite() && *grams > 0.0 && *grams <= MAX_PORTION_GRAMS)
        .ok_or_else(|| EstimatorError::MalformedOutput {
            raw: reply.grams.to_string(),
        })?;

    let human_portion = reply
        .portion
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| format!("{grams} g"));

    Ok(Portion {
        ingredient: ingredient.to_string(),
        grams,
        human_portion,
    })
}
