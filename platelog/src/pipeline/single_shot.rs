use serde::Deserialize;
use serde_json::Value;

use crate::llm::prompts::single_shot_prompt;
use crate::llm::{CompletionOptions, JsonShape};
use crate::models::{EstimateSource, FoodEstimate, MealResult, Portion};

use super::calories::coerce_calories;
use super::estimator::{Estimator, EstimatorError};
use super::orchestrator::CLARIFICATION_QUESTION;

const SINGLE_SHOT_TEMPERATURE: f32 = 0.3;

/// Recorded for the whole description when the model's answer is unusable.
pub const FALLBACK_MEAL_CALORIES: u32 = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SingleShotReply {
    #[serde(default)]
    clarification_needed: bool,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    foods: Vec<SingleShotFood>,
}

#[derive(Debug, Deserialize)]
struct SingleShotFood {
    #[serde(default)]
    name: String,
    #[serde(default)]
    calories: Value,
    #[serde(default)]
    portion: Option<String>,
}

/// One prompt for the whole meal. The model may ask a question instead.
pub(super) async fn estimate(estimator: &Estimator, description: &str) -> MealResult {
    let reply = estimator
        .query::<SingleShotReply>(
            "single_shot",
            &single_shot_prompt(description),
            JsonShape::Object,
            &CompletionOptions::with_temperature(SINGLE_SHOT_TEMPERATURE),
        )
        .await;

    match reply {
        Ok(reply) if reply.clarification_needed => {
            let question = reply
                .question
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .unwrap_or_else(|| CLARIFICATION_QUESTION.to_string());
            MealResult::clarification(question)
        }
        Ok(reply) => {
            let Some(foods) = into_foods(reply.foods) else {
                tracing::warn!("Implausible food calories in breakdown, using fallback");
                return fallback(description);
            };
            if foods.is_empty() {
                tracing::warn!("Model listed no foods, recording fallback estimate");
                return fallback(description);
            }
            MealResult::complete(foods)
        }
        Err(EstimatorError::ServiceUnavailable { reason }) => {
            tracing::warn!(
                reason = %reason,
                "Language model unreachable, asking for clarification"
            );
            MealResult::clarification(CLARIFICATION_QUESTION)
        }
        Err(EstimatorError::MalformedOutput { .. }) => {
            tracing::warn!("Unparseable meal breakdown, recording fallback estimate");
            fallback(description)
        }
    }
}

/// Unnamed foods are dropped. `None` when any food carries an implausible
/// calorie figure, which makes the whole answer unusable.
fn into_foods(foods: Vec<SingleShotFood>) -> Option<Vec<FoodEstimate>> {
    let mut estimates = Vec::with_capacity(foods.len());
    for food in foods {
        let name = food.name.trim().to_string();
        if name.is_empty() {
            continue;
        }
        let calories = coerce_calories(&name, &food.calories)?;
        estimates.push(FoodEstimate {
            calories,
            portion: food
                .portion
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| Portion::DEFAULT_DESCRIPTION.to_string()),
            grams: None,
            source: EstimateSource::LanguageModel,
            name,
        });
    }
    Some(estimates)
}

fn fallback(description: &str) -> MealResult {
    MealResult::complete(vec![FoodEstimate {
        name: description.to_string(),
        calories: FALLBACK_MEAL_CALORIES,
        portion: Portion::DEFAULT_DESCRIPTION.to_string(),
        grams: None,
        source: EstimateSource::Heuristic,
    }])
}
