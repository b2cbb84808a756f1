//! Meal estimation pipeline
//!
//! A description is split into dishes, each dish into ingredients; every
//! ingredient is sized and then priced in calories. Each step walks an
//! ordered list of strategies and the first that answers wins, so a
//! degraded upstream lowers accuracy instead of failing the request.

mod calories;
mod decompose;
mod estimator;
mod orchestrator;
mod portion;
mod single_shot;

#[cfg(test)]
pub(crate) mod testing;

use serde_json::Value;

pub use calories::{heuristic_calories, CalorieResolver, CalorieStrategy, HEURISTIC_KCAL_PER_GRAM};
pub use decompose::{Decomposer, Decomposition, DishPlan};
pub use estimator::{Estimator, EstimatorError};
pub use orchestrator::{
    merge_clarification, MealPipeline, CLARIFICATION_QUESTION, MIN_DESCRIPTION_LEN,
};
pub use portion::{PortionResolver, PortionStrategy, PORTION_CHAIN};

/// Reads a JSON number, or a string that parses as one.
pub(crate) fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings() {
        assert_eq!(number_from(&json!(42)), Some(42.0));
        assert_eq!(number_from(&json!(" 7.5 ")), Some(7.5));
        assert_eq!(number_from(&json!("about 7")), None);
        assert_eq!(number_from(&json!([1])), None);
    }
}
