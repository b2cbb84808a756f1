use chrono::{DateTime, NaiveDate, Utc};
use nanoid::nanoid;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Where a calorie figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum EstimateSource {
    Database,
    LanguageModel,
    Heuristic,
}

/// One ingredient of one dish, with the context later prompts need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ingredient<'a> {
    pub name: &'a str,
    pub dish: &'a str,
    pub description: &'a str,
}

/// Estimated amount of an ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portion {
    pub ingredient: String,
    /// Always > 0.
    pub grams: f64,
    pub human_portion: String,
}

impl Portion {
    pub const DEFAULT_GRAMS: f64 = 50.0;
    pub const DEFAULT_DESCRIPTION: &'static str = "standard serving";

    pub fn standard_serving(ingredient: &str) -> Self {
        Self {
            ingredient: ingredient.to_string(),
            grams: Self::DEFAULT_GRAMS,
            human_portion: Self::DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FoodEstimate {
    pub name: String,
    pub calories: u32,
    pub portion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grams: Option<f64>,
    pub source: EstimateSource,
}

/// Foods of a finished estimate. The total is derived from `foods` on
/// construction and on deserialization; an upstream total is never kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "BreakdownWire", from = "BreakdownWire")]
pub struct MealBreakdown {
    foods: Vec<FoodEstimate>,
    total_calories: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BreakdownWire {
    #[serde(default)]
    clarification_needed: bool,
    #[serde(default)]
    foods: Vec<FoodEstimate>,
    #[serde(default)]
    total_calories: u32,
}

impl From<MealBreakdown> for BreakdownWire {
    fn from(breakdown: MealBreakdown) -> Self {
        Self {
            clarification_needed: false,
            foods: breakdown.foods,
            total_calories: breakdown.total_calories,
        }
    }
}

impl From<BreakdownWire> for MealBreakdown {
    fn from(wire: BreakdownWire) -> Self {
        MealBreakdown::new(wire.foods)
    }
}

impl MealBreakdown {
    /// The total saturates at `u32::MAX` instead of wrapping.
    pub fn new(foods: Vec<FoodEstimate>) -> Self {
        let total_calories = foods
            .iter()
            .fold(0u32, |total, food| total.saturating_add(food.calories));
        Self {
            foods,
            total_calories,
        }
    }

    pub fn foods(&self) -> &[FoodEstimate] {
        &self.foods
    }

    pub fn total_calories(&self) -> u32 {
        self.total_calories
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum MealResult {
    /// Not persisted; the caller resubmits `original + " " + answer`.
    Clarification { question: String },
    Complete(MealBreakdown),
}

impl MealResult {
    pub fn clarification(question: impl Into<String>) -> Self {
        Self::Clarification {
            question: question.into(),
        }
    }

    pub fn complete(foods: Vec<FoodEstimate>) -> Self {
        Self::Complete(MealBreakdown::new(foods))
    }

    pub fn needs_clarification(&self) -> bool {
        matches!(self, Self::Clarification { .. })
    }

    pub fn breakdown(&self) -> Option<&MealBreakdown> {
        match self {
            Self::Complete(breakdown) => Some(breakdown),
            Self::Clarification { .. } => None,
        }
    }
}

impl Serialize for MealResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MealResult::Clarification { question } => {
                let mut state = serializer.serialize_struct("MealResult", 2)?;
                state.serialize_field("clarificationNeeded", &true)?;
                state.serialize_field("question", question)?;
                state.end()
            }
            MealResult::Complete(breakdown) => breakdown.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealLogEntry {
    pub id: String,
    /// Creation time; kept when the entry is edited.
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub description: String,
    #[serde(flatten)]
    pub breakdown: MealBreakdown,
}

impl MealLogEntry {
    pub fn new(description: impl Into<String>, breakdown: MealBreakdown) -> Self {
        Self {
            id: nanoid!(),
            timestamp: Utc::now(),
            updated_at: None,
            description: description.into(),
            breakdown,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn total_calories(&self) -> u32 {
        self.breakdown.total_calories()
    }
}

/// Aggregate over a set of log entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    pub meal_count: usize,
    pub total_calories: u64,
    pub average_calories: u32,
}

impl LogStats {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a MealLogEntry>) -> Self {
        let (meal_count, total_calories) = entries
            .into_iter()
            .fold((0usize, 0u64), |(count, total), entry| {
                (count + 1, total + u64::from(entry.total_calories()))
            });

        let average_calories = if meal_count == 0 {
            0
        } else {
            (total_calories as f64 / meal_count as f64).round() as u32
        };

        Self {
            meal_count,
            total_calories,
            average_calories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub stats: LogStats,
}
