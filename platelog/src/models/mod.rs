mod meal;

pub use meal::{
    DailyStats, EstimateSource, FoodEstimate, Ingredient, LogStats, MealBreakdown, MealLogEntry,
    MealResult, Portion,
};
