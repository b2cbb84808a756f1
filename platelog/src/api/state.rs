use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::llm::{LlmProvider, TextGenerator};
use crate::nutrition::{FoodDataClient, NutritionSource};
use crate::pipeline::MealPipeline;
use crate::rate_limit::RateLimiter;
use crate::services::MealLog;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: LlmProvider,
    pub pipeline: Arc<MealPipeline>,
    pub meal_log: MealLog,
}

impl AppState {
    /// Builds the language-model provider and nutrition client from `config`.
    ///
    /// A missing or unusable LLM setup is not fatal: the provider reports
    /// itself unavailable and meals fall back to clarification questions.
    pub fn from_config(config: Config) -> Result<Self> {
        let llm = LlmProvider::new(&config.llm);
        if !llm.is_available() {
            tracing::warn!(backend = ?llm.backend(), "Language model unavailable");
        }

        let nutrition: Option<Arc<dyn NutritionSource>> = if config.nutrition.enabled {
            let limiter = Arc::new(RateLimiter::new(
                "nutrition",
                config.nutrition.requests_per_minute,
                config.nutrition.burst,
            ));
            if config.nutrition.is_demo_key() {
                tracing::warn!("USDA_API_KEY not set, using the rate-limited demo key");
            }
            Some(Arc::new(FoodDataClient::new(&config.nutrition, limiter)?))
        } else {
            None
        };

        Ok(Self::new(config, llm, nutrition))
    }

    pub fn new(
        config: Config,
        llm: LlmProvider,
        nutrition: Option<Arc<dyn NutritionSource>>,
    ) -> Self {
        let generator: Arc<dyn TextGenerator> = Arc::new(llm.clone());
        Self::with_generator(config, llm, generator, nutrition)
    }

    /// Like [`AppState::new`] but prompts `generator` instead of `llm`.
    pub fn with_generator(
        config: Config,
        llm: LlmProvider,
        generator: Arc<dyn TextGenerator>,
        nutrition: Option<Arc<dyn NutritionSource>>,
    ) -> Self {
        let config = Arc::new(config);
        let llm_limiter = Arc::new(RateLimiter::new(
            "llm",
            config.llm.requests_per_minute,
            config.llm.burst,
        ));
        let pipeline = MealPipeline::new(
            generator,
            llm_limiter,
            nutrition,
            &config.llm,
            &config.pipeline,
        );

        Self {
            config,
            llm,
            pipeline: Arc::new(pipeline),
            meal_log: MealLog::new(),
        }
    }
}
