use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;

fn parse_env_or<T: FromStr>(var: &str, default: T) -> T
where
    T::Err: fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// First variable in `vars` that is set, in order.
fn env_first(vars: &[&str]) -> Option<String> {
    vars.iter().find_map(|var| env::var(var).ok())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub nutrition: NutritionConfig,
    pub pipeline: PipelineConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// LLM configuration for the text-generation service
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
    pub burst: u32,
}

/// Food-composition database (USDA FoodData Central) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NutritionConfig {
    pub enabled: bool,
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
    pub burst: u32,
}

pub const USDA_DEMO_KEY: &str = "DEMO_KEY";
pub const USDA_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

impl NutritionConfig {
    pub fn is_demo_key(&self) -> bool {
        self.api_key == USDA_DEMO_KEY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// Dishes, ingredients, portions and calories, each its own stage.
    Staged,
    /// One prompt that returns the whole meal breakdown.
    SingleShot,
}

impl PipelineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staged => "staged",
            Self::SingleShot => "single_shot",
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "staged" => Ok(Self::Staged),
            "single_shot" | "singleshot" => Ok(Self::SingleShot),
            other => Err(format!("unknown pipeline mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub mode: PipelineMode,
    /// Totals above this ask the user to confirm portions. `None` disables the check.
    pub max_meal_calories: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    pub default_limit: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 15,
            requests_per_minute: 60,
            burst: 5,
        }
    }
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: USDA_DEMO_KEY.to_string(),
            base_url: USDA_BASE_URL.to_string(),
            timeout_secs: 5,
            requests_per_minute: 30,
            burst: 3,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: PipelineMode::Staged,
            max_meal_calories: Some(3000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let llm_defaults = LlmConfig::default();
        let nutrition_defaults = NutritionConfig::default();

        let max_meal_calories: u32 = parse_env_or("MAX_MEAL_CALORIES", 3000);

        Self {
            server: ServerConfig {
                host: env::var("PLATELOG_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_first(&["PLATELOG_PORT", "PORT"])
                    .and_then(|val| match val.parse() {
                        Ok(port) => Some(port),
                        Err(e) => {
                            tracing::warn!("Invalid port '{}': {}. Using default.", val, e);
                            None
                        }
                    })
                    .unwrap_or(3000),
            },
            llm: LlmConfig {
                model: env::var("LLM_MODEL").unwrap_or(llm_defaults.model),
                api_key: env_first(&["LLM_API_KEY", "OPENAI_API_KEY"]),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", llm_defaults.timeout_secs),
                requests_per_minute: parse_env_or(
                    "LLM_REQUESTS_PER_MINUTE",
                    llm_defaults.requests_per_minute,
                ),
                burst: parse_env_or("LLM_BURST", llm_defaults.burst),
            },
            nutrition: NutritionConfig {
                enabled: parse_env_or("NUTRITION_ENABLED", nutrition_defaults.enabled),
                api_key: env::var("USDA_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .unwrap_or(nutrition_defaults.api_key),
                base_url: env::var("USDA_BASE_URL").unwrap_or(nutrition_defaults.base_url),
                timeout_secs: parse_env_or("NUTRITION_TIMEOUT", nutrition_defaults.timeout_secs),
                requests_per_minute: parse_env_or(
                    "NUTRITION_REQUESTS_PER_MINUTE",
                    nutrition_defaults.requests_per_minute,
                ),
                burst: parse_env_or("NUTRITION_BURST", nutrition_defaults.burst),
            },
            pipeline: PipelineConfig {
                mode: parse_env_or("PIPELINE_MODE", PipelineMode::Staged),
                max_meal_calories: (max_meal_calories > 0).then_some(max_meal_calories),
            },
            history: HistoryConfig {
                default_limit: parse_env_or("HISTORY_DEFAULT_LIMIT", 50),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "PLATELOG_PORT",
        "PORT",
        "LLM_MODEL",
        "LLM_API_KEY",
        "OPENAI_API_KEY",
        "USDA_API_KEY",
        "PIPELINE_MODE",
        "MAX_MEAL_CALORIES",
        "NUTRITION_ENABLED",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env();

        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.llm.model, "openai/gpt-4o-mini");
        assert!(config.llm.api_key.is_none());
        assert!(config.nutrition.enabled);
        assert!(config.nutrition.is_demo_key());
        assert_eq!(config.pipeline.mode, PipelineMode::Staged);
        assert_eq!(config.pipeline.max_meal_calories, Some(3000));
        assert_eq!(config.history.default_limit, 50);
    }

    #[test]
    #[serial]
    fn test_openai_key_used_when_llm_key_missing() {
        clear_env();
        env::set_var("OPENAI_API_KEY", "sk-original");

        let config = Config::default();
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-original"));

        env::set_var("LLM_API_KEY", "sk-preferred");
        let config = Config::default();
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-preferred"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_legacy_port_variable() {
        clear_env();
        env::set_var("PORT", "8081");
        assert_eq!(Config::default().server.port, 8081);

        env::set_var("PLATELOG_PORT", "9090");
        assert_eq!(Config::default().server.port, 9090);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_calorie_threshold_disables_check() {
        clear_env();
        env::set_var("MAX_MEAL_CALORIES", "0");
        assert_eq!(Config::default().pipeline.max_meal_calories, None);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_mode_falls_back_to_default() {
        clear_env();
        env::set_var("PIPELINE_MODE", "telepathic");
        assert_eq!(Config::default().pipeline.mode, PipelineMode::Staged);

        env::set_var("PIPELINE_MODE", "single-shot");
        assert_eq!(Config::default().pipeline.mode, PipelineMode::SingleShot);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_usda_key_keeps_demo_key() {
        clear_env();
        env::set_var("USDA_API_KEY", "  ");
        assert!(Config::default().nutrition.is_demo_key());

        env::set_var("USDA_API_KEY", "real-key");
        assert!(!Config::default().nutrition.is_demo_key());
        clear_env();
    }

    #[test]
    fn test_parse_llm_provider_model() {
        assert_eq!(
            parse_llm_provider_model("openai/gpt-4o-mini"),
            ("openai", "gpt-4o-mini")
        );
        assert_eq!(
            parse_llm_provider_model("openrouter/meta/llama-3"),
            ("openrouter", "meta/llama-3")
        );
        assert_eq!(
            parse_llm_provider_model("custom-model"),
            ("local", "custom-model")
        );
    }
}
