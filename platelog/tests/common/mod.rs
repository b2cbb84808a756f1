#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::{Match, Request};

use platelog::config::{LlmConfig, NutritionConfig};

pub const USDA_TEST_KEY: &str = "test-usda-key";

pub fn llm_config(base_url: String) -> LlmConfig {
    LlmConfig {
        model: "openai/gpt-4o-mini".to_string(),
        api_key: Some("test-key".to_string()),
        base_url: Some(base_url),
        timeout_secs: 5,
        requests_per_minute: 0,
        burst: 1,
    }
}

pub fn nutrition_config(base_url: String) -> NutritionConfig {
    NutritionConfig {
        enabled: true,
        api_key: USDA_TEST_KEY.to_string(),
        base_url,
        timeout_secs: 5,
        requests_per_minute: 0,
        burst: 1,
    }
}

pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}

pub fn search_body(fdc_id: u64, description: &str) -> Value {
    json!({
        "totalHits": 1,
        "foods": [
            {"fdcId": fdc_id, "description": description, "dataType": "SR Legacy"}
        ]
    })
}

pub fn detail_body(description: &str, kcal_per_100g: f64) -> Value {
    json!({
        "fdcId": 1,
        "description": description,
        "foodNutrients": [
            {
                "nutrient": {"id": 1003, "number": "203", "name": "Protein", "unitName": "g"},
                "amount": 12.5
            },
            {
                "nutrient": {"id": 1008, "number": "208", "name": "Energy", "unitName": "kcal"},
                "amount": kcal_per_100g
            }
        ]
    })
}

/// Matches chat-completion requests whose prompt contains every needle.
pub struct PromptContains(pub Vec<&'static str>);

pub fn prompt_contains(needles: &[&'static str]) -> PromptContains {
    PromptContains(needles.to_vec())
}

impl Match for PromptContains {
    fn matches(&self, request: &Request) -> bool {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return false;
        };
        let prompt: String = body["messages"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|message| message["content"].as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.0.iter().all(|needle| prompt.contains(needle))
    }
}
