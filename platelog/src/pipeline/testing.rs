//! Scripted collaborators for pipeline unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{PlatelogError, Result};
use crate::llm::{CompletionOptions, TextGenerator};
use crate::nutrition::{NutritionMatch, NutritionSource};

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Unavailable,
    Delayed(Duration),
}

impl Reply {
    pub fn text(body: impl Into<String>) -> Self {
        Reply::Text(body.into())
    }
}

/// Answers a prompt with the reply of the first rule whose needles all
/// occur in it. Unmatched prompts fail like an unreachable service.
#[derive(Default)]
pub struct ScriptedGenerator {
    rules: Vec<(Vec<String>, Reply)>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, needles: &[&str], reply: Reply) -> Self {
        self.rules
            .push((needles.iter().map(|n| n.to_string()).collect(), reply));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let reply = self
            .rules
            .iter()
            .find(|(needles, _)| needles.iter().all(|n| prompt.contains(n.as_str())))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Text(body)) => Ok(body),
            Some(Reply::Delayed(delay)) => {
                tokio::time::sleep(delay).await;
                Ok("{}".to_string())
            }
            Some(Reply::Unavailable) | None => {
                Err(PlatelogError::LlmUnavailable("scripted outage".to_string()))
            }
        }
    }
}

/// In-memory food table keyed by lowercase name.
#[derive(Default)]
pub struct FakeNutrition {
    foods: HashMap<String, f64>,
    lookups: AtomicUsize,
}

impl FakeNutrition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, calories_per_100g: f64) -> Self {
        self.foods.insert(name.to_lowercase(), calories_per_100g);
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NutritionSource for FakeNutrition {
    async fn lookup(&self, name: &str) -> Option<NutritionMatch> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.foods
            .get(&name.to_lowercase())
            .map(|&calories_per_100g| NutritionMatch {
                calories_per_100g,
                match_id: format!("fake-{name}"),
                description: name.to_string(),
            })
    }
}
