//! USDA FoodData Central client
//!
//! Search by name, accept the first candidate, then read its energy value
//! from the detail endpoint. Every failure collapses into "not found" at the
//! [`NutritionSource`] boundary; the typed errors stay internal for logging.
//!
//! API reference: <https://fdc.nal.usda.gov/api-guide.html>

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::NutritionConfig;
use crate::error::{PlatelogError, Result};
use crate::rate_limit::RateLimiter;

use super::{NutritionMatch, NutritionSource};

/// Legacy SR nutrient number for energy in kcal.
const ENERGY_NUTRIENT_NUMBER: &str = "208";
/// FoodData Central nutrient id for energy in kcal.
const ENERGY_NUTRIENT_ID: u32 = 1008;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<SearchCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchCandidate {
    fdc_id: u64,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodDetailsResponse {
    #[serde(default)]
    description: String,
    #[serde(default)]
    food_nutrients: Vec<FoodNutrientEntry>,
}

/// Detail responses nest nutrient metadata; abridged and search payloads
/// flatten it. Both layouts are accepted.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodNutrientEntry {
    nutrient: Option<NutrientInfo>,
    amount: Option<f64>,
    nutrient_id: Option<u32>,
    nutrient_number: Option<String>,
    nutrient_name: Option<String>,
    unit_name: Option<String>,
    value: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NutrientInfo {
    id: Option<u32>,
    number: Option<String>,
    name: Option<String>,
    unit_name: Option<String>,
}

/// Flattened view of one nutrient row.
#[derive(Debug, Clone, PartialEq)]
struct Nutrient {
    id: Option<u32>,
    number: Option<String>,
    name: String,
    unit: String,
    amount: f64,
}

impl FoodNutrientEntry {
    fn normalize(self) -> Option<Nutrient> {
        let info = self.nutrient.unwrap_or_default();
        Some(Nutrient {
            id: info.id.or(self.nutrient_id),
            number: info.number.or(self.nutrient_number),
            name: info.name.or(self.nutrient_name).unwrap_or_default(),
            unit: info.unit_name.or(self.unit_name).unwrap_or_default(),
            amount: self.amount.or(self.value)?,
        })
    }
}

/// Energy per 100 g from a nutrient list.
///
/// The well-known nutrient code wins; a kcal row whose name mentions
/// "energy" is the secondary match.
fn energy_per_100g(nutrients: &[Nutrient]) -> Option<f64> {
    let by_code = nutrients.iter().find(|n| {
        n.number.as_deref() == Some(ENERGY_NUTRIENT_NUMBER) || n.id == Some(ENERGY_NUTRIENT_ID)
    });

    let by_name = || {
        nutrients.iter().find(|n| {
            n.name.to_lowercase().contains("energy") && n.unit.eq_ignore_ascii_case("kcal")
        })
    };

    by_code.or_else(by_name).map(|n| n.amount)
}

pub struct FoodDataClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl FoodDataClient {
    pub fn new(config: &NutritionConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| {
                PlatelogError::Nutrition(format!("Failed to create USDA HTTP client: {error}"))
            })?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter,
        })
    }

    async fn first_candidate(&self, query: &str) -> Result<Option<SearchCandidate>> {
        self.limiter.acquire().await;

        let url = format!("{}/foods/search", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("query", query),
                ("pageSize", "1"),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PlatelogError::Nutrition(format!(
                "search returned HTTP {}",
                response.status()
            )));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.foods.into_iter().next())
    }

    async fn energy_for(&self, fdc_id: u64) -> Result<Option<(String, f64)>> {
        self.limiter.acquire().await;

        let url = format!("{}/food/{fdc_id}", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PlatelogError::Nutrition(format!(
                "detail for {fdc_id} returned HTTP {}",
                response.status()
            )));
        }

        let details: FoodDetailsResponse = response.json().await?;
        let nutrients: Vec<Nutrient> = details
            .food_nutrients
            .into_iter()
            .filter_map(FoodNutrientEntry::normalize)
            .collect();

        Ok(energy_per_100g(&nutrients).map(|kcal| (details.description, kcal)))
    }

    async fn try_lookup(&self, name: &str) -> Result<Option<NutritionMatch>> {
        let Some(candidate) = self.first_candidate(name).await? else {
            tracing::debug!(ingredient = %name, "No USDA candidates");
            return Ok(None);
        };

        let Some((description, kcal)) = self.energy_for(candidate.fdc_id).await? else {
            tracing::debug!(
                ingredient = %name,
                fdc_id = candidate.fdc_id,
                "USDA food has no energy value"
            );
            return Ok(None);
        };

        if !kcal.is_finite() || kcal <= 0.0 {
            tracing::debug!(
                ingredient = %name,
                fdc_id = candidate.fdc_id,
                kcal,
                "Ignoring non-positive energy value"
            );
            return Ok(None);
        }

        let description = if description.is_empty() {
            candidate.description
        } else {
            description
        };

        Ok(Some(NutritionMatch {
            calories_per_100g: kcal,
            match_id: candidate.fdc_id.to_string(),
            description,
        }))
    }
}

#[async_trait]
impl NutritionSource for FoodDataClient {
    async fn lookup(&self, name: &str) -> Option<NutritionMatch> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        match self.try_lookup(name).await {
            Ok(found) => found,
            Err(error) => {
                tracing::warn!(
                    ingredient = %name,
                    error = %error,
                    "USDA lookup failed, treating as not found"
                );
                None
            }
        }
    }
}
