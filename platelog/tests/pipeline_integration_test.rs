mod common;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use platelog::config::{PipelineConfig, PipelineMode};
use platelog::llm::{LlmProvider, TextGenerator};
use platelog::models::{EstimateSource, MealResult};
use platelog::nutrition::{FoodDataClient, NutritionSource};
use platelog::pipeline::{MealPipeline, CLARIFICATION_QUESTION};
use platelog::rate_limit::RateLimiter;

use common::{
    completion_body, detail_body, llm_config, nutrition_config, prompt_contains, search_body,
    USDA_TEST_KEY,
};

async fn mount_completion(server: &MockServer, needles: &[&'static str], content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(prompt_contains(needles))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(content)))
        .mount(server)
        .await;
}

async fn mount_usda_food(server: &MockServer, query: &str, fdc_id: u64, kcal: f64) {
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .and(query_param("query", query))
        .and(query_param("api_key", USDA_TEST_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(fdc_id, query)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/food/{fdc_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_body(query, kcal)))
        .mount(server)
        .await;
}

async fn mount_usda_miss(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"totalHits": 0, "foods": []})),
        )
        .with_priority(10)
        .mount(server)
        .await;
}

fn pipeline(
    llm_server: &MockServer,
    nutrition: Option<Arc<dyn NutritionSource>>,
    mode: PipelineMode,
) -> MealPipeline {
    let provider = LlmProvider::new(&llm_config(llm_server.uri()));
    assert!(provider.is_available());
    let generator: Arc<dyn TextGenerator> = Arc::new(provider);

    MealPipeline::new(
        generator,
        Arc::new(RateLimiter::unlimited("llm")),
        nutrition,
        &llm_config(llm_server.uri()),
        &PipelineConfig {
            mode,
            max_meal_calories: Some(3000),
        },
    )
}

fn usda(server: &MockServer) -> Arc<dyn NutritionSource> {
    Arc::new(
        FoodDataClient::new(
            &nutrition_config(server.uri()),
            Arc::new(RateLimiter::unlimited("nutrition")),
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn test_staged_pipeline_mixes_database_model_and_heuristic() {
    let llm = MockServer::start().await;
    let fdc = MockServer::start().await;

    mount_completion(
        &llm,
        &["Identify the separate dishes"],
        r#"["2 eggs", "toast"]"#,
    )
    .await;
    mount_completion(
        &llm,
        &["Break this dish", "DISH: \"2 eggs\""],
        r#"["egg", "egg", "butter"]"#,
    )
    .await;
    mount_completion(
        &llm,
        &["Break this dish", "DISH: \"toast\""],
        "```json\n[\"bread\", \"butter\"]\n```",
    )
    .await;
    mount_completion(
        &llm,
        &["Estimate how much", "INGREDIENT: \"egg\""],
        r#"{"grams": 50, "portion": "1 large egg"}"#,
    )
    .await;
    mount_completion(
        &llm,
        &["Estimate how much", "INGREDIENT: \"bread\""],
        r#"{"grams": 30, "portion": "1 slice"}"#,
    )
    .await;
    mount_completion(
        &llm,
        &["Estimate how much", "INGREDIENT: \"butter\""],
        r#"{"grams": 5, "portion": "1 pat"}"#,
    )
    .await;
    mount_completion(
        &llm,
        &["Estimate the calories", "\"bread\""],
        r#"{"name": "bread", "calories": 80}"#,
    )
    .await;
    mount_completion(
        &llm,
        &["Estimate the calories", "\"butter\""],
        "Butter is mostly fat.",
    )
    .await;

    mount_usda_food(&fdc, "egg", 748967, 143.0).await;
    mount_usda_miss(&fdc).await;

    let result = pipeline(&llm, Some(usda(&fdc)), PipelineMode::Staged)
        .process_meal("2 eggs and toast")
        .await
        .unwrap();

    let breakdown = result.breakdown().expect("complete result");
    let foods: Vec<_> = breakdown
        .foods()
        .iter()
        .map(|food| (food.name.as_str(), food.calories, food.source))
        .collect();

    assert_eq!(
        foods,
        vec![
            ("egg", 72, EstimateSource::Database),
            ("egg", 72, EstimateSource::Database),
            ("butter", 8, EstimateSource::Heuristic),
            ("bread", 80, EstimateSource::LanguageModel),
            ("butter", 8, EstimateSource::Heuristic),
        ]
    );
    assert_eq!(breakdown.total_calories(), 240);
    assert_eq!(breakdown.foods()[0].portion, "1 large egg");
}

#[tokio::test]
async fn test_unreachable_model_asks_for_clarification() {
    // No mocks mounted: every completion request gets a 404.
    let llm = MockServer::start().await;

    let result = pipeline(&llm, None, PipelineMode::Staged)
        .process_meal("chicken curry with rice")
        .await
        .unwrap();

    assert_eq!(result, MealResult::clarification(CLARIFICATION_QUESTION));
}

#[tokio::test]
async fn test_single_shot_recomputes_total_from_fenced_json() {
    let llm = MockServer::start().await;
    mount_completion(
        &llm,
        &["Convert this meal description"],
        &format!(
            "```json\n{}\n```",
            json!({
                "foods": [
                    {"name": "burger", "calories": 550},
                    {"name": "fries", "calories": 365}
                ],
                "totalCalories": 100,
                "clarificationNeeded": false
            })
        ),
    )
    .await;

    let result = pipeline(&llm, None, PipelineMode::SingleShot)
        .process_meal("burger and fries")
        .await
        .unwrap();

    let breakdown = result.breakdown().expect("complete result");
    assert_eq!(breakdown.foods().len(), 2);
    assert_eq!(breakdown.total_calories(), 915);
}

#[tokio::test]
async fn test_single_shot_model_question_is_passed_through() {
    let llm = MockServer::start().await;
    mount_completion(
        &llm,
        &["Convert this meal description"],
        r#"{"clarificationNeeded": true, "question": "Was the sandwich a 6-inch or a footlong?"}"#,
    )
    .await;

    let result = pipeline(&llm, None, PipelineMode::SingleShot)
        .process_meal("a sub sandwich")
        .await
        .unwrap();

    assert_eq!(
        result,
        MealResult::clarification("Was the sandwich a 6-inch or a footlong?")
    );
}

#[tokio::test]
async fn test_usda_lookup_reads_energy_per_100g() {
    let fdc = MockServer::start().await;
    mount_usda_food(&fdc, "banana", 1105314, 89.0).await;

    let found = usda(&fdc).lookup("banana").await.expect("match");

    assert_eq!(found.calories_per_100g, 89.0);
    assert_eq!(found.match_id, "1105314");
}

#[tokio::test]
async fn test_usda_failure_is_not_found() {
    let fdc = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&fdc)
        .await;

    assert!(usda(&fdc).lookup("banana").await.is_none());
}

#[tokio::test]
async fn test_usda_food_without_energy_is_not_found() {
    let fdc = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(42, "water")))
        .mount(&fdc)
        .await;
    Mock::given(method("GET"))
        .and(path("/food/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "description": "Water",
            "foodNutrients": []
        })))
        .mount(&fdc)
        .await;

    assert!(usda(&fdc).lookup("water").await.is_none());
}
