//! Prompt templates for each estimation stage
//!
//! Templates use plain `format!()` interpolation so a missing variable is a
//! compile-time error. Every template embeds worked examples that pin the
//! exact JSON shape the stage parser expects.

/// Generate a prompt that lists the dishes mentioned in a meal description
///
/// The model must answer with a JSON array of dish names in the order they
/// appear in the description.
///
/// # Arguments
/// * `description` - The user's free-text meal description
///
/// # Example
/// ```
/// use platelog::llm::prompts::dish_identification_prompt;
///
/// let prompt = dish_identification_prompt("burger and fries");
/// assert!(prompt.contains("burger and fries"));
/// ```
pub fn dish_identification_prompt(description: &str) -> String {
    format!(
        r#"Identify the separate dishes or drinks in this meal description.

RULES:
1. List each dish once, in the order it is mentioned
2. Keep quantities and preparation that belong to the dish ("2 fried eggs")
3. Do not split a dish into its ingredients yet
4. Include drinks, sides and condiments that are served separately

EXAMPLES:
Input: "Big Mac with medium fries and a coke"
Output: ["Big Mac", "medium fries", "coke"]

Input: "2 eggs and toast"
Output: ["2 eggs", "toast"]

Return ONLY a JSON array of strings.

MEAL: "{description}""#
    )
}

/// Generate a prompt that breaks one dish into raw-food ingredients
///
/// # Arguments
/// * `dish` - The dish to break down
/// * `description` - The full meal description, for context
///
/// # Example
/// ```
/// use platelog::llm::prompts::ingredient_breakdown_prompt;
///
/// let prompt = ingredient_breakdown_prompt("club sandwich", "club sandwich and soup");
/// assert!(prompt.contains("club sandwich"));
/// ```
pub fn ingredient_breakdown_prompt(dish: &str, description: &str) -> String {
    format!(
        r#"Break this dish into the ingredients that carry its calories.

RULES:
1. Use plain raw-food names ("beef patty", "white bread", "butter")
2. Repeat an ingredient once per unit when the dish names a count ("2 eggs" -> "egg", "egg")
3. Include cooking fats and sauces that are normally part of the dish
4. Honour modifications from the meal ("no mayo", "extra cheese")

EXAMPLES:
Dish: "cheeseburger"
Output: ["hamburger bun", "beef patty", "cheddar cheese", "ketchup"]

Dish: "grilled chicken salad with ranch"
Output: ["grilled chicken breast", "mixed lettuce", "ranch dressing"]

Return ONLY a JSON array of strings.

DISH: "{dish}"
FULL MEAL: "{description}""#
    )
}

/// Generate a prompt that estimates the mass of one ingredient
///
/// Embeds portion-size guidelines so the model stays within realistic ranges.
///
/// # Arguments
/// * `ingredient` - The ingredient to size
/// * `dish` - The dish the ingredient belongs to
/// * `description` - The full meal description
pub fn portion_prompt(ingredient: &str, dish: &str, description: &str) -> String {
    format!(
        r#"Estimate how much of this ingredient is in the dish, in grams.

GUIDELINES:
- Meat, fish or tofu portion: 85-200 g
- One egg: about 50 g
- Slice of bread: 25-40 g; bun: 50-90 g
- Cooked rice or pasta side: 150-250 g
- Vegetables in a dish: 30-150 g
- Cheese slice: 20-30 g
- Butter, oil or mayonnaise: 5-15 g
- Sauces and dressings: 15-40 g
- Herbs, spices and seasoning: 1-5 g
- Drinks: 250-500 g

Use the quantities in the meal when given. Never answer 0.

EXAMPLES:
Ingredient: "beef patty" in "double cheeseburger"
Output: {{"grams": 180, "portion": "2 patties"}}

Ingredient: "butter" in "toast"
Output: {{"grams": 5, "portion": "1 pat"}}

Return ONLY a JSON object with "grams" (number) and "portion" (short description).

INGREDIENT: "{ingredient}"
DISH: "{dish}"
FULL MEAL: "{description}""#
    )
}

/// Shorter portion prompt used when the detailed one fails
///
/// # Example
/// ```
/// use platelog::llm::prompts::simple_portion_prompt;
///
/// let prompt = simple_portion_prompt("rice", "fried rice");
/// assert!(prompt.contains("\"grams\""));
/// ```
pub fn simple_portion_prompt(ingredient: &str, dish: &str) -> String {
    format!(
        r#"How many grams of "{ingredient}" are in a typical serving of "{dish}"?
Answer with ONLY a JSON object, for example: {{"grams": 100, "portion": "1 serving"}}"#
    )
}

/// Generate a prompt asking for the calories in a sized ingredient
///
/// # Arguments
/// * `ingredient` - The ingredient name
/// * `portion` - Human description of the amount
/// * `grams` - Estimated mass
pub fn calorie_estimate_prompt(ingredient: &str, portion: &str, grams: f64) -> String {
    format!(
        r#"Estimate the calories for this specific food amount.

RULES:
1. Use the gram weight; the portion text is only context
2. Consider the cooking method (fried adds fat)
3. Be conservative but realistic

EXAMPLE:
Food: "egg", 50 g (1 large egg)
Output: {{"name": "egg", "calories": 72}}

Return ONLY a JSON object with "name" and "calories" (whole number).

FOOD: "{ingredient}", {grams} g ({portion})"#
    )
}

/// Generate the one-shot prompt that returns a complete meal breakdown
///
/// The model may instead ask exactly one follow-up question.
///
/// # Example
/// ```
/// use platelog::llm::prompts::single_shot_prompt;
///
/// let prompt = single_shot_prompt("a bowl of chili");
/// assert!(prompt.contains("clarificationNeeded"));
/// ```
pub fn single_shot_prompt(description: &str) -> String {
    format!(
        r#"Convert this meal description into discrete food items with approximate calories.
Assume standard serving sizes unless the description says otherwise.
If you genuinely cannot tell the portion size, ask exactly one follow-up question.

Return valid JSON only, in this exact format:
{{"foods": [{{"name": "food item name", "calories": 0}}], "totalCalories": 0, "clarificationNeeded": false}}

Or, if clarification is needed:
{{"clarificationNeeded": true, "question": "your question here"}}

MEAL: "{description}""#
    )
}
