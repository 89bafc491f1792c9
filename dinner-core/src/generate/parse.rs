//! Decoding model output into recipe candidates.
//!
//! The response must contain a JSON array of recipes (optionally wrapped in
//! `{"recipes": [...]}`, optionally fenced or surrounded by prose). Anything
//! else is a [`ParseError`]. Individual items that fail the schema are
//! dropped; they never reach validation half-typed.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{Macros, RecipeCandidate, RecipeIngredient};

const DEFAULT_SERVINGS: u32 = 2;
const DEFAULT_READY_IN_MINUTES: u32 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Response contained no JSON")]
    NoJson,

    #[error("Malformed JSON: {0}")]
    Malformed(String),

    #[error("Expected a JSON array of recipes, got {0}")]
    UnexpectedShape(&'static str),
}

/// A number that models sometimes send as a string ("4", "25 minutes").
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(f64),
    Text(String),
}

impl Lenient {
    fn value(&self) -> Option<f64> {
        match self {
            Lenient::Number(n) => Some(*n),
            Lenient::Text(s) => s
                .split_whitespace()
                .next()
                .and_then(|first| first.parse().ok()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngredientEntry {
    Structured(GeneratedIngredient),
    Plain(String),
}

#[derive(Debug, Deserialize)]
struct GeneratedIngredient {
    #[serde(alias = "item", alias = "ingredient")]
    name: String,
    #[serde(default, alias = "quantity")]
    amount: Option<Lenient>,
    #[serde(default)]
    unit: Option<String>,
}

/// One recipe as the model writes it. Accepts snake_case and camelCase keys.
#[derive(Debug, Deserialize)]
struct GeneratedRecipe {
    #[serde(default, alias = "recipe_id", alias = "recipeId")]
    id: Option<String>,
    #[serde(alias = "title")]
    name: String,
    #[serde(default)]
    servings: Option<Lenient>,
    #[serde(
        default,
        alias = "readyInMinutes",
        alias = "ready_in_min",
        alias = "total_time_minutes"
    )]
    ready_in_minutes: Option<Lenient>,
    #[serde(default, alias = "calories_per_serving", alias = "caloriesPerServing")]
    calories: Option<Lenient>,
    #[serde(default, alias = "protein_per_serving", alias = "proteinPerServing")]
    protein: Option<Lenient>,
    #[serde(default, alias = "carbs_per_serving", alias = "carbsPerServing")]
    carbs: Option<Lenient>,
    #[serde(default, alias = "fat_per_serving", alias = "fatPerServing")]
    fat: Option<Lenient>,
    #[serde(default)]
    ingredients: Vec<IngredientEntry>,
    #[serde(default, alias = "instructions")]
    steps: Vec<String>,
    #[serde(
        default,
        alias = "imageSearchHint",
        alias = "image_query",
        alias = "imageSearchQuery"
    )]
    image_search_hint: Option<String>,
}

/// Strip a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fence(text: &str) -> &str {
    let raw = text.trim();
    let Some(inner) = raw.strip_prefix("```") else {
        return raw;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);

    // Drop the info string ("json", "JSON", ...) on the opening line
    match inner.find('\n') {
        Some(newline) if !inner[..newline].trim_start().starts_with(['[', '{']) => {
            inner[newline + 1..].trim()
        }
        _ => inner.trim(),
    }
}

/// Find the JSON payload in a raw model response.
fn extract_json(raw: &str) -> Result<Value, ParseError> {
    let text = strip_code_fence(raw);
    if text.is_empty() {
        return Err(ParseError::NoJson);
    }

    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            // Prose around the array: try the outermost [...]
            match (text.find('['), text.rfind(']')) {
                (Some(start), Some(end)) if end > start => {
                    serde_json::from_str(&text[start..=end])
                        .map_err(|e| ParseError::Malformed(e.to_string()))
                }
                _ if text.contains(['[', '{']) => Err(ParseError::Malformed(first_err.to_string())),
                _ => Err(ParseError::NoJson),
            }
        }
    }
}

fn recipe_items(value: Value) -> Result<Vec<Value>, ParseError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("recipes") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ParseError::UnexpectedShape("an object without a recipes array")),
        },
        Value::Null => Err(ParseError::UnexpectedShape("null")),
        Value::Bool(_) => Err(ParseError::UnexpectedShape("a boolean")),
        Value::Number(_) => Err(ParseError::UnexpectedShape("a number")),
        Value::String(_) => Err(ParseError::UnexpectedShape("a string")),
    }
}

/// Remove list numbering from a step ("1. Boil", "Step 2: Drain", "3) Serve").
fn clean_step(step: &str) -> String {
    let mut s = step.trim();
    if let Some(rest) = s
        .strip_prefix("Step ")
        .or_else(|| s.strip_prefix("step "))
    {
        s = rest;
    }

    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &s[digits..];
        // "1.5 cups" is a quantity, not numbering
        if let Some(rest) = rest
            .strip_prefix(['.', ')', ':'])
            .filter(|r| r.is_empty() || r.starts_with(char::is_whitespace))
        {
            s = rest;
        }
    }

    s.trim_start_matches([' ', '-', '\t']).trim().to_string()
}

fn non_negative_whole(value: Option<&Lenient>, default: u32) -> Option<u32> {
    match value.and_then(Lenient::value) {
        None => Some(default),
        Some(v) if v.is_finite() && v >= 0.0 => Some(v.round() as u32),
        Some(_) => None,
    }
}

fn macro_value(value: Option<&Lenient>) -> f64 {
    value.and_then(Lenient::value).unwrap_or(0.0)
}

impl GeneratedRecipe {
    /// Apply schema checks and build a candidate. Returns the reason on failure.
    fn into_candidate(self, source: &str) -> Result<RecipeCandidate, String> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("blank name".to_string());
        }

        let servings = non_negative_whole(self.servings.as_ref(), DEFAULT_SERVINGS)
            .ok_or("negative servings")?
            .max(1);
        let ready_in_minutes =
            non_negative_whole(self.ready_in_minutes.as_ref(), DEFAULT_READY_IN_MINUTES)
                .ok_or("negative ready time")?;

        let macros = Macros {
            calories_per_serving: macro_value(self.calories.as_ref()),
            protein_per_serving: macro_value(self.protein.as_ref()),
            carbs_per_serving: macro_value(self.carbs.as_ref()),
            fat_per_serving: macro_value(self.fat.as_ref()),
        };
        if !macros.is_non_negative() {
            return Err("negative macros".to_string());
        }

        let ingredients: Vec<RecipeIngredient> = self
            .ingredients
            .into_iter()
            .map(|entry| match entry {
                IngredientEntry::Structured(i) => RecipeIngredient {
                    name: i.name.trim().to_string(),
                    amount: i
                        .amount
                        .as_ref()
                        .and_then(Lenient::value)
                        .filter(|a| a.is_finite() && *a >= 0.0)
                        .unwrap_or(0.0),
                    unit: i.unit.unwrap_or_default().trim().to_string(),
                },
                IngredientEntry::Plain(name) => RecipeIngredient::new(name.trim(), 0.0, ""),
            })
            .collect();
        if ingredients.iter().all(|i| i.name.is_empty()) {
            return Err("no ingredients".to_string());
        }

        let steps = self
            .steps
            .iter()
            .map(|s| clean_step(s))
            .filter(|s| !s.is_empty())
            .collect();

        Ok(RecipeCandidate {
            id: self
                .id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name,
            servings,
            ready_in_minutes,
            macros,
            ingredients,
            steps,
            image_search_hint: self
                .image_search_hint
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty()),
            image_url: None,
            source: source.to_string(),
        })
    }
}

/// Decode a raw model response into candidates tagged with `source`.
///
/// Fails only when the response as a whole is not a recipe array; items that
/// fail the schema are logged and skipped.
pub fn parse_candidates(raw: &str, source: &str) -> Result<Vec<RecipeCandidate>, ParseError> {
    let items = recipe_items(extract_json(raw)?)?;

    let mut candidates = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let decoded = serde_json::from_value::<GeneratedRecipe>(item)
            .map_err(|e| e.to_string())
            .and_then(|recipe| recipe.into_candidate(source));

        match decoded {
            Ok(candidate) => candidates.push(candidate),
            Err(reason) => {
                tracing::debug!(index, reason = %reason, "Dropping malformed recipe item");
            }
        }
    }

    Ok(candidates)
}
