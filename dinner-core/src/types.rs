use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pantry entry as stored by the inventory service.
///
/// Only entries with a positive quantity count as available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>, quantity: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }

    pub fn is_available(&self) -> bool {
        self.quantity > 0.0
    }
}

/// One line of a recipe's ingredient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
}

impl RecipeIngredient {
    pub fn new(name: impl Into<String>, amount: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount,
            unit: unit.into(),
        }
    }
}

/// Per-serving nutrition estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub calories_per_serving: f64,
    pub protein_per_serving: f64,
    pub carbs_per_serving: f64,
    pub fat_per_serving: f64,
}

impl Macros {
    pub fn is_non_negative(&self) -> bool {
        [
            self.calories_per_serving,
            self.protein_per_serving,
            self.carbs_per_serving,
            self.fat_per_serving,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// A generated recipe.
///
/// Built by the generator from model output. `image_url` stays empty until the
/// candidate has passed validation and been through the image enricher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCandidate {
    pub id: String,
    pub name: String,
    pub servings: u32,
    pub ready_in_minutes: u32,
    #[serde(flatten)]
    pub macros: Macros,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_search_hint: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub source: String,
}

impl RecipeCandidate {
    /// Create a minimal candidate with a fresh id. Mostly useful for tests and
    /// for callers that assemble recipes by hand.
    pub fn new(name: impl Into<String>, ingredients: Vec<RecipeIngredient>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            servings: 2,
            ready_in_minutes: 30,
            macros: Macros::default(),
            ingredients,
            steps: Vec::new(),
            image_search_hint: None,
            image_url: None,
            source: "manual".to_string(),
        }
    }

    /// Case-insensitive key used to detect duplicate recipes in one batch.
    pub fn name_key(&self) -> String {
        self.name.trim().to_lowercase()
    }

    /// Query text for the image lookup: the model's hint when present, else the name.
    pub fn image_query(&self) -> &str {
        self.image_search_hint
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(&self.name)
    }
}

/// Result of a suggestion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestions {
    pub recipes: Vec<RecipeCandidate>,
    /// Number of recipes asked for, after clamping.
    pub requested: usize,
    /// Generation rounds actually run.
    pub attempts: u32,
}

impl Suggestions {
    /// True when the attempt budget ran out before `requested` recipes were found.
    pub fn is_partial(&self) -> bool {
        self.recipes.len() < self.requested
    }
}
