//! Pantry and dietary preference sources.
//!
//! The suggestion engine only needs two lists per user: ingredient names that
//! are in stock and restriction tags. Where they come from (a JSON file, the
//! pantry REST service) is behind [`PantryProvider`].

mod http;

pub use http::HttpPantry;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::types::InventoryItem;

#[derive(Debug, Error)]
pub enum PantryError {
    #[error("Pantry request failed: {0}")]
    RequestFailed(String),

    #[error("Pantry service returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Unexpected pantry response: {0}")]
    BadResponse(String),

    #[error("Pantry request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to read pantry file {path}: {message}")]
    File { path: String, message: String },
}

/// Source of a user's available ingredients and dietary restrictions.
#[async_trait]
pub trait PantryProvider: Send + Sync {
    /// Ingredient names with quantity > 0, deduplicated.
    async fn available_ingredients(&self, user_id: &str) -> Result<Vec<String>, PantryError>;

    /// Active restriction tags, e.g. "gluten_free".
    async fn dietary_restrictions(&self, user_id: &str) -> Result<Vec<String>, PantryError>;
}

/// Reduce inventory rows to the names that are actually in stock.
///
/// Drops zero-quantity and blank rows, trims names, and keeps the first
/// spelling of case-insensitive duplicates.
pub fn flatten_inventory(items: &[InventoryItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| item.is_available())
        .map(|item| item.name.trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Trim, drop blanks and deduplicate restriction tags.
fn clean_restrictions(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize)]
struct PantryFile {
    #[serde(default)]
    inventory: Vec<InventoryItem>,
    #[serde(default, alias = "restrictions")]
    dietary_restrictions: Vec<String>,
}

/// A fixed pantry, the same for every user.
#[derive(Debug, Clone, Default)]
pub struct StaticPantry {
    inventory: Vec<InventoryItem>,
    restrictions: Vec<String>,
}

impl StaticPantry {
    pub fn new(inventory: Vec<InventoryItem>, restrictions: Vec<String>) -> Self {
        Self {
            inventory,
            restrictions,
        }
    }

    /// Parse `{"inventory": [{"name": .., "quantity": ..}], "dietary_restrictions": [..]}`.
    pub fn from_json(json: &str) -> Result<Self, PantryError> {
        let file: PantryFile =
            serde_json::from_str(json).map_err(|e| PantryError::BadResponse(e.to_string()))?;
        Ok(Self::new(file.inventory, file.dietary_restrictions))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PantryError> {
        let json = std::fs::read_to_string(path).map_err(|e| PantryError::File {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json).map_err(|e| PantryError::File {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn inventory(&self) -> &[InventoryItem] {
        &self.inventory
    }
}

#[async_trait]
impl PantryProvider for StaticPantry {
    async fn available_ingredients(&self, _user_id: &str) -> Result<Vec<String>, PantryError> {
        Ok(flatten_inventory(&self.inventory))
    }

    async fn dietary_restrictions(&self, _user_id: &str) -> Result<Vec<String>, PantryError> {
        Ok(clean_restrictions(&self.restrictions))
    }
}
