//! Client for the pantry REST service.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{clean_restrictions, flatten_inventory, PantryError, PantryProvider};
use crate::types::InventoryItem;

/// Header the pantry service reads the caller's identity from.
const USER_ID_HEADER: &str = "user-id";

/// An inventory row. The service nests the item under `pantry_item`; flat
/// `{name, quantity}` rows are accepted too.
#[derive(Debug, Deserialize)]
struct InventoryRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    pantry_item: Option<NamedItem>,
    #[serde(default)]
    quantity: f64,
}

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: String,
}

impl InventoryRow {
    fn into_item(self) -> Option<InventoryItem> {
        let name = self.pantry_item.map(|p| p.name).or(self.name)?;
        Some(InventoryItem::new(name, self.quantity))
    }
}

#[derive(Debug, Deserialize)]
struct AllergenResponse {
    #[serde(default)]
    dietary_restrictions: Vec<String>,
}

/// Pantry backed by `GET {base}/inventory` and `GET {base}/preferences/allergens`.
#[derive(Debug, Clone)]
pub struct HttpPantry {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPantry {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PantryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PantryError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, user_id: &str) -> Result<T, PantryError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Fetching from pantry service");

        let response = self
            .client
            .get(&url)
            .header(USER_ID_HEADER, user_id)
            .send()
            .await
            .map_err(|e| PantryError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PantryError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| PantryError::BadResponse(e.to_string()))
    }
}

#[async_trait]
impl PantryProvider for HttpPantry {
    async fn available_ingredients(&self, user_id: &str) -> Result<Vec<String>, PantryError> {
        let rows: Vec<InventoryRow> = self.get_json("/inventory", user_id).await?;
        let items: Vec<InventoryItem> = rows.into_iter().filter_map(InventoryRow::into_item).collect();
        Ok(flatten_inventory(&items))
    }

    async fn dietary_restrictions(&self, user_id: &str) -> Result<Vec<String>, PantryError> {
        let body: AllergenResponse = self.get_json("/preferences/allergens", user_id).await?;
        Ok(clean_restrictions(&body.dietary_restrictions))
    }
}
