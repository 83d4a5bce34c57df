use crate::error::{AppError, AppResult};
use crate::inventory::{Ingredient, RecipeItem};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub ingredients: Vec<RecipeItem>,
}

// Matches the layout of the seed file
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Catalog {
    pub ingredients: Vec<Ingredient>,
    pub products: Vec<Product>,
}

impl Catalog {
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = fs::read_to_string(path)?;
        let catalog: Catalog = serde_json::from_str(&content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Every recipe must point at an ingredient in the same catalog, and ids must be unique.
    pub fn validate(&self) -> AppResult<()> {
        let mut ingredient_ids = HashSet::new();
        for ingredient in &self.ingredients {
            if !ingredient_ids.insert(ingredient.id) {
                return Err(AppError::InvalidCatalog(format!(
                    "duplicate ingredient id {}",
                    ingredient.id
                )));
            }
        }

        let mut product_ids = HashSet::new();
        for product in &self.products {
            if !product_ids.insert(product.id) {
                return Err(AppError::InvalidCatalog(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
            if let Some(item) = product
                .ingredients
                .iter()
                .find(|item| !ingredient_ids.contains(&item.ingredient_id))
            {
                return Err(AppError::InvalidCatalog(format!(
                    "product {} uses unknown ingredient {}",
                    product.id, item.ingredient_id
                )));
            }
        }
        Ok(())
    }
}
