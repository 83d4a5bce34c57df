use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::catalog::{Catalog, Product};
use crate::error::{AppError, AppResult};
use crate::inventory::{Consumption, Ingredient};
use crate::order::{Order, OrderLine};
use crate::store::ShopStore;

#[derive(Default)]
struct Tables {
    ingredients: BTreeMap<u64, Ingredient>,
    products: HashMap<u64, Product>,
    orders: HashMap<Uuid, Order>,
    lines: HashMap<Uuid, Vec<OrderLine>>,
}

/// In-process store. Everything is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_catalog(catalog: &Catalog) -> AppResult<Self> {
        let store = Self::new();
        store.seed(catalog).await?;
        Ok(store)
    }
}

#[async_trait]
impl ShopStore for MemoryStore {
    async fn list_ingredients(&self) -> AppResult<Vec<Ingredient>> {
        let tables = self.tables.lock().await;
        Ok(tables.ingredients.values().cloned().collect())
    }

    async fn get_ingredient(&self, id: u64) -> AppResult<Option<Ingredient>> {
        let tables = self.tables.lock().await;
        Ok(tables.ingredients.get(&id).cloned())
    }

    async fn get_product(&self, id: u64) -> AppResult<Option<Product>> {
        let tables = self.tables.lock().await;
        Ok(tables.products.get(&id).cloned())
    }

    async fn create_order(&self, order: &Order) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        tables.orders.insert(order.id, order.clone());
        tables.lines.entry(order.id).or_default();
        Ok(())
    }

    async fn attach_line(&self, order_id: Uuid, line: &OrderLine) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if !tables.orders.contains_key(&order_id) {
            return Err(AppError::OrderNotFound(order_id.to_string()));
        }
        tables.lines.entry(order_id).or_default().push(line.clone());
        Ok(())
    }

    async fn get_order(&self, order_id: Uuid) -> AppResult<Option<Order>> {
        let tables = self.tables.lock().await;
        Ok(tables.orders.get(&order_id).cloned())
    }

    async fn order_lines(&self, order_id: Uuid) -> AppResult<Vec<OrderLine>> {
        let tables = self.tables.lock().await;
        Ok(tables.lines.get(&order_id).cloned().unwrap_or_default())
    }

    async fn consume_ingredient(&self, id: u64, amount: Decimal) -> AppResult<Consumption> {
        let mut tables = self.tables.lock().await;
        let ingredient = tables
            .ingredients
            .get_mut(&id)
            .ok_or(AppError::IngredientNotFound(id))?;
        Ok(ingredient.consume(amount))
    }

    async fn release_alert(&self, id: u64) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let ingredient = tables
            .ingredients
            .get_mut(&id)
            .ok_or(AppError::IngredientNotFound(id))?;
        ingredient.release_alert();
        Ok(())
    }

    async fn seed(&self, catalog: &Catalog) -> AppResult<()> {
        catalog.validate()?;
        let mut tables = self.tables.lock().await;
        for ingredient in &catalog.ingredients {
            tables
                .ingredients
                .entry(ingredient.id)
                .or_insert_with(|| ingredient.clone());
        }
        for product in &catalog.products {
            tables.products.insert(product.id, product.clone());
        }
        Ok(())
    }
}
