use async_trait::async_trait;
use redis::{aio::Connection, AsyncCommands, Client};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::{Catalog, Product};
use crate::error::{AppError, AppResult};
use crate::inventory::{Consumption, Ingredient};
use crate::order::{Order, OrderLine};
use crate::store::ShopStore;

const INGREDIENT_IDS: &str = "ingredients";
const PRODUCT_IDS: &str = "products";

fn ingredient_key(id: u64) -> String {
    format!("ingredient:{}", id)
}

fn product_key(id: u64) -> String {
    format!("product:{}", id)
}

fn order_key(id: Uuid) -> String {
    format!("order:{}", id)
}

fn order_lines_key(id: Uuid) -> String {
    format!("order:{}:lines", id)
}

/// Redis-backed store. Every record is a JSON string under its own key.
#[derive(Clone)]
pub struct RedisStore {
    client: Arc<Client>,
}

impl RedisStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Opens a dedicated connection; WATCH state is per connection.
    pub async fn get_connection(&self) -> AppResult<Connection> {
        Ok(self.client.get_async_connection().await?)
    }

    /// Reads, modifies and writes back one ingredient as an optimistic transaction.
    ///
    /// # Arguments
    /// * `id` - The ingredient to update
    /// * `apply` - The modification; rerun against fresh data if another client
    ///   wrote the ingredient in the meantime
    ///
    /// # Returns
    /// * `AppResult<T>` - Whatever `apply` returned on the committed attempt
    pub async fn update_ingredient<T, F>(&self, id: u64, mut apply: F) -> AppResult<T>
    where
        F: FnMut(&mut Ingredient) -> T + Send,
        T: Send,
    {
        let mut conn = self.get_connection().await?;
        let key = ingredient_key(id);

        // EXEC returns nil if the key changed after WATCH.
        loop {
            redis::cmd("WATCH")
                .arg(&key)
                .query_async::<_, ()>(&mut conn)
                .await?;

            let json: Option<String> = conn.get(&key).await?;
            let Some(json) = json else {
                redis::cmd("UNWATCH")
                    .query_async::<_, ()>(&mut conn)
                    .await?;
                return Err(AppError::IngredientNotFound(id));
            };

            let mut ingredient: Ingredient = serde_json::from_str(&json)?;
            let outcome = apply(&mut ingredient);
            let updated = serde_json::to_string(&ingredient)?;

            let committed: Option<()> = redis::pipe()
                .atomic()
                .set(&key, updated)
                .ignore()
                .query_async(&mut conn)
                .await?;

            if committed.is_some() {
                return Ok(outcome);
            }
            debug!(ingredient_id = id, "ingredient changed concurrently, retrying");
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let mut conn = self.get_connection().await?;
        let json: Option<String> = conn.get(key).await?;
        Ok(match json {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        })
    }
}

#[async_trait]
impl ShopStore for RedisStore {
    async fn list_ingredients(&self) -> AppResult<Vec<Ingredient>> {
        let mut conn = self.get_connection().await?;
        let mut ids: Vec<u64> = conn.smembers(INGREDIENT_IDS).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        ids.sort_unstable();

        let keys: Vec<String> = ids.iter().map(|id| ingredient_key(*id)).collect();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        values
            .into_iter()
            .flatten()
            .map(|json| serde_json::from_str(&json).map_err(AppError::from))
            .collect()
    }

    async fn get_ingredient(&self, id: u64) -> AppResult<Option<Ingredient>> {
        self.get_json(&ingredient_key(id)).await
    }

    async fn get_product(&self, id: u64) -> AppResult<Option<Product>> {
        self.get_json(&product_key(id)).await
    }

    async fn create_order(&self, order: &Order) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        let json = serde_json::to_string(order)?;
        // NOTE(dev): explicit unit return type, see https://github.com/rust-lang/rust/issues/123748
        conn.set::<_, _, ()>(order_key(order.id), json).await?;
        Ok(())
    }

    async fn attach_line(&self, order_id: Uuid, line: &OrderLine) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        let exists: bool = conn.exists(order_key(order_id)).await?;
        if !exists {
            return Err(AppError::OrderNotFound(order_id.to_string()));
        }
        let json = serde_json::to_string(line)?;
        conn.rpush::<_, _, ()>(order_lines_key(order_id), json).await?;
        Ok(())
    }

    async fn get_order(&self, order_id: Uuid) -> AppResult<Option<Order>> {
        self.get_json(&order_key(order_id)).await
    }

    async fn order_lines(&self, order_id: Uuid) -> AppResult<Vec<OrderLine>> {
        let mut conn = self.get_connection().await?;
        let lines: Vec<String> = conn.lrange(order_lines_key(order_id), 0, -1).await?;
        lines
            .iter()
            .map(|json| serde_json::from_str(json).map_err(AppError::from))
            .collect()
    }

    async fn consume_ingredient(&self, id: u64, amount: Decimal) -> AppResult<Consumption> {
        self.update_ingredient(id, |ingredient| ingredient.consume(amount)).await
    }

    async fn release_alert(&self, id: u64) -> AppResult<()> {
        self.update_ingredient(id, |ingredient| ingredient.release_alert()).await
    }

    async fn seed(&self, catalog: &Catalog) -> AppResult<()> {
        catalog.validate()?;
        let mut conn = self.get_connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic();

        for ingredient in &catalog.ingredients {
            // NX keeps the live stock level and alert latch of known ingredients.
            pipe.cmd("SET")
                .arg(ingredient_key(ingredient.id))
                .arg(serde_json::to_string(ingredient)?)
                .arg("NX")
                .ignore()
                .sadd(INGREDIENT_IDS, ingredient.id)
                .ignore();
        }
        for product in &catalog.products {
            pipe.set(product_key(product.id), serde_json::to_string(product)?)
                .ignore()
                .sadd(PRODUCT_IDS, product.id)
                .ignore();
        }

        pipe.query_async::<_, ()>(&mut conn).await?;
        info!(
            ingredients = catalog.ingredients.len(),
            products = catalog.products.len(),
            "catalog seeded"
        );
        Ok(())
    }
}
