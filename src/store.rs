use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::catalog::{Catalog, Product};
use crate::error::AppResult;
use crate::inventory::{Consumption, Ingredient};
use crate::order::{Order, OrderLine};

/// Persistence for ingredients, products and orders.
///
/// Implementations must apply `consume_ingredient` atomically per ingredient:
/// two concurrent decrements of the same ingredient may not lose an update,
/// and only one of them may report `alert_due`.
#[async_trait]
pub trait ShopStore: Send + Sync {
    /// Lists every stored ingredient.
    ///
    /// # Returns
    /// * `AppResult<Vec<Ingredient>>` - All ingredients, ordered by id
    async fn list_ingredients(&self) -> AppResult<Vec<Ingredient>>;

    async fn get_ingredient(&self, id: u64) -> AppResult<Option<Ingredient>>;

    async fn get_product(&self, id: u64) -> AppResult<Option<Product>>;

    /// Saves a newly created order.
    ///
    /// # Arguments
    /// * `order` - The order to persist; its lines are attached separately
    async fn create_order(&self, order: &Order) -> AppResult<()>;

    /// Associates a product and quantity with an existing order.
    ///
    /// # Arguments
    /// * `order_id` - The order the line belongs to
    /// * `line` - Product id and quantity
    ///
    /// # Returns
    /// * `AppResult<()>` - `OrderNotFound` if the order was never created
    async fn attach_line(&self, order_id: Uuid, line: &OrderLine) -> AppResult<()>;

    async fn get_order(&self, order_id: Uuid) -> AppResult<Option<Order>>;

    /// Lines in the order they were attached.
    async fn order_lines(&self, order_id: Uuid) -> AppResult<Vec<OrderLine>>;

    /// Decrements an ingredient's stock and persists the result together with
    /// the alert latch.
    ///
    /// # Arguments
    /// * `id` - The ingredient to take stock from
    /// * `amount` - How much to take; stock may go negative
    ///
    /// # Returns
    /// * `AppResult<Consumption>` - The updated ingredient, flagged `alert_due` when
    ///   this decrement claimed the latch. `IngredientNotFound` for an unknown id.
    async fn consume_ingredient(&self, id: u64, amount: Decimal) -> AppResult<Consumption>;

    /// Clears the alert latch claimed by `consume_ingredient` when the alert
    /// could not be delivered, so a later order alerts again.
    ///
    /// # Arguments
    /// * `id` - The ingredient whose latch to clear
    async fn release_alert(&self, id: u64) -> AppResult<()>;

    /// Writes catalog products, replacing existing entries, and adds catalog
    /// ingredients that are not stored yet. Stored ingredients keep their stock.
    ///
    /// # Arguments
    /// * `catalog` - A catalog that passes `Catalog::validate`
    async fn seed(&self, catalog: &Catalog) -> AppResult<()>;
}
