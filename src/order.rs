use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::inventory::{InventoryLedger, StockGate};
use crate::notify::Notifier;
use crate::request::PlaceOrder;
use crate::store::ShopStore;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "Order"),
        }
    }
}

impl Order {
    /// Creates a new order with a fresh id.
    pub fn new(customer_name: String, customer_email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_name,
            customer_email,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A product attached to an order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderLine {
    pub product_id: u64,
    pub quantity: u32,
}

/// Per-line pricing returned to the caller.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LineDetail {
    pub product_id: u64,
    /// Unit price.
    pub price: Decimal,
    pub quantity: u32,
    /// Running total of the order up to and including this line.
    pub total_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub order: Order,
    pub lines: Vec<LineDetail>,
}

impl PlacedOrder {
    pub fn total(&self) -> Decimal {
        self.lines
            .last()
            .map(|line| line.total_price)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Places orders: gates on stock, records lines and consumes ingredients.
pub struct OrderProcessor<'a> {
    store: &'a dyn ShopStore,
    notifier: &'a dyn Notifier,
    gate: StockGate,
}

impl<'a> OrderProcessor<'a> {
    /// Creates a processor over the given store and notifier.
    ///
    /// # Arguments
    /// * `store` - Where orders are written and ingredients consumed
    /// * `notifier` - Receives low-stock alerts
    /// * `gate` - Closes the shop when any ingredient runs too low
    pub fn new(store: &'a dyn ShopStore, notifier: &'a dyn Notifier, gate: StockGate) -> Self {
        Self {
            store,
            notifier,
            gate,
        }
    }

    /// Places a validated order.
    ///
    /// Lines are processed in request order. An unknown product aborts the
    /// request, but stock taken by earlier lines stays taken.
    ///
    /// # Arguments
    /// * `request` - The validated order; lines without a quantity are skipped
    ///
    /// # Returns
    /// * `AppResult<PlacedOrder>` - The order and its priced lines. `ShopClosed`
    ///   when the stock gate trips, `ProductNotFound` for an unknown product.
    #[instrument(skip(self, request), fields(customer = %request.customer_email))]
    pub async fn place_order(&self, request: PlaceOrder) -> AppResult<PlacedOrder> {
        let ingredients = self.store.list_ingredients().await?;
        self.gate.check(&ingredients)?;

        let order = Order::new(request.customer_name, request.customer_email);
        self.store.create_order(&order).await?;
        info!(order_id = %order.id, "order created");

        let ledger = InventoryLedger::new(self.store, self.notifier);
        let mut running_total = Decimal::ZERO;
        let mut lines = Vec::with_capacity(request.lines.len());

        for requested in &request.lines {
            let Some(quantity) = requested.quantity else {
                debug!(product_id = requested.product_id, "skipping line without quantity");
                continue;
            };

            let product = self
                .store
                .get_product(requested.product_id)
                .await?
                .ok_or(AppError::ProductNotFound(requested.product_id))?;

            let line_total = product.price * Decimal::from(quantity);
            running_total += line_total;

            lines.push(LineDetail {
                product_id: product.id,
                price: product.price,
                quantity,
                total_price: running_total,
                line_total,
            });

            self.store
                .attach_line(
                    order.id,
                    &OrderLine {
                        product_id: product.id,
                        quantity,
                    },
                )
                .await?;

            for item in &product.ingredients {
                ledger.consume(item, quantity).await?;
            }
        }

        info!(order_id = %order.id, lines = lines.len(), total = %running_total, "order placed");
        Ok(PlacedOrder { order, lines })
    }
}
