use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::notify::{LowStockAlert, Notifier};
use crate::store::ShopStore;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ingredient {
    pub id: u64,
    pub name: String,
    pub stock: Decimal,
    pub threshold: Decimal,
    #[serde(default)]
    pub alert_sent: bool,
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (#{}) stock={} threshold={}",
            self.name, self.id, self.stock, self.threshold
        )
    }
}

/// Result of taking stock out of a single ingredient.
#[derive(Debug, Clone, PartialEq)]
pub struct Consumption {
    pub ingredient: Ingredient,
    /// Set only on the decrement that moved the ingredient into the alerted state.
    pub alert_due: bool,
}

impl Ingredient {
    /// Takes `amount` out of stock. Stock is allowed to go negative.
    ///
    /// The first time stock ends up at or below the threshold the `alert_sent`
    /// latch is claimed and the returned consumption is flagged `alert_due`.
    /// While latched, further decrements never flag again. A claim whose alert
    /// could not be delivered is undone with `release_alert`.
    pub fn consume(&mut self, amount: Decimal) -> Consumption {
        self.stock -= amount;

        let alert_due = self.stock <= self.threshold && !self.alert_sent;
        if alert_due {
            self.alert_sent = true;
        }

        Consumption {
            ingredient: self.clone(),
            alert_due,
        }
    }

    /// Clears the latch so the next decrement at or below the threshold alerts again.
    pub fn release_alert(&mut self) {
        self.alert_sent = false;
    }

    pub fn is_below_gate(&self, ratio: Decimal) -> bool {
        self.stock <= self.threshold * ratio
    }
}

/// How much of an ingredient one unit of a product uses.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecipeItem {
    pub ingredient_id: u64,
    pub amount: Decimal,
}

/// Closes the shop for every order while any ingredient is critically low.
#[derive(Debug, Clone, Copy)]
pub struct StockGate {
    ratio: Decimal,
}

impl Default for StockGate {
    fn default() -> Self {
        Self {
            ratio: Decimal::new(5, 1),
        }
    }
}

impl StockGate {
    /// Creates a gate with a custom ratio.
    ///
    /// # Arguments
    /// * `ratio` - Fraction of each ingredient's threshold at or below which the shop closes
    ///
    /// # Returns
    /// * `Self` - A new StockGate instance
    pub fn new(ratio: Decimal) -> Self {
        Self { ratio }
    }

    /// Fraction of the threshold the gate closes at.
    pub fn ratio(&self) -> Decimal {
        self.ratio
    }

    /// Fails with `ShopClosed` if any ingredient sits at or below
    /// `threshold * ratio`, whether or not the order uses it.
    pub fn check(&self, ingredients: &[Ingredient]) -> AppResult<()> {
        match ingredients.iter().find(|i| i.is_below_gate(self.ratio)) {
            Some(ingredient) => {
                warn!(%ingredient, ratio = %self.ratio, "stock gate closed");
                Err(AppError::ShopClosed)
            }
            None => Ok(()),
        }
    }
}

/// Applies product consumption to stored ingredients and raises low-stock alerts.
pub struct InventoryLedger<'a> {
    store: &'a dyn ShopStore,
    notifier: &'a dyn Notifier,
}

impl<'a> InventoryLedger<'a> {
    pub fn new(store: &'a dyn ShopStore, notifier: &'a dyn Notifier) -> Self {
        Self { store, notifier }
    }

    /// Takes one line's worth of an ingredient out of stock and alerts the
    /// merchant if this decrement is the one that crossed the threshold.
    ///
    /// # Arguments
    /// * `item` - The ingredient and the amount used per unit of product
    /// * `quantity` - Units of product ordered
    ///
    /// # Returns
    /// * `AppResult<Consumption>` - The updated ingredient. If the alert cannot be
    ///   sent the latch is released and the send error is returned.
    #[instrument(skip(self), fields(ingredient_id = item.ingredient_id))]
    pub async fn consume(&self, item: &RecipeItem, quantity: u32) -> AppResult<Consumption> {
        let amount = item.amount * Decimal::from(quantity);
        let consumption = self
            .store
            .consume_ingredient(item.ingredient_id, amount)
            .await?;

        debug!(
            %amount,
            stock = %consumption.ingredient.stock,
            "ingredient decremented"
        );

        if consumption.alert_due {
            let alert = LowStockAlert::for_ingredient(
                self.notifier.recipient(),
                &consumption.ingredient,
            );
            warn!(ingredient = %consumption.ingredient, "ingredient low on stock");
            if let Err(send_error) = self.notifier.send(&alert).await {
                error!(error = %send_error, "low stock alert not sent, releasing latch");
                if let Err(release_error) = self.store.release_alert(item.ingredient_id).await {
                    error!(error = %release_error, "failed to release alert latch");
                }
                return Err(send_error);
            }
        }

        Ok(consumption)
    }
}
