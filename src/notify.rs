use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::AppResult;
use crate::inventory::Ingredient;

/// Redis list drained by the mail worker.
pub const MAIL_OUTBOX: &str = "mail:outbox";

/// Mail sent to the merchant when an ingredient runs low.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LowStockAlert {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub ingredient_id: u64,
    pub ingredient_name: String,
    pub stock: Decimal,
    pub threshold: Decimal,
    pub created_at: DateTime<Utc>,
}

impl LowStockAlert {
    pub fn for_ingredient(recipient: &str, ingredient: &Ingredient) -> Self {
        Self {
            recipient: recipient.to_string(),
            subject: format!("Low stock: {}", ingredient.name),
            body: format!(
                "Stock of {} has dropped to {}, at or below its threshold of {}. Please reorder.",
                ingredient.name, ingredient.stock, ingredient.threshold
            ),
            ingredient_id: ingredient.id,
            ingredient_name: ingredient.name.clone(),
            stock: ingredient.stock,
            threshold: ingredient.threshold,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Address low-stock alerts are sent to.
    fn recipient(&self) -> &str;

    async fn send(&self, alert: &LowStockAlert) -> AppResult<()>;
}

/// Queues alert mails on a Redis list for the mail worker to deliver.
#[derive(Clone)]
pub struct RedisOutbox {
    client: Arc<Client>,
    recipient: String,
}

impl RedisOutbox {
    pub fn new(client: Arc<Client>, recipient: String) -> Self {
        Self { client, recipient }
    }
}

#[async_trait]
impl Notifier for RedisOutbox {
    fn recipient(&self) -> &str {
        &self.recipient
    }

    #[instrument(skip(self, alert), fields(ingredient_id = alert.ingredient_id))]
    async fn send(&self, alert: &LowStockAlert) -> AppResult<()> {
        let mut conn = self.client.get_async_connection().await?;
        let json = serde_json::to_string(alert)?;
        conn.lpush::<_, _, ()>(MAIL_OUTBOX, json).await?;
        info!(recipient = %alert.recipient, "low stock alert queued");
        Ok(())
    }
}

/// Writes alerts to the log only. Used when running without Redis.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    recipient: String,
}

impl LogNotifier {
    pub fn new(recipient: String) -> Self {
        Self { recipient }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn recipient(&self) -> &str {
        &self.recipient
    }

    async fn send(&self, alert: &LowStockAlert) -> AppResult<()> {
        warn!(
            recipient = %alert.recipient,
            ingredient_id = alert.ingredient_id,
            subject = %alert.subject,
            "low stock alert"
        );
        Ok(())
    }
}
