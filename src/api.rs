use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use axum_macros::debug_handler;
use redis::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::config::{Config, StorageBackend};
use crate::error::{AppError, AppResult};
use crate::inventory::{Ingredient, StockGate};
use crate::memory::MemoryStore;
use crate::notify::{LogNotifier, Notifier, RedisOutbox};
use crate::order::{LineDetail, Order, OrderLine, OrderProcessor};
use crate::redis_store::RedisStore;
use crate::request::PlaceOrderRequest;
use crate::store::ShopStore;

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub order: Order,
    pub product: Vec<LineDetail>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetOrderResponse {
    pub order: Order,
    pub products: Vec<OrderLine>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ShopStore>,
    pub notifier: Arc<dyn Notifier>,
    pub gate: StockGate,
}

impl AppState {
    pub fn new(store: Arc<dyn ShopStore>, notifier: Arc<dyn Notifier>, gate: StockGate) -> Self {
        Self {
            store,
            notifier,
            gate,
        }
    }

    /// Builds the configured store and notifier and seeds the catalog into the store.
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        let catalog = if std::path::Path::new(&config.catalog_file).exists() {
            Catalog::load(&config.catalog_file)?
        } else {
            warn!(path = %config.catalog_file, "catalog file not found, starting empty");
            Catalog::default()
        };

        let gate = StockGate::new(config.stock_gate_ratio);
        let state = match config.storage {
            StorageBackend::Redis => {
                let client = Arc::new(Client::open(config.redis_url.as_str())?);
                let store = RedisStore::new(client.clone());
                store.seed(&catalog).await?;
                let notifier = RedisOutbox::new(client, config.alert_recipient.clone());
                Self::new(Arc::new(store), Arc::new(notifier), gate)
            }
            StorageBackend::Memory => {
                let store = MemoryStore::with_catalog(&catalog).await?;
                let notifier = LogNotifier::new(config.alert_recipient.clone());
                Self::new(Arc::new(store), Arc::new(notifier), gate)
            }
        };

        info!(storage = ?config.storage, gate_ratio = %gate.ratio(), "application state ready");
        Ok(state)
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/orders", post(place_order))
        .route("/orders/:order_id", get(get_order))
        .route("/ingredients", get(list_ingredients))
        .with_state(state)
}

#[debug_handler]
async fn place_order(
    State(state): State<AppState>,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> AppResult<Json<PlaceOrderResponse>> {
    let Json(request) =
        payload.map_err(|rejection| AppError::invalid("body", rejection.body_text()))?;
    let request = request.into_order()?;

    let processor = OrderProcessor::new(state.store.as_ref(), state.notifier.as_ref(), state.gate);
    let placed = processor.place_order(request).await?;

    Ok(Json(PlaceOrderResponse {
        success: true,
        order: placed.order,
        product: placed.lines,
    }))
}

#[debug_handler]
async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<GetOrderResponse>> {
    let id = Uuid::parse_str(&order_id).map_err(|_| AppError::OrderNotFound(order_id.clone()))?;
    let order = state
        .store
        .get_order(id)
        .await?
        .ok_or(AppError::OrderNotFound(order_id))?;
    let products = state.store.order_lines(id).await?;

    Ok(Json(GetOrderResponse { order, products }))
}

#[debug_handler]
async fn list_ingredients(State(state): State<AppState>) -> AppResult<Json<Vec<Ingredient>>> {
    Ok(Json(state.store.list_ingredients().await?))
}
