//! Shared fixture for driving the router in-process.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;

use shop_orders::api::{create_router, AppState};
use shop_orders::catalog::{Catalog, Product};
use shop_orders::error::{AppError, AppResult};
use shop_orders::inventory::{Ingredient, RecipeItem, StockGate};
use shop_orders::memory::MemoryStore;
use shop_orders::notify::{LowStockAlert, Notifier};
use shop_orders::store::ShopStore;

/// Keeps every alert instead of mailing it. Can be told to fail the next sends.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<LowStockAlert>>,
    failures: AtomicUsize,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<LowStockAlert> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next_sends(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn recipient(&self) -> &str {
        "merchant@example.com"
    }

    async fn send(&self, alert: &LowStockAlert) -> AppResult<()> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::Notification("mail relay unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

pub struct TestFixture {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub fn ingredient(id: u64, name: &str, stock: Decimal, threshold: Decimal) -> Ingredient {
    Ingredient {
        id,
        name: name.to_string(),
        stock,
        threshold,
        alert_sent: false,
    }
}

/// Beef (100 / threshold 20) and buns (500 / threshold 50).
/// Burger: 5 beef + 1 bun, 5.50. Slider: 2 beef + 1 bun, 3.00.
pub fn burger_catalog() -> Catalog {
    Catalog {
        ingredients: vec![
            ingredient(1, "Beef", dec!(100), dec!(20)),
            ingredient(2, "Bun", dec!(500), dec!(50)),
        ],
        products: vec![
            Product {
                id: 1,
                name: "Burger".to_string(),
                price: dec!(5.50),
                ingredients: vec![
                    RecipeItem { ingredient_id: 1, amount: dec!(5) },
                    RecipeItem { ingredient_id: 2, amount: dec!(1) },
                ],
            },
            Product {
                id: 2,
                name: "Slider".to_string(),
                price: dec!(3.00),
                ingredients: vec![
                    RecipeItem { ingredient_id: 1, amount: dec!(2) },
                    RecipeItem { ingredient_id: 2, amount: dec!(1) },
                ],
            },
        ],
    }
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_catalog(burger_catalog()).await
    }

    pub async fn with_catalog(catalog: Catalog) -> Self {
        let store = Arc::new(MemoryStore::with_catalog(&catalog).await.unwrap());
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(store.clone(), notifier.clone(), StockGate::default());
        Self {
            router: create_router(state),
            store,
            notifier,
        }
    }

    pub async fn stock(&self, ingredient_id: u64) -> Ingredient {
        self.store.get_ingredient(ingredient_id).await.unwrap().unwrap()
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_raw(&self, uri: &str, body: &'static str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse { status, body }
    }
}
