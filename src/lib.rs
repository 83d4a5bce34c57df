//! Shop Order Service
//!
//! Order intake for a food shop. Placing an order checks ingredient stock,
//! prices each product line, takes the ingredients out of inventory and mails
//! the merchant when an ingredient runs low.
//!
//! # Architecture
//!
//! ## Core Components
//!
//! * `api` - HTTP endpoints using the Axum framework
//! * `request` - Request shape validation
//! * `order` - Order building and the order processor
//! * `inventory` - Ingredients, the stock gate and the inventory ledger
//! * `notify` - Low-stock alert mails
//! * `store` - Storage trait, with `redis_store` and `memory` backends
//! * `catalog` - Product and ingredient seed data
//! * `config` - Environment configuration
//! * `error` - Error handling and HTTP response mapping
//!
//! ## Order Flow
//!
//! 1. The request body is validated (`400` on failure).
//! 2. The stock gate scans every ingredient. If any sits at or below half its
//!    threshold the shop is closed and the order is refused (`403`).
//! 3. The order is created. Each line with a positive quantity is priced,
//!    attached to the order and its ingredients are consumed.
//! 4. An ingredient whose stock ends at or below its threshold triggers one
//!    alert mail. The `alert_sent` latch suppresses further alerts.
//!
//! An unknown product aborts the request with `404`. Stock consumed by earlier
//! lines of the same request is not restored.
//!
//! ### Storage Layer
//! - Redis, one JSON document per key
//! - Stock updates use WATCH/MULTI so concurrent orders cannot lose updates
//!   or both send an alert for the same ingredient
//!
//! # Environment Configuration
//!
//! ```bash
//! HOST=127.0.0.1                      # Server host
//! PORT=3000                           # Server port
//! REDIS_URL=redis://localhost:6379    # Redis connection URL
//! STORAGE_BACKEND=redis               # redis or memory
//! CATALOG_FILE=static/catalog.json    # Products and ingredients to seed
//! ALERT_RECIPIENT=owner@example.com   # Low-stock mail recipient
//! STOCK_GATE_RATIO=0.5                # Fraction of threshold that closes the shop
//! RUST_LOG=info                       # Logging level
//! ```
//!
//! # API Endpoints
//!
//! ## POST /orders
//!
//! ### Request
//! ```json
//! {
//!   "customer_name": "string",
//!   "customer_email": "string",
//!   "products": [{ "product_id": 1, "quantity": 2 }]
//! }
//! ```
//!
//! ### Response
//! ```json
//! {
//!   "success": true,
//!   "order": {
//!     "id": "uuid",
//!     "customer_name": "string",
//!     "customer_email": "string",
//!     "created_at": "timestamp",
//!     "updated_at": "timestamp"
//!   },
//!   "product": [
//!     {
//!       "product_id": 1,
//!       "price": "12.50",
//!       "quantity": 2,
//!       "total_price": "25.00",
//!       "line_total": "25.00"
//!     }
//!   ]
//! }
//! ```
//!
//! `total_price` is the running total of the order up to that line;
//! `line_total` is the line on its own.
//!
//! ## GET /orders/:order_id
//! Returns the order and its product lines.
//!
//! ## GET /ingredients
//! Returns current stock, thresholds and alert state of every ingredient.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod inventory;
pub mod memory;
pub mod notify;
pub mod order;
pub mod redis_store;
pub mod request;
pub mod store;
