mod common;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::str::FromStr;

use common::{burger_catalog, ingredient, TestFixture};
use shop_orders::error::SHOP_CLOSED_MESSAGE;

fn order_body(products: serde_json::Value) -> serde_json::Value {
    json!({
        "customer_name": "Ada Lovelace",
        "customer_email": "ada@example.com",
        "products": products
    })
}

fn decimal(value: &serde_json::Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal serialized as string")).unwrap()
}

#[tokio::test]
async fn places_order_and_reports_lines() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/orders",
            order_body(json!([
                { "product_id": 1, "quantity": 2 },
                { "product_id": 2, "quantity": 1 }
            ])),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["success"], json!(true));
    assert_eq!(response.body["order"]["customer_name"], "Ada Lovelace");

    let lines = response.body["product"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(decimal(&lines[0]["total_price"]), dec!(11.00));
    assert_eq!(decimal(&lines[1]["line_total"]), dec!(3.00));
    // total_price is cumulative across lines
    assert_eq!(decimal(&lines[1]["total_price"]), dec!(14.00));

    assert_eq!(fixture.stock(1).await.stock, dec!(88));
    assert_eq!(fixture.stock(2).await.stock, dec!(497));
    assert!(fixture.notifier.sent().is_empty());
}

#[tokio::test]
async fn persisted_order_can_be_fetched() {
    let fixture = TestFixture::new().await;

    let placed = fixture
        .post(
            "/orders",
            order_body(json!([
                { "product_id": 2, "quantity": 3 },
                { "product_id": 1, "quantity": 1 }
            ])),
        )
        .await;
    let order_id = placed.body["order"]["id"].as_str().unwrap().to_string();

    let response = fixture.get(&format!("/orders/{}", order_id)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["order"]["id"], order_id.as_str());
    assert_eq!(
        response.body["products"],
        json!([
            { "product_id": 2, "quantity": 3 },
            { "product_id": 1, "quantity": 1 }
        ])
    );
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let fixture = TestFixture::new().await;

    let missing = fixture
        .get("/orders/6a2f41a3-c54c-fce8-32d2-0324e1c32e22")
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let malformed = fixture.get("/orders/not-a-uuid").await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn low_stock_anywhere_closes_the_shop() {
    let mut catalog = burger_catalog();
    // Not used by any product, still closes the shop
    catalog
        .ingredients
        .push(ingredient(3, "Pickles", dec!(5), dec!(10)));
    let fixture = TestFixture::with_catalog(catalog).await;

    let response = fixture
        .post("/orders", order_body(json!([{ "product_id": 1, "quantity": 1 }])))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["success"], json!(false));
    assert_eq!(response.body["message"], SHOP_CLOSED_MESSAGE);
    assert_eq!(fixture.stock(1).await.stock, dec!(100));
}

#[tokio::test]
async fn stock_just_above_gate_is_accepted() {
    let mut catalog = burger_catalog();
    catalog.ingredients[0].stock = dec!(10.01);
    let fixture = TestFixture::with_catalog(catalog).await;

    let response = fixture
        .post("/orders", order_body(json!([{ "product_id": 2, "quantity": 1 }])))
        .await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn lines_without_positive_quantity_are_skipped() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/orders",
            order_body(json!([
                { "product_id": 1, "quantity": 0 },
                { "product_id": 1 },
                { "product_id": 2, "quantity": -4 },
                { "product_id": 2, "quantity": 1 }
            ])),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let lines = response.body["product"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["product_id"], 2);
    assert_eq!(fixture.stock(1).await.stock, dec!(98));
}

#[tokio::test]
async fn skipped_unknown_product_is_not_resolved() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/orders",
            order_body(json!([
                { "product_id": 404, "quantity": 0 },
                { "product_id": 1, "quantity": 1 }
            ])),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn crossing_threshold_sends_one_alert() {
    let fixture = TestFixture::new().await;

    // 100 - 5 * 18 = 10
    let response = fixture
        .post("/orders", order_body(json!([{ "product_id": 1, "quantity": 18 }])))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let beef = fixture.stock(1).await;
    assert_eq!(beef.stock, dec!(10));
    assert!(beef.alert_sent);

    let sent = fixture.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].ingredient_id, 1);
    assert_eq!(sent[0].recipient, "merchant@example.com");
}

#[tokio::test]
async fn exact_threshold_alerts_once_and_never_again() {
    let fixture = TestFixture::new().await;

    // 100 - 5 * 16 = 20, exactly the threshold
    fixture
        .post("/orders", order_body(json!([{ "product_id": 1, "quantity": 16 }])))
        .await;
    assert_eq!(fixture.stock(1).await.stock, dec!(20));
    assert_eq!(fixture.notifier.sent().len(), 1);

    // 20 - 2 * 4 = 12, still above the gate at 10
    let response = fixture
        .post("/orders", order_body(json!([{ "product_id": 2, "quantity": 4 }])))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(fixture.stock(1).await.stock, dec!(12));
    assert_eq!(fixture.notifier.sent().len(), 1);
}

#[tokio::test]
async fn failed_alert_is_retried_by_the_next_order() {
    let fixture = TestFixture::new().await;
    fixture.notifier.fail_next_sends(1);

    // 100 - 2 * 41 = 18, below the threshold of 20
    let response = fixture
        .post("/orders", order_body(json!([{ "product_id": 2, "quantity": 41 }])))
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["success"], json!(false));

    let beef = fixture.stock(1).await;
    assert_eq!(beef.stock, dec!(18));
    assert!(!beef.alert_sent);
    assert!(fixture.notifier.sent().is_empty());

    // 18 - 2 = 16, gate at 10 still open
    let response = fixture
        .post("/orders", order_body(json!([{ "product_id": 2, "quantity": 1 }])))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let beef = fixture.stock(1).await;
    assert_eq!(beef.stock, dec!(16));
    assert!(beef.alert_sent);
    let sent = fixture.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].ingredient_id, 1);
}

#[tokio::test]
async fn unknown_product_fails_after_earlier_lines_applied() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/orders",
            order_body(json!([
                { "product_id": 1, "quantity": 2 },
                { "product_id": 999, "quantity": 1 }
            ])),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.body["errors"]["product_id"],
        json!(["Product not found"])
    );
    // No rollback: the first line's consumption is kept
    assert_eq!(fixture.stock(1).await.stock, dec!(90));
    assert_eq!(fixture.stock(2).await.stock, dec!(498));
}

#[tokio::test]
async fn invalid_request_lists_field_errors() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/orders",
            json!({
                "customer_email": "nope",
                "products": [{ "quantity": 1 }]
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], json!(false));
    let errors = response.body["errors"].as_object().unwrap();
    assert!(errors.contains_key("customer_name"));
    assert!(errors.contains_key("customer_email"));
    assert!(errors.contains_key("products.0.product_id"));
    assert_eq!(fixture.stock(1).await.stock, dec!(100));
}

#[tokio::test]
async fn oversized_quantity_is_a_bad_request() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/orders",
            order_body(json!([
                { "product_id": 2, "quantity": 1 },
                { "product_id": 1, "quantity": 5000000000i64 }
            ])),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(
        response.body["errors"]["products.1.quantity"].is_array(),
        "{:?}",
        response.body
    );
    assert_eq!(fixture.stock(1).await.stock, dec!(100));
    assert_eq!(fixture.stock(2).await.stock, dec!(500));
}

#[tokio::test]
async fn blank_customer_name_is_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/orders",
            json!({
                "customer_name": "   ",
                "customer_email": "ada@example.com",
                "products": [{ "product_id": 1, "quantity": 1 }]
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["errors"]["customer_name"].is_array());
    assert_eq!(fixture.stock(1).await.stock, dec!(100));
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_raw("/orders", "{\"products\": \"many\"").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["errors"]["body"].is_array());
}

#[tokio::test]
async fn ingredients_endpoint_reports_stock() {
    let fixture = TestFixture::new().await;
    fixture
        .post("/orders", order_body(json!([{ "product_id": 1, "quantity": 1 }])))
        .await;

    let response = fixture.get("/ingredients").await;

    assert_eq!(response.status, StatusCode::OK);
    let ingredients = response.body.as_array().unwrap();
    assert_eq!(ingredients.len(), 2);
    assert_eq!(ingredients[0]["name"], "Beef");
    assert_eq!(decimal(&ingredients[0]["stock"]), dec!(95));
    assert_eq!(ingredients[0]["alert_sent"], json!(false));
}
