mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{app, body_json, delete, get, post, put, PASSWORD};

async fn create_product(router: &axum::Router, name: &str, retail: i64, wholesale: i64, stock: i64) -> String {
    let response = router
        .clone()
        .oneshot(post(
            "/products",
            &json!({
                "name": name,
                "brand": "Lucky",
                "unit_of_measure": "bag",
                "retail_price_cents": retail,
                "wholesale_price_cents": wholesale,
                "stock_quantity": stock,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

async fn stock_of(router: &axum::Router, product_id: &str) -> i64 {
    let response = router
        .clone()
        .oneshot(get(&format!("/products/{}", product_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["stock_quantity"].as_i64().unwrap()
}

fn retail_sale(product_id: &str, quantity: i64, price_cents: i64) -> Value {
    json!({
        "customer_type": "retail",
        "items": [{
            "product_id": product_id,
            "quantity": quantity,
            "price_cents": price_cents,
        }],
    })
}

#[tokio::test]
async fn test_health() {
    let (router, _db) = app().await;

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_create_sale_with_item_discount() {
    let (router, _db) = app().await;
    let product_id = create_product(&router, "Cement", 10000, 9000, 5).await;

    let response = router
        .clone()
        .oneshot(post(
            "/sales",
            &json!({
                "customer_type": "retail",
                "items": [{
                    "product_id": product_id,
                    "quantity": 2,
                    "price_cents": 10000,
                    "discount_type": "percentage",
                    "discount_value": 1000,
                }],
                "subtotal_cents": 18000,
                "total_amount_cents": 18000,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["total_amount_cents"], 18000);
    assert_eq!(body["subtotal_cents"], 18000);
    assert_eq!(body["customer_type"], "retail");
    assert!(body["customer_id"].is_null());
    assert_eq!(body["items"][0]["original_price_cents"], 20000);
    assert_eq!(body["items"][0]["discount_amount_cents"], 2000);
    assert_eq!(body["items"][0]["product_name"], "Cement");

    assert_eq!(stock_of(&router, &product_id).await, 3);

    let sale_id = body["sale_id"].as_str().unwrap();
    let response = router
        .clone()
        .oneshot(get(&format!("/sales/{}", sale_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["sale"]["total_amount_cents"], 18000);
    assert_eq!(detail["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_price_mismatch_and_tolerance() {
    let (router, _db) = app().await;
    let product_id = create_product(&router, "Pipe", 10000, 8000, 10).await;

    let response = router
        .clone()
        .oneshot(post("/sales", &retail_sale(&product_id, 1, 9000)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "PRICE_MISMATCH");
    assert_eq!(body["details"]["expected_cents"], 10000);
    assert_eq!(stock_of(&router, &product_id).await, 10);

    let response = router
        .clone()
        .oneshot(post("/sales", &retail_sale(&product_id, 1, 10001)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(stock_of(&router, &product_id).await, 9);
}

#[tokio::test]
async fn test_out_of_stock_is_rejected() {
    let (router, _db) = app().await;
    let product_id = create_product(&router, "Valve", 4500, 4000, 1).await;

    let response = router
        .clone()
        .oneshot(post("/sales", &retail_sale(&product_id, 2, 4500)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INSUFFICIENT_STOCK");
    assert_eq!(stock_of(&router, &product_id).await, 1);
}

#[tokio::test]
async fn test_extreme_submitted_amounts_are_validation_errors() {
    let (router, _db) = app().await;
    let product_id = create_product(&router, "Bolt", 4500, 4000, 5).await;

    for price in [i64::MIN, -1, i64::MAX] {
        let response = router
            .clone()
            .oneshot(post("/sales", &retail_sale(&product_id, 1, price)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "price {price}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }

    let mut body = retail_sale(&product_id, 1, 4500);
    body["total_amount_cents"] = json!(i64::MIN);
    let response = router.clone().oneshot(post("/sales", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    assert_eq!(stock_of(&router, &product_id).await, 5);
}

#[tokio::test]
async fn test_customer_type_is_locked() {
    let (router, _db) = app().await;
    let product_id = create_product(&router, "Sand", 9000, 8000, 50).await;

    let response = router
        .clone()
        .oneshot(post("/sales", &retail_sale(&product_id, 1, 9000)))
        .await
        .unwrap();
    let sale_id = body_json(response).await["sale_id"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(put(&format!("/sales/{}", sale_id), &json!({ "customer_type": "long-term" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "CUSTOMER_TYPE_LOCKED");

    // Quantity edits still go through and move stock by the delta.
    let detail = router
        .clone()
        .oneshot(get(&format!("/sales/{}", sale_id)))
        .await
        .unwrap();
    let item_id = body_json(detail).await["items"][0]["id"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(put(
            &format!("/sales/{}", sale_id),
            &json!({ "customer_type": "retail", "items": [{ "item_id": item_id, "quantity": 3 }] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["sale"]["customer_type"], "retail");
    assert_eq!(body["sale"]["total_amount_cents"], 27000);
    assert_eq!(stock_of(&router, &product_id).await, 47);
}

#[tokio::test]
async fn test_archive_flow() {
    let (router, _db) = app().await;
    let product_id = create_product(&router, "Paint", 42000, 39500, 30).await;
    let uri = format!("/products/{}", product_id);

    // No password
    let response = router.clone().oneshot(delete(&uri, &json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "PASSWORD_REQUIRED");

    // Wrong password
    let response = router
        .clone()
        .oneshot(delete(&uri, &json!({ "password": "nope" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "INCORRECT_PASSWORD");

    let response = router
        .clone()
        .oneshot(delete(&uri, &json!({ "password": PASSWORD })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["item_type"], "product");
    assert_eq!(body["original_id"], product_id.as_str());
    let archive_id = body["archive_id"].as_str().unwrap().to_string();

    let response = router.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .clone()
        .oneshot(get("/deleted-items?item_type=product"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], archive_id.as_str());

    let response = router
        .clone()
        .oneshot(get("/deleted-items?item_type=invoice"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let restore_uri = format!("/deleted-items/{}/restore", archive_id);
    let response = router
        .clone()
        .oneshot(post(&restore_uri, &json!({ "password": PASSWORD })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(stock_of(&router, &product_id).await, 30);

    // Delete again, then purge for good.
    let response = router
        .clone()
        .oneshot(delete(&uri, &json!({ "password": PASSWORD })))
        .await
        .unwrap();
    let archive_id = body_json(response).await["archive_id"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(delete(
            &format!("/deleted-items/{}", archive_id),
            &json!({ "password": PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(post(
            &format!("/deleted-items/{}/restore", archive_id),
            &json!({ "password": PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customer_history() {
    let (router, _db) = app().await;
    let product_id = create_product(&router, "Wire", 10000, 9000, 20).await;

    let response = router
        .clone()
        .oneshot(post(
            "/customers",
            &json!({ "name": "Bilal Traders", "classification": "long-term", "opening_balance_cents": 1000 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let customer_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = router
        .clone()
        .oneshot(post(
            "/sales",
            &json!({
                "customer_id": customer_id,
                "customer_type": "long-term",
                "items": [{ "product_id": product_id, "quantity": 2, "price_cents": 9000 }],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .clone()
        .oneshot(post(
            &format!("/customers/{}/payments", customer_id),
            &json!({ "amount_cents": 5000, "description": "Cash" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .clone()
        .oneshot(get(&format!("/customers/{}/history", customer_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let statement = body_json(response).await;
    // 1000 opening + 18000 sale - 5000 payment
    assert_eq!(statement["closing_balance_cents"], 14000);
    assert_eq!(statement["closing_label"], "Dr");
    assert_eq!(statement["total_debit_cents"], 18000);
    assert_eq!(statement["total_credit_cents"], 5000);
    assert_eq!(statement["entries"][0]["kind"], "opening");

    let response = router
        .clone()
        .oneshot(get("/customers/missing/history"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_sale_leaves_customer_statement_until_restored() {
    let (router, _db) = app().await;
    let product_id = create_product(&router, "Cable", 3000, 2500, 10).await;

    let response = router
        .clone()
        .oneshot(post("/customers", &json!({ "name": "Noor Hardware", "classification": "retail" })))
        .await
        .unwrap();
    let customer_id = body_json(response).await["id"].as_str().unwrap().to_string();
    let history_uri = format!("/customers/{}/history", customer_id);

    let response = router
        .clone()
        .oneshot(post(
            "/sales",
            &json!({
                "customer_id": customer_id,
                "customer_type": "retail",
                "items": [{ "product_id": product_id, "quantity": 3, "price_cents": 3000 }],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let sale_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let statement = body_json(router.clone().oneshot(get(&history_uri)).await.unwrap()).await;
    assert_eq!(statement["closing_balance_cents"], 9000);
    assert_eq!(statement["entries"].as_array().unwrap().len(), 2);

    let response = router
        .clone()
        .oneshot(delete(&format!("/sales/{}", sale_id), &json!({ "password": PASSWORD })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let archive_id = body_json(response).await["archive_id"].as_str().unwrap().to_string();

    let statement = body_json(router.clone().oneshot(get(&history_uri)).await.unwrap()).await;
    assert_eq!(statement["closing_balance_cents"], 0);
    assert_eq!(statement["total_debit_cents"], 0);
    assert_eq!(statement["entries"].as_array().unwrap().len(), 1);

    let response = router
        .clone()
        .oneshot(post(
            &format!("/deleted-items/{}/restore", archive_id),
            &json!({ "password": PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let statement = body_json(router.clone().oneshot(get(&history_uri)).await.unwrap()).await;
    assert_eq!(statement["closing_balance_cents"], 9000);
    assert_eq!(statement["total_debit_cents"], 9000);
    assert_eq!(statement["entries"].as_array().unwrap().len(), 2);
    assert_eq!(statement["entries"][1]["kind"], "sale");
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_error() {
    let (router, _db) = app().await;

    let request = axum::http::Request::builder()
        .method(axum::http::Method::POST)
        .uri("/sales")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"items\": ["))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = router
        .oneshot(post("/sales", &json!({ "customer_type": "retail", "items": [] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}
