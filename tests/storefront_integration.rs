//! Integration tests for the storefront HTTP service
//!
//! These tests drive the full router and verify:
//! - Cart lifecycle (add, merge, update, remove, clear, checkout)
//! - Session handling (header, cookie, generated ids)
//! - Product listing, lookups and filter bounds
//! - Error handling

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

// Import from the main crate
use storefront_core::catalog::{InMemoryCatalog, Pagination, Product, ProductPage, ProductQuery};
use storefront_core::router::create_app_router;
use storefront_core::state::{AppState, SharedState};

fn product(id: &str, brand: &str, category: &str, price: f64, case_size: Option<f64>) -> Product {
    Product {
        id: id.into(),
        name: format!("{brand} {id}"),
        brand: brand.into(),
        category: category.into(),
        gender: Some("unisex".into()),
        band: Some("steel".into()),
        case_color: Some("silver".into()),
        color: Some("blue".into()),
        price,
        case_size,
        rating: price / 100.0,
        created_at: 1_700_000_000,
        image: format!("/img/{id}.jpg"),
        currency: "OMR".into(),
        discount: None,
    }
}

/// Helper function to create a test app instance
fn create_test_app() -> axum::Router {
    create_app_router(create_test_state())
}

fn create_test_state() -> SharedState {
    let catalog = InMemoryCatalog::new(vec![
        product("w1", "Seiko", "watches", 250.0, Some(40.0)),
        product("w2", "Casio", "watches", 45.0, Some(36.0)),
        product("b1", "Maison", "bags", 120.0, None),
    ]);
    Arc::new(AppState::in_memory(catalog))
}

/// Helper function to send a JSON request and get the response
async fn send_request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    cart_id: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = cart_id {
        builder = builder.header("x-cart-id", id);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, body)
}

fn watch_payload(id: &str, price: f64, quantity: u32, discount: Option<f64>) -> Value {
    json!({
        "product": {
            "id": id,
            "name": format!("Watch {id}"),
            "brand": "Seiko",
            "price": price,
            "image": "/img/w.jpg",
            "currency": "OMR",
            "discount": discount
        },
        "quantity": quantity
    })
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app();
    let (status, body) = send_request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_add_item_computes_totals() {
    let app = create_test_app();

    let (status, body) = send_request(
        &app,
        "POST",
        "/cart/items",
        Some("cart-totals"),
        Some(watch_payload("w1", 100.0, 2, Some(10.0))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["productId"], "w1");
    assert!(body["items"][0]["id"].is_string());
    assert_eq!(body["totalItems"], 2);
    assert_eq!(body["subtotal"], 200.0);
    assert_eq!(body["discount"], 20.0);
    assert_eq!(body["total"], 180.0);
}

#[tokio::test]
async fn test_add_same_product_aggregates() {
    let app = create_test_app();

    send_request(
        &app,
        "POST",
        "/cart/items",
        Some("cart-merge"),
        Some(watch_payload("w1", 10.0, 2, None)),
    )
    .await;
    let (status, body) = send_request(
        &app,
        "POST",
        "/cart/items",
        Some("cart-merge"),
        Some(watch_payload("w1", 10.0, 3, None)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(body["total"], 50.0);
}

#[tokio::test]
async fn test_quantity_defaults_to_one() {
    let app = create_test_app();
    let mut payload = watch_payload("w1", 10.0, 1, None);
    payload.as_object_mut().unwrap().remove("quantity");

    let (status, body) =
        send_request(&app, "POST", "/cart/items", Some("cart-default"), Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_update_and_remove_items() {
    let app = create_test_app();

    send_request(
        &app,
        "POST",
        "/cart/items",
        Some("cart-edit"),
        Some(watch_payload("w1", 10.0, 1, None)),
    )
    .await;
    let (_, body) = send_request(
        &app,
        "POST",
        "/cart/items",
        Some("cart-edit"),
        Some(watch_payload("w2", 5.0, 1, None)),
    )
    .await;
    let first_id = body["items"][0]["id"].as_str().unwrap().to_string();
    let second_id = body["items"][1]["id"].as_str().unwrap().to_string();

    let (status, body) = send_request(
        &app,
        "PATCH",
        &format!("/cart/items/{first_id}"),
        Some("cart-edit"),
        Some(json!({ "quantity": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["quantity"], 4);
    assert_eq!(body["subtotal"], 45.0);

    // Zero quantity removes the line.
    let (status, body) = send_request(
        &app,
        "PATCH",
        &format!("/cart/items/{first_id}"),
        Some("cart-edit"),
        Some(json!({ "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, body) = send_request(
        &app,
        "DELETE",
        &format!("/cart/items/{second_id}"),
        Some("cart-edit"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["total"], 0.0);
}

#[tokio::test]
async fn test_unknown_item_is_not_found() {
    let app = create_test_app();

    let (status, body) =
        send_request(&app, "DELETE", "/cart/items/missing", Some("cart-404"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let (status, _) = send_request(
        &app,
        "PATCH",
        "/cart/items/missing",
        Some("cart-404"),
        Some(json!({ "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_additions_are_rejected() {
    let app = create_test_app();

    let (status, _) = send_request(
        &app,
        "POST",
        "/cart/items",
        Some("cart-bad"),
        Some(watch_payload("w1", 10.0, 0, None)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_request(
        &app,
        "POST",
        "/cart/items",
        Some("cart-bad"),
        Some(watch_payload("w1", 10.0, 1, Some(150.0))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Discount"));
}

#[tokio::test]
async fn test_clear_cart() {
    let app = create_test_app();

    send_request(
        &app,
        "POST",
        "/cart/items",
        Some("cart-clear"),
        Some(watch_payload("w1", 10.0, 3, Some(10.0))),
    )
    .await;
    let (status, body) = send_request(&app, "DELETE", "/cart", Some("cart-clear"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalItems"], 0);
    assert_eq!(body["subtotal"], 0.0);
    assert_eq!(body["discount"], 0.0);
    assert_eq!(body["total"], 0.0);

    let (_, body) = send_request(&app, "GET", "/cart", Some("cart-clear"), None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_multiple_carts_isolation() {
    let app = create_test_app();

    send_request(
        &app,
        "POST",
        "/cart/items",
        Some("cart-1"),
        Some(watch_payload("w1", 10.0, 5, None)),
    )
    .await;
    let (_, body) = send_request(
        &app,
        "POST",
        "/cart/items",
        Some("cart-2"),
        Some(watch_payload("w2", 7.0, 3, None)),
    )
    .await;

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["productId"], "w2");
    assert_eq!(items[0]["quantity"], 3);
}

#[tokio::test]
async fn test_checkout() {
    let app = create_test_app();

    send_request(
        &app,
        "POST",
        "/cart/items",
        Some("checkout-cart"),
        Some(watch_payload("w1", 100.0, 2, Some(10.0))),
    )
    .await;

    let (status, body) = send_request(&app, "POST", "/checkout", Some("checkout-cart"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "checked_out");
    assert_eq!(body["cartId"], "checkout-cart");
    assert_eq!(body["currency"], "OMR");
    assert_eq!(body["order"]["total"], 180.0);

    let (_, body) = send_request(&app, "GET", "/cart", Some("checkout-cart"), None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_checkout_empty_cart() {
    let app = create_test_app();

    let (status, body) = send_request(&app, "POST", "/checkout", Some("nonexistent-cart"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cart is empty");
}

#[tokio::test]
async fn test_new_session_sets_cookie() {
    let app = create_test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/cart")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("cart_session="));
    let session = cookie
        .trim_start_matches("cart_session=")
        .split(';')
        .next()
        .unwrap()
        .to_string();

    // The cookie alone identifies the cart afterwards.
    let request = Request::builder()
        .method("POST")
        .uri("/cart/items")
        .header("content-type", "application/json")
        .header(header::COOKIE, format!("cart_session={session}"))
        .body(Body::from(
            serde_json::to_string(&watch_payload("w1", 10.0, 1, None)).unwrap(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let (_, body) = send_request(&app, "GET", "/cart", Some(&session), None).await;
    assert_eq!(body["totalItems"], 1);
}

#[tokio::test]
async fn test_invalid_json() {
    let app = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/cart/items")
        .header("content-type", "application/json")
        .header("x-cart-id", "bad-json")
        .body(Body::from("invalid json {{{"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_products_with_filters() {
    let app = create_test_app();

    let (status, body) = send_request(
        &app,
        "GET",
        "/products?category=watches&sortBy=price-asc&minCaseSize=30&maxCaseSize=45",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["id"], "w2");
    assert_eq!(products[1]["id"], "w1");
    assert_eq!(body["pagination"]["currentPage"], 1);
    assert_eq!(body["pagination"]["pageSize"], 12);
    assert_eq!(body["pagination"]["totalPages"], 1);
    assert_eq!(body["pagination"]["totalCount"], 2);
}

#[tokio::test]
async fn test_list_products_repeated_params() {
    let app = create_test_app();

    let (status, body) = send_request(
        &app,
        "GET",
        "/products?brand=Seiko&brand=Maison&pageSize=1&page=2&sortBy=price-desc",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["products"][0]["id"], "b1");
    assert_eq!(body["pagination"]["totalPages"], 2);
}

#[tokio::test]
async fn test_list_products_invalid_param() {
    let app = create_test_app();

    let (status, body) = send_request(&app, "GET", "/products?minPrice=cheap", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("minPrice"));
}

#[tokio::test]
async fn test_get_product() {
    let app = create_test_app();

    let (status, body) = send_request(&app, "GET", "/products/w1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["brand"], "Seiko");

    let (status, _) = send_request(&app, "GET", "/products/unknown", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_filter_bounds() {
    let app = create_test_app();

    let (status, body) = send_request(&app, "GET", "/filters/bounds", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["priceRange"]["min"], 45.0);
    assert_eq!(body["priceRange"]["max"], 250.0);
    assert_eq!(body["caseSizeRange"]["min"], 36.0);
    assert_eq!(body["caseSizeRange"]["max"], 40.0);
}

#[tokio::test]
async fn test_repeated_listing_is_served_from_cache() {
    let state = create_test_state();
    let app = create_app_router(state.clone());

    let (status, first) = send_request(&app, "GET", "/products?brand=Seiko", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["pagination"]["totalCount"], 1);
    assert_eq!(state.product_cache.len(), 1);

    // Replace the cached page; a second identical request must return it.
    let key = ProductQuery::from_pairs(&[("brand", "Seiko")]).unwrap().cache_key();
    state.product_cache.set(
        key,
        ProductPage {
            products: Vec::new(),
            pagination: Pagination::new(1, 12, 99),
        },
    );
    let (status, second) = send_request(&app, "GET", "/products?brand=Seiko", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["pagination"]["totalCount"], 99);
    assert_eq!(state.product_cache.len(), 1);

    let (_, other) = send_request(&app, "GET", "/products?brand=Casio", None, None).await;
    assert_eq!(other["pagination"]["totalCount"], 1);
    assert_eq!(state.product_cache.len(), 2);
}

#[tokio::test]
async fn test_separator_characters_in_values_get_their_own_cache_entry() {
    let catalog = InMemoryCatalog::new(vec![product("x1", "x", "watches", 10.0, None)]);
    let state: SharedState = Arc::new(AppState::in_memory(catalog));
    let app = create_app_router(state.clone());

    let (status, smuggled) =
        send_request(&app, "GET", "/products?brand=x%26category%3Dwatches", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(smuggled["pagination"]["totalCount"], 0);

    let (status, split) =
        send_request(&app, "GET", "/products?brand=x&category=watches", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(split["pagination"]["totalCount"], 1);
    assert_eq!(state.product_cache.len(), 2);
}
