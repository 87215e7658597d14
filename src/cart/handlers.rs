//! REST API handlers for shopping cart operations
//!
//! Every route works on the cart of the calling session. The session is
//! taken from the `x-cart-id` header, then the `cart_session` cookie; when
//! neither is present a new id is issued through `Set-Cookie`.

use super::{helpers::*, models::*};
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::info;

pub const CART_ID_HEADER: &str = "x-cart-id";
pub const SESSION_COOKIE: &str = "cart_session";

/// Creates routes for cart-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/:item_id", patch(update_item).delete(remove_item))
        .route("/checkout", post(checkout))
}

/// Identifies the cart of a request. Returns the id and whether it was
/// freshly generated.
pub fn resolve_session_id(headers: &HeaderMap) -> (String, bool) {
    let from_header = headers
        .get(CART_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let from_cookie = || {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
            .map(|(_, value)| value.to_string())
    };

    match from_header.or_else(from_cookie) {
        Some(id) => (id, false),
        None => (get_or_create_cart_id(None), true),
    }
}

/// Attaches the session cookie when the session was created by this request.
fn respond(body: impl IntoResponse, session_id: &str, is_new_session: bool) -> Response {
    let mut response = body.into_response();
    if is_new_session {
        let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

/// Endpoint: GET /cart
async fn get_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let (session_id, is_new_session) = resolve_session_id(&headers);
    let cart = state.cart(&session_id).get_cart();
    respond(Json(cart), &session_id, is_new_session)
}

/// Endpoint: POST /cart/items
async fn add_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<AddItemInput>,
) -> Result<Response, AppError> {
    let (session_id, is_new_session) = resolve_session_id(&headers);
    let cart = state
        .cart(&session_id)
        .add_item(&payload.product, payload.quantity)?;
    Ok(respond(Json(cart), &session_id, is_new_session))
}

/// Endpoint: PATCH /cart/items/{item_id}
async fn update_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(item_id): Path<String>,
    Json(payload): Json<UpdateQuantityInput>,
) -> Result<Response, AppError> {
    let (session_id, is_new_session) = resolve_session_id(&headers);
    let cart = state
        .cart(&session_id)
        .update_quantity(&item_id, payload.quantity)?;
    Ok(respond(Json(cart), &session_id, is_new_session))
}

/// Endpoint: DELETE /cart/items/{item_id}
async fn remove_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(item_id): Path<String>,
) -> Result<Response, AppError> {
    let (session_id, is_new_session) = resolve_session_id(&headers);
    let cart = state.cart(&session_id).remove_item(&item_id)?;
    Ok(respond(Json(cart), &session_id, is_new_session))
}

/// Endpoint: DELETE /cart
async fn clear_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let (session_id, is_new_session) = resolve_session_id(&headers);
    let cart = state.cart(&session_id).clear_cart();
    respond(Json(cart), &session_id, is_new_session)
}

/// Endpoint: POST /checkout
/// Snapshots the cart into an order summary and clears it. Payment capture
/// happens outside this service.
async fn checkout(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (session_id, is_new_session) = resolve_session_id(&headers);
    let engine = state.cart(&session_id);

    let order = engine.get_cart();
    if order.is_empty() {
        return Err(AppError::EmptyCart);
    }
    engine.clear_cart();

    info!(
        cart_id = %session_id,
        total = order.total,
        items = %format_item_summary(&order.items),
        "checkout"
    );

    let currency = order
        .items
        .first()
        .map(|i| i.currency.clone())
        .unwrap_or_else(default_currency);

    Ok(respond(
        Json(CheckoutSummary {
            status: "checked_out".to_string(),
            cart_id: session_id.clone(),
            currency,
            order,
        }),
        &session_id,
        is_new_session,
    ))
}
