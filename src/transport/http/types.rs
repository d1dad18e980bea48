use crate::app::cart_service::CartService;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub cart_service: Arc<CartService>,
}

/// Uniform response envelope for every endpoint.
#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(message.into()) }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateCartRequest {
    /// Customer identity (e.g. phone number). When given and an active cart
    /// already exists for it, that cart is resumed instead of creating a
    /// new one.
    #[serde(default)]
    pub user_phone: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AddItemRequest {
    pub cart_id: String,
    pub product_id: i32,
    /// Increment applied to the stored quantity (default 1).
    #[serde(default)]
    pub quantity: Option<i32>,
    /// Name the caller believes `product_id` refers to; a mismatch against
    /// the catalog name rejects the call with 409.
    #[serde(default)]
    pub expected_name: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SetQuantityRequest {
    pub cart_id: String,
    pub product_id: i32,
    /// Exact quantity to store; 0 or less deletes the line.
    pub quantity: i32,
    #[serde(default)]
    pub expected_name: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CloseCartRequest {
    #[serde(default)]
    pub cart_id: Option<String>,
    /// Alternative to `cart_id`: close the identity's active cart.
    #[serde(default)]
    pub identity: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CloseCartQuery {
    pub cart_id: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct GetCartQuery {
    pub id: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct RemoveItemQuery {
    pub cart_id: Option<String>,
    pub product_id: Option<i32>,
}

#[derive(Deserialize, Debug)]
pub struct ProductsQuery {
    pub search: Option<String>,
    pub id: Option<i32>,
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::err(format!(
            "Invalid JSON body: {} (expected: {})",
            err, expected
        ))),
    )
}
