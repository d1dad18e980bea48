use crate::domain::cart::CartLine;
use crate::domain::product::{Product, ProductHit};
use crate::transport::http::handlers::{cart, catalog, health, items, manifest};
use crate::transport::http::types::{
    AddItemRequest, ApiResponse, CloseCartRequest, CreateCartRequest, SetQuantityRequest,
};
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        catalog::products_handler,
        cart::create_cart_handler,
        cart::get_cart_handler,
        cart::close_cart_handler,
        items::add_item_handler,
        items::set_quantity_handler,
        items::remove_item_handler,
        manifest::manifest_handler
    ),
    components(schemas(
        ApiResponse,
        CreateCartRequest,
        CloseCartRequest,
        AddItemRequest,
        SetQuantityRequest,
        Product,
        ProductHit,
        CartLine
    ))
)]
#[allow(dead_code)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::healthcheck_handler))
        .route("/products", get(catalog::products_handler))
        .route("/cart", post(cart::create_cart_handler).get(cart::get_cart_handler))
        .route("/cart/close", post(cart::close_cart_handler))
        .route(
            "/cart/items",
            post(items::add_item_handler)
                .patch(items::set_quantity_handler)
                .delete(items::remove_item_handler),
        )
        .route("/manifest", get(manifest::manifest_handler))
        .with_state(app_state)
}
