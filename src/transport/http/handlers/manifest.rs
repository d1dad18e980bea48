use crate::transport::http::types::ApiResponse;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Static tool descriptions so the consuming agent knows what it can call.
/// Parameter schemas follow the JSON-schema-ish shape LLM tool interfaces
/// expect.
#[utoipa::path(
    get,
    path = "/manifest",
    responses(
        (status = 200, description = "Tool manifest for the consuming agent", body = ApiResponse)
    )
)]
pub async fn manifest_handler() -> impl IntoResponse {
    Json(ApiResponse::ok(json!({
        "tools": [
            {
                "name": "search_products",
                "description": "Search products by name or category (e.g. 'trousers', 'blue shirt'). Returns a list with id, name and price.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "search": { "type": "string", "description": "Search term" }
                    }
                }
            },
            {
                "name": "get_product_details",
                "description": "Fetch detailed information for one product.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "description": "Product id" }
                    },
                    "required": ["id"]
                }
            },
            {
                "name": "create_cart",
                "description": "Create a new shopping cart, or resume the existing active one when a phone number is given.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "user_phone": { "type": "string", "description": "Customer phone number (optional)" }
                    }
                }
            },
            {
                "name": "add_to_cart",
                "description": "Add a product to the cart. Requires cart_id and product_id.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "cart_id": { "type": "string", "description": "Cart id" },
                        "product_id": { "type": "integer", "description": "Product id to add" },
                        "quantity": { "type": "integer", "description": "Quantity (default 1)" },
                        "expected_name": { "type": "string", "description": "Name you believe the product has (e.g. 'jacket'). ALWAYS set it to catch wrong ids." }
                    },
                    "required": ["cart_id", "product_id"]
                }
            },
            {
                "name": "update_cart_item",
                "description": "Set the exact quantity of a product in the cart. A quantity of 0 removes it.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "cart_id": { "type": "string", "description": "Cart id" },
                        "product_id": { "type": "integer", "description": "Product id" },
                        "quantity": { "type": "integer", "description": "New exact quantity (e.g. 3)" },
                        "expected_name": { "type": "string", "description": "Name you believe the product has (id validation)." }
                    },
                    "required": ["cart_id", "product_id", "quantity"]
                }
            },
            {
                "name": "get_cart",
                "description": "Fetch the current cart contents and total.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "cart_id": { "type": "string", "description": "Cart id" }
                    },
                    "required": ["cart_id"]
                }
            },
            {
                "name": "remove_from_cart",
                "description": "Remove a product from the cart.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "cart_id": { "type": "string", "description": "Cart id" },
                        "product_id": { "type": "integer", "description": "Product id to remove" }
                    },
                    "required": ["cart_id", "product_id"]
                }
            },
            {
                "name": "close_cart",
                "description": "Close the cart, finish the purchase and return the final summary. Call when the customer confirms.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "cart_id": { "type": "string", "description": "Cart id to close" }
                    },
                    "required": ["cart_id"]
                }
            }
        ]
    })))
}
