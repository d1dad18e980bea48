use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A catalog product. Owned by the catalog; read-only from the cart engine's
/// perspective (no mutation path exists in this service).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i32,
    pub category: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Compact projection returned by catalog search (kept deliberately small so
/// the consuming agent gets id + name + price and nothing else).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductHit {
    pub id: i32,
    pub name: String,
    pub price: f64,
}
