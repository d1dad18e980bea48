use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Cart lifecycle state. A closed cart is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CartStatus {
    Active,
    Closed,
}

impl CartStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CartStatus::Active => "active",
            CartStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CartStatus::Active),
            "closed" => Some(CartStatus::Closed),
            _ => None,
        }
    }
}

/// A cart row: opaque id, optional customer identity (e.g. phone number),
/// lifecycle status.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: String,
    pub identity: Option<String>,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
}

/// One line of a cart: a product joined with its stored quantity.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLine {
    pub product_id: i32,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub subtotal: f64,
}

impl CartLine {
    pub fn new(product_id: i32, name: String, price: f64, quantity: i32) -> Self {
        let subtotal = round_cents(price * f64::from(quantity));
        Self { product_id, name, price, quantity, subtotal }
    }
}

/// Items plus the derived total. Never persisted: recomputed from current
/// rows on every read, so price changes retroactively affect open carts.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub total: f64,
}

impl CartSummary {
    pub fn from_lines(items: Vec<CartLine>) -> Self {
        let total = round_cents(items.iter().map(|l| l.subtotal).sum());
        Self { items, total }
    }
}

/// Round to 2 decimal places. Totals are sums of f64 subtotals; rounding
/// happens here at the boundary only, never in stored values.
pub fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
