//! The cart engine.
//!
//! Orchestrates the catalog lookup, the expected-name guard and the cart
//! store to implement the public operations. Validation order on mutations
//! follows the boundary contract: product existence first, then the
//! expected-name guard, then the write itself, which carries the cart-state
//! gate inside its own transaction.

use crate::domain::cart::{Cart, CartSummary};
use crate::domain::matching::{match_expected_name, NameMatch};
use crate::domain::product::Product;
use crate::storage::{CartStore, CatalogStore, GatedWrite, SetOutcome};
use sqlx::PgPool;
use thiserror::Error;

/// Error taxonomy exposed to the transport layer. Each variant maps to a
/// stable `kind` tag; storage failures keep the original detail for
/// operator diagnosis and are never surfaced as success.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{what} {key} not found")]
    NotFound { what: &'static str, key: String },

    #[error(
        "id mismatch: product {product_id} is '{canonical_name}', not '{expected_name}'; \
         look up the correct id"
    )]
    IdentityMismatch {
        product_id: i32,
        canonical_name: String,
        expected_name: String,
    },

    #[error("cart {0} is closed; item changes are no longer allowed")]
    CartClosed(String),

    #[error("no cart to close: {0}")]
    MissingReference(String),

    #[error("transient storage failure: {0}")]
    Transient(#[from] anyhow::Error),
}

impl CartError {
    /// Stable machine-readable tag carried in every error response.
    pub fn kind(&self) -> &'static str {
        match self {
            CartError::InvalidInput(_) => "invalid_input",
            CartError::NotFound { .. } => "not_found",
            CartError::IdentityMismatch { .. } => "identity_mismatch",
            CartError::CartClosed(_) => "cart_closed",
            CartError::MissingReference(_) => "missing_reference",
            CartError::Transient(_) => "transient",
        }
    }
}

/// Result of an add: the canonical name (so the agent can confirm what it
/// actually added) and the freshly recomputed total.
#[derive(Debug, Clone)]
pub struct AddReceipt {
    pub product_name: String,
    pub total: f64,
}

/// Result of an exact-quantity set.
#[derive(Debug, Clone, Copy)]
pub enum SetReceipt {
    Deleted,
    Quantity(i32),
}

/// Snapshot returned by close: the item state at close time.
#[derive(Debug, Clone)]
pub struct ClosedCart {
    pub cart_id: String,
    pub summary: CartSummary,
}

pub struct CartService {
    carts: CartStore,
    catalog: CatalogStore,
}

impl CartService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            carts: CartStore::new(pool.clone()),
            catalog: CatalogStore::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        self.carts.pool()
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Returns the identity's active cart if one exists, else creates a
    /// fresh cart. The bool is true when an existing cart was resumed.
    pub async fn resume_or_create(&self, identity: Option<&str>) -> Result<(Cart, bool), CartError> {
        let identity = identity.map(str::trim).filter(|s| !s.is_empty());
        let (cart, created) = self.carts.resume_or_create(identity).await?;
        if created {
            tracing::info!(cart_id = %cart.id, identity = ?cart.identity, "created cart");
        } else {
            tracing::info!(cart_id = %cart.id, "resumed active cart");
        }
        Ok((cart, !created))
    }

    /// Increments the stored quantity by `quantity` (negative deltas are
    /// applied literally; the row disappears when it drops to zero or
    /// below). Returns the canonical name and the recomputed total.
    pub async fn add_item(
        &self,
        cart_id: &str,
        product_id: i32,
        quantity: i32,
        expected_name: Option<&str>,
    ) -> Result<AddReceipt, CartError> {
        let product = self.guarded_product(product_id, expected_name).await?;

        let write = self.carts.upsert_increment(cart_id, product_id, quantity).await?;
        let applied = gated(cart_id, write)?;
        let summary = self.get_cart(cart_id).await?;
        tracing::info!(cart_id, product_id, applied, total = summary.total, "added item");
        Ok(AddReceipt { product_name: product.name, total: summary.total })
    }

    /// Sets the exact stored quantity; `quantity <= 0` deletes the line.
    pub async fn set_item_quantity(
        &self,
        cart_id: &str,
        product_id: i32,
        quantity: i32,
        expected_name: Option<&str>,
    ) -> Result<SetReceipt, CartError> {
        self.guarded_product(product_id, expected_name).await?;

        let write = self.carts.set_exact_quantity(cart_id, product_id, quantity).await?;
        let outcome = gated(cart_id, write)?;
        tracing::info!(cart_id, product_id, ?outcome, "set item quantity");
        Ok(match outcome {
            SetOutcome::Deleted => SetReceipt::Deleted,
            SetOutcome::Created(q) | SetOutcome::Updated(q) => SetReceipt::Quantity(q),
        })
    }

    /// Unconditional delete attempt; the second call for the same line
    /// reports `false` without error.
    pub async fn remove_item(&self, cart_id: &str, product_id: i32) -> Result<bool, CartError> {
        let removed = self.carts.remove_item(cart_id, product_id).await?;
        tracing::info!(cart_id, product_id, removed, "removed item");
        Ok(removed)
    }

    /// Read-only and side-effect-free: an unknown or empty cart returns an
    /// empty item list and total 0, never an error.
    pub async fn get_cart(&self, cart_id: &str) -> Result<CartSummary, CartError> {
        let lines = self.carts.get_items(cart_id).await?;
        Ok(CartSummary::from_lines(lines))
    }

    /// Resolves the cart by id, else by the identity's active cart, then
    /// marks it closed and snapshots items + total in the same transaction,
    /// so the response reflects exactly the state at close time. Closing
    /// twice is idempotent.
    pub async fn close_cart(
        &self,
        cart_id: Option<&str>,
        identity: Option<&str>,
    ) -> Result<ClosedCart, CartError> {
        let cart = match (cart_id, identity) {
            (Some(id), _) => self.carts.get_cart(id).await?.ok_or_else(|| {
                CartError::MissingReference(format!("no cart with id {id}"))
            })?,
            (None, Some(identity)) => self.carts.find_active_cart(identity).await?.ok_or_else(|| {
                CartError::MissingReference(format!("no active cart for identity {identity}"))
            })?,
            (None, None) => {
                return Err(CartError::MissingReference(
                    "a cart_id or an identity is required".to_string(),
                ))
            }
        };

        let lines = self.carts.close_cart(&cart.id).await?;
        let summary = CartSummary::from_lines(lines);
        tracing::info!(cart_id = %cart.id, total = summary.total, "closed cart");
        Ok(ClosedCart { cart_id: cart.id, summary })
    }

    /// Product existence + expected-name guard shared by the item mutations.
    async fn guarded_product(
        &self,
        product_id: i32,
        expected_name: Option<&str>,
    ) -> Result<Product, CartError> {
        let product = self.catalog.get_by_id(product_id).await?.ok_or_else(|| {
            CartError::NotFound { what: "product", key: product_id.to_string() }
        })?;

        if let Some(expected) = expected_name {
            if let NameMatch::Mismatch(m) = match_expected_name(&product.name, expected) {
                tracing::warn!(
                    product_id,
                    canonical = %m.canonical_name,
                    expected = %m.expected_name,
                    "expected-name guard rejected mutation"
                );
                return Err(CartError::IdentityMismatch {
                    product_id,
                    canonical_name: m.canonical_name,
                    expected_name: m.expected_name,
                });
            }
        }
        Ok(product)
    }

}

/// Maps a gated store write onto the error taxonomy. The closed-cart
/// rejection is intentional: a closed cart is terminal.
fn gated<T>(cart_id: &str, write: GatedWrite<T>) -> Result<T, CartError> {
    match write {
        GatedWrite::Applied(value) => Ok(value),
        GatedWrite::UnknownCart => Err(CartError::NotFound {
            what: "cart",
            key: cart_id.to_string(),
        }),
        GatedWrite::CartClosed => Err(CartError::CartClosed(cart_id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_are_stable() {
        let cases: Vec<(CartError, &str)> = vec![
            (CartError::InvalidInput("x".into()), "invalid_input"),
            (CartError::NotFound { what: "product", key: "7".into() }, "not_found"),
            (
                CartError::IdentityMismatch {
                    product_id: 7,
                    canonical_name: "Red Scarf".into(),
                    expected_name: "socks".into(),
                },
                "identity_mismatch",
            ),
            (CartError::CartClosed("c1".into()), "cart_closed"),
            (CartError::MissingReference("x".into()), "missing_reference"),
            (CartError::Transient(anyhow::anyhow!("boom")), "transient"),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn gated_writes_map_to_the_taxonomy() {
        assert!(matches!(gated("c1", GatedWrite::Applied(7)), Ok(7)));
        let unknown = gated::<i32>("c1", GatedWrite::UnknownCart).unwrap_err();
        assert_eq!(unknown.kind(), "not_found");
        let closed = gated::<i32>("c1", GatedWrite::CartClosed).unwrap_err();
        assert_eq!(closed.kind(), "cart_closed");
    }

    #[test]
    fn mismatch_message_names_both_sides() {
        let err = CartError::IdentityMismatch {
            product_id: 7,
            canonical_name: "Red Scarf".into(),
            expected_name: "socks".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Red Scarf"));
        assert!(msg.contains("socks"));
        assert!(msg.contains('7'));
    }
}
