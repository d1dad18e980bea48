//! Cart lifecycle and item rows.
//!
//! Every check-then-act the HTTP layer could race on is collapsed here into
//! a single conditional write: cart creation conflicts against the partial
//! unique index on active identities, and item mutations are single-statement
//! `ON CONFLICT` upserts. Item writes and close serialize on the cart row
//! lock, so an item can never land in a cart after its close snapshot. The
//! store never holds a transaction across a caller round trip.

use crate::domain::cart::{Cart, CartLine, CartStatus};
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

/// Result of an exact-quantity set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// A new row was inserted with this quantity.
    Created(i32),
    /// An existing row was overwritten with this quantity.
    Updated(i32),
    /// The row was deleted (or was already absent).
    Deleted,
}

/// Result of an item write that is gated on the cart row. The gate and the
/// write share one transaction, so the answer cannot go stale between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedWrite<T> {
    Applied(T),
    UnknownCart,
    CartClosed,
}

#[derive(Clone)]
pub struct CartStore {
    pool: PgPool,
}

impl CartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Most recently created active cart for `identity`, if any. Historical
    /// duplicates (a data anomaly the unique index prevents going forward)
    /// resolve by most-recent-created.
    pub async fn find_active_cart(&self, identity: &str) -> anyhow::Result<Option<Cart>> {
        let row = sqlx::query(
            "SELECT id, identity, status, created_at FROM carts
             WHERE identity = $1 AND status = 'active'
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| cart_from_row(&r)).transpose()
    }

    pub async fn get_cart(&self, cart_id: &str) -> anyhow::Result<Option<Cart>> {
        let row = sqlx::query("SELECT id, identity, status, created_at FROM carts WHERE id = $1")
            .bind(cart_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| cart_from_row(&r)).transpose()
    }

    /// Returns the active cart for `identity`, creating one if none exists.
    /// The bool is true when this call inserted a fresh cart.
    ///
    /// The insert conflicts against the partial unique index on
    /// `(identity) WHERE status = 'active'`; losing the race to a concurrent
    /// request means the winner's cart already exists, so loop back and
    /// pick it up.
    pub async fn resume_or_create(&self, identity: Option<&str>) -> anyhow::Result<(Cart, bool)> {
        let Some(identity) = identity else {
            let cart = self.insert_cart(None).await?.ok_or_else(|| {
                anyhow::anyhow!("anonymous cart insert returned no row")
            })?;
            return Ok((cart, true));
        };

        for _ in 0..3 {
            if let Some(cart) = self.find_active_cart(identity).await? {
                return Ok((cart, false));
            }
            if let Some(cart) = self.insert_cart(Some(identity)).await? {
                return Ok((cart, true));
            }
            // Lost the insert race; the winner's row is visible on the
            // next lookup.
            tracing::debug!(identity, "active-cart insert conflicted, retrying lookup");
        }
        anyhow::bail!("could not create or resume a cart for identity {identity}")
    }

    async fn insert_cart(&self, identity: Option<&str>) -> anyhow::Result<Option<Cart>> {
        let id = Uuid::new_v4().to_string();
        let row = sqlx::query(
            "INSERT INTO carts (id, identity, status) VALUES ($1, $2, 'active')
             ON CONFLICT (identity) WHERE status = 'active' AND identity IS NOT NULL
             DO NOTHING
             RETURNING id, identity, status, created_at",
        )
        .bind(&id)
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| cart_from_row(&r)).transpose()
    }

    /// Marks the cart closed and returns the item rows as of the close, in
    /// one transaction. The UPDATE takes the cart row lock that every item
    /// write holds for its whole transaction, so an in-flight write either
    /// commits before this snapshot or observes the closed status and
    /// refuses. Idempotent: closing an already-closed cart re-snapshots it.
    pub async fn close_cart(&self, cart_id: &str) -> anyhow::Result<Vec<CartLine>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE carts SET status = 'closed' WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        let lines = fetch_items(&mut tx, cart_id).await?;
        tx.commit().await?;
        Ok(lines)
    }

    /// Item rows joined with their products, ordered by product id. An
    /// unknown cart id yields an empty vec, never an error.
    pub async fn get_items(&self, cart_id: &str) -> anyhow::Result<Vec<CartLine>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items(&mut conn, cart_id).await
    }

    /// Adds `delta` to the stored quantity, inserting the row if absent.
    /// A resulting quantity <= 0 deletes the row in the same transaction,
    /// so non-positive quantities are never observable. The applied
    /// quantity comes back in `Applied` (<= 0 means the row is gone).
    pub async fn upsert_increment(
        &self,
        cart_id: &str,
        product_id: i32,
        delta: i32,
    ) -> anyhow::Result<GatedWrite<i32>> {
        let mut tx = self.pool.begin().await?;
        match lock_cart_status(&mut tx, cart_id).await? {
            None => return Ok(GatedWrite::UnknownCart),
            Some(CartStatus::Closed) => return Ok(GatedWrite::CartClosed),
            Some(CartStatus::Active) => {}
        }

        let row = sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
             ON CONFLICT (cart_id, product_id)
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
             RETURNING quantity",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await?;
        let quantity: i32 = row.try_get("quantity")?;

        if quantity <= 0 {
            sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
                .bind(cart_id)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(GatedWrite::Applied(quantity))
    }

    /// Sets the exact stored quantity. `quantity <= 0` deletes the row
    /// (no-op if absent); otherwise the row is inserted or overwritten in
    /// one statement.
    pub async fn set_exact_quantity(
        &self,
        cart_id: &str,
        product_id: i32,
        quantity: i32,
    ) -> anyhow::Result<GatedWrite<SetOutcome>> {
        let mut tx = self.pool.begin().await?;
        match lock_cart_status(&mut tx, cart_id).await? {
            None => return Ok(GatedWrite::UnknownCart),
            Some(CartStatus::Closed) => return Ok(GatedWrite::CartClosed),
            Some(CartStatus::Active) => {}
        }

        if quantity <= 0 {
            sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
                .bind(cart_id)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(GatedWrite::Applied(SetOutcome::Deleted));
        }

        // xmax = 0 distinguishes a fresh insert from an overwrite.
        let row = sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
             ON CONFLICT (cart_id, product_id)
             DO UPDATE SET quantity = EXCLUDED.quantity
             RETURNING quantity, (xmax = 0) AS inserted",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        let applied: i32 = row.try_get("quantity")?;
        let inserted: bool = row.try_get("inserted")?;
        tx.commit().await?;
        Ok(GatedWrite::Applied(if inserted {
            SetOutcome::Created(applied)
        } else {
            SetOutcome::Updated(applied)
        }))
    }

    /// Unconditional delete attempt. Returns whether a row was actually
    /// removed, so a second call reports false without error.
    pub async fn remove_item(&self, cart_id: &str, product_id: i32) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Locks the cart row for the rest of the transaction and returns its
/// status, or None for an unknown cart. Item writes and close serialize
/// on this lock.
async fn lock_cart_status(
    conn: &mut PgConnection,
    cart_id: &str,
) -> anyhow::Result<Option<CartStatus>> {
    let row = sqlx::query("SELECT status FROM carts WHERE id = $1 FOR UPDATE")
        .bind(cart_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(|r| {
        let raw: String = r.try_get("status")?;
        CartStatus::parse(&raw)
            .ok_or_else(|| anyhow::anyhow!("unknown cart status '{raw}' in storage"))
    })
    .transpose()
}

async fn fetch_items(conn: &mut PgConnection, cart_id: &str) -> anyhow::Result<Vec<CartLine>> {
    let rows = sqlx::query(
        "SELECT p.id AS product_id, p.name, p.price, ci.quantity
         FROM cart_items ci
         JOIN products p ON ci.product_id = p.id
         WHERE ci.cart_id = $1
         ORDER BY p.id",
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        lines.push(CartLine::new(
            row.try_get("product_id")?,
            row.try_get("name")?,
            row.try_get("price")?,
            row.try_get("quantity")?,
        ));
    }
    Ok(lines)
}

fn cart_from_row(row: &sqlx::postgres::PgRow) -> anyhow::Result<Cart> {
    let status_raw: String = row.try_get("status")?;
    let status = CartStatus::parse(&status_raw)
        .ok_or_else(|| anyhow::anyhow!("unknown cart status '{status_raw}' in storage"))?;
    Ok(Cart {
        id: row.try_get("id")?,
        identity: row.try_get("identity")?,
        status,
        created_at: row.try_get("created_at")?,
    })
}
