//! Postgres-backed stores.

use sqlx::PgPool;

pub mod cart_store;
pub mod catalog;

pub use cart_store::{CartStore, GatedWrite, SetOutcome};
pub use catalog::CatalogStore;

/// Creates the tables this service owns (idempotent).
///
/// The partial unique index on `carts` is what makes the one-active-cart-
/// per-identity invariant hold under concurrent create requests; the
/// application relies on `ON CONFLICT` against it rather than a
/// lookup-before-insert.
pub async fn init_schema(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            price DOUBLE PRECISION NOT NULL DEFAULT 0,
            stock INTEGER NOT NULL DEFAULT 0,
            category TEXT,
            size TEXT,
            color TEXT
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS carts (
            id TEXT PRIMARY KEY,
            identity TEXT,
            status TEXT NOT NULL DEFAULT 'active',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS carts_one_active_per_identity
            ON carts (identity) WHERE status = 'active' AND identity IS NOT NULL",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS cart_items (
            cart_id TEXT NOT NULL REFERENCES carts(id) ON DELETE CASCADE,
            product_id INTEGER NOT NULL REFERENCES products(id),
            quantity INTEGER NOT NULL,
            PRIMARY KEY (cart_id, product_id)
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}
