//! Read-only catalog access.

use crate::domain::product::{Product, ProductHit};
use sqlx::{PgPool, Row};

/// Resolves product ids to canonical rows and serves the compact search
/// listing. No caching layer: catalog size and call volume are both small
/// relative to network latency, so every call is a fresh read.
#[derive(Clone)]
pub struct CatalogStore {
    pool: PgPool,
}

impl CatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i32) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, description, price, stock, category, size, color
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        Ok(Some(Product {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
            category: row.try_get("category")?,
            size: row.try_get("size")?,
            color: row.try_get("color")?,
        }))
    }

    /// Name/category search with a compact `{id, name, price}` projection.
    /// No term returns the first `limit` products.
    pub async fn search(&self, term: Option<&str>, limit: i64) -> anyhow::Result<Vec<ProductHit>> {
        let rows = match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(term) => {
                let pattern = format!("%{}%", term);
                sqlx::query(
                    "SELECT id, name, price FROM products
                     WHERE name ILIKE $1 OR category ILIKE $1
                     ORDER BY id LIMIT $2",
                )
                .bind(pattern)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT id, name, price FROM products ORDER BY id LIMIT $1")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            hits.push(ProductHit {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                price: row.try_get("price")?,
            });
        }
        Ok(hits)
    }
}
