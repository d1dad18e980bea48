pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::cart_service::{CartError, CartService};
pub use domain::cart::{Cart, CartLine, CartStatus, CartSummary};
pub use domain::matching::{match_expected_name, NameMatch, NameMismatch};
pub use domain::product::{Product, ProductHit};
pub use storage::{init_schema, CartStore, CatalogStore};
