//! Domain types and pure logic for the cart engine.

pub mod cart;
pub mod matching;
pub mod product;

pub use cart::{Cart, CartLine, CartStatus, CartSummary};
pub use matching::{match_expected_name, NameMatch, NameMismatch};
pub use product::{Product, ProductHit};
