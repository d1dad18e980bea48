pub mod cart_service;

pub use cart_service::{AddReceipt, CartError, CartService, ClosedCart, SetReceipt};
