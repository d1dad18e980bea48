pub mod error;
pub mod router;
pub mod types;
pub mod handlers {
    pub mod cart;
    pub mod catalog;
    pub mod health;
    pub mod items;
    pub mod manifest;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
