pub mod router;
pub mod types;
pub mod handlers {
    pub mod admin_catalog;
    pub mod auth;
    pub mod catalog;
    pub mod common;
    pub mod health;
    pub mod reviews;
    pub mod suggestions;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
