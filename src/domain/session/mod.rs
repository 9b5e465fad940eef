pub mod session_manager;

pub use session_manager::{Role, SessionContext, SessionManager, SessionToken};
