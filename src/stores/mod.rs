// Stores layer - Data access and repository pattern
pub mod session_store;
pub mod user_store;

pub use session_store::SessionStore;
pub use user_store::UserStore;
