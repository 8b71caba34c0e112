// Internal types - not exposed through the API surface
pub mod auth;
pub mod role;

pub use auth::{Claims, TokenUser};
pub use role::Role;
