// Database entities - SeaORM models
pub mod role;
pub mod session;
pub mod user;
