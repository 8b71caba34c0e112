// Errors layer - Error type definitions
pub mod api;
pub mod core;
pub mod internal;

// Re-exports for convenience
pub use api::ApiError;
pub use core::CoreError;
pub use internal::InternalError;
