use poem_openapi::Object;

/// Response model for health check endpoint
#[derive(Object, Debug)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,

    /// Timestamp of the health check (ISO 8601 format)
    pub timestamp: String,
}

/// Envelope for endpoints that return only an outcome message
#[derive(Object, Debug)]
pub struct MessageBody {
    /// Whether the operation succeeded
    pub success: bool,

    /// Human-readable outcome message
    pub message: String,
}
