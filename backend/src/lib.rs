//! Species recognition backend service

/// External species classifier adapter
pub mod classifier;

/// Request middleware
pub mod middleware;

/// S3 object storage and scoped credential issuance
pub mod object_store;

/// Recognition pipeline and history service
pub mod recognition;

/// Handler routes
pub mod routes;

/// HTTP server setup
pub mod server;

/// Shared types: environment and error handling
pub mod types;
