//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `GET /cache/get?key=` - Retrieve a value by key
//! - `PUT|POST /cache/set?key=&value=` - Store a key-value pair
//! - `DELETE /cache/invalidate?key=` or `?value=` - Schedule an invalidation
//! - `GET /stats` - Per-shard and total statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
