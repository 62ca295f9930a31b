//! API Module
//!
//! Frontend HTTP API over a single group.
//!
//! # Endpoints
//! - `GET /api?key=K` - Value bytes for a key
//! - `GET /api/stats` - Group statistics
//! - `GET /api/healthz` - Health check
//! - `GET /api/batch?keys=a,b` - Several keys at once
//! - `DELETE /api/delete?key=K` - Evict a key locally

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
