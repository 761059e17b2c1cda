//! API Module
//!
//! HTTP transport for the cache service.
//!
//! # Endpoints
//! - `POST /rpc` - JSON-RPC lookup (`CacheSrv.Get`)
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
