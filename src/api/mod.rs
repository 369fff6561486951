//! API Module
//!
//! HTTP handlers and routing for the counter cache REST API.
//!
//! # Endpoints
//! - `GET /counts/:id` - Read one counter (0 when unavailable)
//! - `POST /counts` - Read many counters, partial result
//! - `DELETE /counts` - Drop every cached counter
//! - `GET /stats` - Cache and fetch statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
