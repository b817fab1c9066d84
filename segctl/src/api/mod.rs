//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Segments** (`/api/v1/segments/*`): Segment CRUD and title resolution
//! - **Health** (`/healthz`): Liveness check
//!
//! The OpenAPI document is served at `/api-docs/openapi.json`.

pub mod handlers;
pub mod models;
