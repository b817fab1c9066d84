//! API request and response data models.
//!
//! API models are distinct from database models, so the wire format and the
//! table layout can evolve independently. All models are annotated with
//! `utoipa` for the generated OpenAPI document.
//!
//! - [`segments`]: Segment payloads and subscription resolution
//! - [`pagination`]: Shared `skip`/`limit` query parameters

pub mod pagination;
pub mod segments;
