//! HTTP request handlers.
//!
//! Each handler deserializes the request, calls the [`crate::services`] layer and
//! serializes the response. Failures are returned as [`crate::errors::Error`], which
//! converts to the matching HTTP status code.
//!
//! - [`segments`]: Segment CRUD and subscription title resolution

pub mod segments;
