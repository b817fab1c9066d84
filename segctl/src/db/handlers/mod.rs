//! Repository implementations for database access.
//!
//! # Available Repositories
//!
//! - [`Segments`]: Segment CRUD with soft delete and title resolution
//!
//! All repositories implement the [`Repository`] trait and wrap a borrowed
//! connection; they never commit a caller's transaction.

pub mod repository;
pub mod segments;

pub use repository::Repository;
pub use segments::{SegmentFilter, Segments};
