//! Service layer between HTTP handlers and repositories.
//!
//! Services own the shared pool, acquire a connection per call, and log the
//! outcome of each operation.
//!
//! - [`segments`]: [`SegmentService`](segments::SegmentService)

pub mod segments;

pub use segments::SegmentService;
