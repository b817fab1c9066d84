//! Database layer for segment persistence.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern to keep SQL out of the service and API layers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Services   │  (services - pool handling & logging)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - statements & row mapping)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - records & validation)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations
//! - [`models`]: Database records and request validation
//! - [`errors`]: Database-specific error types
//!
//! # Connections and Transactions
//!
//! Repositories borrow a `&mut PgConnection`, so they work equally on a pooled
//! connection or inside a caller's transaction:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut segments = Segments::new(&mut tx);
//! let ids = segments.resolve_ids_by_titles(&titles).await?;
//! // ... insert rows referencing `ids` ...
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are exposed through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
