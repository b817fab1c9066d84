//! Database record models.
//!
//! These structs are what repositories accept and return. They are kept
//! separate from the API models in [`crate::api::models`] so the storage and
//! wire representations can evolve independently; conversions go through
//! `From` impls in both directions.
//!
//! - [`segments`]: segment create/update requests (with validation) and rows
//! - [`subscriptions`]: a user's set of segment titles, prior to resolution

pub mod segments;
pub mod subscriptions;
