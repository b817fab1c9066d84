//! Segment service.
//!
//! Created once at startup and shared through [`crate::AppState`]. Each call
//! acquires its own connection from the pool, so concurrent requests never share
//! a connection.

use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::db::{
    errors::{DbError, Result, SqlxResultExt, TxStage},
    handlers::{Repository, SegmentFilter, Segments},
    models::{
        segments::{SegmentCreateDBRequest, SegmentDBResponse, SegmentUpdateDBRequest},
        subscriptions::Subscription,
    },
};
use crate::types::{SegmentId, abbrev_uuid};

#[derive(Clone, Debug)]
pub struct SegmentService {
    pool: PgPool,
}

impl SegmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &SegmentCreateDBRequest) -> Result<SegmentDBResponse> {
        let mut conn = self.pool.acquire().await.during("acquire connection")?;
        let result = Segments::new(&mut conn).create(request).await;

        match &result {
            Ok(segment) => info!(segment_id = %abbrev_uuid(&segment.id), title = %segment.title, "Created segment"),
            Err(e) => warn!(title = %request.title, "Failed to create segment: {}", e),
        }
        result
    }

    pub async fn get(&self, id: SegmentId) -> Result<SegmentDBResponse> {
        let mut conn = self.pool.acquire().await.during("acquire connection")?;
        let result = Segments::new(&mut conn).get_by_id(id).await;

        match &result {
            Ok(_) => debug!(segment_id = %abbrev_uuid(&id), "Fetched segment"),
            Err(DbError::NotFound) => debug!(segment_id = %abbrev_uuid(&id), "Segment not found"),
            Err(e) => warn!(segment_id = %abbrev_uuid(&id), "Failed to fetch segment: {}", e),
        }
        result
    }

    pub async fn list(&self, filter: &SegmentFilter) -> Result<Vec<SegmentDBResponse>> {
        let mut conn = self.pool.acquire().await.during("acquire connection")?;
        let result = Segments::new(&mut conn).list(filter).await;

        match &result {
            Ok(segments) => debug!(count = segments.len(), "Listed segments"),
            Err(e) => warn!("Failed to list segments: {}", e),
        }
        result
    }

    pub async fn update(&self, id: SegmentId, request: &SegmentUpdateDBRequest) -> Result<SegmentDBResponse> {
        let mut conn = self.pool.acquire().await.during("acquire connection")?;
        let result = Segments::new(&mut conn).update(id, request).await;

        match &result {
            Ok(_) => info!(segment_id = %abbrev_uuid(&id), "Updated segment"),
            Err(e) => warn!(segment_id = %abbrev_uuid(&id), "Failed to update segment: {}", e),
        }
        result
    }

    pub async fn delete(&self, id: SegmentId) -> Result<()> {
        let mut conn = self.pool.acquire().await.during("acquire connection")?;
        let result = Segments::new(&mut conn).delete(id).await;

        match &result {
            Ok(()) => info!(segment_id = %abbrev_uuid(&id), "Deleted segment"),
            Err(e) => warn!(segment_id = %abbrev_uuid(&id), "Failed to delete segment: {}", e),
        }
        result
    }

    /// Validate a subscription and resolve its titles to live segment ids.
    ///
    /// Resolution runs inside a transaction, which is where rows referencing the
    /// returned ids would be written.
    pub async fn resolve_subscription(&self, subscription: &Subscription) -> Result<Vec<SegmentId>> {
        subscription.validate()?;

        let mut tx = self.pool.begin().await.map_err(|e| DbError::transaction(TxStage::Begin, e))?;

        let titles = subscription.titles();
        let ids = Segments::new(&mut tx).resolve_ids_by_titles(&titles).await?;

        tx.commit().await.map_err(|e| DbError::transaction(TxStage::Commit, e))?;

        if ids.len() < titles.len() {
            debug!(
                user_id = %abbrev_uuid(&subscription.user_id),
                requested = titles.len(),
                resolved = ids.len(),
                "Some segment titles did not resolve"
            );
        }
        Ok(ids)
    }
}
