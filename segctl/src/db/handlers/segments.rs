//! Database repository for segments.
//!
//! Segments are never physically removed: deleting one sets `delete_at`, and every read
//! (`get_by_id`, `list`, `resolve_ids_by_titles`) only sees rows where `delete_at IS NULL`.

use crate::db::{
    errors::{DbError, Result, SqlxResultExt, TxStage},
    handlers::repository::Repository,
    models::segments::{SegmentCreateDBRequest, SegmentDBResponse, SegmentUpdateDBRequest},
};
use crate::types::{SegmentId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, PgConnection, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const INSERT_SEGMENT: &str = r#"
    INSERT INTO segments (id, title, description, auto_user_prc)
    VALUES ($1, $2, $3, $4)
    RETURNING id, title, description, auto_user_prc, create_at, update_at, delete_at
"#;

const SELECT_LIVE_SEGMENT: &str = r#"
    SELECT id, title, description, auto_user_prc, create_at, update_at, delete_at
    FROM segments
    WHERE id = $1 AND delete_at IS NULL
"#;

// Base of the list statement; filters are appended with bound parameters.
const SELECT_LIVE_SEGMENTS: &str = r#"
    SELECT id, title, description, auto_user_prc, create_at, update_at, delete_at
    FROM segments
    WHERE delete_at IS NULL
"#;

const SOFT_DELETE_SEGMENT: &str = r#"
    UPDATE segments SET delete_at = NOW()
    WHERE id = $1 AND delete_at IS NULL
"#;

const SEGMENT_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM segments WHERE id = $1)";

const UPDATE_LIVE_SEGMENT: &str = r#"
    UPDATE segments SET
        title = $2,
        description = $3,
        auto_user_prc = $4,
        update_at = NOW()
    WHERE id = $1 AND delete_at IS NULL
    RETURNING id, title, description, auto_user_prc, create_at, update_at, delete_at
"#;

const SELECT_IDS_BY_TITLES: &str = r#"
    SELECT id FROM segments
    WHERE title = ANY($1) AND delete_at IS NULL
    ORDER BY title
"#;

/// Filter for listing segments
#[derive(Debug, Clone, Default)]
pub struct SegmentFilter {
    pub skip: i64,
    /// `None` returns every remaining row
    pub limit: Option<i64>,
    /// Case-insensitive substring match on the title
    pub search: Option<String>,
}

impl SegmentFilter {
    pub fn new(skip: i64, limit: Option<i64>) -> Self {
        Self { skip, limit, search: None }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

// Database entity model; column names follow the table, not the API
#[derive(Debug, Clone, FromRow)]
struct Segment {
    pub id: SegmentId,
    pub title: String,
    pub description: String,
    pub auto_user_prc: i16,
    pub create_at: DateTime<Utc>,
    pub update_at: DateTime<Utc>,
    pub delete_at: Option<DateTime<Utc>>,
}

impl From<Segment> for SegmentDBResponse {
    fn from(segment: Segment) -> Self {
        Self {
            id: segment.id,
            title: segment.title,
            description: segment.description,
            auto_user_pct: segment.auto_user_prc,
            created_at: segment.create_at,
            updated_at: segment.update_at,
            deleted_at: segment.delete_at,
        }
    }
}

/// Escape LIKE wildcards so user input only ever matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub struct Segments<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Segments<'c> {
    type CreateRequest = SegmentCreateDBRequest;
    type UpdateRequest = SegmentUpdateDBRequest;
    type Response = SegmentDBResponse;
    type Id = SegmentId;
    type Filter = SegmentFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        request.validate()?;

        // Always generate a new ID for segments
        let segment_id = Uuid::new_v4();

        let segment = sqlx::query_as::<_, Segment>(INSERT_SEGMENT)
            .bind(segment_id)
            .bind(&request.title)
            .bind(&request.description)
            .bind(request.auto_user_pct)
            .fetch_one(&mut *self.db)
            .await
            .during("create segment")?;

        Ok(segment.into())
    }

    #[instrument(skip(self), fields(segment_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Self::Response> {
        let segment = sqlx::query_as::<_, Segment>(SELECT_LIVE_SEGMENT)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await
            .during("get segment")?
            .ok_or(DbError::NotFound)?;

        Ok(segment.into())
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new(SELECT_LIVE_SEGMENTS);

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query
                .push(" AND title ILIKE ")
                .push_bind(format!("%{}%", escape_like(search)))
                .push(" ESCAPE '\\'");
        }

        query.push(" ORDER BY create_at ASC, id ASC");

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit);
        }
        if filter.skip > 0 {
            query.push(" OFFSET ").push_bind(filter.skip);
        }

        let segments = query
            .build_query_as::<Segment>()
            .fetch_all(&mut *self.db)
            .await
            .during("list segments")?;

        Ok(segments.into_iter().map(SegmentDBResponse::from).collect())
    }

    #[instrument(skip(self), fields(segment_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        let result = sqlx::query(SOFT_DELETE_SEGMENT)
            .bind(id)
            .execute(&mut *self.db)
            .await
            .during("delete segment")?;

        // Nothing affected means the segment is missing or was already deleted
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(segment_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        request.validate()?;

        // The existence check and the write must see the same snapshot, so regardless of the
        // connection passed in, this runs in its own transaction.
        let mut tx = self.db.begin().await.map_err(|e| DbError::transaction(TxStage::Begin, e))?;

        match Self::update_in_tx(&mut tx, id, request).await {
            Ok(segment) => {
                tx.commit().await.map_err(|e| DbError::transaction(TxStage::Commit, e))?;
                Ok(segment)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(segment_id = %abbrev_uuid(&id), "Failed to roll back segment update: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

impl<'c> Segments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    async fn update_in_tx(conn: &mut PgConnection, id: SegmentId, request: &SegmentUpdateDBRequest) -> Result<SegmentDBResponse> {
        let exists: bool = sqlx::query_scalar(SEGMENT_EXISTS)
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .during("check segment existence")?;

        if !exists {
            return Err(DbError::NotFound);
        }

        // A soft-deleted row passes the existence check but is not updatable
        let segment = sqlx::query_as::<_, Segment>(UPDATE_LIVE_SEGMENT)
            .bind(id)
            .bind(&request.title)
            .bind(&request.description)
            .bind(request.auto_user_pct)
            .fetch_optional(&mut *conn)
            .await
            .during("update segment")?
            .ok_or(DbError::NotFound)?;

        Ok(segment.into())
    }

    /// Translate segment titles into the ids of live segments carrying them.
    ///
    /// Titles with no live segment are left out, so the result may be shorter than the input.
    /// Pass a transaction's connection to resolve within the same snapshot as a subsequent write.
    #[instrument(skip(self, titles), fields(count = titles.len()), err)]
    pub async fn resolve_ids_by_titles(&mut self, titles: &[String]) -> Result<Vec<SegmentId>> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let ids = sqlx::query_scalar::<_, Uuid>(SELECT_IDS_BY_TITLES)
            .bind(titles)
            .fetch_all(&mut *self.db)
            .await
            .during("resolve segment titles")?;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn new_segment(title: &str, auto_user_pct: i16) -> SegmentCreateDBRequest {
        SegmentCreateDBRequest {
            title: title.to_string(),
            description: format!("{title} description"),
            auto_user_pct,
        }
    }

    async fn count_rows(pool: &PgPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM segments").fetch_one(pool).await.unwrap()
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("AVITO_10%"), "AVITO\\_10\\%");
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_segment(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let created = repo.create(&new_segment("AVITO_VOICE_MESSAGES", 50)).await.unwrap();
        assert_eq!(created.title, "AVITO_VOICE_MESSAGES");
        assert_eq!(created.description, "AVITO_VOICE_MESSAGES description");
        assert_eq!(created.auto_user_pct, 50);
        assert!(created.deleted_at.is_none());

        let fetched = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_with_invalid_percentage_touches_nothing(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let err = repo.create(&new_segment("AVITO_DISCOUNT_30", 101)).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let err = repo.create(&new_segment("", 10)).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        drop(repo);
        drop(conn);
        assert_eq!(count_rows(&pool).await, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_unknown_segment_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_is_soft_and_hides_segment(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let created = repo.create(&new_segment("A", 50)).await.unwrap();
        repo.delete(created.id).await.unwrap();

        assert!(matches!(repo.get_by_id(created.id).await, Err(DbError::NotFound)));
        let listed = repo.list(&SegmentFilter::default()).await.unwrap();
        assert!(listed.iter().all(|s| s.id != created.id));

        // Row is still present, only marked
        drop(repo);
        let delete_at: Option<DateTime<Utc>> = sqlx::query_scalar("SELECT delete_at FROM segments WHERE id = $1")
            .bind(created.id)
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert!(delete_at.is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_twice_or_unknown_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let created = repo.create(&new_segment("A", 10)).await.unwrap();
        repo.delete(created.id).await.unwrap();

        assert!(matches!(repo.delete(created.id).await, Err(DbError::NotFound)));
        assert!(matches!(repo.delete(Uuid::new_v4()).await, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_empty_is_ok(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let segments = repo.list(&SegmentFilter::default()).await.unwrap();
        assert!(segments.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_excludes_deleted_and_keeps_creation_order(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let first = repo.create(&new_segment("FIRST", 10)).await.unwrap();
        let second = repo.create(&new_segment("SECOND", 20)).await.unwrap();
        let third = repo.create(&new_segment("THIRD", 30)).await.unwrap();
        repo.delete(second.id).await.unwrap();

        let segments = repo.list(&SegmentFilter::default()).await.unwrap();
        let ids: Vec<_> = segments.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first.id, third.id]);
        assert!(segments.iter().all(|s| s.deleted_at.is_none()));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_keeps_creation_order_within_one_transaction(pool: PgPool) {
        let mut tx = pool.begin().await.unwrap();
        let mut repo = Segments::new(&mut tx);

        let mut created = Vec::new();
        for title in ["ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX"] {
            created.push(repo.create(&new_segment(title, 10)).await.unwrap().id);
        }
        tx.commit().await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let listed = Segments::new(&mut conn).list(&SegmentFilter::default()).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|s| s.id).collect();
        assert_eq!(ids, created);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_pagination_and_search(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        for i in 0..5 {
            repo.create(&new_segment(&format!("AVITO_DISCOUNT_{i}"), 10)).await.unwrap();
        }
        repo.create(&new_segment("AVITO_VOICE_MESSAGES", 10)).await.unwrap();
        repo.create(&new_segment("AVITO_100%_OFF", 10)).await.unwrap();

        let page = repo.list(&SegmentFilter::new(2, Some(2))).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "AVITO_DISCOUNT_2");
        assert_eq!(page[1].title, "AVITO_DISCOUNT_3");

        let beyond = repo.list(&SegmentFilter::new(100, Some(10))).await.unwrap();
        assert!(beyond.is_empty());

        let discounts = repo.list(&SegmentFilter::default().with_search("discount")).await.unwrap();
        assert_eq!(discounts.len(), 5);

        // Wildcards in the search term match literally
        let percent = repo.list(&SegmentFilter::default().with_search("100%")).await.unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].title, "AVITO_100%_OFF");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_changes_only_mutable_fields(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let created = repo.create(&new_segment("AVITO_DISCOUNT_30", 30)).await.unwrap();

        let update = SegmentUpdateDBRequest {
            title: "AVITO_DISCOUNT_50".to_string(),
            description: "fifty percent off".to_string(),
            auto_user_pct: 50,
        };
        let updated = repo.update(created.id, &update).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.title, "AVITO_DISCOUNT_50");
        assert_eq!(updated.description, "fifty percent off");
        assert_eq!(updated.auto_user_pct, 50);
        assert!(updated.updated_at >= created.updated_at);

        let fetched = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_unknown_segment_changes_nothing(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let existing = repo.create(&new_segment("KEEP", 10)).await.unwrap();

        let update = SegmentUpdateDBRequest {
            title: "KEEP".to_string(),
            description: "changed".to_string(),
            auto_user_pct: 99,
        };
        let err = repo.update(Uuid::new_v4(), &update).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));

        let untouched = repo.get_by_id(existing.id).await.unwrap();
        assert_eq!(untouched, existing);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_deleted_segment_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let created = repo.create(&new_segment("GONE", 10)).await.unwrap();
        repo.delete(created.id).await.unwrap();

        let update = SegmentUpdateDBRequest {
            title: "BACK".to_string(),
            description: String::new(),
            auto_user_pct: 10,
        };
        assert!(matches!(repo.update(created.id, &update).await, Err(DbError::NotFound)));

        drop(repo);
        let title: String = sqlx::query_scalar("SELECT title FROM segments WHERE id = $1")
            .bind(created.id)
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(title, "GONE");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_with_invalid_percentage_is_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let created = repo.create(&new_segment("A", 10)).await.unwrap();
        let update = SegmentUpdateDBRequest {
            title: "A".to_string(),
            description: String::new(),
            auto_user_pct: 101,
        };
        assert!(matches!(repo.update(created.id, &update).await, Err(DbError::Validation(_))));
        assert_eq!(repo.get_by_id(created.id).await.unwrap().auto_user_pct, 10);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_active_title_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let original = repo.create(&new_segment("DUP", 10)).await.unwrap();
        let err = repo.create(&new_segment("DUP", 20)).await.unwrap_err();
        match err {
            DbError::UniqueViolation { constraint, .. } => {
                assert_eq!(constraint.as_deref(), Some("segments_title_active_unique"));
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }

        // Title is free again once the holder is deleted
        repo.delete(original.id).await.unwrap();
        let reused = repo.create(&new_segment("DUP", 20)).await.unwrap();
        assert_ne!(reused.id, original.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_resolve_ids_by_titles(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let a = repo.create(&new_segment("A", 10)).await.unwrap();
        let b = repo.create(&new_segment("B", 10)).await.unwrap();
        let c = repo.create(&new_segment("C", 10)).await.unwrap();
        repo.delete(c.id).await.unwrap();

        let titles = vec!["B".to_string(), "A".to_string(), "C".to_string(), "MISSING".to_string()];
        let ids = repo.resolve_ids_by_titles(&titles).await.unwrap();
        assert_eq!(ids, vec![a.id, b.id]);

        assert!(repo.resolve_ids_by_titles(&[]).await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_resolve_ids_inside_transaction_sees_uncommitted_rows(pool: PgPool) {
        let mut tx = pool.begin().await.unwrap();
        let mut repo = Segments::new(&mut tx);

        let created = repo.create(&new_segment("PENDING", 10)).await.unwrap();
        let ids = repo.resolve_ids_by_titles(&["PENDING".to_string()]).await.unwrap();
        assert_eq!(ids, vec![created.id]);

        tx.rollback().await.unwrap();
        assert_eq!(count_rows(&pool).await, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_delete_get_list_roundtrip(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Segments::new(&mut conn);

        let created = repo.create(&new_segment("A", 50)).await.unwrap();
        repo.delete(created.id).await.unwrap();
        assert!(matches!(repo.get_by_id(created.id).await, Err(DbError::NotFound)));
        let listed = repo.list(&SegmentFilter::default()).await.unwrap();
        assert!(!listed.iter().any(|s| s.id == created.id));
    }
}
