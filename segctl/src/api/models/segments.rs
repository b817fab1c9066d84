//! API request/response models for segments.

use super::pagination::Pagination;
use crate::db::models::segments::SegmentDBResponse;
use crate::types::{SegmentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing segments
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListSegmentsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Search query to filter segments by title (case-insensitive substring match)
    pub search: Option<String>,
}

/// Request body for creating a new segment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SegmentCreate {
    /// Segment title (unique among live segments)
    #[schema(example = "AVITO_VOICE_MESSAGES")]
    pub title: String,
    /// Free-form description
    #[serde(default)]
    #[schema(example = "Users with voice messages enabled")]
    pub description: String,
    /// Share of users automatically added to the segment, 0 to 100
    #[schema(example = 50, minimum = 0, maximum = 100)]
    pub auto_user_pct: i16,
}

/// Request body for updating a segment. All mutable fields are replaced.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SegmentUpdate {
    #[schema(example = "AVITO_VOICE_MESSAGES")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[schema(example = 30, minimum = 0, maximum = 100)]
    pub auto_user_pct: i16,
}

/// Segment details returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SegmentResponse {
    /// Unique identifier for the segment
    #[schema(value_type = String, format = "uuid")]
    pub id: SegmentId,
    pub title: String,
    pub description: String,
    pub auto_user_pct: i16,
    /// When the segment was created
    pub created_at: DateTime<Utc>,
    /// When the segment was last modified
    pub updated_at: DateTime<Utc>,
    /// Soft delete marker; always null for segments returned by reads
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<SegmentDBResponse> for SegmentResponse {
    fn from(db: SegmentDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            auto_user_pct: db.auto_user_pct,
            created_at: db.created_at,
            updated_at: db.updated_at,
            deleted_at: db.deleted_at,
        }
    }
}

/// Request body for resolving a user's segment titles into ids.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionRequest {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    /// Segment titles; duplicates are collapsed
    #[schema(example = json!(["AVITO_VOICE_MESSAGES", "AVITO_DISCOUNT_30"]))]
    pub segment_titles: Vec<String>,
}

/// Ids of the live segments matching a subscription's titles.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResolvedSegments {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    /// One id per matching title, ordered by title; unknown titles are omitted
    #[schema(value_type = Vec<String>)]
    pub segment_ids: Vec<SegmentId>,
}
