//! Database models for segments.

use crate::api::models::segments::{SegmentCreate, SegmentUpdate};
use crate::db::errors::ValidationError;
use crate::types::SegmentId;
use chrono::{DateTime, Utc};

/// Inclusive bounds for the share of users automatically added to a segment
pub const AUTO_USER_PCT_RANGE: std::ops::RangeInclusive<i16> = 0..=100;

fn validate_segment_fields(title: &str, auto_user_pct: i16) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if !AUTO_USER_PCT_RANGE.contains(&auto_user_pct) {
        return Err(ValidationError::PercentageOutOfRange(auto_user_pct));
    }
    Ok(())
}

/// Database request for creating a new segment
#[derive(Debug, Clone)]
pub struct SegmentCreateDBRequest {
    pub title: String,
    pub description: String,
    pub auto_user_pct: i16,
}

impl SegmentCreateDBRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_segment_fields(&self.title, self.auto_user_pct)
    }
}

impl From<SegmentCreate> for SegmentCreateDBRequest {
    fn from(api: SegmentCreate) -> Self {
        Self {
            title: api.title.trim().to_string(),
            description: api.description,
            auto_user_pct: api.auto_user_pct,
        }
    }
}

/// Database request for updating a segment. All mutable fields are replaced.
#[derive(Debug, Clone)]
pub struct SegmentUpdateDBRequest {
    pub title: String,
    pub description: String,
    pub auto_user_pct: i16,
}

impl SegmentUpdateDBRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_segment_fields(&self.title, self.auto_user_pct)
    }
}

impl From<SegmentUpdate> for SegmentUpdateDBRequest {
    fn from(api: SegmentUpdate) -> Self {
        Self {
            title: api.title.trim().to_string(),
            description: api.description,
            auto_user_pct: api.auto_user_pct,
        }
    }
}

/// Database response for a segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDBResponse {
    pub id: SegmentId,
    pub title: String,
    pub description: String,
    pub auto_user_pct: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
