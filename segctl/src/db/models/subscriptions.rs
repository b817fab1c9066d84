//! Database models for subscriptions.
//!
//! A subscription ties a user to segments by title. Titles are translated to
//! segment ids (see [`crate::db::handlers::Segments::resolve_ids_by_titles`])
//! before any foreign key is written.

use crate::api::models::segments::SubscriptionRequest;
use crate::db::errors::ValidationError;
use crate::types::UserId;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub user_id: UserId,
    pub segment_titles: BTreeSet<String>,
}

impl Subscription {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.is_nil() {
            return Err(ValidationError::NilUserId);
        }
        if self.segment_titles.is_empty() {
            return Err(ValidationError::NoSegmentTitles);
        }
        if self.segment_titles.iter().any(|t| t.is_empty()) {
            return Err(ValidationError::EmptySegmentTitle);
        }
        Ok(())
    }

    pub fn titles(&self) -> Vec<String> {
        self.segment_titles.iter().cloned().collect()
    }
}

impl From<SubscriptionRequest> for Subscription {
    fn from(api: SubscriptionRequest) -> Self {
        Self {
            user_id: api.user_id,
            segment_titles: api.segment_titles.into_iter().map(|t| t.trim().to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_duplicate_titles_collapse() {
        let sub: Subscription = SubscriptionRequest {
            user_id: Uuid::new_v4(),
            segment_titles: vec!["A".to_string(), " A ".to_string(), "B".to_string()],
        }
        .into();
        assert_eq!(sub.titles(), vec!["A".to_string(), "B".to_string()]);
        assert!(sub.validate().is_ok());
    }

    #[test]
    fn test_nil_user_is_rejected() {
        let sub = Subscription {
            user_id: Uuid::nil(),
            segment_titles: BTreeSet::from(["A".to_string()]),
        };
        assert_eq!(sub.validate(), Err(ValidationError::NilUserId));
    }

    #[test]
    fn test_empty_title_set_is_rejected() {
        let sub = Subscription {
            user_id: Uuid::new_v4(),
            segment_titles: BTreeSet::new(),
        };
        assert_eq!(sub.validate(), Err(ValidationError::NoSegmentTitles));

        let sub = Subscription {
            user_id: Uuid::new_v4(),
            segment_titles: BTreeSet::from([String::new()]),
        };
        assert_eq!(sub.validate(), Err(ValidationError::EmptySegmentTitle));
    }
}
