use crate::AppState;
use crate::api::models::segments::{
    ListSegmentsQuery, ResolvedSegments, SegmentCreate, SegmentResponse, SegmentUpdate, SubscriptionRequest,
};
use crate::db::errors::DbError;
use crate::db::handlers::SegmentFilter;
use crate::db::models::{
    segments::{SegmentCreateDBRequest, SegmentUpdateDBRequest},
    subscriptions::Subscription,
};
use crate::errors::{Error, Result};
use crate::types::SegmentId;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

/// Name the missing segment instead of returning a bare "not found"
fn segment_error(id: SegmentId) -> impl FnOnce(DbError) -> Error {
    move |e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "Segment".to_string(),
            id: id.to_string(),
        },
        other => Error::Database(other),
    }
}

#[utoipa::path(
    get,
    path = "/segments",
    tag = "segments",
    summary = "List segments",
    description = "Lists live segments in creation order. Deleted segments are never returned.",
    responses(
        (status = 200, description = "List of segments", body = Vec<SegmentResponse>),
        (status = 400, description = "Invalid query parameters"),
        (status = 500, description = "Internal server error")
    ),
    params(ListSegmentsQuery)
)]
#[tracing::instrument(skip_all)]
pub async fn list_segments(State(state): State<AppState>, Query(query): Query<ListSegmentsQuery>) -> Result<Json<Vec<SegmentResponse>>> {
    let mut filter = SegmentFilter::new(query.pagination.skip(), query.pagination.limit());
    if let Some(search) = query.search {
        filter = filter.with_search(search);
    }

    let segments = state.segments.list(&filter).await?;
    Ok(Json(segments.into_iter().map(SegmentResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/segments",
    tag = "segments",
    summary = "Create segment",
    request_body = SegmentCreate,
    responses(
        (status = 201, description = "Segment created successfully", body = SegmentResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "A live segment with this title already exists"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_segment(State(state): State<AppState>, Json(create): Json<SegmentCreate>) -> Result<(StatusCode, Json<SegmentResponse>)> {
    let request = SegmentCreateDBRequest::from(create);

    let segment = state.segments.create(&request).await?;
    Ok((StatusCode::CREATED, Json(SegmentResponse::from(segment))))
}

#[utoipa::path(
    get,
    path = "/segments/{id}",
    tag = "segments",
    summary = "Get segment",
    responses(
        (status = 200, description = "Segment details", body = SegmentResponse),
        (status = 404, description = "Segment not found or deleted"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = uuid::Uuid, Path, description = "Segment ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_segment(State(state): State<AppState>, Path(id): Path<SegmentId>) -> Result<Json<SegmentResponse>> {
    let segment = state.segments.get(id).await.map_err(segment_error(id))?;
    Ok(Json(SegmentResponse::from(segment)))
}

#[utoipa::path(
    put,
    path = "/segments/{id}",
    tag = "segments",
    summary = "Update segment",
    description = "Replaces the title, description and auto-assignment percentage of a live segment.",
    request_body = SegmentUpdate,
    responses(
        (status = 200, description = "Segment updated successfully", body = SegmentResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Segment not found or deleted"),
        (status = 409, description = "A live segment with this title already exists"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = uuid::Uuid, Path, description = "Segment ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_segment(
    State(state): State<AppState>,
    Path(id): Path<SegmentId>,
    Json(update): Json<SegmentUpdate>,
) -> Result<Json<SegmentResponse>> {
    let request = SegmentUpdateDBRequest::from(update);

    let segment = state.segments.update(id, &request).await.map_err(segment_error(id))?;
    Ok(Json(SegmentResponse::from(segment)))
}

#[utoipa::path(
    delete,
    path = "/segments/{id}",
    tag = "segments",
    summary = "Delete segment",
    description = "Soft-deletes a segment. Its title becomes available for new segments.",
    responses(
        (status = 204, description = "Segment deleted successfully"),
        (status = 404, description = "Segment not found or already deleted"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("id" = uuid::Uuid, Path, description = "Segment ID")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_segment(State(state): State<AppState>, Path(id): Path<SegmentId>) -> Result<StatusCode> {
    state.segments.delete(id).await.map_err(segment_error(id))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/segments/resolve",
    tag = "segments",
    summary = "Resolve subscription titles",
    description = "Translates a user's segment titles into the ids of live segments. Unknown or deleted titles are omitted.",
    request_body = SubscriptionRequest,
    responses(
        (status = 200, description = "Resolved segment ids", body = ResolvedSegments),
        (status = 400, description = "Invalid subscription"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn resolve_subscription(
    State(state): State<AppState>,
    Json(request): Json<SubscriptionRequest>,
) -> Result<Json<ResolvedSegments>> {
    let subscription = Subscription::from(request);

    let segment_ids = state.segments.resolve_subscription(&subscription).await?;
    Ok(Json(ResolvedSegments {
        user_id: subscription.user_id,
        segment_ids,
    }))
}
