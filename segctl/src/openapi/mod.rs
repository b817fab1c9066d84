//! OpenAPI documentation for the segment API.
//!
//! Served as JSON at `/api-docs/openapi.json`; paths are relative to the `/api/v1` server.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "segctl",
        description = "CRUD over user cohort segments backed by PostgreSQL"
    ),
    servers(
        (url = "/api/v1", description = "Segment API")
    ),
    paths(
        api::handlers::segments::list_segments,
        api::handlers::segments::create_segment,
        api::handlers::segments::get_segment,
        api::handlers::segments::update_segment,
        api::handlers::segments::delete_segment,
        api::handlers::segments::resolve_subscription,
    ),
    components(
        schemas(
            api::models::pagination::Pagination,
            api::models::segments::ListSegmentsQuery,
            api::models::segments::SegmentCreate,
            api::models::segments::SegmentUpdate,
            api::models::segments::SegmentResponse,
            api::models::segments::SubscriptionRequest,
            api::models::segments::ResolvedSegments,
        )
    ),
    tags(
        (name = "segments", description = "Segment management and title resolution")
    )
)]
pub struct ApiDoc;
