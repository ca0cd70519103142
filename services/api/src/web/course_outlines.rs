//! services/api/src/web/course_outlines.rs
//!
//! Axum handlers for the `/course-outlines` resource. Every route here sits
//! behind `require_bearer_token`.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use scoping_core::domain::CourseOutline;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::IntoParams;

use crate::web::middleware::VerifiedSubject;
use crate::web::rest::{json_body, port_error, HandlerError, PageQuery};
use crate::web::state::AppState;

/// Optional equality filter on one outline field.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OutlineFilterQuery {
    /// One of `technology_name`, `course_code`, `course_name`.
    #[serde(rename = "filterName")]
    pub filter_name: Option<String>,
    #[serde(rename = "filterValue")]
    pub filter_value: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/course-outlines",
    request_body = CourseOutline,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Course outline created", body = CourseOutline),
        (status = 400, description = "Undecodable body or missing technology_name"),
        (status = 401, description = "Missing or rejected bearer token"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_course_outline_handler(
    State(state): State<Arc<AppState>>,
    Extension(VerifiedSubject(subject)): Extension<VerifiedSubject>,
    payload: Result<Json<CourseOutline>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let outline = json_body(payload)?;
    let created = state
        .course_outlines
        .create_course_outline(outline)
        .await
        .map_err(port_error)?;
    info!("Course outline {} created by {}.", created.id, subject);
    Ok(Json(created))
}

/// List outlines ordered by technology name, optionally filtered on one field.
#[utoipa::path(
    get,
    path = "/api/v1/course-outlines",
    params(PageQuery, OutlineFilterQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "One page of course outlines", body = Vec<CourseOutline>),
        (status = 400, description = "Unsupported filter field"),
        (status = 401, description = "Missing or rejected bearer token"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_course_outlines_handler(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<OutlineFilterQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let filter_name = filter.filter_name.filter(|f| !f.is_empty());
    let filter_value = filter.filter_value.filter(|v| !v.is_empty());

    let outlines = match (filter_name, filter_value) {
        (Some(field), Some(value)) => {
            state
                .course_outlines
                .list_course_outlines_by_filter(&field, &value, page.page())
                .await
        }
        _ => state.course_outlines.list_course_outlines(page.page()).await,
    }
    .map_err(port_error)?;
    Ok(Json(outlines))
}

#[utoipa::path(
    get,
    path = "/api/v1/course-outlines/{id}",
    params(("id" = String, Path, description = "The course outline's id.")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The course outline", body = CourseOutline),
        (status = 401, description = "Missing or rejected bearer token"),
        (status = 404, description = "No such course outline"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_course_outline_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let outline = state
        .course_outlines
        .get_course_outline(&id)
        .await
        .map_err(port_error)?;
    Ok(Json(outline))
}

/// Replace an outline wholesale.
#[utoipa::path(
    put,
    path = "/api/v1/course-outlines/{id}",
    params(("id" = String, Path, description = "The course outline's id.")),
    request_body = CourseOutline,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The stored course outline", body = CourseOutline),
        (status = 400, description = "Undecodable body or missing technology_name"),
        (status = 401, description = "Missing or rejected bearer token"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_course_outline_handler(
    State(state): State<Arc<AppState>>,
    Extension(VerifiedSubject(subject)): Extension<VerifiedSubject>,
    Path(id): Path<String>,
    payload: Result<Json<CourseOutline>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let outline = json_body(payload)?;
    let updated = state
        .course_outlines
        .update_course_outline(&id, outline)
        .await
        .map_err(port_error)?;
    info!("Course outline {} replaced by {}.", id, subject);
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/course-outlines/{id}",
    params(("id" = String, Path, description = "The course outline's id.")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deleted (or already absent)"),
        (status = 401, description = "Missing or rejected bearer token"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_course_outline_handler(
    State(state): State<Arc<AppState>>,
    Extension(VerifiedSubject(subject)): Extension<VerifiedSubject>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    state
        .course_outlines
        .delete_course_outline(&id)
        .await
        .map_err(port_error)?;
    info!("Course outline {} deleted by {}.", id, subject);
    Ok(StatusCode::OK)
}
