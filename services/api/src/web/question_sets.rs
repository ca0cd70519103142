//! services/api/src/web/question_sets.rs
//!
//! Axum handlers for the `/question-sets` resource.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scoping_core::domain::QuestionSet;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::web::rest::{json_body, port_error, HandlerError, PageQuery};
use crate::web::state::AppState;

/// Optional lookup of a single question set by technology name.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TechnologyQuery {
    /// When non-empty, returns the one question set for this technology instead of a list.
    pub name: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/question-sets",
    request_body = QuestionSet,
    responses(
        (status = 200, description = "Question set created", body = QuestionSet),
        (status = 400, description = "Undecodable body or missing technology_name"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_question_set_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QuestionSet>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let question_set = json_body(payload)?;
    let created = state
        .question_sets
        .create_question_set(question_set)
        .await
        .map_err(port_error)?;
    Ok(Json(created))
}

/// List question sets ordered by technology name, or fetch the one for `?name=`.
#[utoipa::path(
    get,
    path = "/api/v1/question-sets",
    params(PageQuery, TechnologyQuery),
    responses(
        (status = 200, description = "A page of question sets, or a single one when `name` is given", body = Vec<QuestionSet>),
        (status = 404, description = "No question set for the named technology"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_question_sets_handler(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
    Query(technology): Query<TechnologyQuery>,
) -> Result<Response, HandlerError> {
    if let Some(name) = technology.name.filter(|n| !n.is_empty()) {
        let question_set = state
            .question_sets
            .get_question_set_by_technology(&name)
            .await
            .map_err(port_error)?;
        return Ok(Json(question_set).into_response());
    }

    let question_sets = state
        .question_sets
        .list_question_sets(page.page())
        .await
        .map_err(port_error)?;
    Ok(Json(question_sets).into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/question-sets/{id}",
    params(("id" = String, Path, description = "The question set's id.")),
    responses(
        (status = 200, description = "The question set", body = QuestionSet),
        (status = 404, description = "No such question set"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_question_set_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let question_set = state
        .question_sets
        .get_question_set(&id)
        .await
        .map_err(port_error)?;
    Ok(Json(question_set))
}

#[utoipa::path(
    put,
    path = "/api/v1/question-sets/{id}",
    params(("id" = String, Path, description = "The question set's id.")),
    request_body = QuestionSet,
    responses(
        (status = 200, description = "The updated question set", body = QuestionSet),
        (status = 400, description = "Undecodable body"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_question_set_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<QuestionSet>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let question_set = json_body(payload)?;
    let updated = state
        .question_sets
        .update_question_set(&id, question_set)
        .await
        .map_err(port_error)?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/question-sets/{id}",
    params(("id" = String, Path, description = "The question set's id.")),
    responses(
        (status = 200, description = "Deleted (or already absent)"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_question_set_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    state
        .question_sets
        .delete_question_set(&id)
        .await
        .map_err(port_error)?;
    Ok(StatusCode::OK)
}
