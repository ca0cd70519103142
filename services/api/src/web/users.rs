//! services/api/src/web/users.rs
//!
//! Axum handlers for the `/users` resource.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use scoping_core::domain::User;
use std::sync::Arc;

use crate::web::rest::{json_body, port_error, HandlerError, PageQuery};
use crate::web::state::AppState;

/// Create a user. The id is generated by the server.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = User,
    responses(
        (status = 200, description = "User created", body = User),
        (status = 400, description = "Undecodable body or missing name/email_address"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<User>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let user = json_body(payload)?;
    let created = state.users.create_user(user).await.map_err(port_error)?;
    Ok(Json(created))
}

/// List users ordered by email address.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of users", body = Vec<User>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let users = state.users.list_users(query.page()).await.map_err(port_error)?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = String, Path, description = "The user's id.")),
    responses(
        (status = 200, description = "The user", body = User),
        (status = 404, description = "No such user"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let user = state.users.get_user(&user_id).await.map_err(port_error)?;
    Ok(Json(user))
}

/// Merge the supplied fields into an existing user.
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = String, Path, description = "The user's id.")),
    request_body = User,
    responses(
        (status = 200, description = "The updated user", body = User),
        (status = 400, description = "Undecodable body or missing name/email_address"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    payload: Result<Json<User>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let user = json_body(payload)?;
    let updated = state
        .users
        .update_user(&user_id, user)
        .await
        .map_err(port_error)?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = String, Path, description = "The user's id.")),
    responses(
        (status = 200, description = "Deleted (or already absent)"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    state.users.delete_user(&user_id).await.map_err(port_error)?;
    Ok(StatusCode::OK)
}
