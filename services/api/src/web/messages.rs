//! services/api/src/web/messages.rs
//!
//! Axum handlers for `/users/{user_id}/messages`, including the answer-batch
//! submission that kicks off a recommendation. The owning user always comes
//! from the path, whatever the body says.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use scoping_core::domain::Message;
use std::sync::Arc;
use tracing::info;

use crate::web::rest::{json_body, port_error, HandlerError, PageQuery};
use crate::web::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/messages",
    params(("user_id" = String, Path, description = "The owning user's id.")),
    request_body = Message,
    responses(
        (status = 200, description = "Message created", body = Message),
        (status = 400, description = "Undecodable body or message without content"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_message_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    payload: Result<Json<Message>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut message = json_body(payload)?;
    message.user_id = Some(user_id);
    let created = state.messages.post_message(message).await.map_err(port_error)?;
    Ok(Json(created))
}

/// Submit a batch of answers. Returns a pending placeholder message that is
/// later overwritten with the AI recommendation (status `completed`) or a
/// failure notice (status `failed`).
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/messages/answers",
    params(("user_id" = String, Path, description = "The owning user's id.")),
    request_body = Vec<Message>,
    responses(
        (status = 200, description = "The pending placeholder message", body = Message),
        (status = 400, description = "Undecodable body or empty batch"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn submit_answers_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    payload: Result<Json<Vec<Message>>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut batch = json_body(payload)?;
    for message in &mut batch {
        message.user_id = Some(user_id.clone());
    }
    info!("User {} submitted {} answers.", user_id, batch.len());

    let placeholder = state
        .messages
        .submit_answers(batch)
        .await
        .map_err(port_error)?;
    Ok(Json(placeholder))
}

/// List a user's messages in creation order.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/messages",
    params(("user_id" = String, Path, description = "The owning user's id."), PageQuery),
    responses(
        (status = 200, description = "One page of messages", body = Vec<Message>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_messages_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let messages = state
        .messages
        .list_messages(&user_id, query.page())
        .await
        .map_err(port_error)?;
    Ok(Json(messages))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/messages/{message_id}",
    params(
        ("user_id" = String, Path, description = "The owning user's id."),
        ("message_id" = String, Path, description = "The message's id.")
    ),
    responses(
        (status = 200, description = "The message", body = Message),
        (status = 404, description = "No such message"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_message_handler(
    State(state): State<Arc<AppState>>,
    Path((user_id, message_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, HandlerError> {
    let message = state
        .messages
        .get_message(&user_id, &message_id)
        .await
        .map_err(port_error)?;
    Ok(Json(message))
}

/// Merge the supplied fields into an existing message.
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/messages/{message_id}",
    params(
        ("user_id" = String, Path, description = "The owning user's id."),
        ("message_id" = String, Path, description = "The message's id.")
    ),
    request_body = Message,
    responses(
        (status = 200, description = "The updated message", body = Message),
        (status = 400, description = "Undecodable body or message without content"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_message_handler(
    State(state): State<Arc<AppState>>,
    Path((user_id, message_id)): Path<(String, String)>,
    payload: Result<Json<Message>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let message = json_body(payload)?;
    let updated = state
        .messages
        .update_message(&user_id, &message_id, message)
        .await
        .map_err(port_error)?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/messages/{message_id}",
    params(
        ("user_id" = String, Path, description = "The owning user's id."),
        ("message_id" = String, Path, description = "The message's id.")
    ),
    responses(
        (status = 200, description = "Deleted (or already absent)"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_message_handler(
    State(state): State<Arc<AppState>>,
    Path((user_id, message_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, HandlerError> {
    state
        .messages
        .delete_message(&user_id, &message_id)
        .await
        .map_err(port_error)?;
    Ok(StatusCode::OK)
}
