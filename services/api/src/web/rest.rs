//! services/api/src/web/rest.rs
//!
//! Contains the pieces shared by every REST handler module (query parameters,
//! body decoding, error mapping) and the master definition for the OpenAPI
//! specification.

use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use scoping_core::domain::{
    Answer, ChatCompletion, Choice, CompletionMessage, CourseOutline, Message, MessageStatus, Options, Page,
    Question, QuestionSet, Usage, User,
};
use scoping_core::ports::PortError;
use serde::Deserialize;
use tracing::debug;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{IntoParams, Modify, OpenApi};

use crate::web::{course_outlines, messages, question_sets, users};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        liveness_handler,
        users::create_user_handler,
        users::list_users_handler,
        users::get_user_handler,
        users::update_user_handler,
        users::delete_user_handler,
        question_sets::create_question_set_handler,
        question_sets::list_question_sets_handler,
        question_sets::get_question_set_handler,
        question_sets::update_question_set_handler,
        question_sets::delete_question_set_handler,
        course_outlines::create_course_outline_handler,
        course_outlines::list_course_outlines_handler,
        course_outlines::get_course_outline_handler,
        course_outlines::update_course_outline_handler,
        course_outlines::delete_course_outline_handler,
        messages::create_message_handler,
        messages::submit_answers_handler,
        messages::list_messages_handler,
        messages::get_message_handler,
        messages::update_message_handler,
        messages::delete_message_handler,
    ),
    components(
        schemas(
            User, QuestionSet, Question, Options, CourseOutline, Message, Answer, MessageStatus,
            ChatCompletion, Choice, CompletionMessage, Usage
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Scoping API", description = "Training needs scoping: users, questionnaires, course outlines and AI recommendations.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer-token scheme used by the course outline routes.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

//=========================================================================================
// Shared Request Types
//=========================================================================================

/// Pagination parameters. Values are kept as raw text so that anything
/// unparseable falls back to the defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number (default 1).
    pub page: Option<String>,
    /// Records per page (default 10).
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::from_query(self.page.as_deref(), self.page_size.as_deref())
    }
}

//=========================================================================================
// Shared Response Helpers
//=========================================================================================

pub type HandlerError = (StatusCode, String);

/// Maps a port failure onto the HTTP status and plain-text body returned to the client.
pub fn port_error(e: PortError) -> HandlerError {
    match e {
        PortError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        PortError::InvalidInput(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, e.to_string()),
        PortError::Unexpected(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}

/// Unwraps a JSON body, turning any decoding failure into a 400.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HandlerError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        debug!("Rejected request body: {}", rejection.body_text());
        (StatusCode::BAD_REQUEST, rejection.body_text())
    })
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "The service is up", body = String))
)]
pub async fn liveness_handler() -> &'static str {
    "Hello world"
}
