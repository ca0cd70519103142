//! services/api/src/web/router.rs
//!
//! Assembles the complete application router: REST routes, the bearer-token
//! guard on course outlines, CORS, the `OPTIONS` short-circuit, request
//! tracing and the Swagger UI.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::middleware::{require_bearer_token, short_circuit_options};
use crate::web::rest::{liveness_handler, ApiDoc};
use crate::web::state::AppState;
use crate::web::{course_outlines, messages, question_sets, users};

pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route(
            "/users",
            post(users::create_user_handler).get(users::list_users_handler),
        )
        .route(
            "/users/{user_id}",
            get(users::get_user_handler)
                .put(users::update_user_handler)
                .delete(users::delete_user_handler),
        )
        .route(
            "/users/{user_id}/messages",
            post(messages::create_message_handler).get(messages::list_messages_handler),
        )
        .route(
            "/users/{user_id}/messages/answers",
            post(messages::submit_answers_handler),
        )
        .route(
            "/users/{user_id}/messages/{message_id}",
            get(messages::get_message_handler)
                .put(messages::update_message_handler)
                .delete(messages::delete_message_handler),
        )
        .route(
            "/question-sets",
            post(question_sets::create_question_set_handler)
                .get(question_sets::list_question_sets_handler),
        )
        .route(
            "/question-sets/{id}",
            get(question_sets::get_question_set_handler)
                .put(question_sets::update_question_set_handler)
                .delete(question_sets::delete_question_set_handler),
        );

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .route(
            "/course-outlines",
            post(course_outlines::create_course_outline_handler)
                .get(course_outlines::list_course_outlines_handler),
        )
        .route(
            "/course-outlines/{id}",
            get(course_outlines::get_course_outline_handler)
                .put(course_outlines::update_course_outline_handler)
                .delete(course_outlines::delete_course_outline_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_bearer_token,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(liveness_handler))
        .nest("/api/v1", public_routes.merge(protected_routes))
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum_middleware::from_fn(short_circuit_options))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
