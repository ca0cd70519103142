//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use scoping_core::completion_worker::{CompletionQueue, WorkerConfig};
use scoping_core::ports::{CompletionService, DocumentStore, MessageRepository, TokenVerifier};
use scoping_core::repositories::{
    DocumentCourseOutlineRepository, DocumentMessageRepository, DocumentQuestionSetRepository,
    DocumentUserRepository,
};
use scoping_core::services::{CourseOutlineService, MessageService, QuestionSetService, UserService};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub question_sets: QuestionSetService,
    pub course_outlines: CourseOutlineService,
    pub messages: MessageService,
    pub token_verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    /// Wires the entity services onto one document store and starts the
    /// completion worker pool. The returned handles finish once `shutdown` is
    /// cancelled.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        completion: Arc<dyn CompletionService>,
        token_verifier: Arc<dyn TokenVerifier>,
        workers: WorkerConfig,
        shutdown: CancellationToken,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let message_repository: Arc<dyn MessageRepository> =
            Arc::new(DocumentMessageRepository::new(store.clone()));
        let (queue, worker_handles) =
            CompletionQueue::start(workers, message_repository.clone(), completion, shutdown);

        let state = Self {
            users: UserService::new(Arc::new(DocumentUserRepository::new(store.clone()))),
            question_sets: QuestionSetService::new(Arc::new(DocumentQuestionSetRepository::new(
                store.clone(),
            ))),
            course_outlines: CourseOutlineService::new(Arc::new(
                DocumentCourseOutlineRepository::new(store),
            )),
            messages: MessageService::new(message_repository, queue),
            token_verifier,
        };
        (state, worker_handles)
    }
}
