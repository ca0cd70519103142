pub mod completion_worker;
pub mod domain;
pub mod memory_store;
pub mod ports;
pub mod repositories;
pub mod services;

#[cfg(test)]
mod test_support;

pub use completion_worker::{CompletionJob, CompletionQueue, WorkerConfig, FAILED_NOTICE, RECOMMENDATION_CONTEXT};
pub use domain::{
    Answer, ChatCompletion, Choice, CompletionMessage, CourseOutline, Message, MessageStatus, Options, Page,
    Question, QuestionSet, Usage, User,
};
pub use memory_store::InMemoryDocumentStore;
pub use ports::{
    CompletionService, CourseOutlineRepository, Document, DocumentStore, ListQuery, MessageRepository, PortError,
    PortResult, QuestionSetRepository, TokenVerifier, UserRepository,
};
pub use services::{CourseOutlineService, MessageService, QuestionSetService, UserService, PENDING_NOTICE};
