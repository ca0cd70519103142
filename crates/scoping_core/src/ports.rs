//! crates/scoping_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::{ChatCompletion, CourseOutline, Message, Page, QuestionSet, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Document Store Port
//=========================================================================================

/// The stored form of every record: a JSON object.
pub type Document = Map<String, Value>;

/// Deep-merges `patch` into `target`: nested objects are merged key by key,
/// every other value (arrays included) replaces what was there.
pub fn merge_documents(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_documents(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// An equality filter on a top-level document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

/// Describes an ordered, paginated listing of one collection.
///
/// When `order_by` is set, documents lacking that field are excluded and the rest
/// are sorted ascending by it (ties broken by document id). Without it, documents
/// are returned in document-id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub order_by: Option<String>,
    pub filter: Option<FieldFilter>,
    pub offset: usize,
    pub limit: usize,
}

impl ListQuery {
    pub fn ordered_by(field: &str, page: Page) -> Self {
        Self {
            order_by: Some(field.to_string()),
            filter: None,
            offset: page.offset(),
            limit: page.limit(),
        }
    }

    pub fn with_filter(mut self, field: &str, value: &str) -> Self {
        self.filter = Some(FieldFilter {
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }
}

/// Keyed JSON document storage, partitioned into collections.
///
/// Collections are slash-separated paths (e.g. `users/42/messages`).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches one document. Fails with `NotFound` when the key is absent.
    async fn get(&self, collection: &str, id: &str) -> PortResult<Document>;

    /// Writes a document, replacing any existing one under the same key.
    async fn set(&self, collection: &str, id: &str, document: Document) -> PortResult<()>;

    /// Deep-merges `patch` into the stored document (creating it if absent) and
    /// returns the merged result.
    async fn merge(&self, collection: &str, id: &str, patch: Document) -> PortResult<Document>;

    /// Removes a document. Removing an absent key is not an error.
    async fn delete(&self, collection: &str, id: &str) -> PortResult<()>;

    /// Lists `(id, document)` pairs according to `query`.
    async fn list(&self, collection: &str, query: &ListQuery) -> PortResult<Vec<(String, Document)>>;
}

//=========================================================================================
// Entity Repository Ports
//=========================================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: &str) -> PortResult<User>;
    /// Users ordered by email address.
    async fn list_users(&self, page: Page) -> PortResult<Vec<User>>;
    async fn create_user(&self, user: User) -> PortResult<User>;
    async fn update_user(&self, user: User) -> PortResult<User>;
    async fn delete_user(&self, id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait QuestionSetRepository: Send + Sync {
    async fn get_question_set(&self, id: &str) -> PortResult<QuestionSet>;
    /// The first question set (in id order) for a technology.
    async fn get_question_set_by_technology(&self, technology_name: &str) -> PortResult<QuestionSet>;
    /// Question sets ordered by technology name.
    async fn list_question_sets(&self, page: Page) -> PortResult<Vec<QuestionSet>>;
    async fn create_question_set(&self, question_set: QuestionSet) -> PortResult<QuestionSet>;
    async fn update_question_set(&self, question_set: QuestionSet) -> PortResult<QuestionSet>;
    async fn delete_question_set(&self, id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait CourseOutlineRepository: Send + Sync {
    async fn get_course_outline(&self, id: &str) -> PortResult<CourseOutline>;
    /// Course outlines ordered by technology name.
    async fn list_course_outlines(&self, page: Page) -> PortResult<Vec<CourseOutline>>;
    /// Course outlines whose `field` equals `value`.
    async fn list_course_outlines_by_filter(
        &self,
        field: &str,
        value: &str,
        page: Page,
    ) -> PortResult<Vec<CourseOutline>>;
    async fn create_course_outline(&self, outline: CourseOutline) -> PortResult<CourseOutline>;
    async fn update_course_outline(&self, outline: CourseOutline) -> PortResult<CourseOutline>;
    async fn delete_course_outline(&self, id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn get_message(&self, user_id: &str, message_id: &str) -> PortResult<Message>;
    /// A user's messages ordered by creation time.
    async fn list_messages(&self, user_id: &str, page: Page) -> PortResult<Vec<Message>>;
    async fn create_message(&self, message: Message) -> PortResult<Message>;
    async fn update_message(&self, message: Message) -> PortResult<Message>;
    async fn delete_message(&self, user_id: &str, message_id: &str) -> PortResult<()>;
}

//=========================================================================================
// External Service Ports
//=========================================================================================

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Asks the text-generation service to respond to `prompt` under `system_context`.
    async fn complete(&self, system_context: &str, prompt: &str) -> PortResult<ChatCompletion>;
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verifies an identity token and returns the id of the subject it was issued to.
    async fn verify_token(&self, token: &str) -> PortResult<String>;
}
