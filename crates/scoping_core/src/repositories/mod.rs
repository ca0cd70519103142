//! crates/scoping_core/src/repositories/mod.rs
//!
//! Entity repositories backed by the `DocumentStore` port. Each one is a thin
//! mapping between a domain struct and the documents of the collection it owns.

mod course_outline;
mod message;
mod question_set;
mod user;

pub use course_outline::DocumentCourseOutlineRepository;
pub use message::DocumentMessageRepository;
pub use question_set::DocumentQuestionSetRepository;
pub use user::DocumentUserRepository;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::ports::{Document, PortError, PortResult};

pub const USERS_COLLECTION: &str = "users";
pub const QUESTION_SETS_COLLECTION: &str = "question_sets";
pub const COURSE_OUTLINES_COLLECTION: &str = "course_outlines";
/// Sub-collection under each user document.
pub const MESSAGES_COLLECTION: &str = "messages";

fn to_document<T: Serialize>(entity: &T) -> PortResult<Document> {
    match serde_json::to_value(entity).map_err(|e| PortError::Unexpected(e.to_string()))? {
        Value::Object(document) => Ok(document),
        other => Err(PortError::Unexpected(format!(
            "expected an object document, got {other}"
        ))),
    }
}

fn from_document<T: DeserializeOwned>(document: Document) -> PortResult<T> {
    serde_json::from_value(Value::Object(document)).map_err(|e| PortError::Unexpected(e.to_string()))
}
