//! crates/scoping_core/src/services/mod.rs
//!
//! Entity services sit between the HTTP layer and the repositories. They own
//! identifier generation, presence validation and logging; persistence is
//! delegated to the repository ports.

mod course_outline;
mod message;
mod question_set;
mod user;

pub use course_outline::CourseOutlineService;
pub use message::{build_prompt, MessageService, PENDING_NOTICE};
pub use question_set::QuestionSetService;
pub use user::UserService;

use tracing::{debug, error};

use crate::ports::PortError;

/// A fresh opaque identifier for a newly created record.
fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Logs a failed operation and hands the error back for propagation.
/// Caller mistakes are logged at debug level, everything else as an error.
fn log_failure(action: &'static str, id: &str) -> impl FnOnce(PortError) -> PortError {
    let id = id.to_string();
    move |e| {
        match &e {
            PortError::NotFound(_) | PortError::InvalidInput(_) => {
                debug!("Failed to {} '{}': {}", action, id, e)
            }
            _ => error!("Failed to {} '{}': {}", action, id, e),
        }
        e
    }
}

/// An id taken from the request path must not be blank.
fn require_id(id: &str, what: &str) -> Result<(), PortError> {
    if id.trim().is_empty() {
        return Err(PortError::InvalidInput(format!("{what} id must not be empty")));
    }
    Ok(())
}
