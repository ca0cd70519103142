//! crates/scoping_core/src/services/question_set.rs
//!
//! Question set CRUD and the lookup by technology name.

use std::sync::Arc;

use tracing::info;

use super::{log_failure, new_id, require_id};
use crate::domain::{Page, QuestionSet};
use crate::ports::{PortResult, QuestionSetRepository};

#[derive(Clone)]
pub struct QuestionSetService {
    question_sets: Arc<dyn QuestionSetRepository>,
}

impl QuestionSetService {
    pub fn new(question_sets: Arc<dyn QuestionSetRepository>) -> Self {
        Self { question_sets }
    }

    pub async fn create_question_set(&self, mut question_set: QuestionSet) -> PortResult<QuestionSet> {
        question_set.id = new_id();
        question_set.validate()?;

        let created = self
            .question_sets
            .create_question_set(question_set)
            .await
            .map_err(log_failure("create question set", "<new>"))?;
        info!(
            "Created question set {} with {} questions.",
            created.id,
            created.questions.len()
        );
        Ok(created)
    }

    pub async fn get_question_set(&self, id: &str) -> PortResult<QuestionSet> {
        self.question_sets
            .get_question_set(id)
            .await
            .map_err(log_failure("get question set", id))
    }

    /// Returns a single question set for the technology, even if several share
    /// the name.
    pub async fn get_question_set_by_technology(&self, technology_name: &str) -> PortResult<QuestionSet> {
        self.question_sets
            .get_question_set_by_technology(technology_name)
            .await
            .map_err(log_failure("look up question set for", technology_name))
    }

    pub async fn list_question_sets(&self, page: Page) -> PortResult<Vec<QuestionSet>> {
        self.question_sets
            .list_question_sets(page)
            .await
            .map_err(log_failure("list question sets", "*"))
    }

    pub async fn update_question_set(&self, id: &str, mut question_set: QuestionSet) -> PortResult<QuestionSet> {
        require_id(id, "question set")?;
        question_set.id = id.to_string();

        self.question_sets
            .update_question_set(question_set)
            .await
            .map_err(log_failure("update question set", id))
    }

    pub async fn delete_question_set(&self, id: &str) -> PortResult<()> {
        self.question_sets
            .delete_question_set(id)
            .await
            .map_err(log_failure("delete question set", id))
    }
}
