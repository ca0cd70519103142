//! crates/scoping_core/src/repositories/question_set.rs
//!
//! Question sets as documents of the `question_sets` collection, including
//! the lookup by technology name.

use std::sync::Arc;

use async_trait::async_trait;

use super::{from_document, to_document, QUESTION_SETS_COLLECTION};
use crate::domain::{Page, QuestionSet};
use crate::ports::{DocumentStore, ListQuery, PortError, PortResult, QuestionSetRepository};

#[derive(Clone)]
pub struct DocumentQuestionSetRepository {
    store: Arc<dyn DocumentStore>,
}

impl DocumentQuestionSetRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn with_id(id: String, document: crate::ports::Document) -> PortResult<QuestionSet> {
        let mut question_set: QuestionSet = from_document(document)?;
        question_set.id = id;
        Ok(question_set)
    }
}

#[async_trait]
impl QuestionSetRepository for DocumentQuestionSetRepository {
    async fn get_question_set(&self, id: &str) -> PortResult<QuestionSet> {
        let document = self.store.get(QUESTION_SETS_COLLECTION, id).await?;
        Self::with_id(id.to_string(), document)
    }

    async fn get_question_set_by_technology(&self, technology_name: &str) -> PortResult<QuestionSet> {
        let query = ListQuery {
            limit: 1,
            ..Default::default()
        }
        .with_filter("technology_name", technology_name);

        let (id, document) = self
            .store
            .list(QUESTION_SETS_COLLECTION, &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                PortError::NotFound(format!("question set for technology '{technology_name}'"))
            })?;
        Self::with_id(id, document)
    }

    async fn list_question_sets(&self, page: Page) -> PortResult<Vec<QuestionSet>> {
        let query = ListQuery::ordered_by("technology_name", page);
        self.store
            .list(QUESTION_SETS_COLLECTION, &query)
            .await?
            .into_iter()
            .map(|(id, document)| Self::with_id(id, document))
            .collect()
    }

    async fn create_question_set(&self, question_set: QuestionSet) -> PortResult<QuestionSet> {
        self.store
            .set(QUESTION_SETS_COLLECTION, &question_set.id, to_document(&question_set)?)
            .await?;
        Ok(question_set)
    }

    async fn update_question_set(&self, question_set: QuestionSet) -> PortResult<QuestionSet> {
        let merged = self
            .store
            .merge(QUESTION_SETS_COLLECTION, &question_set.id, to_document(&question_set)?)
            .await?;
        Self::with_id(question_set.id, merged)
    }

    async fn delete_question_set(&self, id: &str) -> PortResult<()> {
        self.store.delete(QUESTION_SETS_COLLECTION, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Options, Question};
    use crate::memory_store::InMemoryDocumentStore;
    use pretty_assertions::assert_eq;

    fn question_set(id: &str, technology: &str) -> QuestionSet {
        QuestionSet {
            id: id.to_string(),
            technology_name: Some(technology.to_string()),
            questions: vec![Question {
                category: Some("Experience".to_string()),
                text: Some(format!("How long have you used {technology}?")),
                options: Some(Options {
                    multi_answer: false,
                    possible_options: vec!["<1y".to_string(), "1-3y".to_string()],
                }),
            }],
        }
    }

    #[tokio::test]
    async fn round_trip_preserves_questions() {
        let repo = DocumentQuestionSetRepository::new(Arc::new(InMemoryDocumentStore::new()));
        let created = repo.create_question_set(question_set("1", "AWS")).await.unwrap();
        assert_eq!(repo.get_question_set("1").await.unwrap(), created);
    }

    #[tokio::test]
    async fn lookup_by_shared_technology_returns_exactly_one() {
        let repo = DocumentQuestionSetRepository::new(Arc::new(InMemoryDocumentStore::new()));
        repo.create_question_set(question_set("1", "AWS")).await.unwrap();
        repo.create_question_set(question_set("2", "AWS")).await.unwrap();
        repo.create_question_set(question_set("3", "Azure")).await.unwrap();

        let found = repo.get_question_set_by_technology("AWS").await.unwrap();
        assert_eq!(found.technology_name.as_deref(), Some("AWS"));
        assert!(found.id == "1" || found.id == "2");
    }

    #[tokio::test]
    async fn lookup_of_unknown_technology_is_not_found() {
        let repo = DocumentQuestionSetRepository::new(Arc::new(InMemoryDocumentStore::new()));
        assert!(matches!(
            repo.get_question_set_by_technology("GCP").await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_replaces_question_list() {
        let repo = DocumentQuestionSetRepository::new(Arc::new(InMemoryDocumentStore::new()));
        repo.create_question_set(question_set("1", "AWS")).await.unwrap();

        let updated = repo
            .update_question_set(QuestionSet {
                id: "1".to_string(),
                technology_name: None,
                questions: Vec::new(),
            })
            .await
            .unwrap();

        assert_eq!(updated.technology_name.as_deref(), Some("AWS"));
        assert!(updated.questions.is_empty());
    }
}
