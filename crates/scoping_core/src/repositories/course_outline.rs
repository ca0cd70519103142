//! crates/scoping_core/src/repositories/course_outline.rs
//!
//! Course outlines as documents of the `course_outlines` collection.

use std::sync::Arc;

use async_trait::async_trait;

use super::{from_document, to_document, COURSE_OUTLINES_COLLECTION};
use crate::domain::{CourseOutline, Page};
use crate::ports::{CourseOutlineRepository, Document, DocumentStore, ListQuery, PortResult};

#[derive(Clone)]
pub struct DocumentCourseOutlineRepository {
    store: Arc<dyn DocumentStore>,
}

impl DocumentCourseOutlineRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn list_by(&self, query: ListQuery) -> PortResult<Vec<CourseOutline>> {
        self.store
            .list(COURSE_OUTLINES_COLLECTION, &query)
            .await?
            .into_iter()
            .map(|(id, document)| with_id(id, document))
            .collect()
    }
}

fn with_id(id: String, document: Document) -> PortResult<CourseOutline> {
    let mut outline: CourseOutline = from_document(document)?;
    outline.id = id;
    Ok(outline)
}

#[async_trait]
impl CourseOutlineRepository for DocumentCourseOutlineRepository {
    async fn get_course_outline(&self, id: &str) -> PortResult<CourseOutline> {
        let document = self.store.get(COURSE_OUTLINES_COLLECTION, id).await?;
        with_id(id.to_string(), document)
    }

    async fn list_course_outlines(&self, page: Page) -> PortResult<Vec<CourseOutline>> {
        self.list_by(ListQuery::ordered_by("technology_name", page)).await
    }

    async fn list_course_outlines_by_filter(
        &self,
        field: &str,
        value: &str,
        page: Page,
    ) -> PortResult<Vec<CourseOutline>> {
        self.list_by(ListQuery::ordered_by(field, page).with_filter(field, value))
            .await
    }

    async fn create_course_outline(&self, outline: CourseOutline) -> PortResult<CourseOutline> {
        self.store
            .set(COURSE_OUTLINES_COLLECTION, &outline.id, to_document(&outline)?)
            .await?;
        Ok(outline)
    }

    /// Course outlines are replaced wholesale rather than merged.
    async fn update_course_outline(&self, outline: CourseOutline) -> PortResult<CourseOutline> {
        self.create_course_outline(outline).await
    }

    async fn delete_course_outline(&self, id: &str) -> PortResult<()> {
        self.store.delete(COURSE_OUTLINES_COLLECTION, id).await
    }
}
