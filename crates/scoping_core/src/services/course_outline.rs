//! crates/scoping_core/src/services/course_outline.rs
//!
//! Course outline CRUD and the field-filtered listing.

use std::sync::Arc;

use tracing::info;

use super::{log_failure, new_id, require_id};
use crate::domain::{CourseOutline, Page};
use crate::ports::{CourseOutlineRepository, PortError, PortResult};

#[derive(Clone)]
pub struct CourseOutlineService {
    outlines: Arc<dyn CourseOutlineRepository>,
}

impl CourseOutlineService {
    pub fn new(outlines: Arc<dyn CourseOutlineRepository>) -> Self {
        Self { outlines }
    }

    pub async fn create_course_outline(&self, mut outline: CourseOutline) -> PortResult<CourseOutline> {
        outline.id = new_id();
        outline.validate()?;

        let created = self
            .outlines
            .create_course_outline(outline)
            .await
            .map_err(log_failure("create course outline", "<new>"))?;
        info!("Created course outline {}.", created.id);
        Ok(created)
    }

    pub async fn get_course_outline(&self, id: &str) -> PortResult<CourseOutline> {
        self.outlines
            .get_course_outline(id)
            .await
            .map_err(log_failure("get course outline", id))
    }

    pub async fn list_course_outlines(&self, page: Page) -> PortResult<Vec<CourseOutline>> {
        self.outlines
            .list_course_outlines(page)
            .await
            .map_err(log_failure("list course outlines", "*"))
    }

    /// Lists outlines whose `field` equals `value`. Only the fields in
    /// [`CourseOutline::FILTERABLE_FIELDS`] may be filtered on.
    pub async fn list_course_outlines_by_filter(
        &self,
        field: &str,
        value: &str,
        page: Page,
    ) -> PortResult<Vec<CourseOutline>> {
        if !CourseOutline::FILTERABLE_FIELDS.contains(&field) {
            return Err(PortError::InvalidInput(format!(
                "cannot filter course outlines on '{field}'; expected one of {}",
                CourseOutline::FILTERABLE_FIELDS.join(", ")
            )));
        }

        self.outlines
            .list_course_outlines_by_filter(field, value, page)
            .await
            .map_err(log_failure("filter course outlines on", field))
    }

    /// Replaces the outline stored under `id` with the supplied one.
    pub async fn update_course_outline(&self, id: &str, mut outline: CourseOutline) -> PortResult<CourseOutline> {
        require_id(id, "course outline")?;
        outline.id = id.to_string();
        outline.validate()?;

        self.outlines
            .update_course_outline(outline)
            .await
            .map_err(log_failure("update course outline", id))
    }

    pub async fn delete_course_outline(&self, id: &str) -> PortResult<()> {
        self.outlines
            .delete_course_outline(id)
            .await
            .map_err(log_failure("delete course outline", id))
    }
}
