//! Registered capabilities for the tutor assistant.
//!
//! Each capability is application glue over the core: it reads slots,
//! resolves catalog names, calls the backend, and emits directives. The
//! interesting control flow (gating, suspension, resumption) lives in
//! `tutor-core`; what's here is the per-action behavior.

#![warn(clippy::all)]

mod categories;
mod courses;
mod resources;

pub use categories::CreateCategory;
pub use courses::{EnrollCourse, SearchCourses};
pub use resources::ApproveResource;

use std::sync::Arc;

use tutor_core::directive::{ActionResult, MessagePayload, SessionMutation, TablePayload};
use tutor_core::{ActionCatalog, Resource};

/// Stable action identifiers, as the host dialogue runtime knows them.
pub mod ids {
    pub const SEARCH_COURSES: &str = "course.search";
    pub const ENROLL_COURSE: &str = "course.enroll";
    pub const APPROVE_RESOURCE: &str = "resource.approve";
    pub const CREATE_CATEGORY: &str = "category.create";
}

/// Build the full action catalog. Called once at process start.
pub fn build_catalog() -> ActionCatalog {
    let mut catalog = ActionCatalog::new();
    catalog.register(ids::SEARCH_COURSES, Arc::new(SearchCourses));
    catalog.register(ids::ENROLL_COURSE, Arc::new(EnrollCourse));
    catalog.register(ids::APPROVE_RESOURCE, Arc::new(ApproveResource));
    catalog.register(ids::CREATE_CATEGORY, Arc::new(CreateCategory));
    tracing::debug!(actions = catalog.len(), "action catalog built");
    catalog
}

/// Shared "did you mean" directive: stage the top suggestion for
/// confirmation and show the ranked alternatives.
pub(crate) fn suggest(
    column: &str,
    asked: &str,
    suggestions: &[Resource],
) -> ActionResult {
    let top = suggestions[0].name.clone();
    let table = TablePayload::single_column(
        column,
        suggestions.iter().map(|r| r.name.clone()).collect(),
    );
    ActionResult::new()
        .mutate(SessionMutation::SetLikelyResource { name: top.clone() })
        .with_message(
            MessagePayload::text(format!(
                "I couldn't find \"{asked}\". Did you mean {top}?"
            ))
            .with_table(table),
        )
}

/// Shared generic-failure directive for an unreachable catalog.
pub(crate) fn backend_trouble() -> ActionResult {
    ActionResult::say("Something went wrong while reaching the catalog. Please try again.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::ActionId;

    #[test]
    fn catalog_contains_every_action() {
        let catalog = build_catalog();
        assert_eq!(catalog.len(), 4);
        for id in [
            ids::SEARCH_COURSES,
            ids::ENROLL_COURSE,
            ids::APPROVE_RESOURCE,
            ids::CREATE_CATEGORY,
        ] {
            assert!(
                catalog.lookup(&ActionId::from(id)).is_some(),
                "missing {id}"
            );
        }
    }

    #[test]
    fn suggest_stages_the_top_suggestion() {
        let suggestions = vec![Resource::named("Python Basics"), Resource::named("Go 101")];
        let result = suggest("Course", "Pyhton", &suggestions);
        assert!(matches!(
            result.mutations[0],
            SessionMutation::SetLikelyResource { ref name } if name == "Python Basics"
        ));
        let message = result.message.unwrap();
        assert!(message.text.contains("Pyhton"));
        assert_eq!(message.table.unwrap().rows.len(), 2);
    }
}
