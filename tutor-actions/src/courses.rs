//! Course actions: search and enrolment.

use async_trait::async_trait;

use tutor_core::directive::{ActionResult, MessagePayload, SessionMutation, TablePayload};
use tutor_core::{
    resolve, AccessRequirement, Capability, CapabilityContext, CoreError, MutationCall,
    ResolutionOutcome, ResourceKind,
};

use crate::{backend_trouble, suggest};

/// Look a course up by keyword. Open to everyone.
///
/// An empty keyword with no recent course to fall back on is reported
/// differently from a keyword that matches nothing - the host runtime
/// words the two cases differently.
pub struct SearchCourses;

#[async_trait]
impl Capability for SearchCourses {
    async fn perform(&self, ctx: &CapabilityContext<'_>) -> Result<ActionResult, CoreError> {
        let keyword = ctx
            .session
            .slot_str("keyword")
            .or_else(|| ctx.session.slot_str("course"))
            .unwrap_or("");

        match resolve(
            ctx.backend,
            ctx.session,
            ResourceKind::Course,
            keyword,
            ctx.credential(),
        )
        .await
        {
            ResolutionOutcome::Found(course) => Ok(ActionResult::new()
                .mutate(SessionMutation::RememberEntity {
                    kind: ResourceKind::Course,
                    name: course.name.clone(),
                })
                .mutate(SessionMutation::ClearLikelyResource)
                .with_message(
                    MessagePayload::text(format!("{} is in the catalog.", course.name))
                        .with_table(TablePayload::single_column(
                            "Course",
                            vec![course.name.clone()],
                        )),
                )),
            ResolutionOutcome::NotFound {
                suggestions,
                degraded: false,
            } if !suggestions.is_empty() => {
                let mut result = suggest("Course", keyword, &suggestions);
                result.mutations.push(SessionMutation::RememberEntity {
                    kind: ResourceKind::Course,
                    name: suggestions[0].name.clone(),
                });
                Ok(result)
            }
            ResolutionOutcome::NotFound { degraded: true, .. } => Ok(backend_trouble()),
            ResolutionOutcome::NotFound { .. } => {
                if keyword.is_empty() {
                    // Nothing to search for: no keyword and no recent course
                    Ok(ActionResult::say("Which course should I look for?"))
                } else {
                    Ok(ActionResult::say(format!(
                        "No courses match \"{keyword}\"."
                    )))
                }
            }
        }
    }
}

/// Enroll the user in a course. Requires a signed-in account.
pub struct EnrollCourse;

#[async_trait]
impl Capability for EnrollCourse {
    fn requirement(&self) -> AccessRequirement {
        AccessRequirement::Authenticated
    }

    async fn perform(&self, ctx: &CapabilityContext<'_>) -> Result<ActionResult, CoreError> {
        let Some(name) = ctx.session.referent(ResourceKind::Course, "course") else {
            return Ok(ActionResult::say("Which course would you like to enrol in?"));
        };

        match resolve(
            ctx.backend,
            ctx.session,
            ResourceKind::Course,
            &name,
            ctx.credential(),
        )
        .await
        {
            ResolutionOutcome::Found(course) => {
                let call = MutationCall::Enroll {
                    course: course.name.clone(),
                };
                let reply = ctx.backend.apply(&call, ctx.credential()).await?;
                if reply.success {
                    Ok(ActionResult::new()
                        .mutate(SessionMutation::RememberEntity {
                            kind: ResourceKind::Course,
                            name: course.name.clone(),
                        })
                        .mutate(SessionMutation::ClearLikelyResource)
                        .with_message(MessagePayload::text(format!(
                            "You're enrolled in {}.",
                            course.name
                        ))))
                } else if reply.extras.is_empty() {
                    Ok(ActionResult::say(format!(
                        "I couldn't enrol you in {}.",
                        course.name
                    )))
                } else {
                    // The backend refused but offered near-misses
                    Ok(suggest("Course", &course.name, &reply.extras))
                }
            }
            ResolutionOutcome::NotFound {
                suggestions,
                degraded: false,
            } if !suggestions.is_empty() => Ok(suggest("Course", &name, &suggestions)),
            ResolutionOutcome::NotFound { degraded: true, .. } => Ok(backend_trouble()),
            ResolutionOutcome::NotFound { .. } => Ok(ActionResult::say(format!(
                "I couldn't find a course called \"{name}\"."
            ))),
        }
    }
}
