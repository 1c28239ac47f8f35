//! Resource actions: approval of submitted material.

use async_trait::async_trait;

use tutor_core::directive::{ActionResult, MessagePayload, SessionMutation};
use tutor_core::{
    resolve, AccessRequirement, Capability, CapabilityContext, CoreError, MutationCall,
    PrivilegeLevel, ResolutionOutcome, ResourceKind,
};

use crate::{backend_trouble, suggest};

/// Approve a submitted resource. Admin only.
pub struct ApproveResource;

#[async_trait]
impl Capability for ApproveResource {
    fn requirement(&self) -> AccessRequirement {
        AccessRequirement::Privileged(PrivilegeLevel::Admin)
    }

    async fn perform(&self, ctx: &CapabilityContext<'_>) -> Result<ActionResult, CoreError> {
        let Some(name) = ctx.session.referent(ResourceKind::Resource, "resource") else {
            return Ok(ActionResult::say("Which resource should I approve?"));
        };

        match resolve(
            ctx.backend,
            ctx.session,
            ResourceKind::Resource,
            &name,
            ctx.credential(),
        )
        .await
        {
            ResolutionOutcome::Found(resource) => {
                let call = MutationCall::Approve {
                    resource: resource.name.clone(),
                };
                let reply = ctx.backend.apply(&call, ctx.credential()).await?;
                if reply.success {
                    Ok(ActionResult::new()
                        .mutate(SessionMutation::RememberEntity {
                            kind: ResourceKind::Resource,
                            name: resource.name.clone(),
                        })
                        .mutate(SessionMutation::ClearLikelyResource)
                        .with_message(MessagePayload::text(format!(
                            "{} is approved.",
                            resource.name
                        ))))
                } else if reply.extras.is_empty() {
                    Ok(ActionResult::say(format!(
                        "I couldn't approve {}.",
                        resource.name
                    )))
                } else {
                    Ok(suggest("Resource", &resource.name, &reply.extras))
                }
            }
            ResolutionOutcome::NotFound {
                suggestions,
                degraded: false,
            } if !suggestions.is_empty() => Ok(suggest("Resource", &name, &suggestions)),
            ResolutionOutcome::NotFound { degraded: true, .. } => Ok(backend_trouble()),
            ResolutionOutcome::NotFound { .. } => Ok(ActionResult::say(format!(
                "I couldn't find a resource called \"{name}\"."
            ))),
        }
    }
}
