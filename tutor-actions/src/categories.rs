//! Category actions: catalog administration.

use async_trait::async_trait;

use tutor_core::directive::{ActionResult, MessagePayload, SessionMutation, TablePayload};
use tutor_core::{
    AccessRequirement, Capability, CapabilityContext, CoreError, MutationCall, PrivilegeLevel,
    ResourceKind,
};

/// Create a new category. Admin only.
pub struct CreateCategory;

#[async_trait]
impl Capability for CreateCategory {
    fn requirement(&self) -> AccessRequirement {
        AccessRequirement::Privileged(PrivilegeLevel::Admin)
    }

    async fn perform(&self, ctx: &CapabilityContext<'_>) -> Result<ActionResult, CoreError> {
        let Some(name) = ctx.session.slot_str("category").map(str::to_owned) else {
            return Ok(ActionResult::say("What should the new category be called?"));
        };

        let call = MutationCall::Create {
            kind: ResourceKind::Category,
            name: name.clone(),
        };
        let reply = ctx.backend.apply(&call, ctx.credential()).await?;

        if reply.success {
            Ok(ActionResult::new()
                .mutate(SessionMutation::RememberEntity {
                    kind: ResourceKind::Category,
                    name: name.clone(),
                })
                .with_message(MessagePayload::text(format!(
                    "Created the category {name}."
                ))))
        } else if reply.extras.is_empty() {
            Ok(ActionResult::say(format!(
                "I couldn't create the category {name}."
            )))
        } else {
            // Most likely an existing entry with the same or a very
            // similar name
            let table = TablePayload::single_column(
                "Category",
                reply.extras.iter().map(|r| r.name.clone()).collect(),
            );
            Ok(ActionResult::new().with_message(
                MessagePayload::text(format!(
                    "A category like {name} already exists."
                ))
                .with_table(table),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tutor_core::{BackendClient, MemoryBackend, Session};

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_catalog(ResourceKind::Category, &["Programming"])
            .with_account("admin@x.io", "pw", "Ada", &[PrivilegeLevel::Admin])
    }

    async fn admin_session(backend: &MemoryBackend) -> Session {
        let reply = backend.login("admin@x.io", "pw").await.unwrap();
        let mut session = Session::new("ada");
        session.credential = reply.credential;
        session
    }

    #[tokio::test]
    async fn create_happy_path() {
        let backend = backend();
        let mut session = admin_session(&backend).await;
        session.slots.insert("category".into(), json!("Databases"));

        let ctx = CapabilityContext::new(&session, &backend);
        let result = CreateCategory.perform(&ctx).await.unwrap();
        session.apply_result(&result);

        assert_eq!(result.message.unwrap().text, "Created the category Databases.");
        assert_eq!(
            session.recent_of_kind(ResourceKind::Category).unwrap().name,
            "Databases"
        );
    }

    #[tokio::test]
    async fn create_duplicate_reports_existing_entry() {
        let backend = backend();
        let mut session = admin_session(&backend).await;
        session.slots.insert("category".into(), json!("Programming"));

        let ctx = CapabilityContext::new(&session, &backend);
        let result = CreateCategory.perform(&ctx).await.unwrap();
        let message = result.message.unwrap();
        assert!(message.text.contains("already exists"));
        assert_eq!(message.table.unwrap().rows[0][0], "Programming");
    }

    #[tokio::test]
    async fn create_without_name_prompts() {
        let backend = backend();
        let session = admin_session(&backend).await;
        let ctx = CapabilityContext::new(&session, &backend);
        let result = CreateCategory.perform(&ctx).await.unwrap();
        assert_eq!(
            result.message.unwrap().text,
            "What should the new category be called?"
        );
    }
}
