//! Pending-action coordinator: the deferred-execution state machine.
//!
//! States: **Idle** (no pending action), **Suspended** (an action is
//! parked while the user signs in), and a transient **Resuming** step
//! inside [`resume`] where the stored capability's condition is
//! re-checked against the fresh credential. Suspensions never stack -
//! a new one overwrites the old.

use crate::capability::{self, CapabilityContext, Denial};
use crate::catalog::{ActionCatalog, ActionId};
use crate::directive::{ActionResult, FollowUp, MessagePayload, SessionMutation};
use crate::error::CoreError;
use crate::login;
use crate::session::{Credential, Session};

/// Observable coordinator state, derived from the session.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingState {
    Idle,
    Suspended(ActionId),
}

/// Current state for a session.
pub fn state(session: &Session) -> PendingState {
    match &session.pending_action {
        Some(action) => PendingState::Suspended(action.clone()),
        None => PendingState::Idle,
    }
}

/// Idle → Suspended: park the action and open the credential dialogue.
///
/// Only called for denials that a login can cure; other condition
/// failures are surfaced directly by the dispatcher.
pub fn suspend(action: &ActionId, denial: &Denial) -> ActionResult {
    debug_assert!(denial.needs_login());
    ActionResult {
        mutations: vec![
            SessionMutation::SetPendingAction {
                action: action.clone(),
            },
            SessionMutation::SetActiveDialog {
                dialog: login::LOGIN_DIALOG.to_string(),
            },
        ],
        message: Some(MessagePayload::text(format!(
            "{} Let's get you signed in.",
            denial.message()
        ))),
        follow_up: Some(FollowUp::Dialog {
            dialog: login::LOGIN_DIALOG.to_string(),
        }),
    }
}

/// Suspended → Resuming → Idle | Suspended: take a freshly obtained
/// credential, re-check the stored capability's condition, and either
/// run it or re-suspend it.
///
/// With no pending action the login is simply acknowledged; nothing is
/// performed. A pending id with no registered capability is a fatal
/// configuration error ([`CoreError::InvalidPendingAction`]), never
/// silently ignored.
pub async fn resume(
    catalog: &ActionCatalog,
    backend: &dyn crate::backend::BackendClient,
    session: &Session,
    credential: Credential,
    display_name: Option<String>,
) -> Result<ActionResult, CoreError> {
    // The login's own mutations: store the identity, drop the collected
    // form slots so stale values can never be resubmitted, close the form.
    let mut login_mutations = vec![SessionMutation::SetCredential {
        credential: credential.clone(),
    }];
    if let Some(name) = &display_name {
        login_mutations.push(SessionMutation::SetDisplayName { name: name.clone() });
    }
    login_mutations.extend([
        SessionMutation::ClearSlot {
            name: login::IDENTIFIER_SLOT.to_string(),
        },
        SessionMutation::ClearSlot {
            name: login::PASSWORD_SLOT.to_string(),
        },
        SessionMutation::ClearActiveDialog,
    ]);

    let greeting = match &display_name {
        Some(name) => format!("You're signed in as {name}."),
        None => "You're signed in.".to_string(),
    };

    let Some(action) = session.pending_action.clone() else {
        return Ok(ActionResult {
            mutations: login_mutations,
            message: Some(MessagePayload::text(greeting)),
            follow_up: None,
        });
    };

    let Some(capability) = catalog.lookup(&action) else {
        tracing::error!(%action, "pending action has no registered capability");
        return Err(CoreError::InvalidPendingAction(action));
    };

    let ctx = CapabilityContext::new(session, backend).with_credential(&credential);
    match capability::check_condition(capability.as_ref(), &ctx).await? {
        None => {
            tracing::info!(%action, "resuming pending action after login");
            let mut result = capability.perform(&ctx).await?;
            login_mutations.push(SessionMutation::ClearPendingAction);
            result.prepend_mutations(login_mutations);
            Ok(result)
        }
        Some(denial) if denial.needs_login() => {
            // Still not enough: the account authenticated but lacks what
            // the action demands. Re-enter Suspended with the form state
            // cleared so the user can try a different account.
            tracing::info!(%action, ?denial, "re-suspending after login");
            Ok(ActionResult {
                mutations: login_mutations,
                message: Some(MessagePayload::text(format!(
                    "{} You can sign in with a different account.",
                    denial.message()
                ))),
                follow_up: Some(FollowUp::Dialog {
                    dialog: login::LOGIN_DIALOG.to_string(),
                }),
            })
        }
        Some(denial) => {
            // A non-credential precondition failed; logging in again
            // would not help, so drop the pending action.
            login_mutations.push(SessionMutation::ClearPendingAction);
            Ok(ActionResult {
                mutations: login_mutations,
                message: Some(MessagePayload::text(denial.message())),
                follow_up: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendClient, MemoryBackend, PrivilegeLevel};
    use crate::capability::{AccessRequirement, Capability};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Gated {
        requirement: AccessRequirement,
        performed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Capability for Gated {
        fn requirement(&self) -> AccessRequirement {
            self.requirement
        }

        async fn perform(
            &self,
            _ctx: &CapabilityContext<'_>,
        ) -> Result<ActionResult, CoreError> {
            self.performed.fetch_add(1, Ordering::SeqCst);
            Ok(ActionResult::say("enrolled"))
        }
    }

    fn catalog_with(
        id: &str,
        requirement: AccessRequirement,
    ) -> (ActionCatalog, Arc<AtomicUsize>) {
        let performed = Arc::new(AtomicUsize::new(0));
        let mut catalog = ActionCatalog::new();
        catalog.register(
            id,
            Arc::new(Gated {
                requirement,
                performed: performed.clone(),
            }),
        );
        (catalog, performed)
    }

    async fn login_as(
        backend: &MemoryBackend,
        identifier: &str,
        password: &str,
    ) -> (Credential, Option<String>) {
        let reply = backend.login(identifier, password).await.unwrap();
        (reply.credential.unwrap(), reply.display_name)
    }

    #[test]
    fn state_follows_pending_action() {
        let mut session = Session::new("alice");
        assert_eq!(state(&session), PendingState::Idle);
        session.pending_action = Some(ActionId::from("course.enroll"));
        assert_eq!(
            state(&session),
            PendingState::Suspended(ActionId::from("course.enroll"))
        );
    }

    #[test]
    fn suspend_parks_action_and_opens_login() {
        let result = suspend(&ActionId::from("course.enroll"), &Denial::CredentialRequired);
        let mut session = Session::new("alice");
        session.apply_result(&result);
        assert_eq!(session.pending_action, Some(ActionId::from("course.enroll")));
        assert_eq!(session.active_dialog.as_deref(), Some(login::LOGIN_DIALOG));
        assert!(matches!(result.follow_up, Some(FollowUp::Dialog { .. })));
    }

    #[tokio::test]
    async fn resume_without_pending_action_performs_nothing() {
        let backend = MemoryBackend::new().with_account("a@x.io", "pw", "Alice", &[]);
        let (catalog, performed) = catalog_with("course.enroll", AccessRequirement::Authenticated);
        let session = Session::new("alice");

        let (credential, name) = login_as(&backend, "a@x.io", "pw").await;
        let result = resume(&catalog, &backend, &session, credential, name)
            .await
            .unwrap();

        assert_eq!(performed.load(Ordering::SeqCst), 0);
        assert_eq!(result.message.unwrap().text, "You're signed in as Alice.");
        assert!(result.follow_up.is_none());
    }

    #[tokio::test]
    async fn resume_success_performs_and_clears_pending() {
        let backend = MemoryBackend::new().with_account("a@x.io", "pw", "Alice", &[]);
        let (catalog, performed) = catalog_with("course.enroll", AccessRequirement::Authenticated);

        let mut session = Session::new("alice");
        session.apply_result(&suspend(
            &ActionId::from("course.enroll"),
            &Denial::CredentialRequired,
        ));

        let (credential, name) = login_as(&backend, "a@x.io", "pw").await;
        let result = resume(&catalog, &backend, &session, credential, name)
            .await
            .unwrap();
        session.apply_result(&result);

        assert_eq!(performed.load(Ordering::SeqCst), 1);
        assert!(session.pending_action.is_none());
        assert!(session.is_authenticated());
        assert!(session.active_dialog.is_none());
        assert_eq!(result.message.unwrap().text, "enrolled");
    }

    #[tokio::test]
    async fn resume_retry_path_resuspends_and_clears_form_state() {
        let backend = MemoryBackend::new().with_account("user@x.io", "pw", "Plain User", &[]);
        let (catalog, performed) = catalog_with(
            "resource.approve",
            AccessRequirement::Privileged(PrivilegeLevel::Admin),
        );

        let mut session = Session::new("alice");
        session.apply_result(&suspend(
            &ActionId::from("resource.approve"),
            &Denial::CredentialRequired,
        ));
        // Half-filled form state from the login dialogue
        session.apply(&SessionMutation::SetSlot {
            name: login::IDENTIFIER_SLOT.into(),
            value: serde_json::json!("user@x.io"),
        });

        let (credential, name) = login_as(&backend, "user@x.io", "pw").await;
        let result = resume(&catalog, &backend, &session, credential, name)
            .await
            .unwrap();
        session.apply_result(&result);

        // Still suspended on the same action, but the form state is gone
        assert_eq!(performed.load(Ordering::SeqCst), 0);
        assert_eq!(
            session.pending_action,
            Some(ActionId::from("resource.approve"))
        );
        assert!(session.active_dialog.is_none());
        assert!(session.slots.get(login::IDENTIFIER_SLOT).is_none());
        // The under-privileged account stays signed in
        assert!(session.is_authenticated());
        assert!(matches!(result.follow_up, Some(FollowUp::Dialog { .. })));
    }

    #[tokio::test]
    async fn resume_with_dangling_pending_id_is_fatal() {
        let backend = MemoryBackend::new().with_account("a@x.io", "pw", "Alice", &[]);
        let catalog = ActionCatalog::new();

        let mut session = Session::new("alice");
        session.pending_action = Some(ActionId::from("ghost.action"));

        let (credential, name) = login_as(&backend, "a@x.io", "pw").await;
        let err = resume(&catalog, &backend, &session, credential, name)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidPendingAction(_)));
        assert!(err.is_defect());
    }
}
