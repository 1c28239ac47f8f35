//! Login orchestrator: drives the credential-collection sub-dialogue.
//!
//! [`verify`] is the pure authentication step; [`handle_login`] wraps it
//! with the dialogue behavior - re-prompting for missing fields,
//! clearing stale form slots on rejection, and handing a fresh
//! credential to the pending-action coordinator.

use crate::backend::{BackendClient, BackendError};
use crate::catalog::ActionCatalog;
use crate::directive::{ActionResult, FollowUp, MessagePayload, SessionMutation};
use crate::error::{AuthError, CoreError};
use crate::pending;
use crate::session::{Credential, Session};

/// Dialogue id of the credential-collection form.
pub const LOGIN_DIALOG: &str = "login_details";

/// Session slot the form collects the username-or-email into.
pub const IDENTIFIER_SLOT: &str = "login_identifier";

/// Session slot the form collects the password into.
pub const PASSWORD_SLOT: &str = "login_password";

/// A successful authentication.
#[derive(Debug)]
pub struct AuthSuccess {
    pub credential: Credential,
    pub display_name: Option<String>,
}

/// Authenticate against the backend.
///
/// Distinguishes a rejection ([`AuthError::InvalidCredentials`]) from a
/// transport failure ([`AuthError::Backend`]).
pub async fn verify(
    backend: &dyn BackendClient,
    identifier: &str,
    password: &str,
) -> Result<AuthSuccess, AuthError> {
    let reply = backend.login(identifier, password).await?;
    if !reply.success {
        return Err(AuthError::InvalidCredentials);
    }
    let credential = reply.credential.ok_or_else(|| {
        AuthError::Backend(BackendError::Malformed(
            "login reply missing credential".to_string(),
        ))
    })?;
    Ok(AuthSuccess {
        credential,
        display_name: reply.display_name,
    })
}

/// Handle a submission of the credential form.
///
/// Arguments may come straight from the caller or be left `None` to fall
/// back to the collected form slots. Missing fields re-enter the form
/// instead of calling the backend. On success, control passes to
/// [`pending::resume`].
pub async fn handle_login(
    catalog: &ActionCatalog,
    backend: &dyn BackendClient,
    session: &Session,
    identifier: Option<&str>,
    password: Option<&str>,
) -> Result<ActionResult, CoreError> {
    let identifier = field(identifier, session, IDENTIFIER_SLOT);
    let password = field(password, session, PASSWORD_SLOT);

    let (Some(identifier), Some(password)) = (identifier, password) else {
        return Ok(enter_form(
            "I need your username or email, and your password.",
        ));
    };

    match verify(backend, &identifier, &password).await {
        Ok(auth) => {
            pending::resume(catalog, backend, session, auth.credential, auth.display_name).await
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::info!(sender = %session.sender_id, "login rejected by backend");
            // Drop whatever the form collected so a retry never
            // resubmits stale values.
            Ok(ActionResult {
                mutations: vec![
                    SessionMutation::ClearSlot {
                        name: IDENTIFIER_SLOT.to_string(),
                    },
                    SessionMutation::ClearSlot {
                        name: PASSWORD_SLOT.to_string(),
                    },
                ],
                message: Some(MessagePayload::text(
                    "That username or password doesn't match. Let's try again.",
                )),
                follow_up: Some(FollowUp::Dialog {
                    dialog: LOGIN_DIALOG.to_string(),
                }),
            })
        }
        Err(AuthError::Backend(error)) => Err(CoreError::Backend(error)),
    }
}

fn field(given: Option<&str>, session: &Session, slot: &str) -> Option<String> {
    given
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .or_else(|| session.slot_str(slot).map(str::to_owned))
}

fn enter_form(text: &str) -> ActionResult {
    ActionResult {
        mutations: vec![SessionMutation::SetActiveDialog {
            dialog: LOGIN_DIALOG.to_string(),
        }],
        message: Some(MessagePayload::text(text)),
        follow_up: Some(FollowUp::Dialog {
            dialog: LOGIN_DIALOG.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    #[tokio::test]
    async fn verify_success_returns_credential_and_name() {
        let backend = MemoryBackend::new().with_account("a@x.io", "pw", "Alice", &[]);
        let auth = verify(&backend, "a@x.io", "pw").await.unwrap();
        assert_eq!(auth.display_name.as_deref(), Some("Alice"));
        assert!(!auth.credential.expose().is_empty());
    }

    #[tokio::test]
    async fn verify_rejection_is_invalid_credentials() {
        let backend = MemoryBackend::new().with_account("a@x.io", "pw", "Alice", &[]);
        let err = verify(&backend, "a@x.io", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn verify_offline_is_a_backend_error() {
        let backend = MemoryBackend::new().with_account("a@x.io", "pw", "Alice", &[]);
        backend.set_offline(true);
        let err = verify(&backend, "a@x.io", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Backend(_)));
    }

    #[tokio::test]
    async fn missing_fields_reenter_form_without_backend_call() {
        let backend = MemoryBackend::new();
        backend.set_offline(true); // would error if called
        let catalog = ActionCatalog::new();
        let session = Session::new("alice");

        let result = handle_login(&catalog, &backend, &session, Some("a@x.io"), None)
            .await
            .unwrap();
        assert!(matches!(
            result.follow_up,
            Some(FollowUp::Dialog { ref dialog }) if dialog == LOGIN_DIALOG
        ));
    }

    #[tokio::test]
    async fn fields_fall_back_to_form_slots() {
        let backend = MemoryBackend::new().with_account("a@x.io", "pw", "Alice", &[]);
        let catalog = ActionCatalog::new();
        let mut session = Session::new("alice");
        session.apply(&SessionMutation::SetSlot {
            name: IDENTIFIER_SLOT.into(),
            value: serde_json::json!("a@x.io"),
        });
        session.apply(&SessionMutation::SetSlot {
            name: PASSWORD_SLOT.into(),
            value: serde_json::json!("pw"),
        });

        let result = handle_login(&catalog, &backend, &session, None, None)
            .await
            .unwrap();
        session.apply_result(&result);
        assert!(session.is_authenticated());
        assert_eq!(session.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn rejection_clears_identity_slots() {
        let backend = MemoryBackend::new().with_account("a@x.io", "pw", "Alice", &[]);
        let catalog = ActionCatalog::new();
        let mut session = Session::new("alice");
        session.apply(&SessionMutation::SetSlot {
            name: IDENTIFIER_SLOT.into(),
            value: serde_json::json!("a@x.io"),
        });
        session.apply(&SessionMutation::SetSlot {
            name: PASSWORD_SLOT.into(),
            value: serde_json::json!("wrong"),
        });

        let result = handle_login(&catalog, &backend, &session, None, None)
            .await
            .unwrap();
        session.apply_result(&result);

        assert!(!session.is_authenticated());
        assert!(session.slots.get(IDENTIFIER_SLOT).is_none());
        assert!(session.slots.get(PASSWORD_SLOT).is_none());
        assert!(matches!(result.follow_up, Some(FollowUp::Dialog { .. })));
    }

    #[tokio::test]
    async fn transport_failure_propagates_without_mutation() {
        let backend = MemoryBackend::new().with_account("a@x.io", "pw", "Alice", &[]);
        backend.set_offline(true);
        let catalog = ActionCatalog::new();
        let session = Session::new("alice");

        let err = handle_login(&catalog, &backend, &session, Some("a@x.io"), Some("pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Backend(_)));
    }
}
