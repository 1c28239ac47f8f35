//! Dispatcher: the entry point for running an action by name.
//!
//! Looks the capability up in the catalog, runs it through the gate, and
//! either returns its result, surfaces the denial, or - when the denial
//! is one a login can cure - hands off to the pending-action
//! coordinator. The hand-off is a control transfer, not a failure.

use std::sync::Arc;

use crate::backend::BackendClient;
use crate::capability::{self, CapabilityContext, GateOutcome};
use crate::catalog::{ActionCatalog, ActionId};
use crate::directive::ActionResult;
use crate::error::CoreError;
use crate::login;
use crate::pending;
use crate::session::Session;

/// Entry point for executing registered actions against a session.
pub struct Dispatcher {
    catalog: Arc<ActionCatalog>,
    backend: Arc<dyn BackendClient>,
}

impl Dispatcher {
    pub fn new(catalog: Arc<ActionCatalog>, backend: Arc<dyn BackendClient>) -> Self {
        Self { catalog, backend }
    }

    /// The registered catalog.
    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    /// Execute an action by id.
    ///
    /// The session is read-only here; every change comes back as staged
    /// mutations inside the returned [`ActionResult`] for the caller to
    /// apply as one unit.
    pub async fn execute(
        &self,
        action: &ActionId,
        session: &Session,
    ) -> Result<ActionResult, CoreError> {
        let Some(capability) = self.catalog.lookup(action) else {
            return Err(CoreError::InvalidAction(action.clone()));
        };

        let ctx = CapabilityContext::new(session, self.backend.as_ref());
        match capability::evaluate(capability.as_ref(), &ctx).await? {
            GateOutcome::Performed(result) => Ok(result),
            GateOutcome::Denied(denial) if denial.needs_login() => {
                tracing::info!(%action, sender = %session.sender_id, "suspending action pending login");
                Ok(pending::suspend(action, &denial))
            }
            GateOutcome::Denied(denial) => {
                tracing::debug!(%action, ?denial, "condition failed");
                Ok(ActionResult::say(denial.message()))
            }
        }
    }

    /// Submit the credential form for a session; on success any pending
    /// action is resumed.
    pub async fn submit_login(
        &self,
        session: &Session,
        identifier: Option<&str>,
        password: Option<&str>,
    ) -> Result<ActionResult, CoreError> {
        login::handle_login(
            &self.catalog,
            self.backend.as_ref(),
            session,
            identifier,
            password,
        )
        .await
    }
}
