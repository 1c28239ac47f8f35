//! Capabilities and the gate that guards them.
//!
//! A capability is an executable action plus its authorization
//! precondition. The precondition side is data, not code: each
//! capability declares an [`AccessRequirement`], and the gate evaluates
//! it uniformly - credential presence locally, privilege remotely via
//! the backend. Evaluation is read-only and idempotent, safe to call
//! speculatively; `perform` runs at most once per dispatch.

use async_trait::async_trait;

use crate::backend::{BackendClient, PrivilegeLevel};
use crate::directive::ActionResult;
use crate::error::CoreError;
use crate::session::{Credential, Session};

/// What a capability demands before it may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequirement {
    /// Anyone may run it (e.g. course search)
    Open,
    /// A stored or freshly obtained credential is required
    Authenticated,
    /// A credential carrying the given privilege level is required
    Privileged(PrivilegeLevel),
}

/// Why the gate refused to run a capability.
///
/// The variants are reason codes, never matched by message text: the
/// first two route to the login flow, the third is surfaced to the user
/// as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum Denial {
    /// No credential at hand
    CredentialRequired,
    /// Authenticated, but the account lacks the required level
    PrivilegeRequired(PrivilegeLevel),
    /// Some other precondition failed
    Precondition(String),
}

impl Denial {
    /// Whether this denial should suspend the action behind a login.
    pub const fn needs_login(&self) -> bool {
        matches!(self, Self::CredentialRequired | Self::PrivilegeRequired(_))
    }

    /// User-facing explanation.
    pub fn message(&self) -> String {
        match self {
            Self::CredentialRequired => "You need to sign in first.".to_string(),
            Self::PrivilegeRequired(level) => {
                format!("That needs {level} rights on your account.")
            }
            Self::Precondition(message) => message.clone(),
        }
    }
}

/// Everything a capability may read while running: the session, the
/// backend, and the effective credential (a freshly obtained one
/// overrides whatever the session stores).
pub struct CapabilityContext<'a> {
    pub session: &'a Session,
    pub backend: &'a dyn BackendClient,
    credential_override: Option<&'a Credential>,
}

impl<'a> CapabilityContext<'a> {
    pub fn new(session: &'a Session, backend: &'a dyn BackendClient) -> Self {
        Self {
            session,
            backend,
            credential_override: None,
        }
    }

    /// Evaluate with a credential that is not (yet) stored in the
    /// session - used when resuming a pending action right after login.
    pub fn with_credential(mut self, credential: &'a Credential) -> Self {
        self.credential_override = Some(credential);
        self
    }

    /// The effective credential: the override when present, the
    /// session's stored one otherwise.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential_override
            .or(self.session.credential.as_ref())
    }
}

/// An executable action plus its authorization precondition.
#[async_trait]
pub trait Capability: Send + Sync {
    /// The access requirement the gate enforces. Defaults to open.
    fn requirement(&self) -> AccessRequirement {
        AccessRequirement::Open
    }

    /// Additional read-only precondition beyond the access requirement.
    /// Must be idempotent and free of side effects.
    async fn precondition(
        &self,
        _ctx: &CapabilityContext<'_>,
    ) -> Result<Option<Denial>, CoreError> {
        Ok(None)
    }

    /// Execute the action. Only called once the gate has passed.
    async fn perform(&self, ctx: &CapabilityContext<'_>) -> Result<ActionResult, CoreError>;
}

/// Outcome of running a capability through the gate.
#[derive(Debug)]
pub enum GateOutcome {
    /// The condition held and `perform` ran exactly once
    Performed(ActionResult),
    /// The condition failed; `perform` was not run
    Denied(Denial),
}

/// Evaluate a capability's condition without performing it.
///
/// Read-only and idempotent: calling this twice without intervening
/// state change yields the same answer.
pub async fn check_condition(
    capability: &dyn Capability,
    ctx: &CapabilityContext<'_>,
) -> Result<Option<Denial>, CoreError> {
    match capability.requirement() {
        AccessRequirement::Open => {}
        AccessRequirement::Authenticated => {
            if ctx.credential().is_none() {
                return Ok(Some(Denial::CredentialRequired));
            }
        }
        AccessRequirement::Privileged(level) => match ctx.credential() {
            None => return Ok(Some(Denial::CredentialRequired)),
            Some(credential) => {
                let granted = ctx.backend.check_privilege(credential, level).await?;
                if !granted {
                    return Ok(Some(Denial::PrivilegeRequired(level)));
                }
            }
        },
    }
    capability.precondition(ctx).await
}

/// Run a capability through the gate: evaluate the condition, then
/// either perform exactly once or report the denial unchanged.
pub async fn evaluate(
    capability: &dyn Capability,
    ctx: &CapabilityContext<'_>,
) -> Result<GateOutcome, CoreError> {
    if let Some(denial) = check_condition(capability, ctx).await? {
        return Ok(GateOutcome::Denied(denial));
    }
    Ok(GateOutcome::Performed(capability.perform(ctx).await?))
}
