//! Decision layer behind the tutor assistant.
//!
//! Given a named action to execute for a conversation, this crate decides
//! whether the caller may run it, suspends it behind an interactive login
//! when they may not, and resumes it once a credential is obtained. User
//! supplied catalog names (courses, categories, resources) are resolved
//! against the remote catalog with "did you mean" suggestions when no
//! exact match exists.
//!
//! ## Architecture
//!
//! ```text
//! host runtime → Dispatcher → Capability Gate → perform
//!                    ↓ (credential missing)
//!              Pending-Action Coordinator ⇄ Login Orchestrator
//!                    ↓ (credential obtained)
//!              re-check condition → resume original action
//! ```
//!
//! The crate owns no I/O besides the [`backend::BackendClient`] boundary
//! and emits structured directives ([`directive::ActionResult`]) instead
//! of rendering output itself. Sessions are mutated only by applying those
//! directives, so an abandoned turn leaves the session untouched.

#![warn(clippy::all)]

pub mod backend;
pub mod capability;
pub mod catalog;
pub mod directive;
pub mod dispatcher;
pub mod error;
pub mod login;
pub mod pending;
pub mod resolver;
pub mod session;

pub use backend::{
    BackendClient, BackendError, HttpBackend, LoginReply, MemoryBackend, MutationCall,
    MutationReply, PrivilegeLevel, Resource, ResourceKind, SimilarLookup,
};
pub use capability::{
    check_condition, evaluate, AccessRequirement, Capability, CapabilityContext, Denial,
    GateOutcome,
};
pub use catalog::{ActionCatalog, ActionId};
pub use directive::{ActionResult, FollowUp, Link, MessagePayload, SessionMutation, TablePayload};
pub use dispatcher::Dispatcher;
pub use error::{AuthError, CoreError};
pub use pending::PendingState;
pub use resolver::{resolve, ResolutionOutcome};
pub use session::{Credential, RecentEntity, Session, SessionStore};
