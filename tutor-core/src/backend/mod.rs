//! Remote catalog/service boundary.
//!
//! Everything the decision layer needs from the outside world goes
//! through [`BackendClient`]: fuzzy catalog lookup, login, privilege
//! checks, and the kind-specific mutation calls. Transport, serialization
//! and endpoint shape live behind this trait; callers apply their own
//! retry policy around it (nothing here retries implicitly - enroll and
//! approve are not idempotent).

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::MemoryBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::session::Credential;

/// Error type for backend operations.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport failure - the backend could not be reached
    #[error("backend unreachable: {0}")]
    Unavailable(String),

    /// The backend answered with an error status
    #[error("backend error: {status} - {message}")]
    Server { status: u16, message: String },

    /// The backend answered with something we could not decode
    #[error("malformed backend reply: {0}")]
    Malformed(String),
}

/// The kinds of catalog entries the assistant can talk about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Course,
    Category,
    Language,
    Resource,
}

impl ResourceKind {
    /// Get the kind as a string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Category => "category",
            Self::Language => "language",
            Self::Resource => "resource",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named authorization tier checked against a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeLevel {
    Admin,
    Author,
}

impl PrivilegeLevel {
    /// Get the level as a string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Author => "author",
        }
    }
}

impl fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Backend row id, when known
    #[serde(default)]
    pub id: Option<i64>,
    /// Display name
    pub name: String,
}

impl Resource {
    /// A resource known only by name (e.g. recalled from the session).
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// Reply to a similarity lookup. The backend ranks server-side; the
/// suggestion list is already ordered best-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimilarLookup {
    /// Exact match, when one exists
    #[serde(default)]
    pub exact: Option<Resource>,
    /// Ranked near-misses within the similarity threshold
    #[serde(default)]
    pub suggestions: Vec<Resource>,
}

/// Reply to a login call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginReply {
    pub success: bool,
    /// Issued credential, present on success
    #[serde(default)]
    pub credential: Option<Credential>,
    /// Display name of the account, present on success
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Reply to a mutation call. On failure, `extras` carries ranked
/// near-misses for "did you mean" recovery.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationReply {
    pub success: bool,
    #[serde(default)]
    pub extras: Vec<Resource>,
}

/// Kind-specific mutation calls against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MutationCall {
    /// Enroll the authenticated user in a course
    Enroll { course: String },
    /// Approve a submitted resource
    Approve { resource: String },
    /// Create a catalog entry
    Create { kind: ResourceKind, name: String },
    /// Rename a catalog entry
    Rename {
        kind: ResourceKind,
        from: String,
        to: String,
    },
    /// Delete a catalog entry
    Delete { kind: ResourceKind, name: String },
}

impl MutationCall {
    /// The catalog kind this call operates on.
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Enroll { .. } => ResourceKind::Course,
            Self::Approve { .. } => ResourceKind::Resource,
            Self::Create { kind, .. } | Self::Rename { kind, .. } | Self::Delete { kind, .. } => {
                *kind
            }
        }
    }

    /// The entry name the call targets.
    pub fn subject(&self) -> &str {
        match self {
            Self::Enroll { course } => course,
            Self::Approve { resource } => resource,
            Self::Create { name, .. } | Self::Delete { name, .. } => name,
            Self::Rename { from, .. } => from,
        }
    }
}

/// Abstract remote catalog/service.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Similarity lookup for a user-supplied name. The credential is
    /// threaded through for privileged catalogs.
    async fn lookup_similar(
        &self,
        kind: ResourceKind,
        name: &str,
        credential: Option<&Credential>,
    ) -> Result<SimilarLookup, BackendError>;

    /// Authenticate with username-or-email and password.
    async fn login(&self, identifier: &str, password: &str) -> Result<LoginReply, BackendError>;

    /// Check whether a credential carries the given privilege level.
    async fn check_privilege(
        &self,
        credential: &Credential,
        level: PrivilegeLevel,
    ) -> Result<bool, BackendError>;

    /// Execute a kind-specific mutation.
    async fn apply(
        &self,
        call: &MutationCall,
        credential: Option<&Credential>,
    ) -> Result<MutationReply, BackendError>;
}
