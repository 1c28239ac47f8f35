//! Per-conversation session state.
//!
//! One [`Session`] exists per sender id. Components never mutate a
//! session in place; they return [`SessionMutation`]s inside an
//! [`crate::directive::ActionResult`], and the host applies the whole
//! result (or nothing, when a turn is abandoned).

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::backend::ResourceKind;
use crate::catalog::ActionId;
use crate::directive::{ActionResult, SessionMutation};

/// How many recently offered catalog entries a session remembers.
const RECENT_ENTITY_LIMIT: usize = 10;

/// Opaque authentication token issued by the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for handing to the backend.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens must not end up in logs
        f.write_str("Credential(***)")
    }
}

/// A catalog entry recently offered to the user, usable as the referent
/// of "it" / "the first one".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentEntity {
    pub kind: ResourceKind,
    pub name: String,
}

/// Per-conversation mutable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Conversation owner (host runtime sender id)
    pub sender_id: String,
    /// Credential from the last successful login, if any
    pub credential: Option<Credential>,
    /// Display name reported by the backend at login
    pub display_name: Option<String>,
    /// The action waiting on a fresh credential. At most one; a new
    /// suspension overwrites the old (no nested suspension).
    pub pending_action: Option<ActionId>,
    /// Non-empty while a multi-turn form is collecting slots
    pub active_dialog: Option<String>,
    /// Recently offered catalog entries, most recent first
    pub recent_entities: Vec<RecentEntity>,
    /// Last fuzzy-match suggestion awaiting confirmation
    pub likely_resource: Option<String>,
    /// Opaque slots owned by the host dialogue runtime
    pub slots: HashMap<String, serde_json::Value>,
    /// First turn of the conversation
    pub started_at: DateTime<Utc>,
    /// Last applied directive
    pub last_active: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session for a sender.
    pub fn new(sender_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            sender_id: sender_id.into(),
            credential: None,
            display_name: None,
            pending_action: None,
            active_dialog: None,
            recent_entities: Vec::new(),
            likely_resource: None,
            slots: HashMap::new(),
            started_at: now,
            last_active: now,
        }
    }

    /// Whether a credential is stored.
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// The most recently offered entity of the given kind.
    pub fn recent_of_kind(&self, kind: ResourceKind) -> Option<&RecentEntity> {
        self.recent_entities.iter().find(|e| e.kind == kind)
    }

    /// A slot value as a non-empty string.
    pub fn slot_str(&self, name: &str) -> Option<&str> {
        self.slots
            .get(name)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Resolve what the user is referring to, in fallback order: the
    /// likely-name suggestion awaiting confirmation, then the explicit
    /// slot value, then the most recent entity of the kind.
    pub fn referent(&self, kind: ResourceKind, slot: &str) -> Option<String> {
        self.likely_resource
            .as_deref()
            .or_else(|| self.slot_str(slot))
            .map(str::to_owned)
            .or_else(|| self.recent_of_kind(kind).map(|e| e.name.clone()))
    }

    /// Apply one mutation.
    pub fn apply(&mut self, mutation: &SessionMutation) {
        match mutation {
            SessionMutation::SetCredential { credential } => {
                self.credential = Some(credential.clone());
            }
            SessionMutation::ClearCredential => {
                self.credential = None;
                self.display_name = None;
            }
            SessionMutation::SetDisplayName { name } => {
                self.display_name = Some(name.clone());
            }
            SessionMutation::SetPendingAction { action } => {
                // Overwrites any previous pending action by design of the
                // state machine: suspensions never stack.
                self.pending_action = Some(action.clone());
            }
            SessionMutation::ClearPendingAction => {
                self.pending_action = None;
            }
            SessionMutation::SetActiveDialog { dialog } => {
                self.active_dialog = Some(dialog.clone());
            }
            SessionMutation::ClearActiveDialog => {
                self.active_dialog = None;
            }
            SessionMutation::RememberEntity { kind, name } => {
                self.recent_entities
                    .retain(|e| !(e.kind == *kind && e.name == *name));
                self.recent_entities.insert(
                    0,
                    RecentEntity {
                        kind: *kind,
                        name: name.clone(),
                    },
                );
                self.recent_entities.truncate(RECENT_ENTITY_LIMIT);
            }
            SessionMutation::SetLikelyResource { name } => {
                self.likely_resource = Some(name.clone());
            }
            SessionMutation::ClearLikelyResource => {
                self.likely_resource = None;
            }
            SessionMutation::SetSlot { name, value } => {
                self.slots.insert(name.clone(), value.clone());
            }
            SessionMutation::ClearSlot { name } => {
                self.slots.remove(name);
            }
        }
    }

    /// Apply a whole action result, in order, as one unit.
    pub fn apply_result(&mut self, result: &ActionResult) {
        for mutation in &result.mutations {
            self.apply(mutation);
        }
        self.last_active = Utc::now();
    }
}

/// In-memory store of sessions keyed by sender id.
///
/// The host runtime serializes turns per sender, so `load` hands out a
/// clone to work on and `save` writes it back only once the turn's
/// directives have been applied - an abandoned turn changes nothing.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the session for a sender, creating it on first contact.
    pub async fn load(&self, sender_id: &str) -> Session {
        if let Some(session) = self.sessions.read().await.get(sender_id) {
            return session.clone();
        }
        let session = Session::new(sender_id);
        self.sessions
            .write()
            .await
            .entry(sender_id.to_string())
            .or_insert_with(|| session.clone());
        session
    }

    /// Persist a session after a completed turn.
    pub async fn save(&self, session: Session) {
        self.sessions
            .write()
            .await
            .insert(session.sender_id.clone(), session);
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
