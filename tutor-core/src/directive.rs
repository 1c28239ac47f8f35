//! Directives: the structured output of every action execution.
//!
//! The core never renders text templates or HTML. It emits an
//! [`ActionResult`] - an ordered list of session mutations, at most one
//! outbound message payload, and at most one follow-up - and the
//! presentation layer turns that into whatever the channel needs.

use serde::{Deserialize, Serialize};

use crate::backend::ResourceKind;
use crate::catalog::ActionId;
use crate::session::Credential;

/// One staged change to a [`crate::session::Session`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionMutation {
    SetCredential { credential: Credential },
    ClearCredential,
    SetDisplayName { name: String },
    SetPendingAction { action: ActionId },
    ClearPendingAction,
    SetActiveDialog { dialog: String },
    ClearActiveDialog,
    RememberEntity { kind: ResourceKind, name: String },
    SetLikelyResource { name: String },
    ClearLikelyResource,
    SetSlot { name: String, value: serde_json::Value },
    ClearSlot { name: String },
}

/// A link affordance attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

/// A tabular affordance attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePayload {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TablePayload {
    /// Single-column table, one row per entry.
    pub fn single_column(column: impl Into<String>, rows: Vec<String>) -> Self {
        Self {
            columns: vec![column.into()],
            rows: rows.into_iter().map(|r| vec![r]).collect(),
        }
    }
}

/// Outbound message payload: free text plus at most one link and at most
/// one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<TablePayload>,
}

impl MessagePayload {
    /// A plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: None,
            table: None,
        }
    }

    /// Attach a table.
    pub fn with_table(mut self, table: TablePayload) -> Self {
        self.table = Some(table);
        self
    }

    /// Attach a link.
    pub fn with_link(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.link = Some(Link {
            label: label.into(),
            url: url.into(),
        });
        self
    }
}

/// The next action or dialogue step the host runtime should invoke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FollowUp {
    /// Dispatch another registered action
    Action { action: ActionId },
    /// Enter a multi-turn dialogue/form
    Dialog { dialog: String },
}

/// The unit of execution output.
///
/// Mutations are applied atomically to the session before any follow-up
/// is dispatched; see [`crate::session::Session::apply_result`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub mutations: Vec<SessionMutation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessagePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<FollowUp>,
}

impl ActionResult {
    /// An empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// A result carrying only a plain text message.
    pub fn say(text: impl Into<String>) -> Self {
        Self {
            message: Some(MessagePayload::text(text)),
            ..Self::default()
        }
    }

    /// Add a staged mutation.
    pub fn mutate(mut self, mutation: SessionMutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    /// Set the message payload.
    pub fn with_message(mut self, message: MessagePayload) -> Self {
        self.message = Some(message);
        self
    }

    /// Set the follow-up.
    pub fn then(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = Some(follow_up);
        self
    }

    /// Splice earlier-staged mutations in front of this result's own
    /// (used when merging login mutations with a resumed action).
    pub fn prepend_mutations(&mut self, mut mutations: Vec<SessionMutation>) {
        mutations.append(&mut self.mutations);
        self.mutations = mutations;
    }
}
