//! Fuzzy resolution of user-supplied catalog names.
//!
//! The backend ranks similar entries server-side; the resolver adds the
//! empty-name fallback to recently offered entities and maps transport
//! trouble to a degraded miss. It is stateless - suggestion bookkeeping
//! (`likely_resource`, confirmation prompts) is the calling capability's
//! job.

use crate::backend::{BackendClient, Resource, ResourceKind};
use crate::session::{Credential, Session};

/// Result of a fuzzy lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    /// Exact match
    Found(Resource),
    /// No exact match. `suggestions` is empty only when the catalog has
    /// no entry within the similarity threshold; `degraded` marks a
    /// backend failure rather than a true empty-catalog miss.
    NotFound {
        suggestions: Vec<Resource>,
        degraded: bool,
    },
}

impl ResolutionOutcome {
    /// A plain miss with no suggestions.
    pub fn miss() -> Self {
        Self::NotFound {
            suggestions: Vec::new(),
            degraded: false,
        }
    }

    /// Whether an exact match was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Resolve a user-given name against the catalog.
///
/// An empty `name` falls back to the most recently offered entity of the
/// same kind, without any remote call; when none exists the caller must
/// prompt the user for a name.
pub async fn resolve(
    backend: &dyn BackendClient,
    session: &Session,
    kind: ResourceKind,
    name: &str,
    credential: Option<&Credential>,
) -> ResolutionOutcome {
    let name = name.trim();
    if name.is_empty() {
        return match session.recent_of_kind(kind) {
            Some(entity) => ResolutionOutcome::Found(Resource::named(entity.name.clone())),
            None => ResolutionOutcome::miss(),
        };
    }

    match backend.lookup_similar(kind, name, credential).await {
        Ok(lookup) => match lookup.exact {
            Some(resource) => ResolutionOutcome::Found(resource),
            None => ResolutionOutcome::NotFound {
                suggestions: lookup.suggestions,
                degraded: false,
            },
        },
        Err(error) => {
            tracing::warn!(%kind, name, %error, "catalog lookup failed");
            ResolutionOutcome::NotFound {
                suggestions: Vec::new(),
                degraded: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::directive::SessionMutation;

    fn seeded_backend() -> MemoryBackend {
        MemoryBackend::new().with_catalog(
            ResourceKind::Course,
            &["Python Basics", "Go 101", "Rust Fundamentals"],
        )
    }

    #[tokio::test]
    async fn exact_match_is_found() {
        let backend = seeded_backend();
        let session = Session::new("alice");
        let outcome = resolve(&backend, &session, ResourceKind::Course, "Go 101", None).await;
        match outcome {
            ResolutionOutcome::Found(resource) => assert_eq!(resource.name, "Go 101"),
            other => panic!("expected exact match, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn misspelling_yields_suggestions_not_a_match() {
        let backend = seeded_backend();
        let session = Session::new("alice");
        let outcome = resolve(&backend, &session, ResourceKind::Course, "Pyhton", None).await;
        match outcome {
            ResolutionOutcome::NotFound {
                suggestions,
                degraded,
            } => {
                assert!(!degraded);
                assert_eq!(suggestions[0].name, "Python Basics");
            }
            other => panic!("expected suggestions, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_name_falls_back_to_recent_entity_without_remote_call() {
        // An offline backend would fail any remote call, proving the
        // fallback never leaves the session.
        let backend = seeded_backend();
        backend.set_offline(true);

        let mut session = Session::new("alice");
        session.apply(&SessionMutation::RememberEntity {
            kind: ResourceKind::Course,
            name: "Go 101".into(),
        });

        let outcome = resolve(&backend, &session, ResourceKind::Course, "", None).await;
        match outcome {
            ResolutionOutcome::Found(resource) => assert_eq!(resource.name, "Go 101"),
            other => panic!("expected recent-entity fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_name_without_recents_is_a_plain_miss() {
        let backend = seeded_backend();
        let session = Session::new("alice");
        let outcome = resolve(&backend, &session, ResourceKind::Course, "  ", None).await;
        assert_eq!(outcome, ResolutionOutcome::miss());
    }

    #[tokio::test]
    async fn recent_entity_of_other_kind_does_not_count() {
        let backend = seeded_backend();
        backend.set_offline(true);
        let mut session = Session::new("alice");
        session.apply(&SessionMutation::RememberEntity {
            kind: ResourceKind::Category,
            name: "Databases".into(),
        });
        let outcome = resolve(&backend, &session, ResourceKind::Course, "", None).await;
        assert_eq!(outcome, ResolutionOutcome::miss());
    }

    #[tokio::test]
    async fn backend_failure_is_a_degraded_miss() {
        let backend = seeded_backend();
        backend.set_offline(true);
        let session = Session::new("alice");
        let outcome = resolve(&backend, &session, ResourceKind::Course, "Go 101", None).await;
        match outcome {
            ResolutionOutcome::NotFound {
                suggestions,
                degraded,
            } => {
                assert!(degraded);
                assert!(suggestions.is_empty());
            }
            other => panic!("expected degraded miss, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unrelated_name_is_a_plain_miss() {
        let backend = seeded_backend();
        let session = Session::new("alice");
        let outcome = resolve(
            &backend,
            &session,
            ResourceKind::Course,
            "Underwater Basket Weaving",
            None,
        )
        .await;
        match outcome {
            ResolutionOutcome::NotFound {
                suggestions,
                degraded,
            } => {
                assert!(!degraded);
                assert!(suggestions.is_empty());
            }
            other => panic!("expected plain miss, got {other:?}"),
        }
    }
}
