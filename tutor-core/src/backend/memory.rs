//! In-process backend for tests and local development.
//!
//! Implements the full [`BackendClient`] contract against seeded data,
//! including the server-side similarity ranking the real catalog
//! performs (lowercased jaro-winkler, threshold filter, best-first,
//! truncated). An offline toggle makes every call fail with
//! [`BackendError::Unavailable`] for failure-path tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    BackendClient, BackendError, LoginReply, MutationCall, MutationReply, PrivilegeLevel,
    Resource, ResourceKind, SimilarLookup,
};
use crate::session::Credential;

/// Minimum similarity for an entry to be suggested.
const SIMILARITY_THRESHOLD: f64 = 0.78;

/// Maximum number of suggestions returned.
const MAX_SUGGESTIONS: usize = 3;

struct Account {
    password: String,
    display_name: String,
    levels: HashSet<PrivilegeLevel>,
}

/// Seeded in-memory catalog and account store.
pub struct MemoryBackend {
    catalog: RwLock<HashMap<ResourceKind, Vec<Resource>>>,
    accounts: HashMap<String, Account>,
    issued: RwLock<HashMap<String, String>>,
    next_id: AtomicI64,
    offline: AtomicBool,
}

impl MemoryBackend {
    /// An empty backend.
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(HashMap::new()),
            accounts: HashMap::new(),
            issued: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            offline: AtomicBool::new(false),
        }
    }

    /// Seed catalog entries of one kind.
    pub fn with_catalog(mut self, kind: ResourceKind, names: &[&str]) -> Self {
        let ids: Vec<i64> = names
            .iter()
            .map(|_| self.next_id.fetch_add(1, Ordering::SeqCst))
            .collect();
        let entries = self.catalog.get_mut().entry(kind).or_default();
        for (name, id) in names.iter().zip(ids) {
            entries.push(Resource {
                id: Some(id),
                name: (*name).to_string(),
            });
        }
        self
    }

    /// Seed an account.
    pub fn with_account(
        mut self,
        identifier: &str,
        password: &str,
        display_name: &str,
        levels: &[PrivilegeLevel],
    ) -> Self {
        self.accounts.insert(
            identifier.to_string(),
            Account {
                password: password.to_string(),
                display_name: display_name.to_string(),
                levels: levels.iter().copied().collect(),
            },
        );
        self
    }

    /// A backend seeded with demo data, for running the gateway without
    /// a real catalog service.
    pub fn with_demo_data() -> Self {
        Self::new()
            .with_catalog(
                ResourceKind::Course,
                &["Python Basics", "Go 101", "Rust Fundamentals", "SQL for Analysts"],
            )
            .with_catalog(ResourceKind::Category, &["Programming", "Databases"])
            .with_catalog(ResourceKind::Language, &["English", "German"])
            .with_catalog(ResourceKind::Resource, &["Intro slides", "Exercise pack"])
            .with_account("student@example.com", "student", "Sample Student", &[])
            .with_account(
                "admin@example.com",
                "admin",
                "Sample Admin",
                &[PrivilegeLevel::Admin, PrivilegeLevel::Author],
            )
    }

    /// Toggle simulated unavailability.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn guard(&self) -> Result<(), BackendError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("backend offline".to_string()));
        }
        Ok(())
    }

    /// Rank entries against a query: exact match on case-insensitive
    /// equality, otherwise jaro-winkler suggestions above the threshold.
    fn rank(entries: &[Resource], name: &str) -> SimilarLookup {
        let query = name.to_lowercase();

        if let Some(exact) = entries.iter().find(|e| e.name.to_lowercase() == query) {
            return SimilarLookup {
                exact: Some(exact.clone()),
                suggestions: Vec::new(),
            };
        }

        let mut scored: Vec<(f64, &Resource)> = entries
            .iter()
            .map(|e| (strsim::jaro_winkler(&query, &e.name.to_lowercase()), e))
            .filter(|(score, _)| *score >= SIMILARITY_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(MAX_SUGGESTIONS);

        SimilarLookup {
            exact: None,
            suggestions: scored.into_iter().map(|(_, e)| e.clone()).collect(),
        }
    }

    async fn account_for(&self, credential: &Credential) -> Option<&Account> {
        let issued = self.issued.read().await;
        let identifier = issued.get(credential.expose())?;
        self.accounts.get(identifier)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendClient for MemoryBackend {
    async fn lookup_similar(
        &self,
        kind: ResourceKind,
        name: &str,
        _credential: Option<&Credential>,
    ) -> Result<SimilarLookup, BackendError> {
        self.guard()?;
        let catalog = self.catalog.read().await;
        let entries = catalog.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
        Ok(Self::rank(entries, name))
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<LoginReply, BackendError> {
        self.guard()?;
        let Some(account) = self.accounts.get(identifier) else {
            return Ok(LoginReply {
                success: false,
                credential: None,
                display_name: None,
            });
        };
        if account.password != password {
            return Ok(LoginReply {
                success: false,
                credential: None,
                display_name: None,
            });
        }

        let token = uuid::Uuid::new_v4().to_string();
        self.issued
            .write()
            .await
            .insert(token.clone(), identifier.to_string());
        Ok(LoginReply {
            success: true,
            credential: Some(Credential::new(token)),
            display_name: Some(account.display_name.clone()),
        })
    }

    async fn check_privilege(
        &self,
        credential: &Credential,
        level: PrivilegeLevel,
    ) -> Result<bool, BackendError> {
        self.guard()?;
        Ok(self
            .account_for(credential)
            .await
            .is_some_and(|account| account.levels.contains(&level)))
    }

    async fn apply(
        &self,
        call: &MutationCall,
        _credential: Option<&Credential>,
    ) -> Result<MutationReply, BackendError> {
        self.guard()?;
        let mut catalog = self.catalog.write().await;
        let entries = catalog.entry(call.kind()).or_default();
        let subject = call.subject().to_lowercase();
        let position = entries
            .iter()
            .position(|e| e.name.to_lowercase() == subject);

        match call {
            MutationCall::Enroll { .. } | MutationCall::Approve { .. } => match position {
                Some(_) => Ok(MutationReply {
                    success: true,
                    extras: Vec::new(),
                }),
                None => Ok(MutationReply {
                    success: false,
                    extras: Self::rank(entries, call.subject()).suggestions,
                }),
            },
            MutationCall::Create { name, .. } => match position {
                Some(index) => Ok(MutationReply {
                    success: false,
                    extras: vec![entries[index].clone()],
                }),
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                    entries.push(Resource {
                        id: Some(id),
                        name: name.clone(),
                    });
                    Ok(MutationReply {
                        success: true,
                        extras: Vec::new(),
                    })
                }
            },
            MutationCall::Rename { to, .. } => match position {
                Some(index) => {
                    entries[index].name = to.clone();
                    Ok(MutationReply {
                        success: true,
                        extras: Vec::new(),
                    })
                }
                None => Ok(MutationReply {
                    success: false,
                    extras: Self::rank(entries, call.subject()).suggestions,
                }),
            },
            MutationCall::Delete { .. } => match position {
                Some(index) => {
                    entries.remove(index);
                    Ok(MutationReply {
                        success: true,
                        extras: Vec::new(),
                    })
                }
                None => Ok(MutationReply {
                    success: false,
                    extras: Self::rank(entries, call.subject()).suggestions,
                }),
            },
        }
    }
}
