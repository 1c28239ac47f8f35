//! HTTP implementation of the backend client.
//!
//! Talks to the catalog service (`/chatbox`-shaped REST API). Nothing
//! here retries: a transport failure surfaces immediately as
//! [`BackendError::Unavailable`], because several of the mutation calls
//! (enroll, approve) are not idempotent.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    BackendClient, BackendError, LoginReply, MutationCall, MutationReply, PrivilegeLevel,
    ResourceKind, SimilarLookup,
};
use crate::session::Credential;

/// HTTP client for the catalog service.
#[derive(Clone)]
pub struct HttpBackend {
    base: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct PrivilegeReply {
    granted: bool,
}

impl HttpBackend {
    /// Create a client for the given base URL, e.g.
    /// "http://localhost:8000/chatbox".
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { base, client }
    }

    /// Create a client with a custom reqwest client (for tests or
    /// special transport configuration).
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self { base, client }
    }

    fn bearer(
        request: reqwest::RequestBuilder,
        credential: Option<&Credential>,
    ) -> reqwest::RequestBuilder {
        match credential {
            Some(credential) => request.bearer_auth(credential.expose()),
            None => request,
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BackendError::Server {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn lookup_similar(
        &self,
        kind: ResourceKind,
        name: &str,
        credential: Option<&Credential>,
    ) -> Result<SimilarLookup, BackendError> {
        let url = format!("{}/{}/similar", self.base, kind);
        let request = self.client.get(&url).query(&[("name", name)]);
        let response = Self::bearer(request, credential)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Self::decode(response).await
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<LoginReply, BackendError> {
        let url = format!("{}/login", self.base);
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                identifier,
                password,
            })
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Self::decode(response).await
    }

    async fn check_privilege(
        &self,
        credential: &Credential,
        level: PrivilegeLevel,
    ) -> Result<bool, BackendError> {
        let url = format!("{}/privilege/{}", self.base, level);
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        let reply: PrivilegeReply = Self::decode(response).await?;
        Ok(reply.granted)
    }

    async fn apply(
        &self,
        call: &MutationCall,
        credential: Option<&Credential>,
    ) -> Result<MutationReply, BackendError> {
        let url = format!("{}/actions", self.base);
        let request = self.client.post(&url).json(call);
        let response = Self::bearer(request, credential)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let backend = HttpBackend::new("http://localhost:8000/chatbox/", Duration::from_secs(5));
        assert_eq!(backend.base, "http://localhost:8000/chatbox");
    }

    #[tokio::test]
    async fn unreachable_backend_is_unavailable() {
        // Nothing listens on this port
        let backend = HttpBackend::new("http://127.0.0.1:1/chatbox", Duration::from_millis(200));
        let err = backend
            .lookup_similar(ResourceKind::Course, "Python", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
    }
}
