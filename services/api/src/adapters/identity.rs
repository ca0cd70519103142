//! services/api/src/adapters/identity.rs
//!
//! Verifies client identity tokens against the Identity Toolkit REST API.
//! It implements the `TokenVerifier` port from the `core` crate.

use async_trait::async_trait;
use scoping_core::ports::{PortError, PortResult, TokenVerifier};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
}

/// A `TokenVerifier` that asks the identity provider who a token belongs to.
/// A token is accepted only if the provider resolves it to an account.
#[derive(Clone)]
pub struct IdentityToolkitVerifier {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl IdentityToolkitVerifier {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn lookup_url(&self) -> String {
        format!("{}/accounts:lookup?key={}", self.base_url, self.api_key)
    }
}

#[async_trait]
impl TokenVerifier for IdentityToolkitVerifier {
    async fn verify_token(&self, token: &str) -> PortResult<String> {
        let response = self
            .http
            .post(self.lookup_url())
            .json(&LookupRequest { id_token: token })
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("identity lookup failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            debug!("Identity provider rejected token with status {}.", status);
            return Err(PortError::Unauthorized);
        }

        let body: LookupResponse = response.json().await.map_err(|e| {
            warn!("Unreadable identity lookup response: {}", e);
            PortError::Unauthorized
        })?;

        body.users
            .into_iter()
            .next()
            .map(|user| user.local_id)
            .filter(|id| !id.is_empty())
            .ok_or(PortError::Unauthorized)
    }
}
