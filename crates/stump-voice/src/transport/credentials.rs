//! Short-lived credential exchange with the trusted broker.
//!
//! The broker holds the real API key; clients only ever see an ephemeral
//! session secret.

use serde::Deserialize;
use tracing::debug;

use crate::VoiceError;

/// Ephemeral credential issued by the broker.
#[derive(Clone, Deserialize)]
pub struct SessionCredential {
    pub client_secret: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredential")
            .field("client_secret", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// HTTPS client for the credential-issuing endpoint.
pub struct CredentialBroker {
    url: String,
    http: reqwest::Client,
}

impl CredentialBroker {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(5))
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Request a credential for a session with the given model.
    pub async fn issue(&self, model: &str) -> Result<SessionCredential, VoiceError> {
        debug!(url = %self.url, model = %model, "requesting session credential");

        let response = self
            .http
            .post(&self.url)
            .json(&serde_json::json!({ "model": model }))
            .send()
            .await
            .map_err(|e| VoiceError::Negotiation(format!("credential request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(VoiceError::Negotiation(format!(
                "credential broker returned HTTP {status}: {text}"
            )));
        }

        response
            .json::<SessionCredential>()
            .await
            .map_err(|e| VoiceError::Negotiation(format!("bad credential response: {e}")))
    }
}
