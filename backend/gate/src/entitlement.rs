use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use snaplens_core::{EntitlementChecker, SnapError};

/// Entitlement collaborator reached over HTTP.
///
/// `GET {base_url}/check-subscription?subscriptionId=...` returning
/// `{"status": "active", "paid": true}` for a valid paid subscription.
pub struct HttpEntitlementChecker {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct EntitlementReply {
    status: String,
    #[serde(default)]
    paid: bool,
}

impl HttpEntitlementChecker {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl EntitlementChecker for HttpEntitlementChecker {
    async fn verify(&self, subscription_id: &str) -> Result<bool, SnapError> {
        let url = format!("{}/check-subscription", self.base_url);
        debug!(url = %url, "Checking subscription entitlement");

        let response = self
            .client
            .get(&url)
            .query(&[("subscriptionId", subscription_id)])
            .send()
            .await
            .map_err(|e| SnapError::Other(anyhow::anyhow!("entitlement request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SnapError::Other(anyhow::anyhow!(
                "entitlement service returned {status}"
            )));
        }

        let reply: EntitlementReply = response
            .json()
            .await
            .map_err(|e| SnapError::Other(anyhow::anyhow!("malformed entitlement reply: {e}")))?;

        Ok(reply.status == "active" && reply.paid)
    }
}

/// Fixed-outcome checker for tests, demos, and offline runs.
pub struct StaticEntitlementChecker {
    accept: bool,
}

impl StaticEntitlementChecker {
    pub fn new(accept: bool) -> Self {
        Self { accept }
    }
}

#[async_trait]
impl EntitlementChecker for StaticEntitlementChecker {
    async fn verify(&self, _subscription_id: &str) -> Result<bool, SnapError> {
        Ok(self.accept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entitlement_reply_parsing() {
        let reply: EntitlementReply =
            serde_json::from_str(r#"{"status":"active","paid":true}"#).unwrap();
        assert!(reply.status == "active" && reply.paid);

        // `paid` missing defaults to false, so an active-but-unpaid reply
        // never validates.
        let unpaid: EntitlementReply = serde_json::from_str(r#"{"status":"active"}"#).unwrap();
        assert!(!unpaid.paid);
    }

    #[tokio::test]
    async fn test_static_checker() {
        assert!(StaticEntitlementChecker::new(true)
            .verify("any")
            .await
            .unwrap());
        assert!(!StaticEntitlementChecker::new(false)
            .verify("any")
            .await
            .unwrap());
    }
}
