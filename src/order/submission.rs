//! Order submission — the fulfillment-provider boundary.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use crate::error::SubmissionError;

use super::model::{Amount, OrderDraft, OrderId};

/// Hands a confirmed draft to the fulfillment collaborator.
///
/// Invoked only from the confirm transition; the conversation does not move
/// past the summary unless this succeeds.
#[async_trait]
pub trait OrderSubmission: Send + Sync {
    async fn submit(&self, draft: &OrderDraft) -> Result<OrderId, SubmissionError>;
}

/// HTTP client for the fulfillment provider's order API.
pub struct HttpProviderClient {
    base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl HttpProviderClient {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn order_payload(draft: &OrderDraft) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "reference": draft.correlation_id,
            "platform": draft.platform,
            "service": draft.service.kind.to_string(),
            "target": draft.target,
            "quantity": draft.amount.quantity(),
        });
        if let Amount::Comments(texts) = &draft.amount {
            payload["comments"] = serde_json::json!(texts);
        }
        payload
    }
}

#[async_trait]
impl OrderSubmission for HttpProviderClient {
    async fn submit(&self, draft: &OrderDraft) -> Result<OrderId, SubmissionError> {
        let resp = self
            .client
            .post(format!("{}/orders", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&Self::order_payload(draft))
            .send()
            .await
            .map_err(|e| SubmissionError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SubmissionError::Rejected {
                reason: format!("{status}: {body}"),
            });
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;

        let order_id = data
            .get("order_id")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                SubmissionError::InvalidResponse("response missing order_id".into())
            })?;

        tracing::info!(
            reference = %draft.correlation_id,
            provider_order_id = order_id,
            "Order accepted by provider"
        );
        Ok(OrderId(order_id.to_string()))
    }
}

/// In-memory submission backend for tests and dry runs. Accepts every draft
/// and assigns sequential order ids.
#[derive(Default)]
pub struct MemorySubmission {
    submitted: Mutex<Vec<OrderDraft>>,
}

impl MemorySubmission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every draft accepted so far, in submission order.
    pub async fn submitted(&self) -> Vec<OrderDraft> {
        self.submitted.lock().await.clone()
    }
}

#[async_trait]
impl OrderSubmission for MemorySubmission {
    async fn submit(&self, draft: &OrderDraft) -> Result<OrderId, SubmissionError> {
        let mut submitted = self.submitted.lock().await;
        submitted.push(draft.clone());
        Ok(OrderId(format!("mem-{}", submitted.len())))
    }
}
