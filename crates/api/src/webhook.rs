use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::transport::Transport;
use crate::{ApiClient, ApiResponse};

const WEBHOOK_ENDPOINT: &str = "rest/webhooks/1.0/webhook";

/// A webhook registration. Delivery itself happens on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jql_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_issue_details: Option<bool>,
}

impl Webhook {
    pub fn new(name: impl Into<String>, url: impl Into<String>, events: Vec<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: Some(url.into()),
            events,
            ..Default::default()
        }
    }
}

pub struct WebhookService<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> WebhookService<'a, T> {
    pub(crate) fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub async fn create(&self, webhook: &Webhook) -> Result<ApiResponse<Webhook>> {
        self.client.post(WEBHOOK_ENDPOINT, webhook).await
    }

    pub async fn get_all(&self) -> Result<ApiResponse<Vec<Webhook>>> {
        self.client.get(WEBHOOK_ENDPOINT).await
    }
}
