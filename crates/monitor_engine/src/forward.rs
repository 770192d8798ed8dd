use std::time::Duration;

use monitor_core::{OutboundPayload, Url};
use reqwest::header::CONTENT_TYPE;

use crate::{DeliveryError, DeliveryFailureKind, DeliveryReport};

/// Client settings for the forward endpoint. No overall request timeout is
/// applied; a slow endpoint only delays its own delivery task.
#[derive(Debug, Clone, Default)]
pub struct ForwardSettings {
    pub connect_timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

#[async_trait::async_trait]
pub trait Forwarder: Send + Sync {
    async fn deliver(
        &self,
        target: &Url,
        payload: &OutboundPayload,
    ) -> Result<DeliveryReport, DeliveryError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestForwarder {
    client: reqwest::Client,
}

impl ReqwestForwarder {
    pub fn new(settings: ForwardSettings) -> Result<Self, DeliveryError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(agent) = settings.user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder
            .build()
            .map_err(|err| DeliveryError::new(DeliveryFailureKind::ClientSetup, err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Forwarder for ReqwestForwarder {
    async fn deliver(
        &self,
        target: &Url,
        payload: &OutboundPayload,
    ) -> Result<DeliveryReport, DeliveryError> {
        let body = serde_json::to_vec(payload)
            .map_err(|err| DeliveryError::new(DeliveryFailureKind::Serialize, err.to_string()))?;

        let response = self
            .client
            .post(target.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(DeliveryError::new(
                DeliveryFailureKind::HttpStatus(status.as_u16()),
                text,
            ));
        }

        Ok(DeliveryReport {
            status: status.as_u16(),
            body: text,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        return DeliveryError::new(DeliveryFailureKind::Timeout, err.to_string());
    }
    DeliveryError::new(DeliveryFailureKind::Network, err.to_string())
}
