use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::{ApiError, ApiException},
    protocol::{
        AnalyzeBatchRequest, AnalyzeBatchResponse, AnalyzeRequest, AnalyzeResponse,
        HealthResponse, ModelInfo, ServiceStats,
    },
};
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The seam between controllers and the remote gateway. Every method is one
/// request/response round trip; any `Err` is a transport-class failure
/// (unreachable, timeout, non-2xx, undecodable body). No retries here;
/// retrying is a caller decision.
#[async_trait]
pub trait SentimentGateway: Send + Sync {
    async fn check_health(&self) -> Result<HealthResponse>;
    async fn analyze(&self, text: &str, preprocess: bool) -> Result<AnalyzeResponse>;
    async fn analyze_batch(
        &self,
        texts: &[String],
        preprocess: bool,
    ) -> Result<AnalyzeBatchResponse>;
    async fn model_info(&self) -> Result<ModelInfo>;
    async fn service_stats(&self) -> Result<ServiceStats>;
}

pub struct HttpGateway {
    http: Client,
    origin: String,
}

impl HttpGateway {
    pub fn new(origin: &str) -> Result<Self> {
        Self::with_timeout(origin, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(origin: &str, timeout: Duration) -> Result<Self> {
        let parsed =
            Url::parse(origin).with_context(|| format!("invalid gateway origin: {origin}"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(anyhow!("gateway origin must be http(s): {origin}"));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            origin: origin.trim_end_matches('/').to_string(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// Rejections carry a `{error, code}` body; surface it instead of the bare
/// status when it decodes.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match response.json::<ApiError>().await {
        Ok(rejection) => Err(anyhow::Error::new(ApiException::from(rejection))
            .context(format!("gateway rejected the request ({status})"))),
        Err(_) => Err(anyhow!("gateway returned {status}")),
    }
}

#[async_trait]
impl SentimentGateway for HttpGateway {
    async fn check_health(&self) -> Result<HealthResponse> {
        let response = self
            .http
            .get(format!("{}/health", self.origin))
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn analyze(&self, text: &str, preprocess: bool) -> Result<AnalyzeResponse> {
        let response = self
            .http
            .post(format!("{}/api/analyze", self.origin))
            .json(&AnalyzeRequest {
                text: text.to_string(),
                preprocess,
            })
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn analyze_batch(
        &self,
        texts: &[String],
        preprocess: bool,
    ) -> Result<AnalyzeBatchResponse> {
        let response = self
            .http
            .post(format!("{}/api/analyze-batch", self.origin))
            .json(&AnalyzeBatchRequest {
                texts: texts.to_vec(),
                preprocess,
            })
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn model_info(&self) -> Result<ModelInfo> {
        let response = self
            .http
            .get(format!("{}/api/model-info", self.origin))
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn service_stats(&self) -> Result<ServiceStats> {
        let response = self
            .http
            .get(format!("{}/api/stats", self.origin))
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
