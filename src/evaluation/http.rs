//! Evaluator backed by the feature-flag service's SDK endpoint.
//!
//! ```text
//! POST {base_url}/sdk/evaluate
//! X-SDK-Key: <sdk key>
//! Content-Type: application/json
//!
//! { "environment": "production", "context": { "user_id": "...", ... } }
//! ```
//!
//! The service answers with every flag of the environment; the evaluator picks
//! the requested one out of `flags`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::{EvaluationContext, FlagEvaluator, FlagName};
use crate::error::EvaluationError;

const SDK_KEY_HEADER: &str = "x-sdk-key";

#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub environment: String,
    pub context: EvaluationContext,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub flags: HashMap<String, FlagState>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlagState {
    pub enabled: bool,
    pub reason: String,
}

pub struct HttpEvaluator {
    client: reqwest::Client,
    endpoint: String,
    sdk_key: String,
    environment: String,
    context: EvaluationContext,
}

impl HttpEvaluator {
    pub fn new(
        base_url: &str,
        sdk_key: impl Into<String>,
        environment: impl Into<String>,
        context: EvaluationContext,
    ) -> Result<Self, EvaluationError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| EvaluationError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/sdk/evaluate", base_url.trim_end_matches('/')),
            sdk_key: sdk_key.into(),
            environment: environment.into(),
            context,
        })
    }

    /// Swap in a preconfigured HTTP client (proxies, custom roots, ...).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl FlagEvaluator for HttpEvaluator {
    async fn evaluate_flag(&self, flag: &FlagName) -> Result<bool, EvaluationError> {
        debug!(flag = %flag, endpoint = %self.endpoint, "Requesting flag evaluation");

        let request = EvaluateRequest {
            environment: self.environment.clone(),
            context: self.context.clone(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(SDK_KEY_HEADER, &self.sdk_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EvaluationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EvaluationError::Transport(format!(
                "evaluator responded with {}",
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| EvaluationError::Transport(e.to_string()))?;

        let evaluated: EvaluateResponse = serde_json::from_slice(&body)
            .map_err(|e| EvaluationError::MalformedResponse(e.to_string()))?;

        match evaluated.flags.get(flag.as_str()) {
            Some(state) => {
                debug!(flag = %flag, enabled = state.enabled, reason = %state.reason, "Flag evaluated");
                Ok(state.enabled)
            }
            None => Err(EvaluationError::FlagNotFound(flag.to_string())),
        }
    }
}
