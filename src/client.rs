//! HTTP client for the remote loan calculation service.

use crate::form::LoanRequest;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const CALCULATE_PATH: &str = "/calculate-loan";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub loan_amount: f64,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("calculation service answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed calculation response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone)]
pub struct LoanClient {
    endpoint: String,
    http: reqwest::Client,
}

impl LoanClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_http(base_url, reqwest::Client::new())
    }

    pub fn with_http(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CALCULATE_PATH),
            http,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts the sanitized inputs and reads back `loanAmount`.
    ///
    /// Non-2xx answers and bodies without a numeric `loanAmount` are errors.
    pub async fn calculate(
        &self,
        request: &LoanRequest,
    ) -> Result<CalculationResult, ClientError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|source| self.transport(source))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| self.transport(source))?;
        debug!(%status, bytes = body.len(), "calculation response received");

        if !status.is_success() {
            return Err(ClientError::Status { status, body });
        }

        serde_json::from_str(&body).map_err(|err| ClientError::MalformedResponse(err.to_string()))
    }

    fn transport(&self, source: reqwest::Error) -> ClientError {
        ClientError::Transport {
            url: self.endpoint.clone(),
            source,
        }
    }
}
