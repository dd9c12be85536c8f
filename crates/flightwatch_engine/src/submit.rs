use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use flightwatch_core::{JobId, SearchCriteria};
use serde_json::Value;

use crate::{SubmitError, SubmitFailure};

const SEARCH_PATH: &str = "api/v1/flights";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitSettings {
    pub api_base: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for SubmitSettings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:3000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Starts a background search and returns the id of the job tracking it.
#[async_trait::async_trait]
pub trait SearchSubmitter: Send + Sync {
    async fn submit(&self, criteria: &SearchCriteria) -> Result<JobId, SubmitError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestSubmitter {
    endpoint: reqwest::Url,
    client: reqwest::Client,
}

impl ReqwestSubmitter {
    pub fn new(settings: &SubmitSettings) -> Result<Self, SubmitError> {
        let endpoint = search_endpoint(&settings.api_base)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SubmitError::new(SubmitFailure::Network, err.to_string()))?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl SearchSubmitter for ReqwestSubmitter {
    async fn submit(&self, criteria: &SearchCriteria) -> Result<JobId, SubmitError> {
        criteria.validate()?;

        engine_info!(
            "Submitting search {} -> {} on {}",
            criteria.origin,
            criteria.destination,
            criteria.departure_date
        );
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&criteria.request_body())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let body: Option<Value> = serde_json::from_slice(&bytes).ok();

        if !status.is_success() {
            let message = body
                .as_ref()
                .and_then(|body| body.get("error"))
                .filter(|error| !error.is_null())
                .map(|error| match error.as_str() {
                    Some(text) => text.to_string(),
                    None => error.to_string(),
                })
                .unwrap_or_else(|| status.to_string());
            engine_warn!("Search rejected with {}: {}", status, message);
            return Err(SubmitError::new(
                SubmitFailure::Rejected {
                    status: status.as_u16(),
                },
                message,
            ));
        }

        let job_id = body
            .as_ref()
            .and_then(|body| body.get("job_id"))
            .and_then(|value| serde_json::from_value::<JobId>(value.clone()).ok())
            .filter(|job_id| !matches!(job_id, JobId::Text(text) if text.is_empty()))
            .ok_or_else(|| {
                SubmitError::new(SubmitFailure::MissingJobId, "response carried no job_id")
            })?;

        engine_info!("Search accepted as job {}", job_id);
        Ok(job_id)
    }
}

fn search_endpoint(api_base: &str) -> Result<reqwest::Url, SubmitError> {
    let invalid = |err: url::ParseError| {
        SubmitError::new(
            SubmitFailure::InvalidEndpoint,
            format!("{api_base}: {err}"),
        )
    };
    // Without a trailing slash `join` would replace the last path segment.
    let base = if api_base.ends_with('/') {
        api_base.to_string()
    } else {
        format!("{api_base}/")
    };
    let base = url::Url::parse(&base).map_err(invalid)?;
    match base.scheme() {
        "http" | "https" => {}
        other => {
            return Err(SubmitError::new(
                SubmitFailure::InvalidEndpoint,
                format!("unsupported scheme {other}"),
            ))
        }
    }
    base.join(SEARCH_PATH).map_err(invalid)
}

fn map_reqwest_error(err: reqwest::Error) -> SubmitError {
    if err.is_timeout() {
        return SubmitError::new(SubmitFailure::Timeout, err.to_string());
    }
    SubmitError::new(SubmitFailure::Network, err.to_string())
}
