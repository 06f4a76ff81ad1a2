use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::client::{
    backend_error, ApiError, DashboardApi, DashboardStats, DataRow, SimulationRequest,
    SimulationResponse,
};
use crate::config::ApiConfig;

const STATS_PATH: &str = "/api/stats";
const SAMPLE_PATH: &str = "/api/data/sample";
const SIMULATE_PATH: &str = "/api/simulate";
const PREVIEW_CHARS: usize = 180;

/// `DashboardApi` over the backend's JSON endpoints.
#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    client: Client,
    base_url: String,
}

impl HttpDashboardApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(ApiError::Client)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.endpoint(path);
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        read_json(url, response).await
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(path);
        debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        read_json(url, response).await
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn stats(&self) -> Result<DashboardStats, ApiError> {
        let value = self.get_json(STATS_PATH).await?;
        decode(self.endpoint(STATS_PATH), value)
    }

    async fn sample_rows(&self) -> Result<Vec<DataRow>, ApiError> {
        let value = self.get_json(SAMPLE_PATH).await?;
        decode(self.endpoint(SAMPLE_PATH), value)
    }

    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResponse, ApiError> {
        let value = self.post_json(SIMULATE_PATH, request).await?;
        decode(self.endpoint(SIMULATE_PATH), value)
    }
}

/// Backend error fields win over the HTTP status, since the backend reports
/// failures as `{detail}` bodies on 5xx responses.
async fn read_json(url: String, response: Response) -> Result<Value, ApiError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;
    let parsed = serde_json::from_str::<Value>(&body);
    if let Ok(value) = &parsed {
        if let Some(err) = backend_error(value) {
            return Err(err);
        }
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            url,
            status: status.as_u16(),
            preview: body.chars().take(PREVIEW_CHARS).collect(),
        });
    }
    parsed.map_err(|err| ApiError::Malformed {
        url,
        reason: format!("invalid JSON: {err}"),
    })
}

fn decode<T: DeserializeOwned>(url: String, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|err| ApiError::Malformed {
        url,
        reason: err.to_string(),
    })
}
