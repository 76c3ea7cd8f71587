use log::debug;
use reqwest::{Client, Url};
use serde_json::Value;
use speedcore::detection::DetectionRecord;
use speedcore::{DashboardError, DashboardResult, DeleteSink, DetectionSource};
use std::time::Duration;

/// REST client for the speed-camera backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> DashboardResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| DashboardError::Internal(format!("invalid base url {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(DashboardError::Internal(format!(
                "base url {base_url} cannot carry a path"
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::Internal(e.to_string()))?;
        Ok(Self { http, base })
    }

    /// Joins path segments onto the base url, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Fetches the camera configuration document (`/api/config`).
    pub async fn fetch_config(&self) -> DashboardResult<Value> {
        let url = self.endpoint(&["api", "config"]);
        let body = self.get_bytes(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_bytes(&self, url: Url) -> DashboardResult<Vec<u8>> {
        let endpoint = url.path().to_string();
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| DashboardError::Fetch(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| DashboardError::Fetch(e.to_string()))?;
        Ok(body.to_vec())
    }
}

impl DetectionSource for ApiClient {
    async fn fetch_detections(&self, violations_only: bool) -> DashboardResult<Vec<DetectionRecord>> {
        let mut url = self.endpoint(&["api", "detections"]);
        if violations_only {
            url.query_pairs_mut().append_pair("violations_only", "true");
        }
        debug!("GET {}", url);
        let body = self.get_bytes(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl DeleteSink for ApiClient {
    async fn delete_image(&self, image_file: &str) -> DashboardResult<()> {
        let url = self.endpoint(&["api", "files", "delete", image_file]);
        let endpoint = url.path().to_string();
        debug!("DELETE {}", url);
        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|e| DashboardError::Delete {
                image_file: image_file.to_string(),
                reason: e.to_string(),
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DashboardError::Status {
                endpoint,
                status: status.as_u16(),
            })
        }
    }
}
