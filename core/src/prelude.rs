use crate::detection::DetectionRecord;
use std::future::Future;

/// Common error type for dashboard operations.
#[derive(thiserror::Error, Debug)]
pub enum DashboardError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("unexpected status {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },
    #[error("delete of {image_file} failed: {reason}")]
    Delete { image_file: String, reason: String },
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no detections selected")]
    EmptySelection,
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type DashboardResult<T> = Result<T, DashboardError>;

/// Read-only source of detection records, typically `GET /api/detections`.
pub trait DetectionSource {
    /// Fetches the full detection list. `violations_only` is forwarded to the
    /// backend so it can pre-filter; every other criterion is applied locally.
    fn fetch_detections(
        &self,
        violations_only: bool,
    ) -> impl Future<Output = DashboardResult<Vec<DetectionRecord>>> + Send;
}

/// Sink that removes one detection image, typically
/// `DELETE /api/files/delete/{image_file}`.
pub trait DeleteSink {
    fn delete_image(&self, image_file: &str) -> impl Future<Output = DashboardResult<()>> + Send;
}
