use anyhow::Context;
use serde::{Deserialize, Serialize};
use speedcore::detection::FilterForm;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub base_url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Deletes in flight during a bulk delete; 1 keeps them sequential.
    pub delete_concurrency: usize,
    /// Filter inputs applied when the command line sets none.
    pub filters: FilterForm,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9000".into(),
            poll_interval_secs: 5,
            request_timeout_secs: 10,
            delete_concurrency: 1,
            filters: FilterForm::default(),
        }
    }
}

impl DashboardConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading dashboard config {}", path_ref.display()))?;
        let config: DashboardConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing dashboard config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(base_url: String, poll_interval_secs: u64) -> Self {
        Self {
            base_url,
            poll_interval_secs,
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
