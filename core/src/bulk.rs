use crate::prelude::{DashboardError, DeleteSink};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Result of deleting one image file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub image_file: String,
    pub error: Option<String>,
}

impl DeleteOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-id outcomes of a bulk delete plus the aggregate counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkDeleteReport {
    pub outcomes: Vec<DeleteOutcome>,
    pub success_count: usize,
    pub error_count: usize,
}

impl BulkDeleteReport {
    pub fn from_outcomes(outcomes: Vec<DeleteOutcome>) -> Self {
        let success_count = outcomes.iter().filter(|o| o.is_success()).count();
        let error_count = outcomes.len() - success_count;
        Self {
            outcomes,
            success_count,
            error_count,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeleteOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Deletes each id in turn, awaiting one call before starting the next.
/// A failed id never stops the remaining attempts.
pub async fn delete_sequentially<S>(sink: &S, ids: &[String]) -> BulkDeleteReport
where
    S: DeleteSink,
{
    let mut outcomes = Vec::with_capacity(ids.len());
    for id in ids {
        let error = sink.delete_image(id).await.err().map(|err| err.to_string());
        outcomes.push(DeleteOutcome {
            image_file: id.clone(),
            error,
        });
    }
    BulkDeleteReport::from_outcomes(outcomes)
}

/// Deletes with at most `limit` calls in flight. Outcomes keep the order of `ids`.
pub async fn delete_concurrently<S>(sink: Arc<S>, ids: &[String], limit: usize) -> BulkDeleteReport
where
    S: DeleteSink + Send + Sync + 'static,
{
    // Semaphore::new panics above MAX_PERMITS.
    let permits = Arc::new(Semaphore::new(limit.clamp(1, ids.len().max(1))));
    let mut tasks = JoinSet::new();

    for (index, id) in ids.iter().cloned().enumerate() {
        let sink = sink.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_permit) => sink.delete_image(&id).await,
                Err(err) => Err(DashboardError::Internal(err.to_string())),
            };
            (index, id, result.err().map(|err| err.to_string()))
        });
    }

    let mut slots: Vec<Option<DeleteOutcome>> = vec![None; ids.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, image_file, error)) => {
                slots[index] = Some(DeleteOutcome { image_file, error });
            }
            Err(err) => log::warn!("delete task aborted: {}", err),
        }
    }

    let outcomes = slots
        .into_iter()
        .zip(ids)
        .map(|(slot, id)| {
            slot.unwrap_or_else(|| DeleteOutcome {
                image_file: id.clone(),
                error: Some("delete task aborted".into()),
            })
        })
        .collect();
    BulkDeleteReport::from_outcomes(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::DashboardResult;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records every delete call and fails the ids it was told to.
    #[derive(Default)]
    struct FlakySink {
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FlakySink {
        fn failing(ids: &[&str]) -> Self {
            Self {
                failing: ids.iter().map(|id| id.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl DeleteSink for FlakySink {
        async fn delete_image(&self, image_file: &str) -> DashboardResult<()> {
            self.calls.lock().unwrap().push(image_file.to_string());
            if self.failing.contains(image_file) {
                Err(DashboardError::Status {
                    endpoint: format!("/api/files/delete/{image_file}"),
                    status: 404,
                })
            } else {
                Ok(())
            }
        }
    }

    fn ids() -> Vec<String> {
        vec!["id1.jpg".into(), "id2.jpg".into(), "id3.jpg".into()]
    }

    #[tokio::test]
    async fn middle_failure_does_not_stop_the_rest() {
        let sink = FlakySink::failing(&["id2.jpg"]);
        let report = delete_sequentially(&sink, &ids()).await;
        assert_eq!((report.success_count, report.error_count), (2, 1));
        assert_eq!(*sink.calls.lock().unwrap(), ids());
        let failed: Vec<_> = report.failures().map(|o| o.image_file.as_str()).collect();
        assert_eq!(failed, vec!["id2.jpg"]);
    }

    #[tokio::test]
    async fn total_failure_resolves_normally() {
        let sink = FlakySink::failing(&["id1.jpg", "id2.jpg", "id3.jpg"]);
        let report = delete_sequentially(&sink, &ids()).await;
        assert_eq!((report.success_count, report.error_count), (0, 3));
    }

    #[tokio::test]
    async fn concurrent_delete_keeps_order_and_counts() {
        let sink = Arc::new(FlakySink::failing(&["id2.jpg"]));
        let report = delete_concurrently(sink.clone(), &ids(), 2).await;
        assert_eq!((report.success_count, report.error_count), (2, 1));
        let order: Vec<_> = report.outcomes.iter().map(|o| o.image_file.clone()).collect();
        assert_eq!(order, ids());
        assert_eq!(sink.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn oversized_limit_is_clamped_to_the_id_count() {
        let sink = Arc::new(FlakySink::default());
        let report = delete_concurrently(sink.clone(), &ids(), usize::MAX).await;
        assert_eq!((report.success_count, report.error_count), (3, 0));

        let empty = delete_concurrently(sink, &[], usize::MAX).await;
        assert!(empty.outcomes.is_empty());
    }
}
