use crate::board::DetectionBoard;
use crate::bulk::{delete_concurrently, delete_sequentially, BulkDeleteReport};
use crate::detection::{FilterCriteria, SelectionSummary};
use crate::prelude::{DashboardError, DashboardResult, DeleteSink, DetectionSource};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use std::sync::Arc;

/// Ties a backend client to the board state.
///
/// There is no request sequencing: if two refreshes race, whichever
/// completes last determines the displayed list.
pub struct DashboardSession<C> {
    client: Arc<C>,
    board: DetectionBoard,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl<C> DashboardSession<C>
where
    C: DetectionSource + DeleteSink + Send + Sync + 'static,
{
    pub fn new(client: C) -> Self {
        Self::with_board(client, DetectionBoard::new())
    }

    pub fn with_board(client: C, board: DetectionBoard) -> Self {
        Self {
            client: Arc::new(client),
            board,
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("session"),
        }
    }

    pub fn board(&self) -> &DetectionBoard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut DetectionBoard {
        &mut self.board
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> SelectionSummary {
        self.board.set_criteria(criteria)
    }

    /// Re-fetches the detection list. On failure the previous list and
    /// selection stay as they were.
    pub async fn refresh(&mut self) -> DashboardResult<usize> {
        let violations_only = self.board.criteria().violations_only;
        self.metrics.record_fetch();
        match self.client.fetch_detections(violations_only).await {
            Ok(records) => {
                let fetched = records.len();
                self.board.replace_records(records);
                self.logger.trace(&format!(
                    "fetched {} detections, {} displayed",
                    fetched,
                    self.board.displayed().len()
                ));
                Ok(fetched)
            }
            Err(err) => {
                self.metrics.record_fetch_error();
                self.logger
                    .warn(&format!("error loading detections, keeping stale list: {err}"));
                Err(err)
            }
        }
    }

    /// Deletes every selected image one after another, then clears the
    /// selection and reloads the list.
    pub async fn delete_selected(&mut self) -> DashboardResult<BulkDeleteReport> {
        let ids = self.selected_or_err()?;
        let report = delete_sequentially(self.client.as_ref(), &ids).await;
        self.finish_bulk_delete(report).await
    }

    /// Same contract as [`Self::delete_selected`] with up to `limit` deletes
    /// in flight.
    pub async fn delete_selected_concurrently(
        &mut self,
        limit: usize,
    ) -> DashboardResult<BulkDeleteReport> {
        let ids = self.selected_or_err()?;
        let report = delete_concurrently(self.client.clone(), &ids, limit).await;
        self.finish_bulk_delete(report).await
    }

    fn selected_or_err(&self) -> DashboardResult<Vec<String>> {
        let ids = self.board.selected_ids();
        if ids.is_empty() {
            self.logger.warn("no detections selected");
            return Err(DashboardError::EmptySelection);
        }
        Ok(ids)
    }

    async fn finish_bulk_delete(
        &mut self,
        report: BulkDeleteReport,
    ) -> DashboardResult<BulkDeleteReport> {
        self.metrics
            .record_deletes(report.success_count, report.error_count);
        if report.success_count > 0 {
            self.logger
                .record(&format!("deleted {} detection(s)", report.success_count));
        }
        for failure in report.failures() {
            self.logger.warn(&format!(
                "failed to delete {}: {}",
                failure.image_file,
                failure.error.as_deref().unwrap_or("unknown error")
            ));
        }

        self.board.clear();
        if let Err(err) = self.refresh().await {
            self.logger
                .warn(&format!("refresh after bulk delete failed: {err}"));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{DetectionRecord, Direction};
    use chrono::{Duration, Local};
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory backend: deletes remove rows, listed ids fail.
    struct FakeBackend {
        rows: Mutex<Vec<DetectionRecord>>,
        failing: HashSet<String>,
        offline: Mutex<bool>,
        requested_violations_only: Mutex<Vec<bool>>,
    }

    impl FakeBackend {
        fn new(rows: Vec<DetectionRecord>, failing: &[&str]) -> Self {
            Self {
                rows: Mutex::new(rows),
                failing: failing.iter().map(|id| id.to_string()).collect(),
                offline: Mutex::new(false),
                requested_violations_only: Mutex::new(Vec::new()),
            }
        }
    }

    impl DetectionSource for FakeBackend {
        async fn fetch_detections(
            &self,
            violations_only: bool,
        ) -> DashboardResult<Vec<DetectionRecord>> {
            self.requested_violations_only
                .lock()
                .unwrap()
                .push(violations_only);
            if *self.offline.lock().unwrap() {
                return Err(DashboardError::Fetch("connection refused".into()));
            }
            let rows = self.rows.lock().unwrap().clone();
            Ok(rows
                .into_iter()
                .filter(|r| !violations_only || r.is_violation)
                .collect())
        }
    }

    impl DeleteSink for FakeBackend {
        async fn delete_image(&self, image_file: &str) -> DashboardResult<()> {
            if self.failing.contains(image_file) {
                return Err(DashboardError::Status {
                    endpoint: format!("/api/files/delete/{image_file}"),
                    status: 500,
                });
            }
            self.rows
                .lock()
                .unwrap()
                .retain(|r| r.image_file.as_deref() != Some(image_file));
            Ok(())
        }
    }

    fn record(image: &str, speed_kmh: f64) -> DetectionRecord {
        DetectionRecord {
            timestamp: Local::now().naive_local() - Duration::minutes(5),
            object_type: "car".into(),
            object_color: "silver".into(),
            direction: Direction::L2R,
            speed_kmh,
            speed_mph: None,
            speed_limit: 50.0,
            is_violation: speed_kmh > 50.0,
            confidence: 0.7,
            image_file: Some(image.into()),
            has_image: true,
        }
    }

    fn backend(failing: &[&str]) -> FakeBackend {
        FakeBackend::new(
            vec![
                record("id1.jpg", 42.0),
                record("id2.jpg", 65.0),
                record("id3.jpg", 71.0),
            ],
            failing,
        )
    }

    #[tokio::test]
    async fn bulk_delete_with_middle_failure_reports_counts_and_clears() {
        let mut session = DashboardSession::new(backend(&["id2.jpg"]));
        session.refresh().await.unwrap();
        assert_eq!(session.board_mut().select_all().count, 3);

        let report = session.delete_selected().await.unwrap();
        assert_eq!((report.success_count, report.error_count), (2, 1));
        assert_eq!(session.board().summary().count, 0);
        // the list was reloaded: only the row that failed to delete remains
        assert_eq!(session.board().records().len(), 1);
        assert_eq!(session.metrics().deletes_failed, 1);
    }

    #[tokio::test]
    async fn concurrent_bulk_delete_matches_sequential_contract() {
        let mut session = DashboardSession::new(backend(&["id2.jpg"]));
        session.refresh().await.unwrap();
        session.board_mut().select_all();

        let report = session.delete_selected_concurrently(4).await.unwrap();
        assert_eq!((report.success_count, report.error_count), (2, 1));
        assert!(session.board().selection().is_empty());
    }

    #[tokio::test]
    async fn empty_selection_is_rejected() {
        let mut session = DashboardSession::new(backend(&[]));
        session.refresh().await.unwrap();
        assert!(matches!(
            session.delete_selected().await,
            Err(DashboardError::EmptySelection)
        ));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_records_and_selection() {
        let mut session = DashboardSession::new(backend(&[]));
        session.refresh().await.unwrap();
        session.board_mut().toggle("id1.jpg", true);

        *session.client().offline.lock().unwrap() = true;
        assert!(session.refresh().await.is_err());
        assert_eq!(session.board().records().len(), 3);
        assert_eq!(session.board().summary().count, 1);
        assert_eq!(session.metrics().fetch_errors, 1);
    }

    #[tokio::test]
    async fn violations_only_is_requested_server_side() {
        let mut session = DashboardSession::new(backend(&[]));
        session.set_criteria(FilterCriteria {
            violations_only: true,
            ..Default::default()
        });
        assert_eq!(session.refresh().await.unwrap(), 2);
        assert_eq!(
            *session.client().requested_violations_only.lock().unwrap(),
            vec![true]
        );
    }
}
