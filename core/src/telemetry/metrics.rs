use serde::Serialize;
use std::sync::Mutex;

/// Counters for the fetch and delete traffic a session generates.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub fetches: usize,
    pub fetch_errors: usize,
    pub deletes_ok: usize,
    pub deletes_failed: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_fetch(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.fetches += 1;
        }
    }

    pub fn record_fetch_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.fetch_errors += 1;
        }
    }

    pub fn record_deletes(&self, ok: usize, failed: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.deletes_ok += ok;
            metrics.deletes_failed += failed;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.record_fetch();
        metrics.record_fetch();
        metrics.record_fetch_error();
        metrics.record_deletes(2, 1);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.fetches, 2);
        assert_eq!(snapshot.fetch_errors, 1);
        assert_eq!((snapshot.deletes_ok, snapshot.deletes_failed), (2, 1));
    }
}
