use chrono::{Duration, NaiveDateTime};
use serde::Deserialize;
use speedcore::detection::{DetectionRecord, Direction};

/// One row of the camera's detection log.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDetection {
    pub timestamp: NaiveDateTime,
    pub object_type: String,
    pub object_color: String,
    pub direction: Direction,
    pub speed_kmh: f64,
    pub speed_mph: f64,
    pub confidence: f64,
    /// Empty when no image was saved.
    pub image_file: String,
    pub removed: bool,
}

impl StoredDetection {
    fn to_record(&self, speed_limit: f64) -> DetectionRecord {
        let has_image = !self.image_file.trim().is_empty();
        DetectionRecord {
            timestamp: self.timestamp,
            object_type: self.object_type.clone(),
            object_color: self.object_color.clone(),
            direction: self.direction,
            speed_kmh: self.speed_kmh,
            speed_mph: Some(self.speed_mph),
            speed_limit,
            is_violation: self.speed_kmh > speed_limit,
            confidence: self.confidence,
            image_file: has_image.then(|| self.image_file.clone()),
            has_image,
        }
    }
}

/// Query string accepted by `/api/detections`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionQuery {
    pub violations_only: Option<String>,
    #[serde(rename = "type")]
    pub object_type: Option<String>,
    pub limit: Option<String>,
    pub time_filter: Option<String>,
}

impl DetectionQuery {
    pub fn violations_only(&self) -> bool {
        self.violations_only
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    fn max_age(&self) -> Option<Duration> {
        match self.time_filter.as_deref() {
            Some("1h") => Some(Duration::hours(1)),
            Some("3h") => Some(Duration::hours(3)),
            Some("1d") => Some(Duration::days(1)),
            Some("1w") => Some(Duration::weeks(1)),
            _ => None,
        }
    }

    fn limit(&self) -> Option<usize> {
        self.limit
            .as_deref()
            .filter(|l| *l != "all")
            .and_then(|l| l.parse().ok())
    }
}

/// In-memory detection log with soft deletion.
#[derive(Debug, Clone, Default)]
pub struct DetectionStore {
    rows: Vec<StoredDetection>,
    speed_limit: f64,
}

impl DetectionStore {
    pub fn new(rows: Vec<StoredDetection>, speed_limit: f64) -> Self {
        Self { rows, speed_limit }
    }

    pub fn len(&self) -> usize {
        self.rows.iter().filter(|r| !r.removed).count()
    }

    pub fn speed_limit(&self) -> f64 {
        self.speed_limit
    }

    /// Live rows matching `query`, newest first, truncated to the limit.
    pub fn query(&self, query: &DetectionQuery, now: NaiveDateTime) -> Vec<DetectionRecord> {
        let max_age = query.max_age();
        let violations_only = query.violations_only();
        let type_filter = query.object_type.as_deref().filter(|t| !t.is_empty());

        let mut records: Vec<DetectionRecord> = self
            .rows
            .iter()
            .filter(|row| !row.removed)
            .filter(|row| max_age.map_or(true, |age| now - row.timestamp <= age))
            .map(|row| row.to_record(self.speed_limit))
            .filter(|record| !violations_only || record.is_violation)
            .filter(|record| type_filter.map_or(true, |t| record.object_type == t))
            .collect();

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = query.limit() {
            records.truncate(limit);
        }
        records
    }

    /// Marks the row owning `image_file` as removed. Returns false when no
    /// live row has that image.
    pub fn remove_image(&mut self, image_file: &str) -> bool {
        if image_file.trim().is_empty() {
            return false;
        }
        match self
            .rows
            .iter_mut()
            .find(|row| !row.removed && row.image_file == image_file)
        {
            Some(row) => {
                row.removed = true;
                true
            }
            None => false,
        }
    }
}
