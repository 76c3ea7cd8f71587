use crate::detection::record::{DetectionRecord, Direction};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relative date windows offered by the detections view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Today,
    Yesterday,
    Week,
    Month,
}

impl DateRange {
    /// Resolves the `[start, end)` window relative to `now`.
    ///
    /// Only `Yesterday` carries an explicit end; the other windows are
    /// bounded by `now` implicitly since no detection lies in the future.
    pub fn window(self, now: NaiveDateTime) -> DateWindow {
        let midnight = now.date().and_time(NaiveTime::MIN);
        match self {
            Self::Today => DateWindow {
                start: midnight,
                end: None,
            },
            Self::Yesterday => DateWindow {
                start: midnight - Duration::days(1),
                end: Some(midnight),
            },
            Self::Week => DateWindow {
                start: now - Duration::days(7),
                end: None,
            },
            Self::Month => {
                let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
                    .unwrap_or_else(|| now.date());
                DateWindow {
                    start: first.and_time(NaiveTime::MIN),
                    end: None,
                }
            }
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today => write!(f, "today"),
            Self::Yesterday => write!(f, "yesterday"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
        }
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(format!("unknown date range: {s}")),
        }
    }
}

/// Half-open time window; `end == None` means unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
}

impl DateWindow {
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.start && self.end.map_or(true, |end| timestamp < end)
    }
}

/// Conjunction of optional predicates over a detection list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub speed_min: Option<f64>,
    #[serde(default)]
    pub speed_max: Option<f64>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub violations_only: bool,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Tests a single record against every set predicate.
    pub fn matches(&self, record: &DetectionRecord, now: NaiveDateTime) -> bool {
        if let Some(object_type) = self.object_type.as_deref().filter(|t| !t.is_empty()) {
            // substring, not equality: "van" also matches "caravan"
            if !record
                .object_type
                .to_lowercase()
                .contains(&object_type.to_lowercase())
            {
                return false;
            }
        }

        if let Some(direction) = self.direction {
            if record.direction != direction {
                return false;
            }
        }

        let speed = if record.speed_kmh.is_nan() {
            0.0
        } else {
            record.speed_kmh
        };
        if self.speed_min.is_some_and(|min| speed < min) {
            return false;
        }
        if self.speed_max.is_some_and(|max| speed > max) {
            return false;
        }

        if let Some(range) = self.date_range {
            if !range.window(now).contains(record.timestamp) {
                return false;
            }
        }

        !self.violations_only || record.is_violation
    }
}

/// Returns the records satisfying `criteria`, evaluated against the current
/// local time. Input order is preserved.
pub fn apply_filters(records: &[DetectionRecord], criteria: &FilterCriteria) -> Vec<DetectionRecord> {
    apply_filters_at(records, criteria, Local::now().naive_local())
}

/// Same as [`apply_filters`] with an explicit reference time.
pub fn apply_filters_at(
    records: &[DetectionRecord],
    criteria: &FilterCriteria,
    now: NaiveDateTime,
) -> Vec<DetectionRecord> {
    records
        .iter()
        .filter(|record| criteria.matches(record, now))
        .cloned()
        .collect()
}

/// Raw text of the filter inputs, before sanitisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterForm {
    pub object_type: String,
    pub direction: String,
    pub speed_min: String,
    pub speed_max: String,
    pub date_range: String,
    pub violations_only: bool,
}

impl FilterForm {
    /// Converts form text into criteria. Blank, unparsable, NaN or zero speed
    /// bounds and unrecognised enum values impose no constraint.
    pub fn to_criteria(&self) -> FilterCriteria {
        let object_type = self.object_type.trim();
        FilterCriteria {
            object_type: (!object_type.is_empty()).then(|| object_type.to_string()),
            direction: self.direction.trim().parse().ok(),
            speed_min: parse_bound(&self.speed_min),
            speed_max: parse_bound(&self.speed_max),
            date_range: self.date_range.trim().parse().ok(),
            violations_only: self.violations_only,
        }
    }
}

fn parse_bound(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value != 0.0)
}
