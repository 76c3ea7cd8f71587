use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Travel direction across the camera's field of view.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Direction {
    L2R,
    R2L,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L2R => write!(f, "L2R"),
            Self::R2L => write!(f, "R2L"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L2R" => Ok(Self::L2R),
            "R2L" => Ok(Self::R2L),
            "Unknown" => Ok(Self::Unknown),
            _ => Err(format!("unknown direction: {s}")),
        }
    }
}

/// A single vehicle observation as reported by the backend.
///
/// Records are snapshots: the dashboard never mutates them, it only replaces
/// the whole list on each fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub timestamp: NaiveDateTime,
    #[serde(default, deserialize_with = "null_as_default")]
    pub object_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub object_color: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub direction: Direction,
    #[serde(default, deserialize_with = "null_as_default")]
    pub speed_kmh: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_mph: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub speed_limit: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_violation: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "deserialize_image_file")]
    pub image_file: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_image: bool,
}

impl DetectionRecord {
    /// Key used by the selection set. Only image-bearing rows can be selected.
    pub fn selection_key(&self) -> Option<&str> {
        if !self.has_image {
            return None;
        }
        self.image_file.as_deref().filter(|file| !file.is_empty())
    }
}

/// Parses a backend timestamp into local wall-clock time.
///
/// The camera writes naive local ISO-8601; an explicit offset is converted.
/// A bare date stands for local midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(with_offset.with_timezone(&Local).naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

fn serialize_timestamp<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

/// Treats an explicit `null` like an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_image_file<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|file| !file.trim().is_empty()))
}
