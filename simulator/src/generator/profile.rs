use crate::backend::store::StoredDetection;
use crate::generator::template::image_file_name;
use anyhow::ensure;
use chrono::{Duration, NaiveDateTime};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use speedcore::detection::Direction;
use std::collections::HashSet;

const KMH_TO_MPH: f64 = 0.621_371;

/// Configuration for generating synthetic detections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub count: usize,
    /// Detections are spread uniformly over this many hours before "now".
    pub span_hours: u32,
    pub seed: u64,
    pub speed_mean_kmh: f64,
    pub speed_jitter_kmh: f64,
    /// Share of detections that carry an image, in `0..=1`.
    pub image_ratio: f64,
    pub colors: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 120,
            span_hours: 24 * 40,
            seed: 0,
            speed_mean_kmh: 48.0,
            speed_jitter_kmh: 25.0,
            image_ratio: 0.85,
            colors: ["white", "black", "silver", "red", "blue", "grey"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

/// Generates `config.count` detections ending at `now`, newest last.
pub fn build_detections(
    config: &GeneratorConfig,
    vehicle_classes: &[String],
    now: NaiveDateTime,
) -> anyhow::Result<Vec<StoredDetection>> {
    ensure!(!vehicle_classes.is_empty(), "no vehicle classes to generate");
    ensure!(!config.colors.is_empty(), "no colors to generate");
    ensure!(
        (0.0..=1.0).contains(&config.image_ratio),
        "image_ratio must lie in 0..=1, got {}",
        config.image_ratio
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let span_secs = i64::from(config.span_hours.max(1)) * 3600;
    let jitter = config.speed_jitter_kmh.abs();
    let mut seen_files = HashSet::new();

    let mut detections = Vec::with_capacity(config.count);
    for _ in 0..config.count {
        let timestamp = now - Duration::seconds(rng.gen_range(0..span_secs));
        let direction = if rng.gen_bool(0.5) {
            Direction::L2R
        } else {
            Direction::R2L
        };
        let object_type = vehicle_classes
            .choose(&mut rng)
            .cloned()
            .unwrap_or_default();
        let object_color = config.colors.choose(&mut rng).cloned().unwrap_or_default();
        let offset = if jitter > 0.0 {
            rng.gen_range(-jitter..jitter)
        } else {
            0.0
        };
        let speed_kmh = round1((config.speed_mean_kmh + offset).max(5.0));

        let image_file = if rng.gen_bool(config.image_ratio) {
            let base = image_file_name(timestamp, direction, &object_color, &object_type, speed_kmh);
            let stem = base.trim_end_matches(".jpg").to_string();
            let mut name = base;
            let mut suffix = 1;
            // same second, same vehicle: keep file names unique
            while !seen_files.insert(name.clone()) {
                name = format!("{stem}_{suffix}.jpg");
                suffix += 1;
            }
            name
        } else {
            String::new()
        };

        detections.push(StoredDetection {
            timestamp,
            object_type,
            object_color,
            direction,
            speed_kmh,
            speed_mph: round1(speed_kmh * KMH_TO_MPH),
            confidence: (rng.gen_range(0.40..0.99_f64) * 100.0).round() / 100.0,
            image_file,
            removed: false,
        });
    }

    detections.sort_by_key(|d| d.timestamp);
    Ok(detections)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
