use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub bind: SocketAddr,
    pub speed_limit_kmh: f64,
    pub vehicle_classes: Vec<String>,
    pub ignore_yolo_validation: bool,
    pub generator: GeneratorConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 9000)),
            speed_limit_kmh: 50.0,
            vehicle_classes: ["car", "truck", "bus", "motorcycle", "van"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            ignore_yolo_validation: false,
            generator: GeneratorConfig::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading simulator config {}", path_ref.display()))?;
        let config: SimulatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing simulator config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(bind: SocketAddr, speed_limit_kmh: f64, count: usize, seed: u64) -> Self {
        let defaults = Self::default();
        Self {
            bind,
            speed_limit_kmh,
            generator: GeneratorConfig {
                count,
                seed,
                ..defaults.generator.clone()
            },
            ..defaults
        }
    }

    /// The subset of camera settings served at `/api/config`.
    pub fn to_document(&self) -> Value {
        json!({
            "vehicle_settings": {
                "vehicle_classes": self.vehicle_classes,
                "ignore_yolo_validation": self.ignore_yolo_validation,
            },
            "speed_settings": {
                "speed_limit_kmh": self.speed_limit_kmh,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speedcore::detection::ObjectTypeOptions;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_overrides_generator() {
        let cfg = SimulatorConfig::from_args(SocketAddr::from(([0, 0, 0, 0], 8080)), 60.0, 10, 42);
        assert_eq!(cfg.generator.count, 10);
        assert_eq!(cfg.generator.seed, 42);
        assert_eq!(cfg.speed_limit_kmh, 60.0);
    }

    #[test]
    fn config_load_reads_yaml_with_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"speed_limit_kmh: 30\nvehicle_classes: [car, bicycle]\nignore_yolo_validation: true\ngenerator:\n  count: 5\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = SimulatorConfig::load(&path).unwrap();
        assert_eq!(cfg.speed_limit_kmh, 30.0);
        assert_eq!(cfg.generator.count, 5);
        assert_eq!(cfg.generator.seed, 0);
        assert_eq!(cfg.bind.port(), 9000);
    }

    #[test]
    fn document_feeds_object_type_options() {
        let cfg = SimulatorConfig {
            ignore_yolo_validation: true,
            ..Default::default()
        };
        let options = ObjectTypeOptions::from_config(&cfg.to_document());
        assert_eq!(options.types.last().map(String::as_str), Some("unknown"));
        assert_eq!(options.types.len(), cfg.vehicle_classes.len() + 1);
    }
}
