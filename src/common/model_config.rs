use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::common::inference_device::InferenceDevice;
use crate::common::model_version::ModelVersion;
use crate::data::FsAccess;

/// Weights the original demo shipped with, exported to ONNX.
pub const DEFAULT_WEIGHTS: &str = "yolov8m.onnx";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub weights_path: String,
    /// Location of `libonnxruntime`. Empty means `ORT_DYLIB_PATH` or the system default.
    pub ort_lib_path: String,
    /// Optional class names, one per line. Used when the ONNX metadata has no `names`;
    /// when both exist they must have the same length and the metadata wins.
    pub labels_path: Option<String>,
    pub inference_device: InferenceDevice,
    pub model_version: ModelVersion,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub width: u32,
    pub height: u32,
    pub num_classes: usize,
    /// Images per inference call; a batch size fixed in the graph overrides it.
    pub batch_size: usize,
    pub warmup_runs: usize,
    /// Logs per-stage timings of every inference at info level.
    pub profile: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights_path: DEFAULT_WEIGHTS.to_string(),
            ort_lib_path: String::new(),
            labels_path: None,
            inference_device: InferenceDevice::default(),
            model_version: ModelVersion::YoloV8,
            conf_threshold: 0.25,
            iou_threshold: 0.7,
            width: 640,
            height: 640,
            num_classes: 80,
            batch_size: 1,
            warmup_runs: 1,
            profile: false,
        }
    }
}

impl ModelConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn set_device_type(&mut self, device_type: InferenceDevice) {
        self.inference_device = device_type;
    }

    /// Finds the weights file: absolute paths as given, relative ones under the
    /// working directory, then under `~/.cache/ped_detect/models`.
    pub fn resolve_weights(&self) -> anyhow::Result<PathBuf> {
        let given = PathBuf::from(&self.weights_path);
        if given.is_absolute() {
            if given.is_file() {
                return Ok(given);
            }
        } else {
            let cached = FsAccess::Cache.path_with_subs(&["models"]).ok();
            for root in std::iter::once(FsAccess::Current.raw_path()?).chain(cached) {
                let candidate = root.join(&given);
                if candidate.is_file() {
                    log::debug!("Using weights at {}", candidate.display());
                    return Ok(candidate);
                }
            }
        }

        anyhow::bail!(
            "Weights file {} not found. Export it with `yolo export model=yolov8m.pt format=onnx`.",
            self.weights_path
        )
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.conf_threshold) {
            anyhow::bail!("confidence threshold {} is outside [0, 1]", self.conf_threshold);
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            anyhow::bail!("IoU threshold {} is outside [0, 1]", self.iou_threshold);
        }
        if self.width == 0 || self.height == 0 {
            anyhow::bail!("model input size must be non-zero, got {}x{}", self.width, self.height);
        }
        if self.batch_size == 0 {
            anyhow::bail!("batch size must be at least 1");
        }
        Ok(())
    }
}

impl std::fmt::Display for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Weights File Path: {}\n\
        Labels Path: {}\n\
        OnnxRuntime Lib Path: {}\n\
        Inference Device: {}\n\
        Model Version: {}\n\
        Model Input Resolution: {}x{}\n\
        Detection Threshold: {}\n\
        NMS IoU Threshold: {}\n\
        Batch Size: {}\n\
        Warmup Runs: {}\n\
        Profile: {}",
               self.weights_path,
               self.labels_path.as_deref().unwrap_or("-"),
               if self.ort_lib_path.is_empty() { "-" } else { self.ort_lib_path.as_str() },
               self.inference_device, self.model_version.name(),
               self.width, self.height, self.conf_threshold, self.iou_threshold,
               self.batch_size, self.warmup_runs, self.profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(
            &path,
            r#"{ "weights_path": "yolov8n.onnx", "inference_device": { "kind": "cpu" }, "conf_threshold": 0.4 }"#,
        )
        .unwrap();

        let config = ModelConfig::from_json_file(&path).unwrap();
        assert_eq!(config.weights_path, "yolov8n.onnx");
        assert_eq!(config.inference_device, InferenceDevice::CPU);
        assert_eq!(config.conf_threshold, 0.4);
        assert_eq!(config.iou_threshold, 0.7);
        assert_eq!((config.width, config.height), (640, 640));
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let config = ModelConfig { conf_threshold: 1.5, ..Default::default() };
        assert!(config.validate().is_err());
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn relative_weights_resolve_against_working_dir() {
        let config = ModelConfig { weights_path: "Cargo.toml".to_string(), ..Default::default() };
        let resolved = config.resolve_weights().unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("Cargo.toml"));
    }

    #[test]
    fn zero_batch_is_rejected() {
        let config = ModelConfig { batch_size: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_weights_is_an_error() {
        let config = ModelConfig {
            weights_path: "/nonexistent/weights.onnx".to_string(),
            ..Default::default()
        };
        assert!(config.resolve_weights().is_err());
    }
}
