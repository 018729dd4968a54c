//! Options for building the ONNX Runtime detector.

use anyhow::Result;
use crate::common::{InferenceDevice, ModelConfig, ModelVersion};

#[derive(Debug, Clone)]
pub struct ConfigOrt {
    pub onnx_path: String,
    pub ort_lib_path: String,
    pub device: InferenceDevice,
    pub batch_size: usize,
    pub model_width: u32,
    pub model_height: u32,
    pub profile: bool,
    pub num_dry_run: usize,

    pub nc: Option<usize>,
    pub conf: f32,
    pub iou: Option<f32>,
    pub names: Option<Vec<String>>,
    pub yolo_version: ModelVersion,
}

impl Default for ConfigOrt {
    fn default() -> Self {
        Self {
            onnx_path: String::new(),
            ort_lib_path: String::new(),
            device: InferenceDevice::CPU,
            profile: false,
            batch_size: 1,
            model_height: 640,
            model_width: 640,
            num_dry_run: 1,

            nc: Some(80), // Default COCO class number
            conf: 0.25,
            iou: None,
            names: None,
            yolo_version: ModelVersion::YoloV8,
        }
    }
}

impl ConfigOrt {
    pub fn new() -> Self {
        Default::default()
    }

    /// Options matching a [`ModelConfig`]. The weights path must already be resolved.
    pub fn from_model_config(model: &ModelConfig, onnx_path: &str) -> Result<Self> {
        let mut options = ConfigOrt::new()
            .with_model(onnx_path)?
            .with_ort_lib_path(&model.ort_lib_path)?
            .with_device(model.inference_device)
            .with_yolo_version(model.model_version)
            .with_model_width(model.width)
            .with_model_height(model.height)
            .with_nc(model.num_classes)
            .with_conf(model.conf_threshold)
            .with_iou(model.iou_threshold)
            .with_batch_size(model.batch_size)
            .with_dry_run(model.warmup_runs)
            .with_profile(model.profile);

        if let Some(labels) = &model.labels_path {
            let names = crate::utils::file_to_vec(labels)
                .map_err(|e| anyhow::anyhow!("Failed to read labels file {labels}: {e}"))?;
            options = options.with_names(names);
        }
        Ok(options)
    }

    pub fn with_model(mut self, onnx_path: &str) -> Result<Self> {
        self.onnx_path = onnx_path.to_string();
        Ok(self)
    }

    pub fn with_ort_lib_path(mut self, ort_lib_path: &str) -> Result<Self> {
        self.ort_lib_path = ort_lib_path.to_string();
        Ok(self)
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    pub fn with_model_width(mut self, n: u32) -> Self {
        self.model_width = n;
        self
    }

    pub fn with_model_height(mut self, n: u32) -> Self {
        self.model_height = n;
        self
    }

    pub fn with_dry_run(mut self, n: usize) -> Self {
        self.num_dry_run = n;
        self
    }

    pub fn with_device(mut self, device_type: InferenceDevice) -> Self {
        self.device = device_type;
        self
    }

    pub fn with_yolo_version(mut self, x: ModelVersion) -> Self {
        self.yolo_version = x;
        self
    }

    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = Some(names);
        self
    }

    pub fn with_nc(mut self, nc: usize) -> Self {
        self.nc = Some(nc);
        self
    }

    pub fn with_iou(mut self, x: f32) -> Self {
        self.iou = Some(x);
        self
    }

    pub fn with_conf(mut self, x: f32) -> Self {
        self.conf = x;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_model_config() {
        let model = ModelConfig {
            inference_device: InferenceDevice::CPU,
            conf_threshold: 0.5,
            width: 960,
            ..Default::default()
        };
        let options = ConfigOrt::from_model_config(&model, "weights.onnx").unwrap();
        assert_eq!(options.onnx_path, "weights.onnx");
        assert_eq!(options.device, InferenceDevice::CPU);
        assert_eq!(options.conf, 0.5);
        assert_eq!(options.iou, Some(0.7));
        assert_eq!((options.model_width, options.model_height), (960, 640));
        assert!(options.names.is_none());
        assert_eq!((options.batch_size, options.num_dry_run), (1, 1));
        assert!(!options.profile);
    }

    #[test]
    fn carries_batch_warmup_profile_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("labels.txt");
        std::fs::write(&labels, "person\ncar\n").unwrap();

        let model = ModelConfig {
            batch_size: 4,
            warmup_runs: 0,
            profile: true,
            labels_path: Some(labels.to_string_lossy().into_owned()),
            ..Default::default()
        };
        let options = ConfigOrt::from_model_config(&model, "weights.onnx").unwrap();
        assert_eq!(options.batch_size, 4);
        assert_eq!(options.num_dry_run, 0);
        assert!(options.profile);
        assert_eq!(options.names, Some(vec!["person".to_string(), "car".to_string()]));
    }

    #[test]
    fn missing_labels_file_fails() {
        let model = ModelConfig {
            labels_path: Some("/nonexistent/labels.txt".to_string()),
            ..Default::default()
        };
        assert!(ConfigOrt::from_model_config(&model, "weights.onnx").is_err());
    }
}
