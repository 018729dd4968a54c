//! Command-line flags shared by `ped-detect` and `ped-web`.

use std::path::PathBuf;

use clap::Args;

use crate::common::{InferenceDevice, ModelConfig, ModelVersion};

/// Model selection and thresholds. Flags override values from `--config`.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// JSON model config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// ONNX weights [default: yolov8m.onnx]
    #[arg(long, value_name = "FILE")]
    pub model: Option<String>,

    /// Path to the ONNX Runtime shared library
    #[arg(long, value_name = "FILE")]
    pub ort_lib: Option<String>,

    /// Execution provider: cpu, cuda, tensorrt or coreml [default: cuda, falls back to cpu]
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// GPU index for the execution provider
    #[arg(long, value_name = "ID")]
    pub device_id: Option<usize>,

    /// Confidence threshold (0.0 - 1.0) [default: 0.25]
    #[arg(long, value_name = "THRESHOLD")]
    pub conf: Option<f32>,

    /// NMS IoU threshold (0.0 - 1.0) [default: 0.7]
    #[arg(long, value_name = "THRESHOLD")]
    pub iou: Option<f32>,

    /// Square model input size [default: 640]
    #[arg(long, value_name = "PIXELS")]
    pub imgsz: Option<u32>,

    /// Class names file, one per line
    #[arg(long, value_name = "FILE")]
    pub labels: Option<String>,

    /// YOLO export version, e.g. v8 or yolov11 [default: v8]
    #[arg(long, value_name = "VERSION")]
    pub yolo_version: Option<String>,

    /// Images per inference call when the model has a dynamic batch axis [default: 1]
    #[arg(long, value_name = "N")]
    pub batch: Option<usize>,

    /// Inference runs on a blank frame before the first real one [default: 1]
    #[arg(long, value_name = "N")]
    pub warmup: Option<usize>,

    /// Log per-stage timings of every inference
    #[arg(long)]
    pub profile: bool,
}

impl ModelArgs {
    pub fn model_config(&self) -> anyhow::Result<ModelConfig> {
        let mut config = match &self.config {
            Some(path) => ModelConfig::from_json_file(path)?,
            None => ModelConfig::default(),
        };

        if let Some(model) = &self.model {
            config.weights_path = model.clone();
        }
        if let Some(ort_lib) = &self.ort_lib {
            config.ort_lib_path = ort_lib.clone();
        }

        let device = match (&self.device, self.device_id) {
            (Some(name), id) => Some((name.as_str(), id.unwrap_or(0))),
            (None, Some(id)) => Some((config.inference_device.str_lowercase(), id)),
            (None, None) => None,
        };
        if let Some((name, id)) = device {
            let device = InferenceDevice::from_str(name, id).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown device {name}, expected one of: {}",
                    InferenceDevice::all_inference_devices().join(", ")
                )
            })?;
            config.set_device_type(device);
        }

        if let Some(conf) = self.conf {
            config.conf_threshold = conf;
        }
        if let Some(iou) = self.iou {
            config.iou_threshold = iou;
        }
        if let Some(imgsz) = self.imgsz {
            config.width = imgsz;
            config.height = imgsz;
        }
        if let Some(labels) = &self.labels {
            config.labels_path = Some(labels.clone());
        }
        if let Some(version) = &self.yolo_version {
            config.model_version = ModelVersion::parse(version)
                .ok_or_else(|| anyhow::anyhow!("Unknown YOLO version {version}"))?;
        }

        if let Some(batch) = self.batch {
            config.batch_size = batch;
        }
        if let Some(warmup) = self.warmup {
            config.warmup_runs = warmup;
        }
        if self.profile {
            config.profile = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = ModelArgs {
            device: Some("cpu".to_string()),
            conf: Some(0.5),
            imgsz: Some(320),
            ..Default::default()
        };
        let config = args.model_config().unwrap();
        assert_eq!(config.inference_device, InferenceDevice::CPU);
        assert_eq!(config.conf_threshold, 0.5);
        assert_eq!((config.width, config.height), (320, 320));
        assert_eq!(config.weights_path, "yolov8m.onnx");
    }

    #[test]
    fn runtime_flags_reach_the_config() {
        let args = ModelArgs { batch: Some(4), warmup: Some(0), profile: true, ..Default::default() };
        let config = args.model_config().unwrap();
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.warmup_runs, 0);
        assert!(config.profile);

        let zero_batch = ModelArgs { batch: Some(0), ..Default::default() };
        assert!(zero_batch.model_config().is_err());
    }

    #[test]
    fn device_id_keeps_default_provider() {
        let args = ModelArgs { device_id: Some(1), ..Default::default() };
        assert_eq!(args.model_config().unwrap().inference_device, InferenceDevice::CUDA(1));
    }

    #[test]
    fn rejects_bad_values() {
        let bad_device = ModelArgs { device: Some("tpu".to_string()), ..Default::default() };
        assert!(bad_device.model_config().is_err());

        let bad_conf = ModelArgs { conf: Some(1.5), ..Default::default() };
        assert!(bad_conf.model_config().is_err());
    }
}
