//! ONNX Runtime session wrapper: provider selection, dtype alignment, output extraction.

use std::time::Instant;

use anyhow::{Context, Result};
use half::{bf16, f16};
use ndarray::{Array, IxDyn};
use ort::{
    execution_providers::{ExecutionProvider,
                          CPUExecutionProvider,
                          CUDAExecutionProvider,
                          TensorRTExecutionProvider,
                          CoreMLExecutionProvider},
    session::builder::{GraphOptimizationLevel, SessionBuilder},
    session::{Session, SessionInputValue},
    tensor::TensorElementType,
    value::{DynValue, Tensor, ValueType},
};
use crate::common::InferenceDevice;
use crate::data::{ConfigOrt, TimeCalc, Xs, X, CROSS_MARK};
use crate::utils::human_bytes;

/// ONNX Runtime tensor attributes containing names, data types, and dimensions.
/// Dynamic dimensions are stored as `0`.
#[derive(Debug, Clone, Default)]
pub struct OrtTensorAttr {
    pub names: Vec<String>,
    pub dtypes: Vec<TensorElementType>,
    pub dimss: Vec<Vec<usize>>,
}

impl OrtTensorAttr {
    fn push(&mut self, name: &str, value_type: &ValueType) {
        match value_type {
            ValueType::Tensor { ty, shape, .. } => {
                self.names.push(name.to_string());
                self.dtypes.push(*ty);
                self.dimss.push(shape.iter().map(|&d| if d > 0 { d as usize } else { 0 }).collect());
            }
            other => log::warn!("Skipping non-tensor model value {name}: {other:?}"),
        }
    }
}

/// ONNXRuntime Backend
#[derive(Debug)]
pub struct OrtEngine {
    session: Session,
    device: InferenceDevice,
    inputs_attrs: OrtTensorAttr,
    outputs_attrs: OrtTensorAttr,
    model_width: u32,
    model_height: u32,
    profile: bool,
    infer_time: TimeCalc,
}

impl OrtEngine {
    pub fn new(config: &ConfigOrt) -> Result<Self> {
        Self::init_runtime(&config.ort_lib_path)?;

        let mut builder = Session::builder()?;

        let mut device = config.device;
        match device {
            InferenceDevice::TensorRT(device_id) => {
                Self::build_trt(&mut builder, device_id).unwrap_or_else(|err| {
                    log::warn!("{err}, Using cpu");
                    device = InferenceDevice::CPU;
                })
            }
            InferenceDevice::CUDA(device_id) => {
                Self::build_cuda(&mut builder, device_id).unwrap_or_else(|err| {
                    log::warn!("{err}, Using cpu");
                    device = InferenceDevice::CPU;
                })
            }
            InferenceDevice::CoreML(_) => Self::build_coreml(&mut builder).unwrap_or_else(|err| {
                log::warn!("{err}, Using cpu");
                device = InferenceDevice::CPU;
            }),
            InferenceDevice::CPU => {
                Self::build_cpu(&mut builder)?;
            }
        }
        if device == InferenceDevice::CPU && config.device != InferenceDevice::CPU {
            Self::build_cpu(&mut builder)?;
        }

        let session = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(&config.onnx_path)
            .with_context(|| format!("Failed to load ONNX model {}", config.onnx_path))?;

        let mut inputs_attrs = OrtTensorAttr::default();
        for input in session.inputs.iter() {
            inputs_attrs.push(&input.name, &input.input_type);
        }
        let mut outputs_attrs = OrtTensorAttr::default();
        for output in session.outputs.iter() {
            outputs_attrs.push(&output.name, &output.output_type);
        }
        if inputs_attrs.names.is_empty() || outputs_attrs.names.is_empty() {
            anyhow::bail!("{CROSS_MARK} Model {} has no tensor inputs or outputs", config.onnx_path);
        }

        // The image input is NCHW; fixed spatial sizes in the graph win over the configured ones.
        let dims = &inputs_attrs.dimss[0];
        let model_height = dims.get(2).copied().filter(|&d| d > 0).map(|d| d as u32).unwrap_or(config.model_height);
        let model_width = dims.get(3).copied().filter(|&d| d > 0).map(|d| d as u32).unwrap_or(config.model_width);

        let file_size = std::fs::metadata(&config.onnx_path).map(|m| m.len()).unwrap_or(0);

        // summary
        log::info!(
            "Backend: ONNXRuntime | Device: {} | Input: {}x{} | Weights: {}B",
            device,
            model_width,
            model_height,
            human_bytes(file_size as f64),
        );

        Ok(Self {
            session,
            device,
            inputs_attrs,
            outputs_attrs,
            model_width,
            model_height,
            profile: config.profile,
            infer_time: TimeCalc::default(),
        })
    }

    fn init_runtime(ort_lib_path: &str) -> Result<()> {
        let committed = if ort_lib_path.is_empty() {
            ort::init().with_name("ped_detect").commit()
        } else {
            ort::init_from(ort_lib_path).with_name("ped_detect").commit()
        };

        match committed {
            Ok(_) => Ok(()),
            Err(e) => Err(anyhow::anyhow!("{CROSS_MARK} Failed to commit ORT environment: {:?}", e)),
        }
    }

    fn build_trt(builder: &mut SessionBuilder, device_id: usize) -> Result<()> {
        let trt = TensorRTExecutionProvider::default()
            .with_device_id(device_id as i32)
            .with_engine_cache(true)
            .with_engine_cache_path("trt-cache");
        if trt.is_available()? {
            match trt.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} TensorRT initialization failed: {:?}", err) }
            }
            log::info!("Initial model serialization with TensorRT may take some time...");
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} TensorRT execution provider not available")
        }
    }

    fn build_cuda(builder: &mut SessionBuilder, device_id: usize) -> Result<()> {
        let ep = CUDAExecutionProvider::default()
            .with_device_id(device_id as i32);
        if ep.is_available()? {
            match ep.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} CUDA initialization failed: {:?}", err) }
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CUDA execution provider not available")
        }
    }

    fn build_coreml(builder: &mut SessionBuilder) -> Result<()> {
        let ep = CoreMLExecutionProvider::default();
        if ep.is_available()? {
            match ep.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} CoreML initialization failed: {:?}", err) }
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CoreML execution provider not available")
        }
    }

    fn build_cpu(builder: &mut SessionBuilder) -> Result<()> {
        let ep = CPUExecutionProvider::default();
        if ep.is_available()? {
            match ep.register(builder) {
                Ok(_) => { }
                Err(err) => { anyhow::bail!("{CROSS_MARK} CPU initialization failed: {:?}", err) }
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CPU execution provider not available")
        }
    }

    fn tensor_preprocess(x: &X, dtype: &TensorElementType) -> Result<DynValue> {
        let x = match dtype {
            TensorElementType::Float32 => Tensor::from_array(x.0.clone())?.into_dyn(),
            TensorElementType::Float16 => Tensor::from_array(x.mapv(f16::from_f32))?.into_dyn(),
            TensorElementType::Bfloat16 => Tensor::from_array(x.mapv(bf16::from_f32))?.into_dyn(),
            TensorElementType::Float64 => Tensor::from_array(x.mapv(|x_| x_ as f64))?.into_dyn(),
            TensorElementType::Uint8 => Tensor::from_array(x.mapv(|x_| (x_ * 255.).round() as u8))?.into_dyn(),
            other => anyhow::bail!("Unsupported model input type: {:?}", other),
        };
        Ok(x)
    }

    pub fn run(&mut self, xs: Xs) -> Result<Xs> {
        // inputs dtype alignment
        let t_pre = Instant::now();
        let mut xs_: Vec<(String, SessionInputValue<'_>)> = Vec::new();
        for ((name, dtype), x) in self.inputs_attrs.names.iter()
            .zip(self.inputs_attrs.dtypes.iter())
            .zip(xs.into_iter())
        {
            xs_.push((name.clone(), SessionInputValue::from(Self::tensor_preprocess(&x, dtype)?)));
        }
        let t_pre = t_pre.elapsed();
        self.infer_time.add_or_push(0, t_pre);

        // inference
        let t_run = Instant::now();
        let outputs = self.session.run(xs_).context("ONNX Runtime inference failed")?;
        let t_run = t_run.elapsed();
        self.infer_time.add_or_push(1, t_run);

        // extract
        let t_post = Instant::now();
        let mut ys = Xs::new();
        for (dtype, name) in self.outputs_attrs.dtypes.iter().zip(self.outputs_attrs.names.iter()) {
            let y = Self::tensor_postprocess(&outputs[name.as_str()], dtype)
                .with_context(|| format!("Failed to extract output {name}"))?;
            ys.push_kv(name.as_str(), X::from(y))?;
        }
        let t_post = t_post.elapsed();
        self.infer_time.add_or_push(2, t_post);

        if self.profile {
            log::info!(
                "[Profile] {:.2?} ({:.2?} avg) [alignment: {:.2?} | inference: {:.2?} | to_f32: {:.2?}]",
                t_pre + t_run + t_post,
                self.infer_time.avg(),
                t_pre,
                t_run,
                t_post,
            );
        }
        Ok(ys)
    }

    fn tensor_postprocess(x: &DynValue, dtype: &TensorElementType) -> Result<Array<f32, IxDyn>> {
        fn extract_and_convert<T>(x: &DynValue, map_fn: impl Fn(T) -> f32) -> Result<Array<f32, IxDyn>>
        where
            T: Clone + 'static + ort::tensor::PrimitiveTensorElementType,
        {
            let view = x.try_extract_array::<T>()?;
            Ok(view.mapv(map_fn))
        }

        match dtype {
            TensorElementType::Float32 => extract_and_convert::<f32>(x, |x| x),
            TensorElementType::Float16 => extract_and_convert::<f16>(x, f16::to_f32),
            TensorElementType::Bfloat16 => extract_and_convert::<bf16>(x, bf16::to_f32),
            TensorElementType::Float64 => extract_and_convert::<f64>(x, |x| x as f32),
            TensorElementType::Int64 => extract_and_convert::<i64>(x, |x| x as f32),
            TensorElementType::Int32 => extract_and_convert::<i32>(x, |x| x as f32),
            _ => Err(anyhow::anyhow!("Unsupported ort tensor type: {:?}", dtype)),
        }
    }

    pub fn device(&self) -> &InferenceDevice {
        &self.device
    }

    pub fn model_width(&self) -> u32 { self.model_width }

    pub fn model_height(&self) -> u32 { self.model_height }

    /// Batch size fixed by the graph, `None` when the batch axis is dynamic.
    pub fn fixed_batch(&self) -> Option<usize> {
        self.inputs_attrs.dimss.first().and_then(|d| d.first()).copied().filter(|&b| b > 0)
    }

    pub fn try_fetch(&self, key: &str) -> Option<String> {
        match self.session.metadata() {
            Err(_) => None,
            Ok(metadata) => metadata.custom(key).unwrap_or_default(),
        }
    }
}
