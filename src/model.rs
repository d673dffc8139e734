use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use half::f16;
use ndarray::ArrayViewD;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch};
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::tensor::TensorElementType;
use ort::value::ValueType;
use tracing::debug;

use crate::error::{ClassifyError, Result};
use crate::postprocess::Scores;
use crate::preprocess::InputTensor;

/// Environment variable `ort` reads the ONNX Runtime library path from.
pub const DYLIB_PATH_ENV: &str = "ORT_DYLIB_PATH";

/// Spatial size used when the model leaves height or width dynamic.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    U8,
    F32,
    F16,
}

impl ElementKind {
    pub fn from_tensor_type(ty: TensorElementType) -> Option<Self> {
        match ty {
            TensorElementType::Uint8 => Some(Self::U8),
            TensorElementType::Float32 => Some(Self::F32),
            TensorElementType::Float16 => Some(Self::F16),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Nhwc,
    Nchw,
}

/// Shape and element type of the model's image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSpec {
    pub kind: ElementKind,
    pub layout: Layout,
    pub width: u32,
    pub height: u32,
}

impl InputSpec {
    /// Reads layout and size from a rank-4 input shape. Channels-last wins when
    /// both axis 1 and axis 3 could hold the 3 color channels.
    pub fn from_dims(kind: ElementKind, dims: &[i64]) -> Result<Self> {
        let [_, d1, d2, d3] = dims else {
            return Err(ClassifyError::UnsupportedInput(format!(
                "expected a rank-4 image tensor, got shape {dims:?}"
            )));
        };
        let (layout, h, w) = match (*d1, *d3) {
            (_, 3) => (Layout::Nhwc, *d1, *d2),
            (3, _) => (Layout::Nchw, *d2, *d3),
            _ => {
                return Err(ClassifyError::UnsupportedInput(format!(
                    "no 3-channel axis in shape {dims:?}"
                )));
            }
        };
        Ok(Self {
            kind,
            layout,
            width: spatial(w),
            height: spatial(h),
        })
    }
}

fn spatial(dim: i64) -> u32 {
    u32::try_from(dim)
        .ok()
        .filter(|&d| d > 0)
        .unwrap_or(DEFAULT_INPUT_SIZE)
}

/// Session settings; call `load_model` to get a runnable [`Model`].
pub struct OnnxModel {
    provider: [ExecutionProviderDispatch; 1],
    threads: Option<usize>,
}

impl OnnxModel {
    pub fn new(cuda: bool) -> Self {
        let provider = if cuda {
            [CUDAExecutionProvider::default().build().error_on_failure()]
        } else {
            [CPUExecutionProvider::default().build()]
        };
        Self {
            provider,
            threads: None,
        }
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn load_model(&self, model_path: impl AsRef<Path>) -> Result<Model> {
        let model_path = model_path.as_ref();
        std::fs::metadata(model_path).map_err(|e| ClassifyError::io(model_path, e))?;
        check_runtime_library(std::env::var_os(DYLIB_PATH_ENV).as_deref())?;

        let mut builder = SessionBuilder::new()?
            .with_execution_providers(self.provider.clone())?
            .with_optimization_level(GraphOptimizationLevel::Level3)?;
        if let Some(threads) = self.threads {
            builder = builder.with_intra_threads(threads)?;
        }
        let session = builder.commit_from_file(model_path)?;
        Model::from_session(session)
    }
}

/// `ort` panics when it cannot load the runtime library, so an absolute
/// `ORT_DYLIB_PATH` is checked up front. Relative paths and the default
/// library name are left to the loader's own search.
pub fn check_runtime_library(dylib_path: Option<&OsStr>) -> Result<()> {
    match dylib_path.map(Path::new) {
        Some(path) if path.is_absolute() && !path.is_file() => {
            Err(ClassifyError::RuntimeLibrary(PathBuf::from(path)))
        }
        _ => Ok(()),
    }
}

/// A loaded session plus the input/output details needed to feed it.
pub struct Model {
    session: Session,
    input: InputSpec,
    output_name: String,
    output_kind: ElementKind,
}

impl Model {
    pub fn from_session(session: Session) -> Result<Self> {
        let input = session
            .inputs
            .first()
            .ok_or_else(|| ClassifyError::UnsupportedInput("model has no inputs".into()))?;
        let input = match &input.input_type {
            ValueType::Tensor { ty, dimensions, .. } => {
                let kind = ElementKind::from_tensor_type(*ty).ok_or_else(|| {
                    ClassifyError::UnsupportedInput(format!("element type {ty:?}"))
                })?;
                InputSpec::from_dims(kind, dimensions)?
            }
            other => {
                return Err(ClassifyError::UnsupportedInput(format!("{other:?}")));
            }
        };

        let output = session
            .outputs
            .first()
            .ok_or_else(|| ClassifyError::UnsupportedOutput("model has no outputs".into()))?;
        let output_kind = match &output.output_type {
            ValueType::Tensor { ty, .. } => ElementKind::from_tensor_type(*ty)
                .ok_or_else(|| ClassifyError::UnsupportedOutput(format!("element type {ty:?}")))?,
            other => return Err(ClassifyError::UnsupportedOutput(format!("{other:?}"))),
        };
        let output_name = output.name.clone();

        debug!(?input, output = %output_name, ?output_kind, "model loaded");
        Ok(Self {
            session,
            input,
            output_name,
            output_kind,
        })
    }

    pub fn input_spec(&self) -> &InputSpec {
        &self.input
    }

    /// Runs one inference and returns the first output's class scores.
    pub fn run(&self, input: &InputTensor) -> Result<Scores> {
        let ys = match input {
            InputTensor::U8(xs) => self.session.run(ort::inputs![xs.view().into_dyn()]?)?,
            InputTensor::F32(xs) => self.session.run(ort::inputs![xs.view().into_dyn()]?)?,
            InputTensor::F16(xs) => self.session.run(ort::inputs![xs.view().into_dyn()]?)?,
        };
        let value = &ys[self.output_name.as_str()];

        let scores = match self.output_kind {
            ElementKind::U8 => Scores::Quantized(first_row(value.try_extract_tensor::<u8>()?)),
            ElementKind::F32 => Scores::Float(first_row(value.try_extract_tensor::<f32>()?)),
            ElementKind::F16 => Scores::Float(
                first_row(value.try_extract_tensor::<f16>()?)
                    .into_iter()
                    .map(f16::to_f32)
                    .collect(),
            ),
        };
        if scores.is_empty() {
            return Err(ClassifyError::EmptyOutput);
        }
        Ok(scores)
    }
}

/// Scores of the first batch entry, i.e. the first run along the last axis.
fn first_row<T: Copy>(view: ArrayViewD<'_, T>) -> Vec<T> {
    let classes = view.shape().last().copied().unwrap_or(0);
    view.iter().take(classes).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    #[test]
    fn nhwc_shape() {
        let spec = InputSpec::from_dims(ElementKind::U8, &[1, 224, 192, 3]).unwrap();
        assert_eq!(spec.layout, Layout::Nhwc);
        assert_eq!((spec.width, spec.height), (192, 224));
    }

    #[test]
    fn nchw_shape() {
        let spec = InputSpec::from_dims(ElementKind::F32, &[1, 3, 256, 128]).unwrap();
        assert_eq!(spec.layout, Layout::Nchw);
        assert_eq!((spec.width, spec.height), (128, 256));
    }

    #[test]
    fn dynamic_dims_fall_back_to_default_size() {
        let spec = InputSpec::from_dims(ElementKind::F32, &[-1, -1, -1, 3]).unwrap();
        assert_eq!((spec.width, spec.height), (DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE));
        let spec = InputSpec::from_dims(ElementKind::F32, &[-1, 3, 0, -1]).unwrap();
        assert_eq!(spec.layout, Layout::Nchw);
        assert_eq!((spec.width, spec.height), (DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE));
    }

    #[test]
    fn rejects_non_image_shapes() {
        assert!(InputSpec::from_dims(ElementKind::F32, &[1, 224, 224]).is_err());
        assert!(InputSpec::from_dims(ElementKind::F32, &[1, 1, 28, 28]).is_err());
    }

    #[test]
    fn element_kinds() {
        assert_eq!(
            ElementKind::from_tensor_type(TensorElementType::Uint8),
            Some(ElementKind::U8)
        );
        assert_eq!(
            ElementKind::from_tensor_type(TensorElementType::Float16),
            Some(ElementKind::F16)
        );
        assert_eq!(ElementKind::from_tensor_type(TensorElementType::Int64), None);
    }

    #[test]
    fn missing_runtime_library_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("libonnxruntime.so");
        let err = check_runtime_library(Some(missing.as_os_str())).unwrap_err();
        assert!(matches!(err, ClassifyError::RuntimeLibrary(_)));
        assert!(err.to_string().contains("ORT_DYLIB_PATH"));

        std::fs::write(&missing, b"").unwrap();
        assert!(check_runtime_library(Some(missing.as_os_str())).is_ok());
        assert!(check_runtime_library(None).is_ok());
        assert!(check_runtime_library(Some(OsStr::new("libonnxruntime.so"))).is_ok());
    }

    #[test]
    fn missing_model_fails_before_the_runtime_loads() {
        let dir = tempfile::tempdir().unwrap();
        let err = match OnnxModel::new(false).load_model(dir.path().join("model.onnx")) {
            Ok(_) => panic!("expected a missing model error"),
            Err(e) => e,
        };
        assert!(matches!(err, ClassifyError::Io { .. }), "{err}");
    }

    #[test]
    fn first_row_takes_batch_zero() {
        let arr = Array::from_shape_vec(IxDyn(&[2, 3]), vec![1u8, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(first_row(arr.view()), vec![1, 2, 3]);
        let flat = Array::from_shape_vec(IxDyn(&[4]), vec![0.1f32, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(first_row(flat.view()), vec![0.1, 0.2, 0.3, 0.4]);
    }
}
