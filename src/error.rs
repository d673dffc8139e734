use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a model, preparing its input or reading its output.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to resize image: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("onnx runtime library not found at {} (set ORT_DYLIB_PATH)", .0.display())]
    RuntimeLibrary(PathBuf),

    #[error("onnx runtime error: {0}")]
    Runtime(#[from] ort::Error),

    #[error("unsupported model input: {0}")]
    UnsupportedInput(String),

    #[error("unsupported model output: {0}")]
    UnsupportedOutput(String),

    #[error("model produced no class scores")]
    EmptyOutput,
}

impl ClassifyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ClassifyError> = std::result::Result<T, E>;
