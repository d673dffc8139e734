pub mod classifier;
pub mod cli;
pub mod error;
pub mod helpers;
pub mod mapping;
pub mod model;
pub mod postprocess;
pub mod preprocess;

pub use crate::classifier::{predict, Classification, Prediction};
pub use crate::cli::Args;
pub use crate::error::{ClassifyError, Result};
pub use crate::mapping::{load_class_mapping, LabelMap};
pub use crate::model::{InputSpec, Model, OnnxModel};
pub use crate::postprocess::{argmax, top_k, Scores};
pub use crate::preprocess::{load_image, PreprocessConfig, Processor};
