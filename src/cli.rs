use clap::Parser;

use crate::preprocess::PreprocessConfig;

pub const MISSING_ARGS_WARNING: &str = "Warning: Must provide: model, label, and image file name.";

#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Classify an image with a pre-trained ONNX model", long_about = None)]
pub struct Args {
    /// File path of the ONNX model
    #[arg(long, required = true)]
    pub model: String,

    /// File path of the label file
    #[arg(long, required = true)]
    pub label: String,

    /// File path of the image to be recognized
    #[arg(long, required = true)]
    pub image: String,

    /// Number of predictions to print
    #[arg(long, default_value_t = 3)]
    pub top_k: usize,

    /// Mean subtracted from each pixel for floating-point models
    #[arg(long, default_value_t = 127.5)]
    pub input_mean: f32,

    /// Divisor applied to each pixel for floating-point models
    #[arg(long, default_value_t = 127.5)]
    pub input_std: f32,

    /// Intra-op thread count for the runtime
    #[arg(long)]
    pub threads: Option<usize>,

    /// Run on the CUDA execution provider
    #[arg(long)]
    pub cuda: bool,
}

impl Args {
    /// True when every required path is non-empty.
    pub fn is_complete(&self) -> bool {
        !self.model.is_empty() && !self.label.is_empty() && !self.image.is_empty()
    }

    pub fn preprocess_config(&self) -> PreprocessConfig {
        PreprocessConfig {
            mean: [self.input_mean; 3],
            std: [self.input_std; 3],
            ..PreprocessConfig::default()
        }
    }
}
