//! Classifies `image.png` with `model.onnx` from the working directory and
//! prints the index of the highest-scoring class.

use anyhow::Context;

use label_image::helpers::init_tracing;
use label_image::model::{ElementKind, InputSpec};
use label_image::{OnnxModel, PreprocessConfig, Processor, argmax, load_image};

const MODEL_PATH: &str = "model.onnx";
const IMAGE_PATH: &str = "image.png";
const INPUT_SIZE: u32 = 224;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let model = OnnxModel::new(false)
        .load_model(MODEL_PATH)
        .with_context(|| format!("failed to load model {MODEL_PATH}"))?;
    let image =
        load_image(IMAGE_PATH).with_context(|| format!("failed to load image {IMAGE_PATH}"))?;

    // Always fed as normalized float32 at 224x224, whatever the model reports.
    let spec = InputSpec {
        kind: ElementKind::F32,
        ..*model.input_spec()
    };
    let processor = Processor::new(PreprocessConfig {
        size: Some((INPUT_SIZE, INPUT_SIZE)),
        ..PreprocessConfig::default()
    });
    let xs = processor.preprocess(&image, &spec)?;
    let scores = model.run(&xs)?;

    println!("{}", argmax(&scores));
    Ok(())
}
