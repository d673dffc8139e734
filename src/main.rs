use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use clap::error::ErrorKind;

use label_image::cli::MISSING_ARGS_WARNING;
use label_image::helpers::{format_classification, format_elapsed, init_tracing};
use label_image::{Args, OnnxModel, Processor, load_class_mapping, load_image, predict};

fn main() -> anyhow::Result<ExitCode> {
    let args = match Args::try_parse() {
        Ok(args) if args.is_complete() => args,
        Ok(_) => {
            eprintln!("{MISSING_ARGS_WARNING}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            eprintln!("{MISSING_ARGS_WARNING}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => e.exit(),
    };
    init_tracing();

    let model = OnnxModel::new(args.cuda)
        .with_threads(args.threads)
        .load_model(&args.model)
        .with_context(|| format!("failed to load model {}", args.model))?;
    let labels = load_class_mapping(&args.label)?;
    let image = load_image(&args.image)
        .with_context(|| format!("failed to load image {}", args.image))?;
    let processor = Processor::new(args.preprocess_config());

    let prediction = predict(&model, &labels, &processor, &image, args.top_k)?;
    println!("{}", format_elapsed(prediction.elapsed));
    for classification in &prediction.top {
        println!("{}", format_classification(classification));
    }

    Ok(ExitCode::SUCCESS)
}
