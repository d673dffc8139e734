use std::time::{Duration, Instant};

use image::DynamicImage;
use tracing::{debug, warn};

use crate::error::Result;
use crate::mapping::LabelMap;
use crate::model::Model;
use crate::postprocess::{Scores, top_k};
use crate::preprocess::Processor;

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub class: usize,
    pub score: f32,
    pub confidence: f32,
    /// `None` when the label file has no line for `class`.
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub elapsed: Duration,
    pub top: Vec<Classification>,
}

/// Preprocesses `image`, runs the model once and labels the `k` best classes.
pub fn predict(
    model: &Model,
    labels: &LabelMap,
    processor: &Processor,
    image: &DynamicImage,
    k: usize,
) -> Result<Prediction> {
    let xs = processor.preprocess(image, model.input_spec())?;
    debug!(shape = ?xs.shape(), "input prepared");

    let t = Instant::now();
    let scores = model.run(&xs)?;
    let elapsed = t.elapsed();
    debug!(?elapsed, classes = scores.len(), "inference done");

    Ok(Prediction {
        elapsed,
        top: rank(&scores, labels, k),
    })
}

/// Top `k` classes of `scores` with their confidence and label text.
pub fn rank(scores: &Scores, labels: &LabelMap, k: usize) -> Vec<Classification> {
    if labels.len() < scores.len() {
        warn!(
            labels = labels.len(),
            classes = scores.len(),
            "label file has fewer lines than the model has classes"
        );
    }
    let confidences = scores.confidences();
    top_k(scores, k)
        .into_iter()
        .map(|class| Classification {
            class,
            score: scores.raw(class).unwrap_or_default(),
            confidence: confidences[class],
            label: labels.get(class).map(str::to_string),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_and_labels() {
        let labels = LabelMap::from_lines(["0 cat", "1 dog", "2 bird", "3 fish"]);
        let scores = Scores::Quantized(vec![10, 240, 0, 128]);
        let top = rank(&scores, &labels, 3);

        let classes: Vec<usize> = top.iter().map(|c| c.class).collect();
        assert_eq!(classes, vec![1, 3, 0]);
        assert_eq!(top[0].label.as_deref(), Some("dog"));
        assert_eq!(top[0].score, 240.0);
        assert!((top[0].confidence - 240.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn missing_label_is_none() {
        let labels = LabelMap::from_lines(["0 cat"]);
        let scores = Scores::Float(vec![0.1, 0.9]);
        let top = rank(&scores, &labels, 2);
        assert_eq!(top[0].class, 1);
        assert_eq!(top[0].label, None);
        assert_eq!(top[1].label.as_deref(), Some("cat"));
    }

    #[test]
    fn ranking_is_deterministic() {
        let labels = LabelMap::from_lines(["a", "b", "c"]);
        let scores = Scores::Float(vec![0.3, 0.3, 0.4]);
        assert_eq!(rank(&scores, &labels, 3), rank(&scores, &labels, 3));
    }
}
