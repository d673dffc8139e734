use ndarray::Array1;
use ordered_float::OrderedFloat;

/// Per-class scores from the model's output tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum Scores {
    /// uint8 output of a quantized model, 0..=255.
    Quantized(Vec<u8>),
    Float(Vec<f32>),
}

impl Scores {
    pub fn len(&self) -> usize {
        match self {
            Scores::Quantized(v) => v.len(),
            Scores::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn raw(&self, class: usize) -> Option<f32> {
        match self {
            Scores::Quantized(v) => v.get(class).map(|&s| s as f32),
            Scores::Float(v) => v.get(class).copied(),
        }
    }

    /// Confidence in [0, 1] for every class. Quantized scores are divided by
    /// 255; float scores outside [0, 1] are treated as logits.
    pub fn confidences(&self) -> Vec<f32> {
        match self {
            Scores::Quantized(v) => v.iter().map(|&s| s as f32 / 255.0).collect(),
            Scores::Float(v) if v.iter().all(|s| (0.0..=1.0).contains(s)) => v.clone(),
            Scores::Float(v) => logit_confidences(v),
        }
    }
}

/// Softmax over logits that may hold non-finite values. `+inf` classes share
/// all the mass; `NaN` counts as `-inf`.
fn logit_confidences(logits: &[f32]) -> Vec<f32> {
    let infinite = logits.iter().filter(|&&s| s == f32::INFINITY).count();
    if infinite > 0 {
        let share = 1.0 / infinite as f32;
        return logits
            .iter()
            .map(|&s| if s == f32::INFINITY { share } else { 0.0 })
            .collect();
    }

    let cleaned: Array1<f32> = logits
        .iter()
        .map(|&s| if s.is_nan() { f32::NEG_INFINITY } else { s })
        .collect();
    if cleaned.iter().all(|&s| s == f32::NEG_INFINITY) {
        return vec![0.0; logits.len()];
    }
    softmax(&cleaned).to_vec()
}

/// Applies softmax to a 1D array (slice) and returns a new Array1<f32>.
pub fn softmax(slice: &Array1<f32>) -> Array1<f32> {
    let max_val = slice.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_vals: Array1<f32> = slice.mapv(|x| (x - max_val).exp());
    let sum_exp: f32 = exp_vals.sum();
    exp_vals.mapv(|v| v / sum_exp)
}

/// Index of the first maximum; `NaN` never wins.
fn argmax_index(values: impl IntoIterator<Item = f32>) -> usize {
    values
        .into_iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(max_idx, max_val), (i, val)| {
            if val > max_val { (i, val) } else { (max_idx, max_val) }
        })
        .0
}

pub fn argmax(scores: &Scores) -> usize {
    match scores {
        Scores::Quantized(v) => argmax_index(v.iter().map(|&s| s as f32)),
        Scores::Float(v) => argmax_index(v.iter().copied()),
    }
}

/// Class indices of the `k` highest raw scores, highest first.
/// Equal scores are ordered by descending class index.
pub fn top_k(scores: &Scores, k: usize) -> Vec<usize> {
    let mut ranked: Vec<(OrderedFloat<f32>, usize)> = (0..scores.len())
        .filter_map(|i| scores.raw(i).map(|s| (OrderedFloat(rank_key(s)), i)))
        .collect();
    ranked.sort_unstable_by(|a, b| b.cmp(a));
    ranked.into_iter().take(k).map(|(_, i)| i).collect()
}

// OrderedFloat sorts NaN above everything.
fn rank_key(score: f32) -> f32 {
    if score.is_nan() { f32::NEG_INFINITY } else { score }
}
