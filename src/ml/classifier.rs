// ============================================================
// Layer 5 — Centroid Classifier
// ============================================================
// Sentiment classifier over sentence embeddings.
//
// Training:  average the (normalised) embeddings of every
//            training message per label → one centroid per label.
// Predicting: cosine similarity of the message to each centroid,
//            turned into probabilities with a softmax:
//
//   p(label) = exp(T · sim(label)) / Σ exp(T · sim(l))
//
// The temperature T spreads the similarities (which sit close
// together for short chat messages) so the probabilities are
// readable. The predicted label is the argmax.

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;

use crate::domain::record::LabeledUtterance;
use crate::domain::traits::{Classifier, Embedder, Prediction};
use crate::ml::similarity::{cosine_similarity, l2_normalize};

pub const DEFAULT_TEMPERATURE: f32 = 10.0;

pub struct CentroidClassifier<E: Embedder> {
    embedder:    E,
    labels:      Vec<String>,
    centroids:   Vec<Vec<f32>>,
    temperature: f32,
}

impl<E: Embedder> CentroidClassifier<E> {
    /// Fit one centroid per label.
    ///
    /// Labels are ordered by `label_order` first, then any other
    /// label in order of first appearance.
    pub fn train(embedder: E, examples: &[LabeledUtterance], label_order: &[String]) -> Result<Self> {
        if examples.is_empty() {
            bail!("cannot train a classifier without examples");
        }

        let texts: Vec<String> = examples.iter().map(|u| u.text.clone()).collect();
        let vectors = embedder
            .embed_batch(&texts)
            .context("Embedding classifier training data failed")?;

        let dim = embedder.dimension();
        let mut sums: IndexMap<&str, Vec<f32>> = IndexMap::new();
        for (example, v) in examples.iter().zip(&vectors) {
            let sum = sums
                .entry(example.label.as_str())
                .or_insert_with(|| vec![0.0; dim]);
            for (s, x) in sum.iter_mut().zip(v) {
                *s += x;
            }
        }

        let mut ordered: Vec<&str> = label_order
            .iter()
            .map(String::as_str)
            .filter(|l| sums.contains_key(*l))
            .collect();
        for l in sums.keys() {
            if !ordered.contains(l) {
                ordered.push(l);
            }
        }

        let mut labels    = Vec::with_capacity(ordered.len());
        let mut centroids = Vec::with_capacity(ordered.len());
        for l in ordered {
            let mut c = sums[l].clone();
            l2_normalize(&mut c);
            labels.push(l.to_string());
            centroids.push(c);
        }

        tracing::info!(
            "Trained centroid classifier on {} examples, labels: {:?}",
            examples.len(),
            labels
        );

        Ok(Self { embedder, labels, centroids, temperature: DEFAULT_TEMPERATURE })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl<E: Embedder> Classifier for CentroidClassifier<E> {
    fn predict(&self, text: &str) -> Result<Prediction> {
        let v = self.embedder.embed(text)?;

        let scores: Vec<f32> = self
            .centroids
            .iter()
            .map(|c| self.temperature * cosine_similarity(&v, c))
            .collect();

        // subtract the max before exp() to stay in range
        let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f32 = exps.iter().sum();

        let probabilities: Vec<(String, f32)> = self
            .labels
            .iter()
            .cloned()
            .zip(exps.iter().map(|e| e / total))
            .collect();

        // first label wins ties
        let mut best = 0;
        for (i, s) in scores.iter().enumerate() {
            if *s > scores[best] {
                best = i;
            }
        }

        Ok(Prediction { label: self.labels[best].clone(), probabilities })
    }
}
