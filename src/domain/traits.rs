// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The inference engine treats text normalisation, sentence
// embedding, classification and data loading as services it
// consumes. Each is a trait here so the engine never depends
// on a concrete implementation:
//
//   TextNormalizer  — DialectPreprocessor (data layer)
//   Embedder        — HashingEmbedder (ml layer)
//   Classifier      — CentroidClassifier (ml layer)
//   UtteranceSource — CsvLoader (data layer)
//   ChatPairSource  — CsvLoader (data layer)
//
// Tests swap in small fixed implementations of the same traits.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::record::{CandidateRecord, LabeledUtterance};

// ─── TextNormalizer ───────────────────────────────────────────────────────────
/// Maps raw chat text to a canonical form and splits it into tokens.
/// Implementations must be deterministic and side-effect free.
pub trait TextNormalizer {
    /// Canonicalise raw text (case, spelling variants, placeholders)
    fn normalize(&self, raw: &str) -> String;

    /// Split already canonical text into tokens
    fn tokenize(&self, canonical: &str) -> Vec<String>;

    /// normalize + tokenize in one call
    fn tokens(&self, raw: &str) -> Vec<String> {
        self.tokenize(&self.normalize(raw))
    }
}

// ─── Embedder ─────────────────────────────────────────────────────────────────
/// Turns a sentence into a fixed-length vector.
pub trait Embedder {
    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts at once. The default calls `embed`
    /// per text; backends with real batching override it.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

// ─── Classifier ───────────────────────────────────────────────────────────────
/// Result of classifying one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// The most likely label
    pub label: String,

    /// (label, probability) for every known label, in label order
    pub probabilities: Vec<(String, f32)>,
}

impl Prediction {
    /// Probability assigned to `label`, 0.0 if the label is unknown
    pub fn probability_of(&self, label: &str) -> f32 {
        self.probabilities
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }
}

/// Predicts a sentiment / intent label for a text.
pub trait Classifier {
    fn predict(&self, text: &str) -> Result<Prediction>;
}

// ─── Data sources ─────────────────────────────────────────────────────────────
/// Anything that can provide the labelled base corpus.
pub trait UtteranceSource {
    fn load_utterances(&self) -> Result<Vec<LabeledUtterance>>;
}

/// Anything that can provide the reply catalog.
pub trait ChatPairSource {
    fn load_pairs(&self) -> Result<Vec<CandidateRecord>>;
}
