// ============================================================
// Layer 5 — Response Selector
// ============================================================
// Picks a canned Mundart reply for a user message.
//
// Answer path:
//
//   text ──► Classifier ──► predicted label
//     │                          │ (label filter)
//     └──► Embedder ──► EmbeddingIndex::top_matches
//                               │
//                         best match ── similarity < min? ──► no reply
//                               │
//                               └──────► reply
//
// A missing reply is a normal outcome, not an error: the caller
// still gets the best similarity so it can tell the user how
// close the catalog came.

use anyhow::{bail, Context, Result};

use crate::domain::traits::{Classifier, Embedder, Prediction};
use crate::ml::index::EmbeddingIndex;

/// Result of `select_reply`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyOutcome {
    /// The chosen reply, `None` if nothing cleared the threshold
    pub reply: Option<String>,

    /// Similarity of the best match, `None` for an empty catalog
    pub similarity: Option<f32>,
}

impl ReplyOutcome {
    fn nothing() -> Self {
        Self { reply: None, similarity: None }
    }
}

/// One row of the neighbours debug view.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// 1-based rank
    pub rank:       usize,
    pub similarity: f32,
    pub utterance:  String,
    pub reply:      String,
    pub label:      String,
    pub intent:     Option<String>,
    pub is_seed:    bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NeighborReport {
    pub prediction: Prediction,
    pub hits:       Vec<Neighbor>,
}

/// Classification plus reply for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub prediction: Prediction,
    pub outcome:    ReplyOutcome,
}

pub struct ResponseSelector<E: Embedder, C: Classifier> {
    index:      EmbeddingIndex,
    embedder:   E,
    classifier: C,
}

impl<E: Embedder, C: Classifier> ResponseSelector<E, C> {
    /// `index` must have been built with (a clone of) `embedder`;
    /// a vector length mismatch is rejected here.
    pub fn new(index: EmbeddingIndex, embedder: E, classifier: C) -> Result<Self> {
        if !index.is_empty() && index.dimension() != embedder.dimension() {
            bail!(
                "index holds {}-dim vectors but the embedder produces {}",
                index.dimension(),
                embedder.dimension()
            );
        }
        Ok(Self { index, embedder, classifier })
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn select_reply(
        &self,
        text:            &str,
        predicted_label: Option<&str>,
        top_k:           usize,
        min_similarity:  f32,
    ) -> Result<ReplyOutcome> {
        if self.index.is_empty() {
            return Ok(ReplyOutcome::nothing());
        }

        let query = self.embedder.embed(text).context("Embedding the query failed")?;
        // best match is all we need, but never ask for zero
        let hits  = self.index.top_matches(&query, top_k.max(1), predicted_label)?;

        let Some(best) = hits.first() else {
            return Ok(ReplyOutcome::nothing());
        };

        tracing::debug!(
            "Best match for '{}': row {} sim {:.3} label {}",
            text,
            best.row,
            best.similarity,
            best.record.label
        );

        // NaN never clears the threshold
        if !(best.similarity >= min_similarity) {
            return Ok(ReplyOutcome { reply: None, similarity: Some(best.similarity) });
        }

        Ok(ReplyOutcome {
            reply:      Some(best.record.reply.clone()),
            similarity: Some(best.similarity),
        })
    }

    /// Classify `text`, then pick a reply among catalog rows with
    /// the predicted label.
    pub fn answer(&self, text: &str, top_k: usize, min_similarity: f32) -> Result<Answer> {
        let prediction = self.classifier.predict(text)?;
        let outcome    = self.select_reply(text, Some(&prediction.label), top_k, min_similarity)?;
        Ok(Answer { prediction, outcome })
    }

    /// The `top_n` closest catalog rows, without any threshold.
    pub fn neighbors(
        &self,
        text:                      &str,
        top_n:                     usize,
        filter_by_predicted_label: bool,
    ) -> Result<NeighborReport> {
        let prediction = self.classifier.predict(text)?;

        if self.index.is_empty() {
            return Ok(NeighborReport { prediction, hits: Vec::new() });
        }

        let filter = filter_by_predicted_label.then_some(prediction.label.as_str());
        let query  = self.embedder.embed(text).context("Embedding the query failed")?;

        let hits = self
            .index
            .top_matches(&query, top_n, filter)?
            .into_iter()
            .enumerate()
            .map(|(i, m)| Neighbor {
                rank:       i + 1,
                similarity: m.similarity,
                utterance:  m.record.utterance.clone(),
                reply:      m.record.reply.clone(),
                label:      m.record.label.clone(),
                intent:     m.record.intent.clone(),
                is_seed:    m.record.is_seed,
            })
            .collect();

        Ok(NeighborReport { prediction, hits })
    }
}
