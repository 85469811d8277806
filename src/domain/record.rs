// ============================================================
// Layer 3 — Corpus and Catalog Records
// ============================================================
// Two kinds of rows flow into the assistant:
//
//   LabeledUtterance — one chat message from the base corpus,
//                      tagged with a sentiment label and intent.
//                      Feeds the n-gram model and the classifier.
//
//   CandidateRecord  — one entry of the reply catalog: a user
//                      utterance paired with a canned Mundart
//                      reply. The embedding index owns these and
//                      keeps its vectors row-aligned with them.

use serde::{Deserialize, Serialize};

/// A labelled chat message from the base corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledUtterance {
    /// Raw message text as written by the user
    pub text: String,

    /// Sentiment label, e.g. "negativ", "neutral", "positiv"
    pub label: String,

    /// Finer-grained intent, e.g. "frust" or "smalltalk"
    pub intent: Option<String>,
}

impl LabeledUtterance {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text:   text.into(),
            label:  label.into(),
            intent: None,
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }
}

/// One entry of the reply catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// The user utterance this reply was written for.
    /// Its embedding is what queries are compared against.
    pub utterance: String,

    /// The canned reply shown to the user
    pub reply: String,

    /// Sentiment label of the source utterance
    pub label: String,

    /// Intent of the source utterance, if known
    pub intent: Option<String>,

    /// True for hand-written seed rows, false for augmented ones
    pub is_seed: bool,
}

impl CandidateRecord {
    pub fn new(
        utterance: impl Into<String>,
        reply:     impl Into<String>,
        label:     impl Into<String>,
    ) -> Self {
        Self {
            utterance: utterance.into(),
            reply:     reply.into(),
            label:     label.into(),
            intent:    None,
            is_seed:   true,
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    /// Records without a reply are useless for retrieval
    pub fn has_reply(&self) -> bool {
        !self.reply.trim().is_empty()
    }
}
