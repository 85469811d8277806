// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that define what the assistant
// works with: tokens, corpus rows, catalog records, and the
// capability traits for the collaborators we only consume
// (normalizer, embedder, classifier, data sources).
//
// Rules for this layer:
//   - NO burn tensors here
//   - NO file I/O
//   - Only structs, enums, traits and small pure helpers
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Sentence markers, placeholders and the "good token" rule
pub mod token;

// Corpus rows and retrieval catalog records
pub mod record;

// Capability traits implemented by the data and ml layers
pub mod traits;
