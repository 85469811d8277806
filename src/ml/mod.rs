// ============================================================
// Layer 5 — Inference Layer
// ============================================================
// The three engines of the assistant plus the pieces they
// share. Burn is only imported here (index.rs).
//
//   ngram.rs      — Backoff n-gram next-word model
//                   Counts every 1..N-gram of the corpus and
//                   suggests continuations, falling back to
//                   shorter contexts when a longer one was
//                   never seen.
//
//   embedder.rs   — Deterministic hashing sentence embedder
//
//   similarity.rs — Cosine similarity and L2 normalisation
//
//   index.rs      — Embedding index over the reply catalog
//                   One matmul per query on the NdArray backend,
//                   optional label filter with full-catalog
//                   fallback.
//
//   classifier.rs — Centroid sentiment classifier
//
//   selector.rs   — Response selector
//                   Threshold-gated reply choice and the
//                   neighbours debug view.
//
// Reference: Burn Book §3 (Tensors)
//            Jurafsky & Martin, SLP3 §3 (N-gram Language Models)

/// Backoff n-gram next-word model
pub mod ngram;

/// Cosine similarity helpers
pub mod similarity;

/// Hashing sentence embedder
pub mod embedder;

/// Nearest-neighbour index over the reply catalog
pub mod index;

/// Centroid classifier over embeddings
pub mod classifier;

/// Reply selection and neighbour inspection
pub mod selector;
