// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the CSV files on disk and the token
// sequences / labelled texts the ml layer consumes:
//
//   mundartchat_base.csv      mundartchat_pairs.csv
//          │                          │
//          ▼                          ▼
//   CsvLoader::load_utterances  CsvLoader::load_pairs
//          │                          │
//          ├──► DialectPreprocessor ──► NgramModel
//          │
//          └──► stratified_split ──► CentroidClassifier
//
// Each module is responsible for exactly one step.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Reads the base corpus and chat-pair CSV files
pub mod loader;

/// Canonicalises Mundart chat text into tokens
pub mod preprocessor;

/// Seeded, label-stratified train/test split
pub mod splitter;
