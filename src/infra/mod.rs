// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-backed concerns used by the application layer:
//
//   config_store.rs — AssistantConfig as JSON on disk
//                     Loads a (possibly partial) config file,
//                     falls back to defaults when none is given,
//                     and writes the defaults out for editing.
//
//   metrics.rs      — Classifier evaluation
//                     Accuracy / precision / recall / F1 report
//                     and a CSV logger with one row per run.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Assistant configuration persistence
pub mod config_store;

/// Classification report and metrics CSV logger
pub mod metrics;
