// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Wires the data, ml and infra layers together for each thing
// the CLI can do.
//
// Rules for this layer:
//   - No ML math here (that's Layer 5)
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The assistant: suggest / classify / answer / neighbors
pub mod assistant;

// Held-out evaluation of the classifier
pub mod evaluate_use_case;
