// ============================================================
// Layer 4 — CSV Loader
// ============================================================
// Loads the two datasets the assistant is built from:
//
//   base corpus  (mundartchat_base.csv)
//     text,label,intent[,is_seed,text_clean,...]
//
//   chat pairs   (mundartchat_pairs.csv)
//     user_text,answer_mundart,label[,intent,is_seed,...]
//
// Extra columns are ignored. A missing file or a missing
// required column is a load-time error naming the file and the
// columns.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::domain::record::{CandidateRecord, LabeledUtterance};
use crate::domain::traits::{ChatPairSource, UtteranceSource};

pub const BASE_REQUIRED_COLUMNS: &[&str] = &["text", "label", "intent"];
pub const PAIRS_REQUIRED_COLUMNS: &[&str] = &["user_text", "answer_mundart", "label"];

/// Reads one CSV file with a header row.
/// Implements both source traits; each checks its own columns.
pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open the file and map every header name to its column index,
    /// failing if any of `required` is absent.
    fn open(&self, required: &[&str]) -> Result<(csv::Reader<std::fs::File>, HashMap<String, usize>)> {
        if !self.path.exists() {
            bail!("CSV file '{}' does not exist", self.path.display());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open CSV '{}'", self.path.display()))?;

        let headers = reader
            .headers()
            .with_context(|| format!("Cannot read header row of '{}'", self.path.display()))?;

        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|c| !columns.contains_key(*c))
            .collect();

        if !missing.is_empty() {
            bail!(
                "Missing columns in '{}': {}",
                self.path.display(),
                missing.join(", ")
            );
        }

        Ok((reader, columns))
    }
}

impl UtteranceSource for CsvLoader {
    fn load_utterances(&self) -> Result<Vec<LabeledUtterance>> {
        let (mut reader, cols) = self.open(BASE_REQUIRED_COLUMNS)?;
        let text_col   = cols["text"];
        let label_col  = cols["label"];
        let intent_col = cols["intent"];

        let mut rows = Vec::new();
        for (i, result) in reader.records().enumerate() {
            // +2: one for the header, one for 1-based line numbers
            let record = result.with_context(|| {
                format!("Malformed row {} in '{}'", i + 2, self.path.display())
            })?;

            let mut utterance = LabeledUtterance::new(
                record.get(text_col).unwrap_or(""),
                record.get(label_col).unwrap_or("").trim(),
            );
            let intent = record.get(intent_col).unwrap_or("").trim();
            if !intent.is_empty() {
                utterance = utterance.with_intent(intent);
            }
            rows.push(utterance);
        }

        tracing::info!(
            "Loaded {} utterances from '{}'",
            rows.len(),
            self.path.display()
        );
        Ok(rows)
    }
}

impl ChatPairSource for CsvLoader {
    fn load_pairs(&self) -> Result<Vec<CandidateRecord>> {
        let (mut reader, cols) = self.open(PAIRS_REQUIRED_COLUMNS)?;
        let text_col   = cols["user_text"];
        let reply_col  = cols["answer_mundart"];
        let label_col  = cols["label"];
        let intent_col = cols.get("intent").copied();
        let seed_col   = cols.get("is_seed").copied();

        let mut rows = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = result.with_context(|| {
                format!("Malformed row {} in '{}'", i + 2, self.path.display())
            })?;

            let mut pair = CandidateRecord::new(
                record.get(text_col).unwrap_or(""),
                record.get(reply_col).unwrap_or(""),
                record.get(label_col).unwrap_or("").trim(),
            );

            if let Some(intent) = intent_col.and_then(|c| record.get(c)) {
                if !intent.trim().is_empty() {
                    pair = pair.with_intent(intent.trim());
                }
            }

            if let Some(raw) = seed_col.and_then(|c| record.get(c)) {
                pair.is_seed = parse_flag(raw).unwrap_or_else(|| {
                    tracing::warn!("Row {}: unreadable is_seed value '{}', assuming true", i + 2, raw);
                    true
                });
            }

            rows.push(pair);
        }

        tracing::info!(
            "Loaded {} chat pairs from '{}'",
            rows.len(),
            self.path.display()
        );
        Ok(rows)
    }
}

/// Parse pandas-style booleans ("True", "false", "1", ...).
/// An empty cell counts as true, matching the seed default.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "" | "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
