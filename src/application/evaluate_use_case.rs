// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Measures how well the classifier generalises:
//
//   Step 1: Load the base corpus            (Layer 4 - data)
//   Step 2: Stratified train / test split   (Layer 4 - data)
//   Step 3: Train on the training part      (Layer 5 - ml)
//   Step 4: Predict the held-out part       (Layer 5 - ml)
//   Step 5: Build the report                (Layer 6 - infra)
//   Step 6: Append it to the metrics CSV    (Layer 6 - infra)
//
// Uses the same split and seed as `Assistant::build`, so the
// numbers describe the classifier the assistant actually runs.

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::application::assistant::AssistantConfig;
use crate::data::{loader::CsvLoader, splitter::stratified_split};
use crate::domain::record::LabeledUtterance;
use crate::domain::traits::{Classifier, UtteranceSource};
use crate::infra::metrics::{ClassificationReport, MetricsLogger};
use crate::ml::embedder::HashingEmbedder;

pub struct EvaluateUseCase {
    config:      AssistantConfig,
    metrics_csv: Option<PathBuf>,
}

impl EvaluateUseCase {
    pub fn new(config: AssistantConfig, metrics_csv: Option<PathBuf>) -> Self {
        Self { config, metrics_csv }
    }

    pub fn execute(&self) -> Result<ClassificationReport> {
        // ── Step 1: Load the base corpus ─────────────────────────────────────
        tracing::info!("Loading base corpus from '{}'", self.config.base_csv);
        let utterances = CsvLoader::new(&self.config.base_csv).load_utterances()?;

        self.evaluate(utterances)
    }

    /// Steps 2-6 on already loaded rows.
    pub fn evaluate(&self, utterances: Vec<LabeledUtterance>) -> Result<ClassificationReport> {
        let cfg = &self.config;

        // ── Step 2: Split ────────────────────────────────────────────────────
        let (train, test) = stratified_split(
            utterances,
            |u: &LabeledUtterance| u.label.as_str(),
            cfg.test_fraction,
            cfg.seed,
        );
        if test.is_empty() {
            bail!(
                "test split is empty; raise test_fraction (now {}) or add more data",
                cfg.test_fraction
            );
        }
        tracing::info!("Split: {} train, {} test", train.len(), test.len());

        // ── Step 3: Train ────────────────────────────────────────────────────
        let embedder   = HashingEmbedder::new(cfg.embedding_dim)?;
        let classifier = cfg.train_classifier(embedder, &train)?;

        // ── Step 4: Predict ──────────────────────────────────────────────────
        let mut gold      = Vec::with_capacity(test.len());
        let mut predicted = Vec::with_capacity(test.len());
        for u in &test {
            predicted.push(classifier.predict(&u.text)?.label);
            gold.push(u.label.clone());
        }

        // ── Step 5: Report ───────────────────────────────────────────────────
        let report = ClassificationReport::from_predictions(&gold, &predicted, classifier.labels())?;
        tracing::info!(
            "Evaluated {} examples: accuracy={:.4}, macro_f1={:.4}",
            report.examples,
            report.accuracy,
            report.macro_f1
        );

        // ── Step 6: Log ──────────────────────────────────────────────────────
        if let Some(path) = &self.metrics_csv {
            MetricsLogger::new(path.clone())?.log(&report)?;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<LabeledUtterance> {
        let mut rows = Vec::new();
        for i in 0..4 {
            rows.push(LabeledUtterance::new(format!("ich ha kei bock meh {i}"), "negativ"));
            rows.push(LabeledUtterance::new(format!("merci viu mau fuer alles {i}"), "positiv"));
        }
        rows
    }

    #[test]
    fn test_evaluate_reports_every_test_example() {
        let uc = EvaluateUseCase::new(AssistantConfig::default(), None);
        let report = uc.evaluate(corpus()).unwrap();
        // 4 per label, 25 % each → one per label
        assert_eq!(report.examples, 2);
        assert!(report.accuracy >= 0.0 && report.accuracy <= 1.0);
        assert_eq!(report.per_label.len(), 2);
    }

    #[test]
    fn test_empty_test_split_is_an_error() {
        let cfg = AssistantConfig { test_fraction: 0.0, ..AssistantConfig::default() };
        assert!(EvaluateUseCase::new(cfg, None).evaluate(corpus()).is_err());
    }

    #[test]
    fn test_metrics_are_logged() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        let uc = EvaluateUseCase::new(AssistantConfig::default(), Some(path.clone()));
        uc.evaluate(corpus()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
