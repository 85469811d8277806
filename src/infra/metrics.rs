// ============================================================
// Layer 6 — Evaluation Metrics
// ============================================================
// Scores the classifier on a held-out split and records the
// result.
//
//   ClassificationReport — accuracy plus per-label precision,
//                          recall, F1 and support, and the
//                          macro-averaged F1 over all labels.
//   MetricsLogger        — appends one CSV row per evaluation
//                          run so runs can be compared.
//
// Example CSV output:
//   timestamp_secs,examples,accuracy,macro_f1
//   1760780000,40,0.725000,0.701234
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

const CSV_HEADER: [&str; 4] = ["timestamp_secs", "examples", "accuracy", "macro_f1"];

/// Scores for one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScores {
    pub label:     String,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    /// Number of gold examples with this label
    pub support:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub examples:  usize,
    pub accuracy:  f64,
    pub per_label: Vec<LabelScores>,
    pub macro_f1:  f64,
}

impl ClassificationReport {
    /// Compare gold and predicted labels position by position.
    ///
    /// Labels are reported in `label_order`, followed by any
    /// other label seen in either list. A label that is never
    /// predicted gets precision 0; one with no gold examples
    /// gets recall 0.
    pub fn from_predictions(
        gold:        &[String],
        predicted:   &[String],
        label_order: &[String],
    ) -> Result<Self> {
        if gold.len() != predicted.len() {
            bail!(
                "{} gold labels but {} predictions",
                gold.len(),
                predicted.len()
            );
        }

        let mut labels: Vec<&str> = label_order.iter().map(String::as_str).collect();
        for l in gold.iter().chain(predicted) {
            if !labels.contains(&l.as_str()) {
                labels.push(l);
            }
        }

        let correct = gold.iter().zip(predicted).filter(|(g, p)| g == p).count();
        let accuracy = ratio(correct, gold.len());

        let per_label: Vec<LabelScores> = labels
            .iter()
            .map(|&label| {
                let tp = gold
                    .iter()
                    .zip(predicted)
                    .filter(|(g, p)| *g == label && *p == label)
                    .count();
                let n_pred = predicted.iter().filter(|p| *p == label).count();
                let n_gold = gold.iter().filter(|g| *g == label).count();

                let precision = ratio(tp, n_pred);
                let recall    = ratio(tp, n_gold);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                LabelScores { label: label.to_string(), precision, recall, f1, support: n_gold }
            })
            .collect();

        let macro_f1 = if per_label.is_empty() {
            0.0
        } else {
            per_label.iter().map(|s| s.f1).sum::<f64>() / per_label.len() as f64
        };

        Ok(Self { examples: gold.len(), accuracy, per_label, macro_f1 })
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Appends evaluation results to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the header if the file doesn't exist yet.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();

        if let Some(dir) = csv_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }

        if !csv_path.exists() {
            let mut w = csv::Writer::from_path(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            w.write_record(CSV_HEADER)?;
            w.flush()?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, report: &ClassificationReport) -> Result<()> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        w.write_record(&[
            ts.to_string(),
            report.examples.to_string(),
            format!("{:.6}", report.accuracy),
            format!("{:.6}", report.macro_f1),
        ])?;
        w.flush()?;

        tracing::info!(
            "Logged evaluation to '{}': accuracy={:.4}, macro_f1={:.4}",
            self.csv_path.display(),
            report.accuracy,
            report.macro_f1,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl ClassificationReport {
        fn scores_for(&self, label: &str) -> Option<&LabelScores> {
            self.per_label.iter().find(|s| s.label == label)
        }
    }

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn test_report_scores() {
        let gold = s(&["negativ", "negativ", "positiv", "neutral"]);
        let pred = s(&["negativ", "positiv", "positiv", "neutral"]);
        let r = ClassificationReport::from_predictions(&gold, &pred, &s(&["negativ", "neutral", "positiv"]))
            .unwrap();

        assert_eq!(r.examples, 4);
        assert!((r.accuracy - 0.75).abs() < 1e-9);

        let neg = r.scores_for("negativ").unwrap();
        assert!((neg.precision - 1.0).abs() < 1e-9);
        assert!((neg.recall - 0.5).abs() < 1e-9);
        assert_eq!(neg.support, 2);

        let pos = r.scores_for("positiv").unwrap();
        assert!((pos.precision - 0.5).abs() < 1e-9);
        assert!((pos.recall - 1.0).abs() < 1e-9);

        let labels: Vec<&str> = r.per_label.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["negativ", "neutral", "positiv"]);
    }

    #[test]
    fn test_unseen_label_scores_zero() {
        let r = ClassificationReport::from_predictions(&s(&["a"]), &s(&["a"]), &s(&["a", "b"])).unwrap();
        let b = r.scores_for("b").unwrap();
        assert_eq!(b.f1, 0.0);
        assert_eq!(b.support, 0);
        assert!((r.macro_f1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        assert!(ClassificationReport::from_predictions(&s(&["a"]), &[], &[]).is_err());
    }

    #[test]
    fn test_logger_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("metrics.csv");

        let report = ClassificationReport::from_predictions(&s(&["a", "b"]), &s(&["a", "a"]), &[]).unwrap();
        let logger = MetricsLogger::new(&path).unwrap();
        logger.log(&report).unwrap();
        MetricsLogger::new(&path).unwrap().log(&report).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp_secs,examples,accuracy,macro_f1");
        assert!(lines[1].contains(",2,0.500000,"));

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        assert_eq!(rdr.headers().unwrap(), &csv::StringRecord::from(CSV_HEADER.to_vec()));
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "2");
        assert_eq!(&rows[1][2], "0.500000");
    }
}
