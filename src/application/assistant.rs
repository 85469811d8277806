// ============================================================
// Layer 2 — Assistant
// ============================================================
// Builds every engine from the two CSV files and exposes the
// four things a user can ask for:
//
//   suggest   — next-word suggestions       (n-gram model)
//   classify  — sentiment label + probs     (centroid classifier)
//   answer    — classify, then pick a reply (response selector)
//   neighbors — closest catalog rows, for debugging replies
//
// Build pipeline:
//
//   Step 1: Load the base corpus            (Layer 4 - data)
//   Step 2: Load the chat pairs             (Layer 4 - data)
//   Step 3: Build the n-gram model          (Layer 5 - ml)
//   Step 4: Stratified train / test split   (Layer 4 - data)
//   Step 5: Train the classifier            (Layer 5 - ml)
//   Step 6: Build the embedding index       (Layer 5 - ml)
//
// Both files are read before any model is built, so a bad
// pairs file fails fast. Everything is read-only once built.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::{loader::CsvLoader, preprocessor::DialectPreprocessor, splitter::stratified_split};
use crate::domain::record::{CandidateRecord, LabeledUtterance};
use crate::domain::traits::{ChatPairSource, Classifier, Prediction, UtteranceSource};
use crate::ml::{
    classifier::{CentroidClassifier, DEFAULT_TEMPERATURE},
    embedder::{HashingEmbedder, DEFAULT_EMBEDDING_DIM},
    index::EmbeddingIndex,
    ngram::{NgramModel, Suggestions},
    selector::{Answer, NeighborReport, ResponseSelector},
};

// ─── Assistant Configuration ─────────────────────────────────────────────────
// Serialisable so it can be written with `init-config`, edited
// and passed back with `--config`. Missing keys take the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub base_csv:          String,
    pub pairs_csv:         String,
    pub max_order:         usize,
    pub suggest_top_k:     usize,
    pub reply_top_k:       usize,
    pub min_similarity:    f32,
    pub neighbors_top_n:   usize,
    pub embedding_dim:     usize,
    pub seed:              u64,
    pub test_fraction:     f64,
    /// Softmax temperature of the classifier
    pub temperature:       f32,
    pub label_order:       Vec<String>,
    /// Extra dialect spellings, merged over the built-in map
    pub dialect_overrides: BTreeMap<String, String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_csv:          "data/mundartchat_base.csv".to_string(),
            pairs_csv:         "data/mundartchat_pairs.csv".to_string(),
            max_order:         3,
            suggest_top_k:     5,
            reply_top_k:       5,
            min_similarity:    0.2,
            neighbors_top_n:   5,
            embedding_dim:     DEFAULT_EMBEDDING_DIM,
            seed:              42,
            test_fraction:     0.25,
            temperature:       DEFAULT_TEMPERATURE,
            label_order:       vec!["negativ".into(), "neutral".into(), "positiv".into()],
            dialect_overrides: BTreeMap::new(),
        }
    }
}

impl AssistantConfig {
    pub fn normalizer(&self) -> DialectPreprocessor {
        DialectPreprocessor::new().with_extra_entries(self.dialect_overrides.clone())
    }

    /// Train the centroid classifier with the configured label
    /// order and temperature.
    pub fn train_classifier(
        &self,
        embedder: HashingEmbedder,
        train:    &[LabeledUtterance],
    ) -> Result<CentroidClassifier<HashingEmbedder>> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            bail!("temperature must be a positive number, got {}", self.temperature);
        }
        let classifier = CentroidClassifier::train(embedder, train, &self.label_order)?;
        Ok(classifier.with_temperature(self.temperature))
    }
}

type Selector = ResponseSelector<HashingEmbedder, CentroidClassifier<HashingEmbedder>>;

// ─── Assistant ────────────────────────────────────────────────────────────────
pub struct Assistant {
    config:     AssistantConfig,
    normalizer: DialectPreprocessor,
    ngram:      NgramModel,
    selector:   Selector,
}

impl Assistant {
    /// Load both CSV files named in `config` and build everything.
    pub fn build(config: AssistantConfig) -> Result<Self> {
        // ── Step 1: Load the base corpus ─────────────────────────────────────
        tracing::info!("Loading base corpus from '{}'", config.base_csv);
        let utterances = CsvLoader::new(&config.base_csv).load_utterances()?;

        // ── Step 2: Load the chat pairs ──────────────────────────────────────
        tracing::info!("Loading chat pairs from '{}'", config.pairs_csv);
        let pairs = CsvLoader::new(&config.pairs_csv).load_pairs()?;

        Self::from_data(config, utterances, pairs)
    }

    /// Build from already loaded rows.
    pub fn from_data(
        config:     AssistantConfig,
        utterances: Vec<LabeledUtterance>,
        pairs:      Vec<CandidateRecord>,
    ) -> Result<Self> {
        let normalizer = config.normalizer();
        tracing::debug!("Dialect map has {} entries", normalizer.dialect_map_len());

        // ── Step 3: N-gram model over the whole corpus ───────────────────────
        let ngram = NgramModel::from_texts(
            &normalizer,
            utterances.iter().map(|u| u.text.as_str()),
            config.max_order,
        )
        .context("Building the n-gram model failed")?;
        tracing::info!(
            "{}-gram model ready: {} sentences, {} distinct tokens, {} distinct {}-grams",
            ngram.max_order(),
            ngram.sentence_count(),
            ngram.vocabulary_size(),
            ngram.distinct_ngrams(ngram.max_order()),
            ngram.max_order()
        );

        // ── Step 4: Train / test split ───────────────────────────────────────
        let (train, test) = stratified_split(
            utterances,
            |u: &LabeledUtterance| u.label.as_str(),
            config.test_fraction,
            config.seed,
        );
        tracing::info!("Split: {} train, {} test", train.len(), test.len());

        // ── Step 5: Train the classifier ─────────────────────────────────────
        let embedder   = HashingEmbedder::new(config.embedding_dim)?;
        let classifier = config
            .train_classifier(embedder.clone(), &train)
            .context("Training the classifier failed")?;

        // ── Step 6: Embedding index over the reply catalog ───────────────────
        let index    = EmbeddingIndex::build(pairs, &embedder)?;
        let selector = ResponseSelector::new(index, embedder, classifier)?;

        tracing::info!("Assistant ready ({} replies)", selector.index().len());
        Ok(Self { config, normalizer, ngram, selector })
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn suggest(&self, text: &str, max_order: usize, top_k: usize) -> Suggestions {
        self.ngram.suggest_text(&self.normalizer, text, max_order, top_k)
    }

    pub fn classify(&self, text: &str) -> Result<Prediction> {
        self.selector.classifier().predict(text)
    }

    pub fn answer(&self, text: &str, top_k: usize, min_similarity: f32) -> Result<Answer> {
        self.selector.answer(text, top_k, min_similarity)
    }

    pub fn neighbors(&self, text: &str, top_n: usize, filter_by_label: bool) -> Result<NeighborReport> {
        self.selector.neighbors(text, top_n, filter_by_label)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn corpus() -> Vec<LabeledUtterance> {
        vec![
            LabeledUtterance::new("I ha kei Bock!", "negativ").with_intent("frust"),
            LabeledUtterance::new("i ha kei zit", "negativ").with_intent("stress"),
            LabeledUtterance::new("i ha kei ahnig", "neutral").with_intent("frag"),
            LabeledUtterance::new("das isch so muesam", "negativ").with_intent("frust"),
            LabeledUtterance::new("merci viu mau", "positiv").with_intent("dank"),
            LabeledUtterance::new("ich freu mi mega", "positiv").with_intent("freud"),
            LabeledUtterance::new("wie gohts", "neutral").with_intent("smalltalk"),
            LabeledUtterance::new("super gmacht", "positiv").with_intent("lob"),
        ]
    }

    fn pairs() -> Vec<CandidateRecord> {
        vec![
            CandidateRecord::new("merci viu mau", "Gern gscheh!", "positiv"),
            CandidateRecord::new("das isch so muehsam", "Oh nei, das tönt aastrengend.", "negativ"),
            CandidateRecord::new("wie gohts", "Guet, merci! Und dir?", "neutral"),
            CandidateRecord::new("leer", "", "neutral"),
        ]
    }

    fn assistant() -> Assistant {
        Assistant::from_data(AssistantConfig::default(), corpus(), pairs()).unwrap()
    }

    #[test]
    fn test_suggest_from_trigram_context() {
        let a = assistant();
        let s = a.suggest("i ha kei", 3, 5);
        assert_eq!(s.order, Some(3));
        assert_eq!(s.tokens(), vec!["bock", "zit", "ahnig"]);
        assert!((s.total_probability() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_suggest_on_blank_text_is_empty() {
        assert!(assistant().suggest("   ", 3, 5).is_empty());
    }

    #[test]
    fn test_classify_returns_configured_label_order() {
        let p = assistant().classify("merci viu mau").unwrap();
        let labels: Vec<&str> = p.probabilities.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["negativ", "neutral", "positiv"]);
    }

    #[test]
    fn test_answer_finds_exact_pair() {
        let cfg = AssistantConfig { test_fraction: 0.0, ..AssistantConfig::default() };
        let a = Assistant::from_data(cfg, corpus(), pairs()).unwrap();

        let answer = a.answer("wie gohts", 5, 0.2).unwrap();
        assert_eq!(answer.prediction.label, "neutral");
        assert_eq!(answer.outcome.reply.as_deref(), Some("Guet, merci! Und dir?"));
        assert!((answer.outcome.similarity.unwrap() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_neighbors_skip_empty_replies() {
        let a = assistant();
        let report = a.neighbors("wie gohts", 10, false).unwrap();
        assert_eq!(report.hits.len(), 3);
        assert_eq!(report.hits[0].utterance, "wie gohts");
        assert_eq!(report.hits[0].rank, 1);
    }

    #[test]
    fn test_dialect_overrides_reach_the_ngram_model() {
        let mut cfg = AssistantConfig::default();
        cfg.dialect_overrides.insert("ahnig".into(), "ahnung".into());
        let a = Assistant::from_data(cfg, corpus(), pairs()).unwrap();
        let tokens = a.suggest("i ha kei", 3, 5).tokens().join(" ");
        assert_eq!(tokens, "bock zit ahnung");
    }

    #[test]
    fn test_lower_temperature_flattens_probabilities() {
        let sharp = assistant().classify("merci viu mau").unwrap();

        let cfg = AssistantConfig { temperature: 0.5, ..AssistantConfig::default() };
        let flat = Assistant::from_data(cfg, corpus(), pairs()).unwrap().classify("merci viu mau").unwrap();

        assert_eq!(sharp.label, flat.label);
        assert!(flat.probability_of(&flat.label) < sharp.probability_of(&sharp.label));
    }

    #[test]
    fn test_non_positive_temperature_is_rejected() {
        for t in [0.0, -1.0, f32::NAN] {
            let cfg = AssistantConfig { temperature: t, ..AssistantConfig::default() };
            assert!(Assistant::from_data(cfg, corpus(), pairs()).is_err());
        }
    }

    #[test]
    fn test_build_from_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.csv");
        let chat = dir.path().join("pairs.csv");

        let mut f = std::fs::File::create(&base).unwrap();
        writeln!(f, "text,label,intent").unwrap();
        writeln!(f, "i ha kei bock,negativ,frust").unwrap();
        writeln!(f, "merci viu mau,positiv,dank").unwrap();

        let mut f = std::fs::File::create(&chat).unwrap();
        writeln!(f, "user_text,answer_mundart,label").unwrap();
        writeln!(f, "merci viu mau,Schön!,positiv").unwrap();

        let cfg = AssistantConfig {
            base_csv:  base.display().to_string(),
            pairs_csv: chat.display().to_string(),
            ..AssistantConfig::default()
        };
        let a = Assistant::build(cfg).unwrap();
        let answer = a.answer("merci viu mau", 5, 0.2).unwrap();
        assert_eq!(answer.outcome.reply.as_deref(), Some("Schön!"));
    }

    #[test]
    fn test_missing_csv_fails_build() {
        let cfg = AssistantConfig {
            base_csv: "does/not/exist.csv".into(),
            ..AssistantConfig::default()
        };
        assert!(Assistant::build(cfg).is_err());
    }
}
