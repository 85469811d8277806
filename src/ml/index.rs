// ============================================================
// Layer 5 — Embedding Index
// ============================================================
// Holds the reply catalog and answers nearest-neighbour queries.
//
// Layout:
//   records[i]  ↔  row i of the embedding matrix [n, dim]
//
// Rows are L2-normalised once at construction, so cosine
// similarity against a (normalised) query is one matmul:
//
//   [n, dim] × [dim, 1] → [n, 1]
//
// The matrix lives in a burn tensor on the NdArray (CPU)
// backend; nothing here needs a GPU.
//
// Label filter:
//   If the caller passes a label and at least one record has it,
//   only those rows compete. If no record has it, we log a
//   warning and search the whole catalog rather than return nothing.

use anyhow::{anyhow, bail, Context, Result};
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::NdArray;
use burn::tensor::{Tensor, TensorData};

use crate::domain::record::CandidateRecord;
use crate::domain::traits::Embedder;
use crate::ml::similarity::l2_normalize;

type IndexBackend = NdArray<f32>;

/// One retrieval hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    /// Row of the record in the catalog
    pub row: usize,
    pub record: &'a CandidateRecord,
    /// Cosine similarity in [-1, 1]
    pub similarity: f32,
}

pub struct EmbeddingIndex {
    records: Vec<CandidateRecord>,
    /// `None` for an empty catalog
    matrix:  Option<Tensor<IndexBackend, 2>>,
    dim:     usize,
    device:  NdArrayDevice,
}

impl EmbeddingIndex {
    /// Drop records without a reply, embed the rest in one batch
    /// call and build the matrix.
    pub fn build<E>(records: Vec<CandidateRecord>, embedder: &E) -> Result<Self>
    where
        E: Embedder + ?Sized,
    {
        let records = drop_empty_replies(records);

        let texts: Vec<String> = records.iter().map(|r| r.utterance.clone()).collect();
        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            embedder
                .embed_batch(&texts)
                .context("Embedding the reply catalog failed")?
        };

        Self::from_embedded(records, vectors)
    }

    /// Build from precomputed vectors, one per record.
    pub fn from_embedded(records: Vec<CandidateRecord>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if records.len() != vectors.len() {
            bail!(
                "catalog has {} records but {} embeddings",
                records.len(),
                vectors.len()
            );
        }

        let (records, vectors): (Vec<_>, Vec<_>) = records
            .into_iter()
            .zip(vectors)
            .filter(|(r, _)| r.has_reply())
            .unzip();

        let device = NdArrayDevice::default();
        let dim    = vectors.first().map(Vec::len).unwrap_or(0);

        if records.is_empty() {
            tracing::warn!("Reply catalog is empty; every query will return no match");
            return Ok(Self { records, matrix: None, dim, device });
        }
        if dim == 0 {
            bail!("catalog embeddings have zero length");
        }

        let mut flat = Vec::with_capacity(records.len() * dim);
        for (row, mut v) in vectors.into_iter().enumerate() {
            if v.len() != dim {
                bail!(
                    "embedding for catalog row {} has length {}, expected {}",
                    row,
                    v.len(),
                    dim
                );
            }
            l2_normalize(&mut v);
            flat.extend(v);
        }

        let matrix = Tensor::<IndexBackend, 2>::from_data(
            TensorData::new(flat, [records.len(), dim]),
            &device,
        );

        tracing::info!("Embedding index ready: {} records × {} dims", records.len(), dim);
        Ok(Self { records, matrix: Some(matrix), dim, device })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.records.iter().any(|r| r.label == label)
    }

    /// Cosine similarity of `query` against every row, in row order.
    pub fn similarities(&self, query: &[f32]) -> Result<Vec<f32>> {
        let Some(matrix) = &self.matrix else {
            return Ok(Vec::new());
        };
        if query.len() != self.dim {
            bail!(
                "query embedding has length {}, index expects {}",
                query.len(),
                self.dim
            );
        }
        if let Some(i) = query.iter().position(|x| !x.is_finite()) {
            bail!("query embedding has a non-finite value at position {}", i);
        }

        let mut q = query.to_vec();
        l2_normalize(&mut q);
        let q = Tensor::<IndexBackend, 2>::from_data(TensorData::new(q, [self.dim, 1]), &self.device);

        let sims = matrix.clone().matmul(q);
        let sims = sims
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read similarity tensor: {e:?}"))?;

        // float error can push identical vectors a hair above 1
        Ok(sims.into_iter().map(|s| s.clamp(-1.0, 1.0)).collect())
    }

    /// The `top_k` most similar records, best first.
    ///
    /// Fails if `query` has the wrong length or a non-finite
    /// value. An empty catalog returns an empty list.
    pub fn top_matches(
        &self,
        query:        &[f32],
        top_k:        usize,
        label_filter: Option<&str>,
    ) -> Result<Vec<Match<'_>>> {
        if self.records.is_empty() {
            return Ok(Vec::new());
        }

        let sims = self.similarities(query)?;
        let mut rows = self.candidate_rows(label_filter);

        // stable sort: equal scores keep catalog order
        rows.sort_by(|&a, &b| sims[b].total_cmp(&sims[a]));
        rows.truncate(top_k);

        Ok(rows
            .into_iter()
            .map(|row| Match { row, record: &self.records[row], similarity: sims[row] })
            .collect())
    }

    /// Rows carrying `label`, or every row if none do.
    fn candidate_rows(&self, label_filter: Option<&str>) -> Vec<usize> {
        let all = || (0..self.records.len()).collect::<Vec<_>>();

        let Some(label) = label_filter else {
            return all();
        };
        if !self.has_label(label) {
            tracing::warn!("No catalog record has label '{}', searching all", label);
            return all();
        }

        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.label == label)
            .map(|(i, _)| i)
            .collect()
    }
}

fn drop_empty_replies(records: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
    let before = records.len();
    let kept: Vec<CandidateRecord> = records.into_iter().filter(|r| r.has_reply()).collect();
    if kept.len() < before {
        tracing::info!("Dropped {} catalog rows without a reply", before - kept.len());
    }
    kept
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::embedder::HashingEmbedder;

    fn rec(utterance: &str, reply: &str, label: &str) -> CandidateRecord {
        CandidateRecord::new(utterance, reply, label)
    }

    fn small_index() -> EmbeddingIndex {
        EmbeddingIndex::from_embedded(
            vec![
                rec("a", "reply a", "positiv"),
                rec("b", "reply b", "positiv"),
                rec("c", "reply c", "neutral"),
            ],
            vec![vec![1.0, 0.0], vec![0.6, 0.8], vec![0.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_identical_vector_scores_one() {
        let idx = small_index();
        let hits = idx.top_matches(&[1.0, 0.0], 1, None).unwrap();
        assert_eq!(hits[0].record.utterance, "a");
        assert!((hits[0].similarity - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_results_are_sorted_and_clamped_to_top_k() {
        let idx = small_index();
        let hits = idx.top_matches(&[0.0, 2.0], 10, None).unwrap();
        let rows: Vec<usize> = hits.iter().map(|m| m.row).collect();
        assert_eq!(rows, vec![2, 1, 0]);
        assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));

        assert_eq!(idx.top_matches(&[0.0, 1.0], 2, None).unwrap().len(), 2);
    }

    #[test]
    fn test_label_filter_restricts_candidates() {
        let idx = small_index();
        let hits = idx.top_matches(&[0.0, 1.0], 5, Some("positiv")).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|m| m.record.label == "positiv"));
        assert_eq!(hits[0].record.utterance, "b");
    }

    #[test]
    fn test_unknown_label_falls_back_to_full_catalog() {
        let idx = small_index();
        assert!(idx.has_label("neutral"));
        assert!(!idx.has_label("negativ"));
        let hits = idx.top_matches(&[0.0, 1.0], 5, Some("negativ")).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].record.label, "neutral");
    }

    #[test]
    fn test_empty_catalog_returns_nothing() {
        let idx = EmbeddingIndex::from_embedded(Vec::new(), Vec::new()).unwrap();
        assert!(idx.is_empty());
        assert!(idx.top_matches(&[1.0, 0.0], 5, Some("positiv")).unwrap().is_empty());
    }

    #[test]
    fn test_records_without_reply_are_dropped() {
        let idx = EmbeddingIndex::from_embedded(
            vec![rec("a", "  ", "positiv"), rec("b", "ok", "neutral")],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap();
        assert_eq!(idx.len(), 1);
        let hits = idx.top_matches(&[1.0, 0.0], 5, None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.utterance, "b");
        assert_eq!(hits[0].row, 0);
    }

    #[test]
    fn test_only_empty_replies_gives_empty_index() {
        let e = HashingEmbedder::default();
        let idx = EmbeddingIndex::build(vec![rec("hoi", "", "neutral")], &e).unwrap();
        assert!(idx.top_matches(&e.embed_text("hoi"), 3, None).unwrap().is_empty());
    }

    #[test]
    fn test_inconsistent_dimensions_are_rejected() {
        let err = EmbeddingIndex::from_embedded(
            vec![rec("a", "x", "p"), rec("b", "y", "p")],
            vec![vec![1.0, 0.0], vec![1.0]],
        );
        assert!(err.is_err());

        let err = EmbeddingIndex::from_embedded(vec![rec("a", "x", "p")], Vec::new());
        assert!(err.is_err());
    }

    #[test]
    fn test_query_of_wrong_length_is_an_error() {
        let idx = small_index();
        assert!(idx.top_matches(&[1.0, 0.0, 0.0], 3, None).is_err());
    }

    #[test]
    fn test_build_embeds_utterances() {
        let e = HashingEmbedder::default();
        let idx = EmbeddingIndex::build(
            vec![
                rec("ich ha kei bock meh", "Das tönt müehsam.", "negativ"),
                rec("merci viu mau", "Sehr gärn.", "positiv"),
            ],
            &e,
        )
        .unwrap();
        assert_eq!(idx.dimension(), e.dimension());

        let hits = idx.top_matches(&e.embed_text("merci viu mau"), 1, None).unwrap();
        assert_eq!(hits[0].record.reply, "Sehr gärn.");
    }

    #[test]
    fn test_non_finite_query_is_an_error() {
        let idx = small_index();
        assert!(idx.top_matches(&[f32::NAN, 0.0], 3, None).is_err());
        assert!(idx.similarities(&[1.0, f32::INFINITY]).is_err());
    }

    #[test]
    fn test_top_matches_is_idempotent() {
        let idx = small_index();
        let a = idx.top_matches(&[0.3, 0.7], 3, Some("positiv")).unwrap();
        let b = idx.top_matches(&[0.3, 0.7], 3, Some("positiv")).unwrap();
        assert_eq!(a, b);
    }
}
