// ============================================================
// Layer 5 — Hashing Embedder
// ============================================================
// A deterministic, offline sentence embedder.
//
// It is not a neural sentence encoder. It hashes two kinds of
// features into a fixed number of buckets:
//
//   - whole words           "bock"          weight 1.0
//   - character trigrams    " bo", "boc", "ock", "ck "   weight 0.5
//
// Trigrams make spelling variants land close to each other
// ("muehsam" vs "muesam" share most of them), which matters a
// lot for written dialect. Each feature gets a bucket and a
// sign from its blake3 hash; the summed vector is L2-normalised.
//
// Any other `Embedder` (e.g. a real sentence-transformer served
// elsewhere) can replace this one without touching the index.

use anyhow::{bail, Result};

use crate::domain::traits::Embedder;
use crate::ml::similarity::l2_normalize;

/// Default vector length
pub const DEFAULT_EMBEDDING_DIM: usize = 256;

const WORD_WEIGHT: f32    = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            bail!("embedding dimension must be positive");
        }
        Ok(Self { dim })
    }

    /// Embed without the `Result` wrapper; hashing cannot fail.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dim];

        for word in words(text) {
            self.add_feature(&mut vec, "w", &word, WORD_WEIGHT);

            let padded: Vec<char> = format!(" {word} ").chars().collect();
            for tri in padded.windows(3) {
                let tri: String = tri.iter().collect();
                self.add_feature(&mut vec, "c", &tri, TRIGRAM_WEIGHT);
            }
        }

        l2_normalize(&mut vec);
        vec
    }

    fn add_feature(&self, vec: &mut [f32], kind: &str, feature: &str, weight: f32) {
        let mut h = blake3::Hasher::new();
        h.update(kind.as_bytes());
        h.update(b":");
        h.update(feature.as_bytes());
        let hash  = h.finalize();
        let bytes = hash.as_bytes();

        let mut bucket = [0u8; 8];
        bucket.copy_from_slice(&bytes[..8]);
        let idx  = (u64::from_le_bytes(bucket) % self.dim as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };

        vec[idx] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dim: DEFAULT_EMBEDDING_DIM }
    }
}

impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }
}

/// Lowercased, umlaut-folded words of `text`
fn words(text: &str) -> Vec<String> {
    let folded: String = text
        .to_lowercase()
        .chars()
        .flat_map(|c| match c {
            'ä' => vec!['a', 'e'],
            'ö' => vec!['o', 'e'],
            'ü' => vec!['u', 'e'],
            'ß' => vec!['s', 's'],
            c => vec![c],
        })
        .collect();

    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}
