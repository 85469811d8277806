// ============================================================
// Layer 5 — Backoff N-gram Model
// ============================================================
// Next-word suggestions from raw n-gram counts.
//
// Building:
//   Every corpus sentence is wrapped in <s> ... </s> and every
//   window of length 1..=N is counted:
//
//     <s> i ha kei bock </s>
//       order 1: <s>, i, ha, kei, bock, </s>
//       order 2: (<s> i), (i ha), (ha kei), (kei bock), (bock </s>)
//       order 3: (<s> i ha), (i ha kei), (ha kei bock), (kei bock </s>)
//
//   Orders >= 2 are stored as context → next token → count, so a
//   lookup is one map access instead of a scan over all n-grams.
//   Maps keep insertion order, which makes tie ordering stable
//   for a given corpus.
//
// Querying (backoff):
//   Try the longest context first and fall back one order at a
//   time. Order 1 ignores the context and suggests the most
//   frequent words overall.
//
//     Try(3) ──no match──► Try(2) ──no match──► Unigram ──empty──► Exhausted
//       │                    │                     │
//       └──match──► done     └──match──► done      └──► done
//
// Probabilities at orders >= 2 are renormalised over the shown
// top-k so they sum to 1. At order 1 they are divided by the
// total count of all good tokens instead.

use anyhow::{bail, Result};
use indexmap::IndexMap;

use crate::domain::token::{is_good_token, wrap_sentence};
use crate::domain::traits::TextNormalizer;

/// One suggested next word.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub token:       String,
    pub probability: f64,
}

/// Ranked suggestions plus the n-gram order that produced them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Suggestions {
    /// Order used, `None` when no level produced anything
    pub order: Option<usize>,

    /// Best candidate first
    pub candidates: Vec<Suggestion>,
}

impl Suggestions {
    /// The "no suggestion" outcome
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// context (n-1 tokens) → next token → count
type ContextTable = IndexMap<Vec<String>, IndexMap<String, u32>>;

/// Backoff states, walked from the highest order down.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Backoff {
    /// Match an (n-1)-token context at order n (n >= 2)
    Context(usize),
    /// Context-free unigram distribution
    Unigram,
    /// Every level failed
    Exhausted,
}

impl Backoff {
    fn start(order: usize) -> Self {
        match order {
            0 => Backoff::Exhausted,
            1 => Backoff::Unigram,
            n => Backoff::Context(n),
        }
    }

    /// The state tried after `self` fails
    fn lower(self) -> Self {
        match self {
            Backoff::Context(n) => Backoff::start(n - 1),
            Backoff::Unigram | Backoff::Exhausted => Backoff::Exhausted,
        }
    }
}

/// Immutable n-gram count tables for orders 1..=max_order.
#[derive(Debug, Clone)]
pub struct NgramModel {
    max_order: usize,
    unigrams:  IndexMap<String, u32>,
    /// `higher[i]` holds the table for order `i + 2`
    higher:    Vec<ContextTable>,
    sentences: usize,
}

impl NgramModel {
    /// Count all n-grams of order 1..=`max_order` in `corpus`.
    ///
    /// Each item is one already tokenised text. Empty texts are
    /// skipped. Fails only if `max_order` is zero.
    pub fn build<I, S>(corpus: I, max_order: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[String]>,
    {
        if max_order == 0 {
            bail!("n-gram order must be at least 1");
        }

        let mut unigrams: IndexMap<String, u32> = IndexMap::new();
        let mut higher: Vec<ContextTable> = vec![ContextTable::new(); max_order - 1];
        let mut sentences = 0usize;

        for tokens in corpus {
            let tokens = tokens.as_ref();
            if tokens.is_empty() {
                continue;
            }
            sentences += 1;

            let wrapped = wrap_sentence(tokens);

            for tok in &wrapped {
                *unigrams.entry(tok.clone()).or_insert(0) += 1;
            }

            for n in 2..=max_order {
                if wrapped.len() < n {
                    continue;
                }
                let table = &mut higher[n - 2];
                for window in wrapped.windows(n) {
                    let (context, next) = window.split_at(n - 1);
                    *table
                        .entry(context.to_vec())
                        .or_default()
                        .entry(next[0].clone())
                        .or_insert(0) += 1;
                }
            }
        }

        tracing::debug!(
            "Built {}-gram model from {} sentences ({} distinct tokens)",
            max_order,
            sentences,
            unigrams.len()
        );

        Ok(Self { max_order, unigrams, higher, sentences })
    }

    /// Normalise and tokenise raw texts, then build.
    pub fn from_texts<N, I, S>(normalizer: &N, texts: I, max_order: usize) -> Result<Self>
    where
        N: TextNormalizer + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let corpus: Vec<Vec<String>> = texts
            .into_iter()
            .map(|t| normalizer.tokens(t.as_ref()))
            .collect();
        Self::build(corpus, max_order)
    }

    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// Number of non-empty sentences counted
    pub fn sentence_count(&self) -> usize {
        self.sentences
    }

    /// Distinct order-1 tokens, boundary markers included
    pub fn vocabulary_size(&self) -> usize {
        self.unigrams.len()
    }

    /// Number of distinct n-grams of the given order
    pub fn distinct_ngrams(&self, order: usize) -> usize {
        match order {
            0 => 0,
            1 => self.unigrams.len(),
            n if n <= self.max_order => {
                self.higher[n - 2].values().map(|nexts| nexts.len()).sum()
            }
            _ => 0,
        }
    }

    /// Suggest up to `top_k` next tokens after `prefix`.
    ///
    /// `max_order` is clamped to the order the model was built
    /// with. An empty prefix or `top_k == 0` gives the empty result.
    pub fn suggest(&self, prefix: &[String], max_order: usize, top_k: usize) -> Suggestions {
        if prefix.is_empty() || top_k == 0 {
            return Suggestions::empty();
        }

        let mut state = Backoff::start(max_order.min(self.max_order));

        loop {
            state = match state {
                Backoff::Context(n) => {
                    if prefix.len() < n - 1 {
                        state.lower()
                    } else {
                        let context = &prefix[prefix.len() - (n - 1)..];
                        match self.continuations(n, context, top_k) {
                            Some(candidates) => {
                                return Suggestions { order: Some(n), candidates };
                            }
                            None => state.lower(),
                        }
                    }
                }
                Backoff::Unigram => match self.unigram_candidates(top_k) {
                    Some(candidates) => {
                        return Suggestions { order: Some(1), candidates };
                    }
                    None => state.lower(),
                },
                Backoff::Exhausted => return Suggestions::empty(),
            };
        }
    }

    /// `suggest` on raw text, normalised with `normalizer` first.
    pub fn suggest_text<N>(
        &self,
        normalizer: &N,
        prefix:     &str,
        max_order:  usize,
        top_k:      usize,
    ) -> Suggestions
    where
        N: TextNormalizer + ?Sized,
    {
        let tokens = normalizer.tokens(prefix);
        let result = self.suggest(&tokens, max_order, top_k);
        tracing::debug!(
            "suggest({:?}) → order {:?}, {} candidates",
            tokens,
            result.order,
            result.candidates.len()
        );
        result
    }

    /// Good continuations of `context` at order `n`, renormalised
    /// over the returned top-k. `None` if nothing survives.
    fn continuations(&self, n: usize, context: &[String], top_k: usize) -> Option<Vec<Suggestion>> {
        let nexts = self.higher[n - 2].get(context)?;

        let mut ranked: Vec<(&str, u32)> = nexts
            .iter()
            .filter(|(tok, _)| is_good_token(tok))
            .map(|(tok, &count)| (tok.as_str(), count))
            .collect();

        if ranked.is_empty() {
            return None;
        }

        // sort_by is stable: equal counts keep insertion order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(top_k);

        let shown: u32 = ranked.iter().map(|(_, c)| c).sum();
        Some(to_suggestions(&ranked, shown))
    }

    /// Most frequent good tokens, normalised by the total count of
    /// all good tokens. `None` if the vocabulary has none.
    fn unigram_candidates(&self, top_k: usize) -> Option<Vec<Suggestion>> {
        let mut ranked: Vec<(&str, u32)> = self
            .unigrams
            .iter()
            .filter(|(tok, _)| is_good_token(tok))
            .map(|(tok, &count)| (tok.as_str(), count))
            .collect();

        let total: u32 = ranked.iter().map(|(_, c)| c).sum();
        if total == 0 {
            return None;
        }

        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(top_k);

        Some(to_suggestions(&ranked, total))
    }
}

fn to_suggestions(ranked: &[(&str, u32)], denominator: u32) -> Vec<Suggestion> {
    ranked
        .iter()
        .map(|(tok, count)| Suggestion {
            token:       tok.to_string(),
            probability: f64::from(*count) / f64::from(denominator),
        })
        .collect()
}
