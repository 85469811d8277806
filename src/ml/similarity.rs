// ============================================================
// Layer 5 — Vector helpers
// ============================================================
// Host-side cosine similarity and L2 normalisation, used for
// single-vector work (query normalisation, classifier
// centroids). Catalog-wide similarity goes through the burn
// matrix in index.rs instead.

/// Scale `v` to unit length in place. Zero vectors stay zero.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt();
    if norm > 0.0 {
        let inv = (1.0 / norm) as f32;
        for x in v.iter_mut() {
            *x *= inv;
        }
    }
}

/// Cosine similarity of two equal-length vectors.
/// Returns 0.0 if either vector is zero or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut na  = 0.0f64;
    let mut nb  = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na  += x * x;
        nb  += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())) as f32
}
