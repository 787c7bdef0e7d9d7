//! Vector normalization and similarity functions.

/// Compute the L2 (Euclidean) norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// L2-normalize a vector in-place. Zero vectors remain zero.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Dot product accumulated in `f64`.
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

/// Epsilon-guarded cosine similarity.
///
/// `dot(a, b) / sqrt((|a|^2 + eps) * (|b|^2 + eps))`. A zero vector yields
/// `0.0` instead of a division by zero. Callers check dimensions; extra
/// trailing components of the longer slice are ignored.
pub fn cosine_similarity(a: &[f32], b: &[f32], eps: f32) -> f64 {
    let eps = f64::from(eps);
    let mag_a = dot(a, a) + eps;
    let mag_b = dot(b, b) + eps;
    dot(a, b) / (mag_a * mag_b).sqrt()
}
