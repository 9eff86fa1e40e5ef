//! Cosine similarity and distance.

/// Returned by [`cosine_distance`] when the inputs differ in length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthMismatch {
    pub left: usize,
    pub right: usize,
}

/// Cosine similarity of two equal-length vectors, clamped to `[-1, 1]`.
///
/// Sums are taken in `f64` so finite inputs of any magnitude neither
/// overflow nor underflow. A zero vector on either side has similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, LengthMismatch> {
    if a.len() != b.len() {
        return Err(LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b.iter()).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (x as f64, y as f64);
            (dot + x * y, na + x * x, nb + y * y)
        },
    );

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if !denom.is_finite() || denom < f64::MIN_POSITIVE {
        return Ok(0.0);
    }

    Ok((dot / denom).clamp(-1.0, 1.0) as f32)
}

/// `1 - cosine_similarity(a, b)`; smaller is more similar, range `[0, 2]`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32, LengthMismatch> {
    cosine_similarity(a, b).map(|similarity| 1.0 - similarity)
}

/// Map a cosine distance back to a similarity score.
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 - distance
}
