pub fn l2_norm(v: &[f32]) -> f32 {
    let mut sum = 0.0f32;
    for x in v {
        sum += x * x;
    }
    sum.sqrt()
}

/// Cosine of two vectors with precomputed norms. Callers skip zero norms.
pub fn cosine_similarity(a: &[f32], b: &[f32], a_norm: f32, b_norm: f32) -> f32 {
    let mut dot = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
    }
    dot / (a_norm * b_norm)
}

/// Cosine of two raw vectors; `None` when either is zero or the widths differ.
pub fn cosine(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let (an, bn) = (l2_norm(a), l2_norm(b));
    if an == 0.0 || bn == 0.0 {
        return None;
    }
    Some(cosine_similarity(a, b, an, bn))
}
