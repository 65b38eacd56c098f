//! Vector similarity helpers

/// Calculate cosine similarity between two vectors
///
/// Mismatched lengths, empty vectors and zero-norm vectors yield 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Whether `candidate` can be compared against `reference`
pub fn is_usable_vector(reference: &[f32], candidate: &[f32]) -> bool {
    !candidate.is_empty()
        && candidate.len() == reference.len()
        && candidate.iter().all(|v| v.is_finite())
        && candidate.iter().any(|v| *v != 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let v = vec![0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_usable_vector() {
        let reference = [1.0, 0.0, 0.0];

        assert!(is_usable_vector(&reference, &[0.1, 0.2, 0.3]));
        assert!(!is_usable_vector(&reference, &[0.1, 0.2]));
        assert!(!is_usable_vector(&reference, &[0.0, 0.0, 0.0]));
        assert!(!is_usable_vector(&reference, &[f32::NAN, 0.2, 0.3]));
        assert!(!is_usable_vector(&reference, &[]));
    }
}
