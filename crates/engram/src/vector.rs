// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dense fp32 vector math: cosine similarity and L2 normalization.

/// Compute cosine similarity between two vectors.
///
/// For L2-normalized vectors (as all stored embeddings are), this is
/// equivalent to the dot product. Callers are responsible for checking
/// length agreement; mismatched lengths yield 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// L2-normalize a vector. Zero vectors are returned unchanged.
pub fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vec.iter().map(|v| v / norm).collect()
    } else {
        vec.to_vec()
    }
}

/// Whether a vector is L2-normalized to within `tolerance`.
pub fn is_normalized(vec: &[f32], tolerance: f32) -> bool {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    (norm - 1.0).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_normalized() {
        let v: Vec<f32> = vec![0.5773, 0.5773, 0.5773]; // ~1/sqrt(3) each
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 0.01, "identical vectors should have sim ~1.0, got {sim}");
    }

    #[test]
    fn cosine_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < f32::EPSILON);
    }

    #[test]
    fn cosine_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim - (-1.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn cosine_unnormalized_inputs() {
        // Cosine divides magnitudes out, so scale must not matter.
        let a = vec![3.0, 4.0];
        let b = vec![6.0, 8.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim - 1.0).abs() < 0.001, "got {sim}");
    }

    #[test]
    fn cosine_length_mismatch_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn cosine_zero_vector_is_zero() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn normalize_general_vector() {
        let n = l2_normalize(&[3.0, 4.0]);
        // norm = 5, so normalized = [0.6, 0.8]
        assert!((n[0] - 0.6).abs() < 0.001);
        assert!((n[1] - 0.8).abs() < 0.001);
        assert!(is_normalized(&n, 1e-5));
    }

    #[test]
    fn normalize_zero_vector_unchanged() {
        assert_eq!(l2_normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn is_normalized_tolerance() {
        assert!(is_normalized(&[1.0, 0.0], 1e-5));
        assert!(!is_normalized(&[0.9, 0.0], 1e-5));
    }
}
