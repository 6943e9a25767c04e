//! Ranking candidates by cosine similarity to a query, as a recommender
//! backend would.

use std::cmp::Ordering;

use crate::error::{empty_buffer, Result};
use crate::kernels::cosine_similarity_with;
use crate::simd::{preferred_width, ElementKind, WidthDescriptor};

/// One candidate's position in the input and its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub index: usize,
    pub similarity: f32,
}

/// Ranks `candidates` by cosine similarity to `query`, most similar first.
///
/// Ties keep their input order. At most `top_k` entries are returned, or all
/// of them if `top_k` is `None`.
///
/// # Errors
///
/// Returns an error if `query` is empty or any candidate differs in length
/// from it.
///
/// # Example
///
/// ```rust
/// use lanebench::rank_by_similarity;
///
/// let query = [1.0, 0.0];
/// let items: Vec<Vec<f32>> = vec![vec![0.0, 1.0], vec![2.0, 0.1], vec![1.0, 1.0]];
/// let ranked = rank_by_similarity(&query, &items, Some(2)).unwrap();
///
/// assert_eq!(ranked.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 2]);
/// ```
pub fn rank_by_similarity(
    query: &[f32],
    candidates: &[impl AsRef<[f32]>],
    top_k: Option<usize>,
) -> Result<Vec<Ranked>> {
    rank_by_similarity_with(preferred_width(ElementKind::Float), query, candidates, top_k)
}

/// Ranks `candidates` at an explicit width.
pub fn rank_by_similarity_with(
    width: WidthDescriptor,
    query: &[f32],
    candidates: &[impl AsRef<[f32]>],
    top_k: Option<usize>,
) -> Result<Vec<Ranked>> {
    if query.is_empty() {
        return Err(empty_buffer("query"));
    }

    let mut ranked = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let similarity = cosine_similarity_with(width, query, candidate.as_ref())?;
            Ok(Ranked { index, similarity })
        })
        .collect::<Result<Vec<_>>>()?;

    ranked.sort_by(|x, y| match y.similarity.total_cmp(&x.similarity) {
        Ordering::Equal => x.index.cmp(&y.index),
        other => other,
    });
    if let Some(k) = top_k {
        ranked.truncate(k);
    }
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::length_mismatch;

    #[test]
    fn test_orders_descending() {
        let query = [1.0, 2.0, 3.0];
        let items: Vec<Vec<f32>> = vec![
            vec![-1.0, -2.0, -3.0],
            vec![1.0, 2.0, 3.0],
            vec![3.0, 2.0, 1.0],
            vec![0.0, 0.0, 0.0],
        ];
        let ranked = rank_by_similarity(&query, &items, None).unwrap();
        let order: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
        assert!((ranked[0].similarity - 1.0).abs() < 1e-6);
        assert_eq!(ranked[2].similarity, 0.0);
    }

    #[test]
    fn test_ties_keep_input_order() {
        // every norm is an exact square, so equal similarities tie bit for bit:
        // 25 / (5 * 5) = 50 / (5 * 10) and 24 / (5 * 5) = 48 / (5 * 10)
        let query = [3.0, 4.0];
        let items: Vec<Vec<f32>> = vec![
            vec![4.0, 3.0],
            vec![3.0, 4.0],
            vec![8.0, 6.0],
            vec![6.0, 8.0],
            vec![0.0, 1.0],
        ];
        for width in crate::kernels::test_data::all_widths() {
            let ranked = rank_by_similarity_with(width, &query, &items, None).unwrap();
            let order: Vec<usize> = ranked.iter().map(|r| r.index).collect();
            assert_eq!(order, vec![1, 3, 0, 2, 4], "{width}");
            assert_eq!(ranked[0].similarity, ranked[1].similarity);
            assert_eq!(ranked[2].similarity, ranked[3].similarity);
        }

        let zeros: Vec<Vec<f32>> = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        let ranked = rank_by_similarity(&query, &zeros, None).unwrap();
        assert_eq!(ranked.iter().map(|r| r.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_top_k() {
        let query = [1.0, 0.0];
        let items: Vec<Vec<f32>> = (0..10).map(|i| vec![1.0, i as f32]).collect();
        let ranked = rank_by_similarity(&query, &items, Some(3)).unwrap();
        assert_eq!(ranked.iter().map(|r| r.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(rank_by_similarity(&query, &items, Some(0)).unwrap().is_empty());
        assert_eq!(rank_by_similarity(&query, &items, Some(50)).unwrap().len(), 10);
    }

    #[test]
    fn test_validation() {
        let items: Vec<Vec<f32>> = vec![vec![1.0, 2.0, 3.0]];
        assert_eq!(
            rank_by_similarity(&[], &items, None),
            Err(empty_buffer("query"))
        );
        assert_eq!(
            rank_by_similarity(&[1.0, 2.0], &items, None),
            Err(length_mismatch(2, 3))
        );
    }
}
