//! Sparse feature vectors and p-norm normalization.

use serde::{Deserialize, Serialize};

use crate::error::{AuthorAgeError, Result};

/// A sparse vector with sorted, unique indices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    size: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Create a vector from parallel index/value arrays.
    ///
    /// Indices must be strictly increasing and smaller than `size`.
    pub fn new(size: usize, indices: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(AuthorAgeError::invalid_feature_vector(format!(
                "{} indices but {} values",
                indices.len(),
                values.len()
            )));
        }
        if indices.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(AuthorAgeError::invalid_feature_vector(
                "indices must be strictly increasing",
            ));
        }
        if let Some(&last) = indices.last()
            && last >= size
        {
            return Err(AuthorAgeError::invalid_feature_vector(format!(
                "index {last} out of bounds for size {size}"
            )));
        }
        Ok(Self {
            size,
            indices,
            values,
        })
    }

    /// Create a vector from unsorted `(index, value)` pairs; repeated
    /// indices are summed.
    pub fn from_pairs(size: usize, mut pairs: Vec<(usize, f64)>) -> Result<Self> {
        pairs.sort_unstable_by_key(|&(index, _)| index);

        let mut indices: Vec<usize> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (index, value) in pairs {
            match indices.last() {
                Some(&last) if last == index => {
                    if let Some(slot) = values.last_mut() {
                        *slot += value;
                    }
                }
                _ => {
                    indices.push(index);
                    values.push(value);
                }
            }
        }
        Self::new(size, indices, values)
    }

    /// An all-zero vector.
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Logical dimension.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Indices of the stored entries.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Values of the stored entries.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Iterate over `(index, value)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Dot product with a dense vector of the same dimension.
    pub fn dot(&self, dense: &[f64]) -> Result<f64> {
        if dense.len() != self.size {
            return Err(AuthorAgeError::invalid_feature_vector(format!(
                "dimension mismatch: vector has size {}, weights have size {}",
                self.size,
                dense.len()
            )));
        }
        Ok(self.iter().map(|(index, value)| value * dense[index]).sum())
    }

    /// The p-norm of the vector; `f64::INFINITY` gives the max norm.
    pub fn norm(&self, p: f64) -> f64 {
        if p == 1.0 {
            self.values.iter().map(|v| v.abs()).sum()
        } else if p == 2.0 {
            self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
        } else if p.is_infinite() {
            self.values.iter().fold(0.0, |max, v| max.max(v.abs()))
        } else {
            self.values
                .iter()
                .map(|v| v.abs().powf(p))
                .sum::<f64>()
                .powf(1.0 / p)
        }
    }

    /// Multiply every entry by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for value in &mut self.values {
            *value *= factor;
        }
    }
}

/// Normalizes vectors to unit p-norm.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    p: f64,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self { p: 2.0 }
    }
}

impl Normalizer {
    /// Create a normalizer for the p-norm (`p >= 1`, or infinity).
    pub fn new(p: f64) -> Result<Self> {
        if p.is_nan() || p < 1.0 {
            return Err(AuthorAgeError::invalid_argument(format!(
                "norm order must be >= 1, got {p}"
            )));
        }
        Ok(Self { p })
    }

    /// The L1 normalizer.
    pub fn l1() -> Self {
        Self { p: 1.0 }
    }

    /// The norm order.
    pub fn p(&self) -> f64 {
        self.p
    }

    /// Return `vector` scaled to unit norm; zero vectors are returned unchanged.
    pub fn transform(&self, vector: &SparseVector) -> SparseVector {
        let norm = vector.norm(self.p);
        let mut normalized = vector.clone();
        if norm != 0.0 {
            normalized.scale(1.0 / norm);
        }
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_sorts_and_merges() {
        let vector = SparseVector::from_pairs(5, vec![(3, 1.0), (0, 2.0), (3, 1.0)]).unwrap();
        assert_eq!(vector.indices(), &[0, 3]);
        assert_eq!(vector.values(), &[2.0, 2.0]);
        assert_eq!(vector.nnz(), 2);
    }

    #[test]
    fn test_invalid_vectors() {
        assert!(SparseVector::new(3, vec![0, 1], vec![1.0]).is_err());
        assert!(SparseVector::new(3, vec![1, 0], vec![1.0, 1.0]).is_err());
        assert!(SparseVector::new(3, vec![3], vec![1.0]).is_err());
    }

    #[test]
    fn test_dot() {
        let vector = SparseVector::new(3, vec![0, 2], vec![1.0, 3.0]).unwrap();
        assert_eq!(vector.dot(&[2.0, 100.0, 0.5]).unwrap(), 3.5);
        assert!(vector.dot(&[1.0]).is_err());
    }

    #[test]
    fn test_norms() {
        let vector = SparseVector::new(4, vec![0, 3], vec![3.0, -4.0]).unwrap();
        assert_eq!(vector.norm(1.0), 7.0);
        assert_eq!(vector.norm(2.0), 5.0);
        assert_eq!(vector.norm(f64::INFINITY), 4.0);
        assert!((vector.norm(3.0) - 91.0_f64.powf(1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_l1_normalization() {
        let vector = SparseVector::new(4, vec![1, 2], vec![1.0, 3.0]).unwrap();
        let normalized = Normalizer::l1().transform(&vector);
        assert_eq!(normalized.values(), &[0.25, 0.75]);
        assert_eq!(normalized.indices(), vector.indices());
    }

    #[test]
    fn test_zero_vector_is_unchanged() {
        let vector = SparseVector::zeros(3);
        assert_eq!(Normalizer::l1().transform(&vector), vector);
    }

    #[test]
    fn test_invalid_norm_order() {
        assert!(Normalizer::new(0.5).is_err());
        assert!(Normalizer::new(f64::NAN).is_err());
        assert!(Normalizer::new(f64::INFINITY).is_ok());
    }
}
