// Copyright 2025 Skygraph Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Exact linear-scan similarity index.
//!
//! At the target corpus scale (thousands of chunks) a brute-force scan over
//! an `ndarray` matrix beats the operational cost of an ANN structure, and it
//! is exact by construction.

use crate::embedding::cosine_similarity;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from index construction and search.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorError {
    /// A vector did not match the index dimension.
    #[error("vector has dimension {got}, index expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Exact-distance similarity index over row vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    vectors: Array2<f32>,
}

impl FlatIndex {
    /// Build an index from row vectors, all of dimension `dimension`.
    pub fn from_rows(rows: Vec<Vec<f32>>, dimension: usize) -> Result<Self, VectorError> {
        let mut flat = Vec::with_capacity(rows.len() * dimension);
        let row_count = rows.len();
        for row in rows {
            if row.len() != dimension {
                return Err(VectorError::DimensionMismatch {
                    expected: dimension,
                    got: row.len(),
                });
            }
            flat.extend(row);
        }
        let vectors = Array2::from_shape_vec((row_count, dimension), flat)
            .expect("row-major shape matches collected length");
        Ok(Self { vectors })
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    /// True when no vectors are indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimension.
    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    /// Top-`k` rows by cosine similarity, descending; ties resolve to the
    /// lower row position so results are deterministic.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, VectorError> {
        if query.len() != self.dimension() {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension(),
                got: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                (
                    i,
                    cosine_similarity(query, row.as_slice().expect("rows are contiguous")),
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(dim: usize, hot: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[hot] = 1.0;
        v
    }

    #[test]
    fn rejects_mismatched_row() {
        let err = FlatIndex::from_rows(vec![vec![1.0, 0.0], vec![1.0]], 2).unwrap_err();
        assert_eq!(
            err,
            VectorError::DimensionMismatch {
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn search_orders_by_similarity() {
        let index = FlatIndex::from_rows(
            vec![unit(3, 0), unit(3, 1), vec![0.9, 0.1, 0.0]],
            3,
        )
        .unwrap();

        let hits = index.search(&unit(3, 0), 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, 0);
        assert!((hits[0].1 - 1.0).abs() < 1e-5);
        assert_eq!(hits[1].0, 2);
    }

    #[test]
    fn search_rejects_wrong_dimension_query() {
        let index = FlatIndex::from_rows(vec![unit(3, 0)], 3).unwrap();
        assert!(index.search(&[1.0, 0.0], 1).is_err());
    }

    #[test]
    fn k_larger_than_index_returns_all() {
        let index = FlatIndex::from_rows(vec![unit(2, 0), unit(2, 1)], 2).unwrap();
        let hits = index.search(&unit(2, 0), 10).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn ties_break_by_position() {
        let index = FlatIndex::from_rows(vec![unit(2, 1), unit(2, 1)], 2).unwrap();
        let hits = index.search(&unit(2, 1), 2).unwrap();
        assert_eq!(hits[0].0, 0);
        assert_eq!(hits[1].0, 1);
    }

    #[test]
    fn empty_index_searches_to_nothing() {
        let index = FlatIndex::from_rows(vec![], 4).unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[0.0; 4], 3).unwrap().is_empty());
    }
}
