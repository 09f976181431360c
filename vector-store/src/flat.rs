use crate::error::VectorStoreError;
use log::debug;
use serde::{Deserialize, Serialize};

/// A single nearest-neighbour hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Insertion position of the matched vector (0-based)
    pub position: usize,

    /// Squared Euclidean distance to the query (lower is closer)
    pub distance: f32,
}

/// Exhaustive squared-Euclidean index over `f32` vectors.
///
/// Vectors are stored back to back in a single buffer and addressed by their
/// insertion position. `add` only appends, so positions handed out earlier
/// stay valid for the lifetime of the index.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index for vectors of `dimension` components
    pub fn new(dimension: usize) -> Result<Self, VectorStoreError> {
        if dimension == 0 {
            return Err(VectorStoreError::InvalidDimension(dimension));
        }
        Ok(Self {
            dimension,
            data: Vec::new(),
        })
    }

    /// Append vectors to the index.
    ///
    /// The whole batch is validated before anything is written, so a
    /// rejected batch leaves the index untouched.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), VectorStoreError> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }

        debug!(
            "Flat index grew by {} vectors to {}",
            vectors.len(),
            self.len()
        );
        Ok(())
    }

    /// Return the `k` nearest vectors, closest first.
    ///
    /// Equal distances keep insertion order. Fewer than `k` neighbours are
    /// returned when the index holds fewer vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorStoreError> {
        if query.len() != self.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, stored)| Neighbor {
                position,
                distance: squared_euclidean(query, stored),
            })
            .collect();

        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);
        Ok(neighbors)
    }

    /// Vector stored at `position`, if any
    pub fn get(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        let end = start.checked_add(self.dimension)?;
        self.data.get(start..end)
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Dimension fixed at construction
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Squared L2 distance. Slices are assumed to have equal length.
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn index_with(vectors: &[Vec<f32>]) -> FlatIndex {
        let mut index = FlatIndex::new(vectors[0].len()).unwrap();
        index.add(vectors).unwrap();
        index
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            FlatIndex::new(0),
            Err(VectorStoreError::InvalidDimension(0))
        ));
    }

    #[test]
    fn test_squared_euclidean() {
        assert_eq!(squared_euclidean(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(squared_euclidean(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_ascending_distance() {
        let index = index_with(&[
            vec![10.0, 10.0],
            vec![1.0, 0.0],
            vec![0.0, 0.0],
            vec![5.0, 5.0],
        ]);

        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|n| n.position).collect();

        assert_eq!(positions, vec![2, 1, 3]);
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[1].distance, 1.0);
        assert_eq!(hits[2].distance, 50.0);
    }

    #[test]
    fn test_search_ties_keep_insertion_order() {
        let index = index_with(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]]);

        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|n| n.position).collect();

        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_search_returns_fewer_than_k() {
        let index = index_with(&[vec![1.0], vec![2.0]]);
        assert_eq!(index.search(&[0.0], 10).unwrap().len(), 2);
    }

    #[test]
    fn test_add_appends_without_moving_existing_vectors() {
        let mut index = index_with(&[vec![1.0, 1.0], vec![2.0, 2.0]]);
        index.add(&[vec![3.0, 3.0]]).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.get(0), Some(&[1.0, 1.0][..]));
        assert_eq!(index.get(2), Some(&[3.0, 3.0][..]));
        assert_eq!(index.get(3), None);
    }

    #[test]
    fn test_get_far_out_of_range() {
        let index = index_with(&[vec![1.0, 1.0]]);
        // start fits in usize, start + dimension does not
        assert_eq!(index.get(usize::MAX / 2), None);
        assert_eq!(index.get(usize::MAX), None);
    }

    #[test]
    fn test_mismatched_batch_is_rejected_atomically() {
        let mut index = index_with(&[vec![1.0, 1.0]]);
        let err = index
            .add(&[vec![2.0, 2.0], vec![3.0, 3.0, 3.0]])
            .unwrap_err();

        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_query_dimension_checked() {
        let index = index_with(&[vec![1.0, 1.0]]);
        assert!(index.search(&[1.0], 1).is_err());
    }

    #[test]
    fn test_empty_index_search() {
        let index = FlatIndex::new(4).unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[0.0; 4], 5).unwrap().is_empty());
    }
}
