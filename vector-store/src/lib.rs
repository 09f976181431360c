//! # Hybrid Search Vector Store
//!
//! Flat (exhaustive) nearest-neighbour index used by the dense retriever.
//!
//! Vectors are compared by squared Euclidean distance, lower meaning closer.
//! The index only ever appends, so the position a vector was inserted at is a
//! stable handle that callers can map back to their own records.
//!
//! ## Example
//!
//! ```
//! use hybrid_search_vector_store::FlatIndex;
//!
//! let mut index = FlatIndex::new(2).unwrap();
//! index.add(&[vec![0.0, 0.0], vec![3.0, 4.0]]).unwrap();
//!
//! let hits = index.search(&[3.0, 3.0], 1).unwrap();
//! assert_eq!(hits[0].position, 1);
//! assert_eq!(hits[0].distance, 1.0);
//! ```

mod error;
mod flat;

pub use error::VectorStoreError;
pub use flat::{FlatIndex, Neighbor, squared_euclidean};
