//! ComplEx scoring for knowledge graph embeddings.
//!
//! Knowledge graphs store facts as (subject, predicate, object) triples:
//! `(Einstein, won, NobelPrize)`, `(Paris, capitalOf, France)`.
//! KGE models score triples from learned vectors so that true facts score
//! higher than corrupted ones.
//!
//! ## ComplEx
//!
//! [Trouillon et al. 2016](https://arxiv.org/abs/1606.06357) extends
//! DistMult (`<s, p, o>`) to complex space to handle asymmetric relations:
//!
//! ```text
//! score(s, p, o) = Re(<s, p, conj(o)>)
//! ```
//!
//! The conjugate breaks symmetry, so "parent_of" and "child_of" can be told
//! apart. Embeddings are stored as real arrays of width `2d`: real halves
//! first, imaginary halves second.
//!
//! This crate computes the score as batched `ndarray` operations, never
//! touching complex numbers directly. See [`models`] for the Hadamard-product
//! formulation.
//!
//! ## Combination Modes
//!
//! | Mode | Fixed | Expanded | Output |
//! |------|-------|----------|--------|
//! | `spo` | s, p, o | - | one score per row |
//! | `sp_` | s, p | o | every pair vs. every object |
//! | `_po` | p, o | s | every pair vs. every subject |
//! | `s_o` | s, o | p | every pair vs. every predicate |
//!
//! Training-time negatives use the `*_given_negs` variants instead, where
//! each row has its own private candidate set.
//!
//! ## Layers
//!
//! - [`RelationalScorer`]: embedding-level contract with brute-force defaults.
//! - [`ComplExScorer`]: closed-form batched overrides.
//! - [`KgeModel`] / [`ComplEx`]: embedding tables, index lookup, link
//!   prediction.
//!
//! ## Usage
//!
//! ```rust
//! use kgbench_kge::{ComplEx, DatasetInfo, KgeModel, ModelConfig};
//!
//! let config = ModelConfig::default().with_embedding_dim(16);
//! let dataset = DatasetInfo::new(10, 3);
//! let model = ComplEx::new(&config, &dataset, None, false)?;
//!
//! let scores = model.score_spo(&[0, 1], &[2, 0], &[5, 9])?;
//! assert_eq!(scores.dim(), (2, 1));
//!
//! let predictions = model.predict_tail(0, 2, 5)?;
//! assert_eq!(predictions.len(), 5);
//! # Ok::<(), kgbench_kge::Error>(())
//! ```
//!
//! Training, negative sampling and dataset loading live in the host
//! framework; this crate only scores.
//!
//! ## References
//!
//! - Trouillon et al. (2016). "Complex Embeddings for Simple Link
//!   Prediction." ICML.
//! - Yang et al. (2015). "Embedding Entities and Relations for Learning
//!   and Inference in Knowledge Bases." ICLR.

mod combine;
mod context;
mod error;
mod model;
pub mod models;
mod scorer;

pub use combine::Combine;
pub use context::{DatasetInfo, ModelConfig, DEFAULT_CONFIGURATION_KEY};
pub use error::{Error, Result};
pub use model::{KgeModel, Prediction};
pub use models::{ComplEx, ComplExScorer};
pub use scorer::{brute_force_score_emb, RelationalScorer};
