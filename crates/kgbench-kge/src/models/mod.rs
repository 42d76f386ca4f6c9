//! KGE model implementations.
//!
//! | Model | Scorer | Geometry |
//! |-------|--------|----------|
//! | [`ComplEx`] | [`ComplExScorer`] | Bilinear, complex space |

mod complex;

pub use complex::{ComplEx, ComplExScorer};
