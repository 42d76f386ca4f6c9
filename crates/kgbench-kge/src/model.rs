//! Index-level model contract over embedding tables.
//!
//! A [`KgeModel`] owns entity and relation embedding tables and delegates
//! all arithmetic to its [`RelationalScorer`]. Model families only supply the
//! tables and the scorer; lookup, candidate expansion and link prediction are
//! provided methods.
//!
//! # Design
//!
//! The split mirrors how models are trained elsewhere and served here:
//! - The scorer works on embedding batches and knows nothing about indices.
//! - The model resolves indices to rows and picks the candidate table
//!   (entities for `sp_`/`_po`, relations for `s_o`).
//! - Inference returns `ndarray` arrays or plain Rust types.
//!
//! # Example
//!
//! ```rust
//! use kgbench_kge::{ComplEx, DatasetInfo, KgeModel, ModelConfig};
//!
//! let config = ModelConfig::default().with_embedding_dim(8);
//! let dataset = DatasetInfo::new(5, 2);
//! let model = ComplEx::new(&config, &dataset, None, false).unwrap();
//!
//! // Every (s, p) pair against all entities.
//! let scores = model.score_sp(&[0, 1], &[1, 0], None).unwrap();
//! assert_eq!(scores.dim(), (2, 5));
//!
//! let top = model.predict_tail(0, 1, 3).unwrap();
//! assert_eq!(top.len(), 3);
//! ```

use crate::combine::Combine;
use crate::error::{Error, Result};
use crate::scorer::RelationalScorer;
use ndarray::{Array2, Array3, ArrayView2, Axis, CowArray, Ix2};
use serde::{Deserialize, Serialize};

/// Link prediction result with entity index and score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted entity index.
    pub entity: usize,
    /// Plausibility score (higher = more plausible).
    pub score: f32,
}

/// Unified trait for embedding models scored through a [`RelationalScorer`].
pub trait KgeModel: Send + Sync {
    /// Scoring strategy for this model family.
    type Scorer: RelationalScorer;

    // =========================================================================
    // Required
    // =========================================================================

    /// The scorer this model delegates to.
    fn scorer(&self) -> &Self::Scorer;

    /// Entity embedding table `[num_entities, embedding_dim]`.
    fn entity_embeddings(&self) -> ArrayView2<'_, f32>;

    /// Relation embedding table `[num_relations, embedding_dim]`.
    fn relation_embeddings(&self) -> ArrayView2<'_, f32>;

    /// Model name (e.g., "ComplEx").
    fn name(&self) -> &'static str;

    // =========================================================================
    // Metadata
    // =========================================================================

    fn num_entities(&self) -> usize {
        self.entity_embeddings().nrows()
    }

    fn num_relations(&self) -> usize {
        self.relation_embeddings().nrows()
    }

    fn embedding_dim(&self) -> usize {
        self.entity_embeddings().ncols()
    }

    // =========================================================================
    // Scoring
    // =========================================================================

    /// Score row-aligned triples `(s[i], p[i], o[i])`. Returns `[n, 1]`.
    fn score_spo(&self, s: &[usize], p: &[usize], o: &[usize]) -> Result<Array2<f32>> {
        let s_emb = lookup_rows(self.entity_embeddings(), s, "entity")?;
        let p_emb = lookup_rows(self.relation_embeddings(), p, "relation")?;
        let o_emb = lookup_rows(self.entity_embeddings(), o, "entity")?;
        self.scorer()
            .score_emb(s_emb.view(), p_emb.view(), o_emb.view(), Combine::Spo)
    }

    /// Score each `(s[i], p[i])` against candidate objects.
    ///
    /// With `o = None` every entity is a candidate. Returns `[n, |o|]`.
    fn score_sp(&self, s: &[usize], p: &[usize], o: Option<&[usize]>) -> Result<Array2<f32>> {
        let s_emb = lookup_rows(self.entity_embeddings(), s, "entity")?;
        let p_emb = lookup_rows(self.relation_embeddings(), p, "relation")?;
        let o_emb = candidates(self.entity_embeddings(), o, "entity")?;
        self.scorer()
            .score_emb(s_emb.view(), p_emb.view(), o_emb.view(), Combine::Sp)
    }

    /// Score each `(p[i], o[i])` against candidate subjects.
    ///
    /// With `s = None` every entity is a candidate. Returns `[n, |s|]`.
    fn score_po(&self, p: &[usize], o: &[usize], s: Option<&[usize]>) -> Result<Array2<f32>> {
        let s_emb = candidates(self.entity_embeddings(), s, "entity")?;
        let p_emb = lookup_rows(self.relation_embeddings(), p, "relation")?;
        let o_emb = lookup_rows(self.entity_embeddings(), o, "entity")?;
        self.scorer()
            .score_emb(s_emb.view(), p_emb.view(), o_emb.view(), Combine::Po)
    }

    /// Score each `(s[i], o[i])` against candidate relations.
    ///
    /// With `p = None` every relation is a candidate. Returns `[n, |p|]`.
    fn score_so(&self, s: &[usize], o: &[usize], p: Option<&[usize]>) -> Result<Array2<f32>> {
        let s_emb = lookup_rows(self.entity_embeddings(), s, "entity")?;
        let p_emb = candidates(self.relation_embeddings(), p, "relation")?;
        let o_emb = lookup_rows(self.entity_embeddings(), o, "entity")?;
        self.scorer()
            .score_emb(s_emb.view(), p_emb.view(), o_emb.view(), Combine::So)
    }

    /// Score each `(s[i], p[i])` against its own negatives `o_negs[i, ..]`.
    /// Returns `[n, negs]`.
    fn score_sp_given_negs(
        &self,
        s: &[usize],
        p: &[usize],
        o_negs: ArrayView2<'_, usize>,
    ) -> Result<Array2<f32>> {
        let s_emb = lookup_rows(self.entity_embeddings(), s, "entity")?;
        let p_emb = lookup_rows(self.relation_embeddings(), p, "relation")?;
        let o_emb = lookup_grid(self.entity_embeddings(), o_negs, "entity")?;
        self.scorer()
            .score_emb_sp_given_negs(s_emb.view(), p_emb.view(), o_emb.view())
    }

    /// Score each `(p[i], o[i])` against its own negatives `s_negs[i, ..]`.
    /// Returns `[n, negs]`.
    fn score_po_given_negs(
        &self,
        s_negs: ArrayView2<'_, usize>,
        p: &[usize],
        o: &[usize],
    ) -> Result<Array2<f32>> {
        let s_emb = lookup_grid(self.entity_embeddings(), s_negs, "entity")?;
        let p_emb = lookup_rows(self.relation_embeddings(), p, "relation")?;
        let o_emb = lookup_rows(self.entity_embeddings(), o, "entity")?;
        self.scorer()
            .score_emb_po_given_negs(s_emb.view(), p_emb.view(), o_emb.view())
    }

    // =========================================================================
    // Link Prediction
    // =========================================================================

    /// Predict likely tail entities for (head, relation, ?).
    ///
    /// Returns top-k predictions sorted by score (descending).
    fn predict_tail(&self, head: usize, relation: usize, k: usize) -> Result<Vec<Prediction>> {
        let scores = self.score_sp(&[head], &[relation], None)?;
        Ok(top_k(scores.row(0).iter().copied(), k))
    }

    /// Predict likely head entities for (?, relation, tail).
    ///
    /// Returns top-k predictions sorted by score (descending).
    fn predict_head(&self, relation: usize, tail: usize, k: usize) -> Result<Vec<Prediction>> {
        let scores = self.score_po(&[relation], &[tail], None)?;
        Ok(top_k(scores.row(0).iter().copied(), k))
    }
}

fn top_k(scores: impl Iterator<Item = f32>, k: usize) -> Vec<Prediction> {
    let mut ranked: Vec<Prediction> = scores
        .enumerate()
        .map(|(entity, score)| Prediction { entity, score })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(k);
    ranked
}

fn check_indices(table: ArrayView2<'_, f32>, idx: &[usize], kind: &str) -> Result<()> {
    let n = table.nrows();
    match idx.iter().find(|&&i| i >= n) {
        Some(i) => Err(Error::NotFound(format!(
            "{} index {} (table has {} rows)",
            kind, i, n
        ))),
        None => Ok(()),
    }
}

/// Gather rows of `table` by index.
pub(crate) fn lookup_rows(
    table: ArrayView2<'_, f32>,
    idx: &[usize],
    kind: &str,
) -> Result<Array2<f32>> {
    check_indices(table, idx, kind)?;
    Ok(table.select(Axis(0), idx))
}

/// Gather a `[n, k]` grid of indices into `[n, k, width]`.
pub(crate) fn lookup_grid(
    table: ArrayView2<'_, f32>,
    idx: ArrayView2<'_, usize>,
    kind: &str,
) -> Result<Array3<f32>> {
    let flat: Vec<usize> = idx.iter().copied().collect();
    let rows = lookup_rows(table, &flat, kind)?;
    let (n, k) = idx.dim();
    Ok(rows.into_shape_with_order((n, k, table.ncols()))?)
}

/// Candidate rows: the selected ones, or the whole table without copying.
fn candidates<'a>(
    table: ArrayView2<'a, f32>,
    idx: Option<&[usize]>,
    kind: &str,
) -> Result<CowArray<'a, f32, Ix2>> {
    match idx {
        Some(idx) => Ok(CowArray::from(lookup_rows(table, idx, kind)?)),
        None => Ok(CowArray::from(table)),
    }
}
