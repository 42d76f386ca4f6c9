//! ComplEx: Complex Embeddings for Simple Link Prediction.
//!
//! ComplEx ([Trouillon et al. 2016](http://proceedings.mlr.press/v48/trouillon16.pdf))
//! extends DistMult to complex space. Each embedding of width `2d` is read as
//! `d` complex numbers: the first half is the real part, the second half the
//! imaginary part.
//!
//! # Scoring
//!
//! ```text
//! score(s, p, o) = Re(<s, p, conj(o)>)
//!                = <s_re, p_re, o_re> + <s_re, p_im, o_im>
//!                + <s_im, p_re, o_im> - <s_im, p_im, o_re>
//! ```
//!
//! where `<a, b, c>` is the sum of the elementwise product. The conjugate
//! breaks the symmetry of DistMult: `score(s, p, o) != score(o, p, s)` in
//! general.
//!
//! # Hadamard Form
//!
//! Following Eq. (11) of the paper, the four terms collapse into a single
//! elementwise product over `4d` columns by widening each side:
//!
//! ```text
//! s_wide = [s_re, s_im, s_re,  s_im]   = [s, s]
//! p_wide = [p_re, p_re, p_im, -p_im]
//! o_wide = [o_re, o_im, o_im,  o_re]
//! ```
//!
//! Column block `k` of `s_wide * p_wide * o_wide` is exactly term `k` of the
//! sum above. Cross-product modes then become one matrix multiply, e.g.
//! `sp_` is `(s_wide * p_wide) . o_wide^T`.
//!
//! # Example
//!
//! ```rust
//! use kgbench_kge::{ComplExScorer, Combine, RelationalScorer};
//! use ndarray::array;
//!
//! // s = 1+0i, p = 0+1i, o = 0+1i: Re(1 * i * conj(i)) = 1
//! let s = array![[1.0_f32, 0.0]];
//! let p = array![[0.0_f32, 1.0]];
//! let o = array![[0.0_f32, 1.0]];
//!
//! let score = ComplExScorer::new()
//!     .score_emb(s.view(), p.view(), o.view(), Combine::Spo)
//!     .unwrap();
//! assert_eq!(score.dim(), (1, 1));
//! assert!((score[[0, 0]] - 1.0).abs() < 1e-6);
//! ```

use crate::combine::Combine;
use crate::context::{DatasetInfo, ModelConfig};
use crate::error::{Error, Result};
use crate::model::KgeModel;
use crate::scorer::{
    check_combine_shapes, check_complex_width, check_po_given_negs_shapes,
    check_sp_given_negs_shapes, RelationalScorer,
};
use ndarray::{
    concatenate, Array, Array1, Array2, ArrayView, ArrayView2, ArrayView3, Axis, RemoveAxis,
    Slice,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

// ============================================================================
// Widening
// ============================================================================

/// Real and imaginary halves along the last axis.
fn halves<'a, D: RemoveAxis>(
    x: &'a ArrayView<'_, f32, D>,
) -> (ArrayView<'a, f32, D>, ArrayView<'a, f32, D>) {
    let axis = Axis(x.ndim() - 1);
    let d = x.len_of(axis) / 2;
    (
        x.slice_axis(axis, Slice::from(..d)),
        x.slice_axis(axis, Slice::from(d..)),
    )
}

/// `[s, s]`: lines up with `[re, im, re, im]` of the other two sides.
fn widen_subject<D: RemoveAxis>(s_emb: ArrayView<'_, f32, D>) -> Result<Array<f32, D>> {
    let axis = Axis(s_emb.ndim() - 1);
    Ok(concatenate(axis, &[s_emb.view(), s_emb.view()])?)
}

/// `[p_re, p_re, p_im, -p_im]`
fn widen_predicate<D: RemoveAxis>(p_emb: ArrayView<'_, f32, D>) -> Result<Array<f32, D>> {
    let axis = Axis(p_emb.ndim() - 1);
    let (p_re, p_im) = halves(&p_emb);
    let neg_im = p_im.mapv(|x| -x);
    Ok(concatenate(axis, &[p_re, p_emb.view(), neg_im.view()])?)
}

/// `[o_re, o_im, o_im, o_re]`
fn widen_object<D: RemoveAxis>(o_emb: ArrayView<'_, f32, D>) -> Result<Array<f32, D>> {
    let axis = Axis(o_emb.ndim() - 1);
    let (o_re, o_im) = halves(&o_emb);
    Ok(concatenate(axis, &[o_emb.view(), o_im, o_re])?)
}

/// Row `i` of the result is `m[i] . v[i]`.
fn batched_matvec(m: ArrayView3<'_, f32>, v: ArrayView2<'_, f32>) -> Array2<f32> {
    let (n, k, _) = m.dim();
    let mut out = Array2::zeros((n, k));
    for ((mut row, mi), vi) in out.outer_iter_mut().zip(m.outer_iter()).zip(v.outer_iter()) {
        row.assign(&mi.dot(&vi));
    }
    out
}

/// Reshape to `[n, -1]`.
fn view_rows(out: Array2<f32>, n: usize) -> Result<Array2<f32>> {
    let cols = if n == 0 { out.ncols() } else { out.len() / n };
    Ok(out.into_shape_with_order((n, cols))?)
}

// ============================================================================
// Scorer
// ============================================================================

/// Batched ComplEx scorer.
///
/// Stateless: embeddings are passed in per call, so one scorer can be shared
/// freely across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplExScorer;

impl ComplExScorer {
    pub fn new() -> Self {
        Self
    }
}

impl RelationalScorer for ComplExScorer {
    fn score_emb_spo(
        &self,
        s_emb: ArrayView2<'_, f32>,
        p_emb: ArrayView2<'_, f32>,
        o_emb: ArrayView2<'_, f32>,
    ) -> Result<Array1<f32>> {
        let out = self.score_emb(s_emb, p_emb, o_emb, Combine::Spo)?;
        Ok(out.index_axis_move(Axis(1), 0))
    }

    fn score_emb(
        &self,
        s_emb: ArrayView2<'_, f32>,
        p_emb: ArrayView2<'_, f32>,
        o_emb: ArrayView2<'_, f32>,
        combine: Combine,
    ) -> Result<Array2<f32>> {
        check_combine_shapes(s_emb.dim(), p_emb.dim(), o_emb.dim(), combine)?;

        // Output rows follow the predicate batch except in s_o, where the
        // predicate is the candidate slot.
        let mut n = p_emb.nrows();

        let s_all = widen_subject(s_emb)?;
        let p_all = widen_predicate(p_emb)?;
        let o_all = widen_object(o_emb)?;

        let out = match combine {
            Combine::Spo => (&s_all * &o_all * &p_all)
                .sum_axis(Axis(1))
                .insert_axis(Axis(1)),
            Combine::Sp => (&s_all * &p_all).dot(&o_all.t()),
            Combine::Po => (&p_all * &o_all).dot(&s_all.t()),
            Combine::So => {
                n = s_emb.nrows();
                (&s_all * &o_all).dot(&p_all.t())
            }
        };

        view_rows(out, n)
    }

    fn score_emb_sp_given_negs(
        &self,
        s_emb: ArrayView2<'_, f32>,
        p_emb: ArrayView2<'_, f32>,
        o_emb_negs: ArrayView3<'_, f32>,
    ) -> Result<Array2<f32>> {
        check_sp_given_negs_shapes(s_emb.dim(), p_emb.dim(), o_emb_negs.dim())?;

        let s_all = widen_subject(s_emb)?;
        let p_all = widen_predicate(p_emb)?;
        let o_all = widen_object(o_emb_negs)?; // [n, negs, 4d]

        let sp = s_all * &p_all;
        Ok(batched_matvec(o_all.view(), sp.view()))
    }

    fn score_emb_po_given_negs(
        &self,
        s_emb_negs: ArrayView3<'_, f32>,
        p_emb: ArrayView2<'_, f32>,
        o_emb: ArrayView2<'_, f32>,
    ) -> Result<Array2<f32>> {
        check_po_given_negs_shapes(s_emb_negs.dim(), p_emb.dim(), o_emb.dim())?;

        let s_all = widen_subject(s_emb_negs)?; // [n, negs, 4d]
        let p_all = widen_predicate(p_emb)?;
        let o_all = widen_object(o_emb)?;

        let po = p_all * &o_all;
        Ok(batched_matvec(s_all.view(), po.view()))
    }
}

// ============================================================================
// Model
// ============================================================================

/// ComplEx model: embedding tables scored by [`ComplExScorer`].
#[derive(Debug, Clone)]
pub struct ComplEx {
    config: ModelConfig,
    dataset: DatasetInfo,
    scorer: ComplExScorer,
    /// Entity embeddings `[num_entities, embedding_dim]`.
    entity_embeddings: Array2<f32>,
    /// Relation embeddings `[num_relations, embedding_dim]`.
    relation_embeddings: Array2<f32>,
}

impl ComplEx {
    /// Create a ComplEx model.
    ///
    /// `configuration_key` scopes the configuration (defaults to the key the
    /// config already carries). With `init_for_load_only` the tables are left
    /// zeroed, to be replaced by [`ComplEx::with_embeddings`].
    pub fn new(
        config: &ModelConfig,
        dataset: &DatasetInfo,
        configuration_key: Option<&str>,
        init_for_load_only: bool,
    ) -> Result<Self> {
        let config = match configuration_key {
            Some(key) => config.for_key(key),
            None => config.clone(),
        };
        config.validate()?;
        dataset.validate()?;

        let dim = config.embedding_dim;
        let std = config.initialize_std;
        let (entity_embeddings, relation_embeddings) = if init_for_load_only {
            (
                Array2::zeros((dataset.num_entities, dim)),
                Array2::zeros((dataset.num_relations, dim)),
            )
        } else {
            (
                init_embeddings(dataset.num_entities, dim, std, config.seed)?,
                init_embeddings(dataset.num_relations, dim, std, config.seed.wrapping_add(1))?,
            )
        };

        debug!(
            key = %config.key,
            dataset = dataset.name.as_deref().unwrap_or("<unnamed>"),
            num_entities = dataset.num_entities,
            num_relations = dataset.num_relations,
            embedding_dim = dim,
            init_for_load_only,
            "created ComplEx model"
        );

        Ok(Self {
            config,
            dataset: dataset.clone(),
            scorer: ComplExScorer::new(),
            entity_embeddings,
            relation_embeddings,
        })
    }

    /// Replace both embedding tables with pre-trained ones.
    pub fn with_embeddings(
        mut self,
        entity_embeddings: Array2<f32>,
        relation_embeddings: Array2<f32>,
    ) -> Result<Self> {
        let dim = self.config.embedding_dim;
        let expected = [
            ("entity", entity_embeddings.dim(), self.dataset.num_entities),
            ("relation", relation_embeddings.dim(), self.dataset.num_relations),
        ];
        for (kind, (rows, cols), count) in expected {
            check_complex_width(cols)?;
            if rows != count || cols != dim {
                return Err(Error::Validation(format!(
                    "{} table has shape [{}, {}] but expected [{}, {}]",
                    kind, rows, cols, count, dim
                )));
            }
        }
        if entity_embeddings.iter().chain(relation_embeddings.iter()).any(|x| !x.is_finite()) {
            return Err(Error::Validation("embedding tables contain non-finite values".into()));
        }

        debug!(key = %self.config.key, "installed pre-trained ComplEx embeddings");
        self.entity_embeddings = entity_embeddings;
        self.relation_embeddings = relation_embeddings;
        Ok(self)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn dataset(&self) -> &DatasetInfo {
        &self.dataset
    }

    /// Configuration key the model was built under.
    pub fn configuration_key(&self) -> &str {
        &self.config.key
    }
}

impl KgeModel for ComplEx {
    type Scorer = ComplExScorer;

    fn scorer(&self) -> &ComplExScorer {
        &self.scorer
    }

    fn entity_embeddings(&self) -> ArrayView2<'_, f32> {
        self.entity_embeddings.view()
    }

    fn relation_embeddings(&self) -> ArrayView2<'_, f32> {
        self.relation_embeddings.view()
    }

    fn name(&self) -> &'static str {
        "ComplEx"
    }
}

/// Seeded normal initialization `N(0, std^2)`.
fn init_embeddings(rows: usize, dim: usize, std: f32, seed: u64) -> Result<Array2<f32>> {
    let normal = Normal::new(0.0_f32, std)
        .map_err(|e| Error::Validation(format!("invalid initialize_std {}: {}", std, e)))?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(Array2::from_shape_simple_fn((rows, dim), || normal.sample(&mut rng)))
}
