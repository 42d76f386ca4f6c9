//! Relational scorers: the embedding-level scoring contract.
//!
//! A [`RelationalScorer`] turns subject/predicate/object embedding batches
//! into plausibility scores. Only row-aligned scoring
//! ([`RelationalScorer::score_emb_spo`]) is required; every other operation
//! has a brute-force default that expands the candidate slot and calls it row
//! by row. Model families override the defaults with closed-form batched
//! versions (see [`ComplExScorer`](crate::ComplExScorer)).
//!
//! # Shapes
//!
//! | Operation | s | p | o | Output |
//! |-----------|---|---|---|--------|
//! | `spo` | `[n, w]` | `[n, w]` | `[n, w]` | `[n, 1]` |
//! | `sp_` | `[n, w]` | `[n, w]` | `[m, w]` | `[n, m]` |
//! | `_po` | `[m, w]` | `[n, w]` | `[n, w]` | `[n, m]` |
//! | `s_o` | `[n, w]` | `[m, w]` | `[n, w]` | `[n, m]` |
//! | `sp_given_negs` | `[n, w]` | `[n, w]` | `[n, k, w]` | `[n, k]` |
//! | `po_given_negs` | `[n, k, w]` | `[n, w]` | `[n, w]` | `[n, k]` |
//!
//! `w` is the real-valued embedding width and must be even.

use crate::combine::Combine;
use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayView2, ArrayView3, Axis};

/// Embedding-level scoring strategy for a model family.
pub trait RelationalScorer: Send + Sync {
    /// Score row-aligned triples: row `i` scores `(s[i], p[i], o[i])`.
    fn score_emb_spo(
        &self,
        s_emb: ArrayView2<'_, f32>,
        p_emb: ArrayView2<'_, f32>,
        o_emb: ArrayView2<'_, f32>,
    ) -> Result<Array1<f32>>;

    /// Score embeddings under a combination mode.
    ///
    /// The default expands the candidate slot and is correct for any scorer,
    /// but costs one `score_emb_spo` call per output row.
    fn score_emb(
        &self,
        s_emb: ArrayView2<'_, f32>,
        p_emb: ArrayView2<'_, f32>,
        o_emb: ArrayView2<'_, f32>,
        combine: Combine,
    ) -> Result<Array2<f32>> {
        brute_force_score_emb(self, s_emb, p_emb, o_emb, combine)
    }

    /// Score each `(s[i], p[i])` against its own candidate objects `o_negs[i]`.
    fn score_emb_sp_given_negs(
        &self,
        s_emb: ArrayView2<'_, f32>,
        p_emb: ArrayView2<'_, f32>,
        o_emb_negs: ArrayView3<'_, f32>,
    ) -> Result<Array2<f32>> {
        check_sp_given_negs_shapes(s_emb.dim(), p_emb.dim(), o_emb_negs.dim())?;
        tracing::trace!(
            batch = p_emb.nrows(),
            negs = o_emb_negs.len_of(Axis(1)),
            "brute-force sp_ scoring against private negatives"
        );

        let (n, negs, _) = o_emb_negs.dim();
        let mut out = Array2::zeros((n, negs));
        for (i, mut row) in out.outer_iter_mut().enumerate() {
            let s_rep = repeat_row(s_emb, i, negs)?;
            let p_rep = repeat_row(p_emb, i, negs)?;
            let candidates = o_emb_negs.index_axis(Axis(0), i);
            row.assign(&self.score_emb_spo(s_rep.view(), p_rep.view(), candidates)?);
        }
        Ok(out)
    }

    /// Score each `(p[i], o[i])` against its own candidate subjects `s_negs[i]`.
    fn score_emb_po_given_negs(
        &self,
        s_emb_negs: ArrayView3<'_, f32>,
        p_emb: ArrayView2<'_, f32>,
        o_emb: ArrayView2<'_, f32>,
    ) -> Result<Array2<f32>> {
        check_po_given_negs_shapes(s_emb_negs.dim(), p_emb.dim(), o_emb.dim())?;
        tracing::trace!(
            batch = p_emb.nrows(),
            negs = s_emb_negs.len_of(Axis(1)),
            "brute-force _po scoring against private negatives"
        );

        let (n, negs, _) = s_emb_negs.dim();
        let mut out = Array2::zeros((n, negs));
        for (i, mut row) in out.outer_iter_mut().enumerate() {
            let candidates = s_emb_negs.index_axis(Axis(0), i);
            let p_rep = repeat_row(p_emb, i, negs)?;
            let o_rep = repeat_row(o_emb, i, negs)?;
            row.assign(&self.score_emb_spo(candidates, p_rep.view(), o_rep.view())?);
        }
        Ok(out)
    }
}

/// Generic fallback for [`RelationalScorer::score_emb`].
///
/// Public so that scorers overriding `score_emb` for some modes can still
/// hand the rest back to it.
pub fn brute_force_score_emb<S: RelationalScorer + ?Sized>(
    scorer: &S,
    s_emb: ArrayView2<'_, f32>,
    p_emb: ArrayView2<'_, f32>,
    o_emb: ArrayView2<'_, f32>,
    combine: Combine,
) -> Result<Array2<f32>> {
    check_combine_shapes(s_emb.dim(), p_emb.dim(), o_emb.dim(), combine)?;
    tracing::trace!(%combine, "brute-force scoring");

    let (n, m) = match combine {
        Combine::Spo => {
            return Ok(scorer.score_emb_spo(s_emb, p_emb, o_emb)?.insert_axis(Axis(1)));
        }
        Combine::Sp => (p_emb.nrows(), o_emb.nrows()),
        Combine::Po => (p_emb.nrows(), s_emb.nrows()),
        Combine::So => (s_emb.nrows(), p_emb.nrows()),
    };

    let mut out = Array2::zeros((n, m));
    for (i, mut row) in out.outer_iter_mut().enumerate() {
        let scores = match combine {
            Combine::Sp => {
                let s_rep = repeat_row(s_emb, i, m)?;
                let p_rep = repeat_row(p_emb, i, m)?;
                scorer.score_emb_spo(s_rep.view(), p_rep.view(), o_emb)?
            }
            Combine::Po => {
                let p_rep = repeat_row(p_emb, i, m)?;
                let o_rep = repeat_row(o_emb, i, m)?;
                scorer.score_emb_spo(s_emb, p_rep.view(), o_rep.view())?
            }
            Combine::So => {
                let s_rep = repeat_row(s_emb, i, m)?;
                let o_rep = repeat_row(o_emb, i, m)?;
                scorer.score_emb_spo(s_rep.view(), p_emb, o_rep.view())?
            }
            Combine::Spo => unreachable!("handled above"),
        };
        row.assign(&scores);
    }
    Ok(out)
}

/// Row `i` of `x` repeated `times` times.
fn repeat_row(x: ArrayView2<'_, f32>, i: usize, times: usize) -> Result<Array2<f32>> {
    x.row(i)
        .broadcast((times, x.ncols()))
        .map(|rows| rows.to_owned())
        .ok_or_else(|| Error::ShapeMismatch(format!("cannot repeat row {} to {} rows", i, times)))
}

// ============================================================================
// Shape validation
// ============================================================================

/// Check that `width` can be split into equal real and imaginary halves.
pub(crate) fn check_complex_width(width: usize) -> Result<()> {
    if width % 2 != 0 {
        return Err(Error::OddDimension(width));
    }
    Ok(())
}

fn check_widths(s: usize, p: usize, o: usize) -> Result<()> {
    if s != p || p != o {
        return Err(Error::ShapeMismatch(format!(
            "embedding widths differ: s={}, p={}, o={}",
            s, p, o
        )));
    }
    check_complex_width(s)
}

fn check_rows(what: &str, a: (&str, usize), b: (&str, usize)) -> Result<()> {
    if a.1 != b.1 {
        return Err(Error::ShapeMismatch(format!(
            "{} needs equal batch sizes for {} and {}, got {} and {}",
            what, a.0, b.0, a.1, b.1
        )));
    }
    Ok(())
}

/// Validate embedding shapes for `score_emb` under `combine`.
pub(crate) fn check_combine_shapes(
    s: (usize, usize),
    p: (usize, usize),
    o: (usize, usize),
    combine: Combine,
) -> Result<()> {
    check_widths(s.1, p.1, o.1)?;
    let mode = combine.as_str();
    match combine {
        Combine::Spo => {
            check_rows(mode, ("s", s.0), ("p", p.0))?;
            check_rows(mode, ("p", p.0), ("o", o.0))
        }
        Combine::Sp => check_rows(mode, ("s", s.0), ("p", p.0)),
        Combine::Po => check_rows(mode, ("p", p.0), ("o", o.0)),
        Combine::So => check_rows(mode, ("s", s.0), ("o", o.0)),
    }
}

/// Validate shapes for `score_emb_sp_given_negs`.
pub(crate) fn check_sp_given_negs_shapes(
    s: (usize, usize),
    p: (usize, usize),
    o_negs: (usize, usize, usize),
) -> Result<()> {
    check_widths(s.1, p.1, o_negs.2)?;
    check_rows("sp_given_negs", ("s", s.0), ("p", p.0))?;
    check_rows("sp_given_negs", ("p", p.0), ("o_negs", o_negs.0))
}

/// Validate shapes for `score_emb_po_given_negs`.
pub(crate) fn check_po_given_negs_shapes(
    s_negs: (usize, usize, usize),
    p: (usize, usize),
    o: (usize, usize),
) -> Result<()> {
    check_widths(s_negs.2, p.1, o.1)?;
    check_rows("po_given_negs", ("p", p.0), ("o", o.0))?;
    check_rows("po_given_negs", ("p", p.0), ("s_negs", s_negs.0))
}
