//! Property-based tests for the ComplEx scorer.
//!
//! # Mathematical Properties
//!
//! ComplEx scores a triple as
//!
//! Score = Re(<s, p, conj(o)>)
//!       = <s_re,p_re,o_re> + <s_re,p_im,o_im> + <s_im,p_re,o_im> - <s_im,p_im,o_re>
//!
//! Key properties:
//! - The batched Hadamard form equals the four-term sum for every row
//! - All combination modes agree on the same triple
//! - Private-negative scoring agrees with row-aligned scoring
//! - The closed-form overrides agree with the generic brute-force fallback
//! - The score is linear in every single component

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use kgbench_kge::{brute_force_score_emb, Combine, ComplExScorer, RelationalScorer, Result};
use ndarray::{Array1, Array2, Array3, ArrayView2, Axis};
use proptest::collection::vec;
use proptest::prelude::*;

/// Direct four-term sum for one triple.
fn four_term(s: &[f32], p: &[f32], o: &[f32]) -> f32 {
    let d = s.len() / 2;
    let mut score = 0.0;
    for i in 0..d {
        let (s_re, s_im) = (s[i], s[d + i]);
        let (p_re, p_im) = (p[i], p[d + i]);
        let (o_re, o_im) = (o[i], o[d + i]);
        score += s_re * p_re * o_re + s_re * p_im * o_im + s_im * p_re * o_im - s_im * p_im * o_re;
    }
    score
}

/// Scorer that only knows the four-term sum, so every other operation runs
/// through the trait's brute-force defaults.
struct FourTermScorer;

impl RelationalScorer for FourTermScorer {
    fn score_emb_spo(
        &self,
        s_emb: ArrayView2<'_, f32>,
        p_emb: ArrayView2<'_, f32>,
        o_emb: ArrayView2<'_, f32>,
    ) -> Result<Array1<f32>> {
        Ok(Array1::from_iter((0..s_emb.nrows()).map(|i| {
            four_term(
                &s_emb.row(i).to_vec(),
                &p_emb.row(i).to_vec(),
                &o_emb.row(i).to_vec(),
            )
        })))
    }
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-4 * a.abs().max(b.abs()).max(1.0)
}

fn arrays_close(a: &Array2<f32>, b: &Array2<f32>) -> bool {
    a.dim() == b.dim() && a.iter().zip(b.iter()).all(|(x, y)| close(*x, *y))
}

/// `[rows, 2d]` embeddings with entries in [-2, 2].
fn arb_embeddings(rows: usize, d: usize) -> impl Strategy<Value = Array2<f32>> {
    vec(-2.0f32..2.0, rows * 2 * d)
        .prop_map(move |v| Array2::from_shape_vec((rows, 2 * d), v).unwrap())
}

/// Row-aligned batch: (s, p, o) each `[n, 2d]`.
fn arb_batch() -> impl Strategy<Value = (Array2<f32>, Array2<f32>, Array2<f32>)> {
    (1usize..6, 1usize..6)
        .prop_flat_map(|(n, d)| (arb_embeddings(n, d), arb_embeddings(n, d), arb_embeddings(n, d)))
}

/// Row-aligned batch plus a candidate batch of a different size.
fn arb_batch_with_candidates(
) -> impl Strategy<Value = (Array2<f32>, Array2<f32>, Array2<f32>, Array2<f32>)> {
    (1usize..5, 1usize..7, 1usize..5).prop_flat_map(|(n, m, d)| {
        (
            arb_embeddings(n, d),
            arb_embeddings(n, d),
            arb_embeddings(n, d),
            arb_embeddings(m, d),
        )
    })
}

/// `[n, negs, 2d]` negatives for a batch of `n`.
fn arb_negatives(n: usize, negs: usize, d: usize) -> impl Strategy<Value = Array3<f32>> {
    vec(-2.0f32..2.0, n * negs * 2 * d)
        .prop_map(move |v| Array3::from_shape_vec((n, negs, 2 * d), v).unwrap())
}

fn arb_batch_with_negatives(
) -> impl Strategy<Value = (Array2<f32>, Array2<f32>, Array2<f32>, Array3<f32>)> {
    (1usize..5, 1usize..6, 1usize..5).prop_flat_map(|(n, negs, d)| {
        (
            arb_embeddings(n, d),
            arb_embeddings(n, d),
            arb_embeddings(n, d),
            arb_negatives(n, negs, d),
        )
    })
}

mod identity_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn spo_equals_four_term_sum((s, p, o) in arb_batch()) {
            let out = ComplExScorer.score_emb(s.view(), p.view(), o.view(), Combine::Spo).unwrap();
            prop_assert_eq!(out.dim(), (s.nrows(), 1));

            for i in 0..s.nrows() {
                let expected = four_term(&s.row(i).to_vec(), &p.row(i).to_vec(), &o.row(i).to_vec());
                prop_assert!(close(out[[i, 0]], expected), "row {}: {} vs {}", i, out[[i, 0]], expected);
            }
        }

        #[test]
        fn single_triple_agrees_across_modes((s, p, o) in arb_batch()) {
            let s = s.slice(ndarray::s![0..1, ..]);
            let p = p.slice(ndarray::s![0..1, ..]);
            let o = o.slice(ndarray::s![0..1, ..]);

            let spo = ComplExScorer.score_emb(s, p, o, Combine::Spo).unwrap()[[0, 0]];
            for mode in [Combine::Sp, Combine::Po, Combine::So] {
                let out = ComplExScorer.score_emb(s, p, o, mode).unwrap();
                prop_assert_eq!(out.dim(), (1, 1));
                prop_assert!(close(out[[0, 0]], spo), "{}: {} vs {}", mode, out[[0, 0]], spo);
            }
        }

        #[test]
        fn cross_product_diagonal_is_spo((s, p, o) in arb_batch()) {
            let spo = ComplExScorer.score_emb(s.view(), p.view(), o.view(), Combine::Spo).unwrap();
            let sp = ComplExScorer.score_emb(s.view(), p.view(), o.view(), Combine::Sp).unwrap();
            let po = ComplExScorer.score_emb(s.view(), p.view(), o.view(), Combine::Po).unwrap();
            let so = ComplExScorer.score_emb(s.view(), p.view(), o.view(), Combine::So).unwrap();

            let n = s.nrows();
            prop_assert_eq!(sp.dim(), (n, n));
            for i in 0..n {
                prop_assert!(close(sp[[i, i]], spo[[i, 0]]));
                prop_assert!(close(po[[i, i]], spo[[i, 0]]));
                prop_assert!(close(so[[i, i]], spo[[i, 0]]));
            }
        }

        #[test]
        fn given_negs_with_true_entity_equal_spo((s, p, o) in arb_batch()) {
            let spo = ComplExScorer.score_emb(s.view(), p.view(), o.view(), Combine::Spo).unwrap();

            let o_negs = o.clone().insert_axis(Axis(1));
            let sp = ComplExScorer.score_emb_sp_given_negs(s.view(), p.view(), o_negs.view()).unwrap();
            prop_assert_eq!(sp.dim(), (s.nrows(), 1));

            let s_negs = s.clone().insert_axis(Axis(1));
            let po = ComplExScorer.score_emb_po_given_negs(s_negs.view(), p.view(), o.view()).unwrap();
            prop_assert_eq!(po.dim(), (s.nrows(), 1));

            for i in 0..s.nrows() {
                prop_assert!(close(sp[[i, 0]], spo[[i, 0]]));
                prop_assert!(close(po[[i, 0]], spo[[i, 0]]));
            }
        }
    }
}

mod fallback_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn closed_form_matches_fallback((s, p, o, c) in arb_batch_with_candidates()) {
            let cases = [
                (Combine::Spo, s.view(), p.view(), o.view()),
                (Combine::Sp, s.view(), p.view(), c.view()),
                (Combine::Po, c.view(), p.view(), o.view()),
                (Combine::So, s.view(), c.view(), o.view()),
            ];
            for (mode, s_emb, p_emb, o_emb) in cases {
                let fast = ComplExScorer.score_emb(s_emb, p_emb, o_emb, mode).unwrap();
                let slow = FourTermScorer.score_emb(s_emb, p_emb, o_emb, mode).unwrap();
                prop_assert!(arrays_close(&fast, &slow), "{}: {:?} vs {:?}", mode, fast, slow);

                // The public hook is the same fallback the trait default uses.
                let hook = brute_force_score_emb(&ComplExScorer, s_emb, p_emb, o_emb, mode).unwrap();
                prop_assert!(arrays_close(&fast, &hook), "{}: {:?} vs {:?}", mode, fast, hook);
            }
        }

        #[test]
        fn so_rows_follow_subject((s, _p, o, c) in arb_batch_with_candidates()) {
            let out = ComplExScorer.score_emb(s.view(), c.view(), o.view(), Combine::So).unwrap();
            prop_assert_eq!(out.dim(), (s.nrows(), c.nrows()));
        }

        #[test]
        fn given_negs_match_fallback((s, p, o, negs) in arb_batch_with_negatives()) {
            let fast = ComplExScorer.score_emb_sp_given_negs(s.view(), p.view(), negs.view()).unwrap();
            let slow = FourTermScorer.score_emb_sp_given_negs(s.view(), p.view(), negs.view()).unwrap();
            prop_assert_eq!(fast.dim(), (s.nrows(), negs.len_of(Axis(1))));
            prop_assert!(arrays_close(&fast, &slow));

            let fast = ComplExScorer.score_emb_po_given_negs(negs.view(), p.view(), o.view()).unwrap();
            let slow = FourTermScorer.score_emb_po_given_negs(negs.view(), p.view(), o.view()).unwrap();
            prop_assert!(arrays_close(&fast, &slow));
        }
    }
}

mod sensitivity {
    use super::*;
    use ndarray::array;

    /// Every component of every side has a non-zero partial derivative for
    /// these embeddings, so any single perturbation moves the score.
    #[test]
    fn single_component_perturbation_changes_score() {
        let s = array![[1.0, 2.0, 3.0, -1.0]];
        let p = array![[2.0, -1.0, 1.0, 3.0]];
        let o = array![[1.0, 1.0, 2.0, 3.0]];

        let base = ComplExScorer
            .score_emb(s.view(), p.view(), o.view(), Combine::Spo)
            .unwrap()[[0, 0]];

        for side in 0..3 {
            for j in 0..4 {
                let (mut s2, mut p2, mut o2) = (s.clone(), p.clone(), o.clone());
                let target = match side {
                    0 => &mut s2,
                    1 => &mut p2,
                    _ => &mut o2,
                };
                target[[0, j]] += 0.5;

                let moved = ComplExScorer
                    .score_emb(s2.view(), p2.view(), o2.view(), Combine::Spo)
                    .unwrap()[[0, 0]];
                assert!(
                    (moved - base).abs() > 1e-3,
                    "side {} component {} did not change the score",
                    side,
                    j
                );
            }
        }
    }
}
