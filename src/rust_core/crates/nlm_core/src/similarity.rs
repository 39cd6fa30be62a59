//! Gaussian-weighted patch similarity.
//!
//! Compares the `(2s+1)×(2s+1)` patch around a candidate with the patch
//! around the reference pixel. Each squared difference is weighted by the
//! in-patch Gaussian prior held in [`FilterParams`], the weighted mean is
//! taken, and the result is mapped through `exp(-mean / h²)`:
//!
//! - identical patches give exactly `1`;
//! - the weight never increases as the patches drift apart;
//! - `sdev` shapes the prior inside the patch only, never the candidate's
//!   position in the search window.

use crate::config::{BorderMode, FilterParams};
use crate::view::PlaneView;

/// Gaussian-weighted mean squared difference between the two patches.
#[inline]
pub fn patch_distance<'a>(
    candidate: &PlaneView<'a>,
    reference: &PlaneView<'a>,
    params: &FilterParams,
) -> f64 {
    match params.border() {
        BorderMode::Fixed => {
            weighted_mean_sse(candidate, reference, params, |v, dy, dx| v.at(dy, dx))
        }
        BorderMode::Clamp => {
            weighted_mean_sse(candidate, reference, params, |v, dy, dx| v.clamped_at(dy, dx))
        }
    }
}

/// Map a patch distance onto a similarity weight in `(0, 1]`.
#[inline(always)]
pub fn distance_to_weight(distance: f64, params: &FilterParams) -> f64 {
    (-distance / params.h_sq()).exp()
}

/// Similarity weight of `candidate`'s patch against `reference`'s patch.
#[inline]
pub fn patch_similarity<'a>(
    candidate: &PlaneView<'a>,
    reference: &PlaneView<'a>,
    params: &FilterParams,
) -> f64 {
    distance_to_weight(patch_distance(candidate, reference, params), params)
}

#[inline(always)]
fn weighted_mean_sse<'a, S>(
    candidate: &PlaneView<'a>,
    reference: &PlaneView<'a>,
    params: &FilterParams,
    sample: S,
) -> f64
where
    S: Fn(&PlaneView<'a>, isize, isize) -> f32,
{
    let s = params.s() as isize;
    let mut weighted_sse = 0.0f64;

    for (prior_row, y) in params.prior().chunks_exact(params.patch_width()).zip(-s..=s) {
        for (&g, x) in prior_row.iter().zip(-s..=s) {
            let diff = (sample(candidate, y, x) - sample(reference, y, x)) as f64;
            weighted_sse += g * (diff * diff);
        }
    }

    weighted_sse / params.prior_norm()
}
