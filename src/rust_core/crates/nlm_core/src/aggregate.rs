//! Per-pixel weighted averaging over the search window.

use crate::config::{BorderMode, FilterParams, MAX_SEARCH_RADIUS};
use crate::similarity::patch_similarity;
use crate::view::PlaneView;

/// One search-window member: its sample and its similarity weight.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Candidate {
    pub value: f64,
    pub weight: f64,
}

/// Result of aggregating one target pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelEstimate {
    pub value: f64,
    pub weight_sum: f64,
}

impl PixelEstimate {
    /// False when the weight sum is zero, negative, or not finite.
    #[inline]
    pub fn is_well_defined(&self) -> bool {
        self.weight_sum.is_finite() && self.weight_sum > 0.0
    }
}

/// Reusable candidate storage, owned by one worker at a time and refilled
/// for every target pixel.
#[derive(Debug, Clone)]
pub struct CandidateScratch {
    packs: Vec<Candidate>,
}

impl Default for CandidateScratch {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateScratch {
    /// Scratch large enough for the largest accepted search window.
    pub fn new() -> Self {
        Self {
            packs: Vec::with_capacity((2 * MAX_SEARCH_RADIUS + 1).pow(2)),
        }
    }

    /// Scratch sized for one parameter set.
    pub fn for_params(params: &FilterParams) -> Self {
        Self {
            packs: Vec::with_capacity(params.search_window_size()),
        }
    }

    /// Fill with one candidate per search-window offset, y outer, x inner.
    /// The target's own patch is the reference for every comparison.
    pub fn collect(&mut self, target: &PlaneView<'_>, params: &FilterParams) -> &[Candidate] {
        let a = params.a() as isize;
        self.packs.clear();

        for y in -a..=a {
            for x in -a..=a {
                let candidate = target.recenter(y, x);
                let value = match params.border() {
                    BorderMode::Fixed => target.at(y, x),
                    BorderMode::Clamp => target.clamped_at(y, x),
                };
                self.packs.push(Candidate {
                    value: value as f64,
                    weight: patch_similarity(&candidate, target, params),
                });
            }
        }

        &self.packs
    }
}

/// Weighted mean of the candidates.
///
/// An all-zero weight set yields `0 / 0`; the NaN is returned as is so the
/// caller decides how to treat it.
pub fn aggregate(candidates: &[Candidate]) -> PixelEstimate {
    let weight_sum: f64 = candidates.iter().map(|c| c.weight).sum();
    let weighted: f64 = candidates.iter().map(|c| c.value * c.weight).sum();
    PixelEstimate {
        value: weighted / weight_sum,
        weight_sum,
    }
}

/// Estimate the refined value of the pixel `target` is anchored at.
#[inline]
pub fn estimate_pixel(
    target: &PlaneView<'_>,
    params: &FilterParams,
    scratch: &mut CandidateScratch,
) -> PixelEstimate {
    aggregate(scratch.collect(target, params))
}
