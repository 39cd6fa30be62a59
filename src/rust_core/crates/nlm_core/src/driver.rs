//! Plane and frame driver.
//!
//! Walks the writable region of each plane and stores the aggregated value
//! of every pixel in it. Under [`BorderMode::Fixed`](crate::config::BorderMode)
//! that region is the interior `[12, rows - 12) × [12, cols - 12)`;
//! everything outside it is left as the destination already held it.
//!
//! Rows are independent (read-only source, disjoint destination rows) and
//! are spread over the rayon pool, one candidate scratch buffer per worker.
//! Planes of a frame are processed in parallel as well.

use std::time::Instant;

use ndarray::{s, ArrayView2, ArrayViewMut2, Axis};
use rayon::prelude::*;

use crate::aggregate::{estimate_pixel, CandidateScratch};
use crate::config::{FilterParams, WeightPolicy};
use crate::error::{NlmError, NlmResult};
use crate::frame::Frame;
use crate::view::PlaneView;

/// Minimum rows handed to one rayon task.
const ROW_CHUNK_LEN: usize = 4;
const ROW_CHUNK_LEN_ENV: &str = "NLM_ROW_CHUNK_LEN";
const PROFILE_TIMING_ENV: &str = "NLM_PROFILE_TIMING";

fn resolve_row_chunk_len() -> usize {
    std::env::var(ROW_CHUNK_LEN_ENV)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(ROW_CHUNK_LEN)
}

fn resolve_profile_timing() -> bool {
    std::env::var(PROFILE_TIMING_ENV)
        .ok()
        .map(|value| {
            let v = value.trim();
            v == "1"
                || v.eq_ignore_ascii_case("true")
                || v.eq_ignore_ascii_case("yes")
                || v.eq_ignore_ascii_case("on")
        })
        .unwrap_or(false)
}

/// Row and column ranges the driver writes for a `(rows, cols)` plane.
/// Empty when the plane is too small to have an interior.
pub fn writable_region(
    dim: (usize, usize),
    params: &FilterParams,
) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
    let (rows, cols) = dim;
    let margin = params.margin();
    let row_end = rows.saturating_sub(margin).max(margin);
    let col_end = cols.saturating_sub(margin).max(margin);
    (margin..row_end, margin..col_end)
}

/// Filter `source` into `dest` (same shape), writing only the writable
/// region. `plane` is reported in degenerate-weight errors.
pub fn filter_plane_into(
    source: ArrayView2<'_, f32>,
    mut dest: ArrayViewMut2<'_, f32>,
    params: &FilterParams,
    plane: usize,
) -> NlmResult<()> {
    if source.dim() != dest.dim() {
        return Err(NlmError::format(format!(
            "destination plane {} has shape {:?}, source has {:?}",
            plane,
            dest.dim(),
            source.dim()
        )));
    }

    let (row_range, col_range) = writable_region(source.dim(), params);
    if row_range.is_empty() || col_range.is_empty() {
        return Ok(());
    }

    let first_row = row_range.start;
    let reject_degenerate = params.weight_policy() == WeightPolicy::Reject;

    dest.slice_mut(s![row_range, ..])
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .with_min_len(resolve_row_chunk_len())
        .try_for_each_init(
            || CandidateScratch::for_params(params),
            |scratch, (i, mut out_row)| {
                let row = first_row + i;
                for col in col_range.clone() {
                    let target = PlaneView::new(source, row, col);
                    let estimate = estimate_pixel(&target, params, scratch);
                    if reject_degenerate && !estimate.is_well_defined() {
                        return Err(NlmError::DegenerateWeight { plane, row, col });
                    }
                    out_row[col] = estimate.value as f32;
                }
                Ok(())
            },
        )
}

/// Filter every plane of `source` into a new frame of the same layout.
///
/// The destination starts as a copy of the source, so samples outside the
/// writable region keep their source values.
pub fn filter_frame(source: &Frame, params: &FilterParams) -> NlmResult<Frame> {
    let started = resolve_profile_timing().then(Instant::now);
    let mut dest = source.clone();

    dest.planes_mut()
        .par_iter_mut()
        .zip(source.planes().par_iter())
        .enumerate()
        .try_for_each(|(plane, (out, src))| {
            filter_plane_into(src.view(), out.view_mut(), params, plane)
        })?;

    if let Some(started) = started {
        let dims: Vec<(usize, usize)> = source.planes().iter().map(|p| p.dim()).collect();
        log::debug!(
            "nlm_profile planes={} dims={:?} a={} s={} sdev={} wall_ms={:.3}",
            source.num_planes(),
            dims,
            params.a(),
            params.s(),
            params.sdev(),
            started.elapsed().as_secs_f64() * 1_000.0
        );
    }

    Ok(dest)
}
