//! Filter configuration and the resolved, immutable parameter set.

use crate::error::{NlmError, NlmResult};
use crate::props::{filter_params, PropertyMap};

// =============================================================================
// Constants
// =============================================================================

/// Default search-window half-extent.
pub const DEFAULT_SEARCH_RADIUS: i64 = 8;

/// Default comparison-patch half-extent.
pub const DEFAULT_PATCH_RADIUS: i64 = 4;

/// Default filtering strength, in user-facing units.
pub const DEFAULT_STRENGTH: f64 = 1.6;

/// Default spatial standard deviation of the in-patch Gaussian prior.
pub const DEFAULT_SDEV: f64 = 1.0;

/// Maps the user-facing strength onto the exponent scale of the weight
/// function. Kept verbatim for output compatibility.
pub const H_SCALING_FACTOR: f64 = 199.090_201_979_673_709_079_853_639_667_63;

/// Border excluded from processing under [`BorderMode::Fixed`].
pub const FIXED_MARGIN: usize = 12;

/// Largest accepted search radius; bounds the per-worker scratch buffer.
pub const MAX_SEARCH_RADIUS: usize = 16;

/// Largest accepted patch radius.
pub const MAX_PATCH_RADIUS: usize = 16;

// =============================================================================
// Types
// =============================================================================

/// How pixels near the plane edges are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderMode {
    /// Only the interior `[12, dim - 12)` is written. Requires
    /// `a + s <= 12` so no read leaves the plane.
    #[default]
    Fixed,
    /// Every pixel is written; reads past the edge replicate the nearest
    /// edge sample.
    Clamp,
}

/// What to do when a pixel's total similarity weight is zero or not finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightPolicy {
    /// Keep the IEEE result of the division (NaN for 0/0).
    #[default]
    Propagate,
    /// Fail the frame with [`NlmError::DegenerateWeight`].
    Reject,
}

/// User-facing filter configuration, before validation.
///
/// Radii are signed so that negative host input can be reported rather than
/// wrapped. Use [`resolve`](Self::resolve) to obtain [`FilterParams`].
#[derive(Debug, Clone)]
pub struct NlmConfig {
    /// Search-window half-extent. Default: 8
    pub a: i64,
    /// Comparison-patch half-extent. Default: 4
    pub s: i64,
    /// Filtering strength (user scale). Default: 1.6
    pub h: f64,
    /// Spatial standard deviation of the in-patch prior. Default: 1.0
    pub sdev: f64,
    /// Default: [`BorderMode::Fixed`]
    pub border: BorderMode,
    /// Default: [`WeightPolicy::Propagate`]
    pub weight_policy: WeightPolicy,
}

impl Default for NlmConfig {
    fn default() -> Self {
        Self {
            a: DEFAULT_SEARCH_RADIUS,
            s: DEFAULT_PATCH_RADIUS,
            h: DEFAULT_STRENGTH,
            sdev: DEFAULT_SDEV,
            border: BorderMode::default(),
            weight_policy: WeightPolicy::default(),
        }
    }
}

impl NlmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from host arguments, falling back to defaults
    /// for absent keys.
    pub fn from_props(props: &PropertyMap) -> NlmResult<Self> {
        props.validate_against(&filter_params()?)?;

        let mut config = Self::default();
        if let Some(a) = props.get_int("a")? {
            config.a = a;
        }
        if let Some(s) = props.get_int("s")? {
            config.s = s;
        }
        if let Some(h) = props.get_float("h")? {
            config.h = h;
        }
        if let Some(sdev) = props.get_float("sdev")? {
            config.sdev = sdev;
        }
        Ok(config)
    }

    /// Validate the configuration parameters. `h` and `sdev` are not
    /// checked: zero or negative values give degenerate but defined output.
    pub fn validate(&self) -> NlmResult<()> {
        if self.a < 0 {
            return Err(NlmError::config("a must be no less than 0!"));
        }
        if self.a as usize > MAX_SEARCH_RADIUS {
            return Err(NlmError::config(format!(
                "a must be no greater than {}!",
                MAX_SEARCH_RADIUS
            )));
        }
        if self.s < 0 {
            return Err(NlmError::config("s must be no less than 0!"));
        }
        if self.s as usize > MAX_PATCH_RADIUS {
            return Err(NlmError::config(format!(
                "s must be no greater than {}!",
                MAX_PATCH_RADIUS
            )));
        }
        if self.border == BorderMode::Fixed && (self.a + self.s) as usize > FIXED_MARGIN {
            return Err(NlmError::config(format!(
                "a + s must be no greater than {} with the fixed border (a={}, s={})",
                FIXED_MARGIN, self.a, self.s
            )));
        }
        Ok(())
    }

    /// Validate and derive the immutable parameter set.
    pub fn resolve(&self) -> NlmResult<FilterParams> {
        self.validate()?;
        let params = FilterParams::build(
            self.a as usize,
            self.s as usize,
            self.h / H_SCALING_FACTOR,
            self.sdev,
            self.border,
            self.weight_policy,
        );
        log::debug!(
            "resolved NLMeans2x params a={} s={} h={} (scaled {:e}) sdev={} border={:?} weights={:?}",
            params.a,
            params.s,
            self.h,
            params.h,
            params.sdev,
            params.border,
            params.weight_policy
        );
        Ok(params)
    }
}

/// Validated parameters plus derived constants. Immutable once built and
/// shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct FilterParams {
    a: usize,
    s: usize,
    h: f64,
    h_sq: f64,
    sdev: f64,
    border: BorderMode,
    weight_policy: WeightPolicy,
    /// Row-major `(2s+1)²` table of `exp(-(x² + y²) / (2·sdev²))`.
    prior: Vec<f64>,
    prior_norm: f64,
}

impl FilterParams {
    fn build(
        a: usize,
        s: usize,
        h: f64,
        sdev: f64,
        border: BorderMode,
        weight_policy: WeightPolicy,
    ) -> Self {
        let (prior, prior_norm) = gaussian_prior(s, sdev);
        Self {
            a,
            s,
            h,
            h_sq: h * h,
            sdev,
            border,
            weight_policy,
            prior,
            prior_norm,
        }
    }

    /// Search-window half-extent.
    #[inline]
    pub fn a(&self) -> usize {
        self.a
    }

    /// Patch half-extent.
    #[inline]
    pub fn s(&self) -> usize {
        self.s
    }

    /// Strength after division by [`H_SCALING_FACTOR`].
    #[inline]
    pub fn h(&self) -> f64 {
        self.h
    }

    #[inline]
    pub fn h_sq(&self) -> f64 {
        self.h_sq
    }

    #[inline]
    pub fn sdev(&self) -> f64 {
        self.sdev
    }

    #[inline]
    pub fn border(&self) -> BorderMode {
        self.border
    }

    #[inline]
    pub fn weight_policy(&self) -> WeightPolicy {
        self.weight_policy
    }

    /// Candidates per target pixel, `(2a+1)²`.
    #[inline]
    pub fn search_window_size(&self) -> usize {
        (2 * self.a + 1).pow(2)
    }

    #[inline]
    pub fn patch_width(&self) -> usize {
        2 * self.s + 1
    }

    #[inline]
    pub fn prior(&self) -> &[f64] {
        &self.prior
    }

    /// Sum of [`prior`](Self::prior), accumulated in table order.
    #[inline]
    pub fn prior_norm(&self) -> f64 {
        self.prior_norm
    }

    /// Rows/columns excluded at each edge of a plane.
    #[inline]
    pub fn margin(&self) -> usize {
        match self.border {
            BorderMode::Fixed => FIXED_MARGIN,
            BorderMode::Clamp => 0,
        }
    }
}

fn gaussian_prior(s: usize, sdev: f64) -> (Vec<f64>, f64) {
    let s = s as i64;
    let variance = sdev * sdev;
    let width = (2 * s + 1) as usize;
    let mut table = Vec::with_capacity(width * width);
    let mut norm = 0.0;
    for y in -s..=s {
        for x in -s..=s {
            let squared_distance = ((x * x) + (y * y)) as f64;
            let g = (-squared_distance / (2.0 * variance)).exp();
            table.push(g);
            norm += g;
        }
    }
    (table, norm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::PropValue;

    #[test]
    fn test_default_config_values() {
        let config = NlmConfig::default();
        assert_eq!(config.a, 8);
        assert_eq!(config.s, 4);
        assert_eq!(config.h, 1.6);
        assert_eq!(config.sdev, 1.0);
        assert_eq!(config.border, BorderMode::Fixed);
        assert_eq!(config.weight_policy, WeightPolicy::Propagate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_h_is_rescaled() {
        let params = NlmConfig::default().resolve().unwrap();
        assert_eq!(params.h(), 1.6 / H_SCALING_FACTOR);
        assert_eq!(params.h_sq(), params.h() * params.h());
    }

    #[test]
    fn test_negative_radii_rejected() {
        let mut config = NlmConfig::default();
        config.a = -1;
        assert_eq!(
            config.validate().unwrap_err(),
            NlmError::Configuration("a must be no less than 0!".into())
        );

        let mut config = NlmConfig::default();
        config.s = -3;
        assert_eq!(
            config.resolve().unwrap_err(),
            NlmError::Configuration("s must be no less than 0!".into())
        );
    }

    #[test]
    fn test_radius_caps() {
        let mut config = NlmConfig {
            border: BorderMode::Clamp,
            ..NlmConfig::default()
        };
        config.a = MAX_SEARCH_RADIUS as i64;
        config.s = MAX_PATCH_RADIUS as i64;
        assert!(config.validate().is_ok());

        config.a += 1;
        assert!(config.validate().is_err());

        config.a = 0;
        config.s = MAX_PATCH_RADIUS as i64 + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fixed_border_limits_reach() {
        let mut config = NlmConfig::default();
        config.a = 8;
        config.s = 4;
        assert!(config.validate().is_ok());

        config.s = 5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("a + s"));

        config.border = BorderMode::Clamp;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_degenerate_strength_accepted() {
        let config = NlmConfig {
            h: 0.0,
            sdev: -2.0,
            ..NlmConfig::default()
        };
        assert!(config.resolve().is_ok());
    }

    #[test]
    fn test_from_props_defaults_and_overrides() {
        let config = NlmConfig::from_props(&PropertyMap::new()).unwrap();
        assert_eq!((config.a, config.s), (8, 4));
        assert_eq!((config.h, config.sdev), (1.6, 1.0));

        let props: PropertyMap = [
            ("a", PropValue::Int(2)),
            ("s", PropValue::Int(1)),
            ("h", PropValue::Float(3.2)),
            ("sdev", PropValue::Int(2)),
        ]
        .into_iter()
        .collect();
        let config = NlmConfig::from_props(&props).unwrap();
        assert_eq!((config.a, config.s), (2, 1));
        assert_eq!((config.h, config.sdev), (3.2, 2.0));
    }

    #[test]
    fn test_from_props_rejects_bad_types() {
        let props: PropertyMap = [("a", PropValue::Float(2.0))].into_iter().collect();
        assert!(NlmConfig::from_props(&props).is_err());
    }

    #[test]
    fn test_prior_table_shape_and_center() {
        let params = NlmConfig::default().resolve().unwrap();
        let width = params.patch_width();
        assert_eq!(width, 9);
        assert_eq!(params.prior().len(), 81);

        // Center sample has zero distance.
        assert_eq!(params.prior()[40], 1.0);
        // Symmetric around the center.
        assert_eq!(params.prior()[0], params.prior()[80]);
        assert_eq!(params.prior()[4], params.prior()[36]);

        let sum: f64 = params.prior().iter().sum();
        assert!((sum - params.prior_norm()).abs() < 1e-12);
    }

    #[test]
    fn test_prior_flattens_with_larger_sdev() {
        let narrow = NlmConfig::default().resolve().unwrap();
        let wide = NlmConfig {
            sdev: 2.0,
            ..NlmConfig::default()
        }
        .resolve()
        .unwrap();

        // Corner sample relative to center grows as sdev grows.
        assert!(wide.prior()[0] > narrow.prior()[0]);
        assert_eq!(wide.prior()[40], 1.0);
    }

    #[test]
    fn test_search_window_size() {
        let params = NlmConfig::default().resolve().unwrap();
        assert_eq!(params.search_window_size(), 289);
        assert_eq!(params.margin(), FIXED_MARGIN);

        let params = NlmConfig {
            a: 0,
            s: 0,
            border: BorderMode::Clamp,
            ..NlmConfig::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(params.search_window_size(), 1);
        assert_eq!(params.margin(), 0);
    }
}
