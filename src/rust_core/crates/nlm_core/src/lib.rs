//! NLMeans2x Core Library
//!
//! Pure Rust non-local means filter for single-precision planar frames.
//! Every interior pixel is replaced by a weighted average of its search
//! window, each candidate weighted by how closely its Gaussian-weighted patch
//! matches the target's patch. This crate contains all algorithm logic and
//! the host-facing model (property map, formats, frames) without any
//! language bindings.

pub mod aggregate;
pub mod config;
pub mod driver;
pub mod error;
pub mod filter;
pub mod frame;
pub mod props;
pub mod similarity;
pub mod view;

// Re-export commonly used types at the crate root
pub use aggregate::{estimate_pixel, Candidate, CandidateScratch, PixelEstimate};
pub use config::{BorderMode, FilterParams, NlmConfig, WeightPolicy, H_SCALING_FACTOR};
pub use driver::{filter_frame, filter_plane_into};
pub use error::{NlmError, NlmResult};
pub use filter::NlMeans2x;
pub use frame::{Frame, FrameSource, SampleType, VecClip, VideoFormat};
pub use props::{PropValue, PropertyMap, FILTER_NAME, PARAMETER_SCHEMA};
pub use similarity::patch_similarity;
pub use view::PlaneView;
