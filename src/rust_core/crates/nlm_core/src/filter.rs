//! The NLMeans2x filter instance.
//!
//! Everything that can be wrong with a filter (clip format, argument types,
//! radii) is checked in the constructors. A constructed [`NlMeans2x`] is
//! immutable and can serve any number of frames concurrently.

use ndarray::Array2;
use rayon::prelude::*;

use crate::config::{FilterParams, NlmConfig};
use crate::driver::filter_frame;
use crate::error::NlmResult;
use crate::frame::{Frame, FrameSource, VideoFormat};
use crate::props::{PropertyMap, FILTER_NAME};

#[derive(Debug, Clone)]
pub struct NlMeans2x {
    format: VideoFormat,
    params: FilterParams,
}

impl NlMeans2x {
    /// Build from a clip format and host arguments. The format is checked
    /// before any argument.
    pub fn new(format: &VideoFormat, props: &PropertyMap) -> NlmResult<Self> {
        format.ensure_filterable()?;
        Self::build(format, &NlmConfig::from_props(props)?)
    }

    /// Build from an explicit configuration, for callers that need the
    /// border or weight policies the host signature does not expose.
    pub fn with_config(format: &VideoFormat, config: &NlmConfig) -> NlmResult<Self> {
        format.ensure_filterable()?;
        Self::build(format, config)
    }

    /// Resolve `config` for an already accepted format.
    fn build(format: &VideoFormat, config: &NlmConfig) -> NlmResult<Self> {
        let params = config.resolve()?;
        log::debug!(
            "created {} for {}x{} clip with {} planes",
            FILTER_NAME,
            format.width,
            format.height,
            format.num_planes
        );
        Ok(Self {
            format: *format,
            params,
        })
    }

    /// Filter over the format of `source`.
    pub fn for_source<S: FrameSource + ?Sized>(
        source: &S,
        props: &PropertyMap,
    ) -> NlmResult<Self> {
        Self::new(source.format(), props)
    }

    pub fn format(&self) -> &VideoFormat {
        &self.format
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Filter one frame. Output has the source's plane count and shapes.
    pub fn process(&self, frame: &Frame) -> NlmResult<Frame> {
        frame.ensure_matches(&self.format)?;
        filter_frame(frame, &self.params)
    }

    /// Request frame `n` from `source` and filter it.
    pub fn get_frame<S: FrameSource + ?Sized>(&self, n: usize, source: &S) -> NlmResult<Frame> {
        let frame = source.get_frame(n)?;
        self.process(&frame)
    }

    /// Filter independent frames in parallel, preserving order.
    pub fn process_stack(&self, frames: &[Frame]) -> NlmResult<Vec<Frame>> {
        frames.par_iter().map(|frame| self.process(frame)).collect()
    }

    /// Filter a lone plane. Its shape must match plane 0 of the clip
    /// format; the clip's plane count does not matter.
    pub fn process_plane(&self, plane: Array2<f32>) -> NlmResult<Array2<f32>> {
        let luma = VideoFormat {
            num_planes: 1,
            ..self.format
        };
        let frame = Frame::from_plane(plane);
        frame.ensure_matches(&luma)?;
        let mut planes = filter_frame(&frame, &self.params)?.into_planes();
        Ok(planes.swap_remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NlmError;
    use crate::frame::{SampleType, VecClip};

    #[test]
    fn test_format_checked_before_arguments() {
        let format = VideoFormat {
            sample_type: SampleType::Integer,
            bits_per_sample: 8,
            ..VideoFormat::gray_float32(32, 32)
        };
        let mut props = PropertyMap::new();
        props.set_int("a", -1);

        let err = NlMeans2x::new(&format, &props).unwrap_err();
        assert!(matches!(err, NlmError::Format(_)));
    }

    #[test]
    fn test_format_checked_before_argument_types() {
        let format = VideoFormat::gray_float32(0, 0);
        let mut props = PropertyMap::new();
        props.set_float("a", 2.5).set_int("radius", 3);

        let err = NlMeans2x::new(&format, &props).unwrap_err();
        assert!(matches!(err, NlmError::Format(_)));

        let err = NlMeans2x::new(&VideoFormat::gray_float32(32, 32), &props).unwrap_err();
        assert!(matches!(err, NlmError::Configuration(_)));
    }

    #[test]
    fn test_process_plane_on_multi_plane_clip() {
        let format = VideoFormat::float32(3, 40, 40);
        let filter = NlMeans2x::new(&format, &PropertyMap::new()).unwrap();
        let plane =
            Array2::from_shape_fn((40, 40), |(r, c)| ((r * 7 + c * 3) % 11) as f32 / 11.0);

        let out = filter.process_plane(plane.clone()).unwrap();
        let frame = filter
            .process(&Frame::new(vec![plane.clone(), plane.clone(), plane]))
            .unwrap();
        assert_eq!(out, frame.planes()[0]);

        assert!(matches!(
            filter.process_plane(Array2::zeros((40, 39))),
            Err(NlmError::Format(_))
        ));
    }

    #[test]
    fn test_negative_arguments_rejected() {
        let format = VideoFormat::gray_float32(40, 40);

        let mut props = PropertyMap::new();
        props.set_int("a", -1);
        let err = NlMeans2x::new(&format, &props).unwrap_err();
        assert_eq!(err.to_string(), "NLMeans2x: a must be no less than 0!");

        let mut props = PropertyMap::new();
        props.set_int("s", -2);
        let err = NlMeans2x::new(&format, &props).unwrap_err();
        assert_eq!(err.to_string(), "NLMeans2x: s must be no less than 0!");
    }

    #[test]
    fn test_get_frame_pulls_from_source() {
        let clip = VecClip::from_planes(vec![
            Array2::from_elem((32, 32), 0.1f32),
            Array2::from_elem((32, 32), 0.9f32),
        ])
        .unwrap();
        let filter = NlMeans2x::for_source(&clip, &PropertyMap::new()).unwrap();

        let out = filter.get_frame(1, &clip).unwrap();
        assert!(out.planes()[0].iter().all(|&v| v == 0.9));

        assert_eq!(
            filter.get_frame(5, &clip).unwrap_err(),
            NlmError::FrameUnavailable(5)
        );
    }

    #[test]
    fn test_process_rejects_foreign_frames() {
        let filter =
            NlMeans2x::new(&VideoFormat::gray_float32(32, 32), &PropertyMap::new()).unwrap();
        let frame = Frame::from_plane(Array2::zeros((32, 33)));
        assert!(matches!(
            filter.process(&frame),
            Err(NlmError::Format(_))
        ));
    }

    #[test]
    fn test_process_stack_preserves_order() {
        let format = VideoFormat::gray_float32(30, 30);
        let filter = NlMeans2x::new(&format, &PropertyMap::new()).unwrap();
        let frames: Vec<Frame> = (0..4)
            .map(|i| Frame::filled(&format, i as f32))
            .collect();

        let out = filter.process_stack(&frames).unwrap();
        for (i, frame) in out.iter().enumerate() {
            assert_eq!(frame.planes()[0][[15, 15]], i as f32);
        }
    }
}
