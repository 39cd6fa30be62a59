//! Video format, frames, and the frame source the host provides.

use std::sync::Arc;

use ndarray::Array2;

use crate::error::{NlmError, NlmResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    Integer,
    Float,
}

/// Declared format of a clip. A zero width or height means the clip's
/// dimensions vary from frame to frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFormat {
    pub sample_type: SampleType,
    pub bits_per_sample: u32,
    pub num_planes: usize,
    pub width: usize,
    pub height: usize,
    /// log2 horizontal subsampling of planes after the first.
    pub sub_sampling_w: u32,
    /// log2 vertical subsampling of planes after the first.
    pub sub_sampling_h: u32,
}

impl VideoFormat {
    /// Single-precision float, no subsampling.
    pub fn float32(num_planes: usize, width: usize, height: usize) -> Self {
        Self {
            sample_type: SampleType::Float,
            bits_per_sample: 32,
            num_planes,
            width,
            height,
            sub_sampling_w: 0,
            sub_sampling_h: 0,
        }
    }

    pub fn gray_float32(width: usize, height: usize) -> Self {
        Self::float32(1, width, height)
    }

    pub fn is_constant(&self) -> bool {
        self.width > 0 && self.height > 0 && self.num_planes > 0
    }

    /// `(rows, cols)` of plane `plane`.
    pub fn plane_dim(&self, plane: usize) -> (usize, usize) {
        if plane == 0 {
            (self.height, self.width)
        } else {
            (
                self.height >> self.sub_sampling_h,
                self.width >> self.sub_sampling_w,
            )
        }
    }

    /// Accept only constant-dimension 32-bit float clips.
    pub fn ensure_filterable(&self) -> NlmResult<()> {
        if !self.is_constant()
            || self.sample_type != SampleType::Float
            || self.bits_per_sample < 32
        {
            return Err(NlmError::format(
                "input clip must be single precision fp, with constant dimensions.",
            ));
        }
        Ok(())
    }
}

/// One frame: a list of planes, each a row-major `(rows, cols)` grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    planes: Vec<Array2<f32>>,
}

impl Frame {
    pub fn new(planes: Vec<Array2<f32>>) -> Self {
        Self { planes }
    }

    pub fn from_plane(plane: Array2<f32>) -> Self {
        Self::new(vec![plane])
    }

    /// Frame of `format` with every sample set to `value`.
    pub fn filled(format: &VideoFormat, value: f32) -> Self {
        Self::new(
            (0..format.num_planes)
                .map(|p| Array2::from_elem(format.plane_dim(p), value))
                .collect(),
        )
    }

    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    pub fn planes(&self) -> &[Array2<f32>] {
        &self.planes
    }

    pub fn planes_mut(&mut self) -> &mut [Array2<f32>] {
        &mut self.planes
    }

    pub fn into_planes(self) -> Vec<Array2<f32>> {
        self.planes
    }

    /// Check plane count and per-plane dimensions against `format`.
    pub fn ensure_matches(&self, format: &VideoFormat) -> NlmResult<()> {
        if self.planes.len() != format.num_planes {
            return Err(NlmError::format(format!(
                "frame has {} planes, clip declares {}",
                self.planes.len(),
                format.num_planes
            )));
        }
        for (i, plane) in self.planes.iter().enumerate() {
            let expected = format.plane_dim(i);
            if plane.dim() != expected {
                return Err(NlmError::format(format!(
                    "plane {} has shape {:?}, clip declares {:?}",
                    i,
                    plane.dim(),
                    expected
                )));
            }
        }
        Ok(())
    }
}

/// Host side of frame acquisition: hands out source frames by index.
pub trait FrameSource: Sync {
    fn format(&self) -> &VideoFormat;

    fn num_frames(&self) -> usize;

    fn get_frame(&self, n: usize) -> NlmResult<Arc<Frame>>;
}

/// In-memory clip.
#[derive(Debug, Clone)]
pub struct VecClip {
    format: VideoFormat,
    frames: Vec<Arc<Frame>>,
}

impl VecClip {
    /// Build a clip, rejecting frames that do not match `format`.
    pub fn new(format: VideoFormat, frames: Vec<Frame>) -> NlmResult<Self> {
        for frame in &frames {
            frame.ensure_matches(&format)?;
        }
        Ok(Self {
            format,
            frames: frames.into_iter().map(Arc::new).collect(),
        })
    }

    /// Clip of single-plane frames taken from `planes`, which must share
    /// one shape.
    pub fn from_planes(planes: Vec<Array2<f32>>) -> NlmResult<Self> {
        let (rows, cols) = planes.first().map(|p| p.dim()).unwrap_or((0, 0));
        let format = VideoFormat::gray_float32(cols, rows);
        Self::new(format, planes.into_iter().map(Frame::from_plane).collect())
    }
}

impl FrameSource for VecClip {
    fn format(&self) -> &VideoFormat {
        &self.format
    }

    fn num_frames(&self) -> usize {
        self.frames.len()
    }

    fn get_frame(&self, n: usize) -> NlmResult<Arc<Frame>> {
        self.frames
            .get(n)
            .cloned()
            .ok_or(NlmError::FrameUnavailable(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_dims_with_subsampling() {
        let format = VideoFormat {
            sub_sampling_w: 1,
            sub_sampling_h: 1,
            ..VideoFormat::float32(3, 64, 48)
        };
        assert_eq!(format.plane_dim(0), (48, 64));
        assert_eq!(format.plane_dim(1), (24, 32));
        assert_eq!(format.plane_dim(2), (24, 32));
    }

    #[test]
    fn test_ensure_filterable() {
        assert!(VideoFormat::float32(3, 64, 48).ensure_filterable().is_ok());

        let variable = VideoFormat::gray_float32(0, 0);
        assert!(matches!(
            variable.ensure_filterable(),
            Err(NlmError::Format(_))
        ));

        let half = VideoFormat {
            bits_per_sample: 16,
            ..VideoFormat::gray_float32(32, 32)
        };
        assert!(half.ensure_filterable().is_err());

        let integer = VideoFormat {
            sample_type: SampleType::Integer,
            ..VideoFormat::gray_float32(32, 32)
        };
        assert!(integer.ensure_filterable().is_err());
    }

    #[test]
    fn test_frame_matches_format() {
        let format = VideoFormat::float32(2, 8, 6);
        let frame = Frame::filled(&format, 0.5);
        assert_eq!(frame.num_planes(), 2);
        assert!(frame.ensure_matches(&format).is_ok());

        let wrong_shape = Frame::new(vec![Array2::zeros((6, 8)), Array2::zeros((8, 6))]);
        assert!(wrong_shape.ensure_matches(&format).is_err());

        let wrong_count = Frame::from_plane(Array2::zeros((6, 8)));
        assert!(wrong_count.ensure_matches(&format).is_err());
    }

    #[test]
    fn test_vec_clip_serves_frames() {
        let clip = VecClip::from_planes(vec![
            Array2::from_elem((4, 5), 1.0),
            Array2::from_elem((4, 5), 2.0),
        ])
        .unwrap();

        assert_eq!(clip.num_frames(), 2);
        assert_eq!(clip.format().plane_dim(0), (4, 5));
        assert_eq!(clip.get_frame(1).unwrap().planes()[0][[0, 0]], 2.0);
        assert_eq!(
            clip.get_frame(2).unwrap_err(),
            NlmError::FrameUnavailable(2)
        );
    }

    #[test]
    fn test_vec_clip_rejects_mismatched_frames() {
        let result = VecClip::from_planes(vec![Array2::zeros((4, 5)), Array2::zeros((5, 4))]);
        assert!(result.is_err());
    }
}
