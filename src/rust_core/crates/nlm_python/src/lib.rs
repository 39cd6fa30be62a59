//! PyO3 Python bindings for the NLMeans2x filter.
//!
//! This crate provides thin Python bindings for the nlm_core library.
//! All algorithm logic is in nlm_core; this crate only handles
//! Python/NumPy type conversions and argument plumbing.

use ndarray::{Array2, Axis};
use numpy::{PyArray2, PyArray3, PyReadonlyArray2, PyReadonlyArray3, ToPyArray};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use nlm_core::{Frame, NlMeans2x, NlmError, PropertyMap, VideoFormat, FILTER_NAME, PARAMETER_SCHEMA};

fn to_py_err(err: NlmError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Collect the optional keyword arguments into host properties. Absent
/// arguments are left out so the filter applies its defaults.
fn build_props(a: Option<i64>, s: Option<i64>, h: Option<f64>, sdev: Option<f64>) -> PropertyMap {
    let mut props = PropertyMap::new();
    if let Some(a) = a {
        props.set_int("a", a);
    }
    if let Some(s) = s {
        props.set_int("s", s);
    }
    if let Some(h) = h {
        props.set_float("h", h);
    }
    if let Some(sdev) = sdev {
        props.set_float("sdev", sdev);
    }
    props
}

fn stack_planes(planes: &[Array2<f32>]) -> PyResult<ndarray::Array3<f32>> {
    let views: Vec<_> = planes.iter().map(|p| p.view()).collect();
    ndarray::stack(Axis(0), &views).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Filter a single 2D float32 plane.
#[pyfunction]
#[pyo3(signature = (plane, a=None, s=None, h=None, sdev=None))]
pub fn nlmeans2x<'py>(
    py: Python<'py>,
    plane: PyReadonlyArray2<f32>,
    a: Option<i64>,
    s: Option<i64>,
    h: Option<f64>,
    sdev: Option<f64>,
) -> PyResult<&'py PyArray2<f32>> {
    let plane = plane.as_array().to_owned();
    let (rows, cols) = plane.dim();
    let filter = NlMeans2x::new(
        &VideoFormat::gray_float32(cols, rows),
        &build_props(a, s, h, sdev),
    )
    .map_err(to_py_err)?;

    let output = filter.process_plane(plane).map_err(to_py_err)?;
    Ok(output.to_pyarray(py))
}

/// Filter a [planes, rows, cols] array as the planes of one frame.
#[pyfunction]
#[pyo3(signature = (planes, a=None, s=None, h=None, sdev=None))]
pub fn nlmeans2x_planes<'py>(
    py: Python<'py>,
    planes: PyReadonlyArray3<f32>,
    a: Option<i64>,
    s: Option<i64>,
    h: Option<f64>,
    sdev: Option<f64>,
) -> PyResult<&'py PyArray3<f32>> {
    let planes = planes.as_array();
    let (num_planes, rows, cols) = planes.dim();
    let filter = NlMeans2x::new(
        &VideoFormat::float32(num_planes, cols, rows),
        &build_props(a, s, h, sdev),
    )
    .map_err(to_py_err)?;

    let frame = Frame::new(planes.outer_iter().map(|p| p.to_owned()).collect());
    let output = filter.process(&frame).map_err(to_py_err)?;
    Ok(stack_planes(output.planes())?.to_pyarray(py))
}

/// Filter a [frames, rows, cols] stack of independent grayscale frames.
#[pyfunction]
#[pyo3(signature = (stack, a=None, s=None, h=None, sdev=None))]
pub fn nlmeans2x_stack<'py>(
    py: Python<'py>,
    stack: PyReadonlyArray3<f32>,
    a: Option<i64>,
    s: Option<i64>,
    h: Option<f64>,
    sdev: Option<f64>,
) -> PyResult<&'py PyArray3<f32>> {
    let stack = stack.as_array();
    let (_, rows, cols) = stack.dim();
    let filter = NlMeans2x::new(
        &VideoFormat::gray_float32(cols, rows),
        &build_props(a, s, h, sdev),
    )
    .map_err(to_py_err)?;

    let frames: Vec<Frame> = stack
        .outer_iter()
        .map(|p| Frame::from_plane(p.to_owned()))
        .collect();
    let outputs = filter.process_stack(&frames).map_err(to_py_err)?;

    let planes: Vec<Array2<f32>> = outputs
        .into_iter()
        .flat_map(|frame| frame.into_planes())
        .collect();
    if planes.is_empty() {
        return Ok(ndarray::Array3::<f32>::zeros((0, rows, cols)).to_pyarray(py));
    }
    Ok(stack_planes(&planes)?.to_pyarray(py))
}

/// Filter name and parameter schema as registered with a host.
#[pyfunction]
pub fn signature() -> (&'static str, &'static str) {
    (FILTER_NAME, PARAMETER_SCHEMA)
}

#[pymodule]
fn nlm2x_rust(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(nlmeans2x, m)?)?;
    m.add_function(wrap_pyfunction!(nlmeans2x_planes, m)?)?;
    m.add_function(wrap_pyfunction!(nlmeans2x_stack, m)?)?;
    m.add_function(wrap_pyfunction!(signature, m)?)?;
    Ok(())
}
