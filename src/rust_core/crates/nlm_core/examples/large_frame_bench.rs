use ndarray::Array2;
use nlm_core::{Frame, NlMeans2x, PropertyMap, VideoFormat};
use std::str::FromStr;
use std::time::Instant;

/// Value following `--name`, or `default` when the flag is absent. A
/// malformed value is an error rather than a silent fallback.
fn flag<T: FromStr>(args: &[String], name: &str, default: T) -> Result<T, String> {
    match args.iter().position(|a| a == name) {
        None => Ok(default),
        Some(i) => args
            .get(i + 1)
            .and_then(|v| v.parse::<T>().ok())
            .ok_or_else(|| format!("{} expects a value", name)),
    }
}

fn build_plane(rows: usize, cols: usize, seed: u64) -> Array2<f32> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15 ^ seed;
    Array2::from_shape_fn((rows, cols), |_| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 40) as f32) / ((1u64 << 24) as f32)
    })
}

/// Peak resident set size of this process in MiB. `ru_maxrss` is bytes on
/// macOS and KiB elsewhere.
fn peak_rss_mib() -> Option<f64> {
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    if unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) } != 0 {
        return None;
    }
    let kib = if cfg!(target_os = "macos") {
        usage.ru_maxrss as f64 / 1024.0
    } else {
        usage.ru_maxrss as f64
    };
    Some(kib / 1024.0)
}

fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    let rows = flag(&args, "--rows", 1080usize)?;
    let cols = flag(&args, "--cols", 1920usize)?;
    let planes = flag(&args, "--planes", 3usize)?;
    let a = flag(&args, "--a", 8i64)?;
    let s = flag(&args, "--s", 4i64)?;
    let h = flag(&args, "--h", 1.6f64)?;
    let sdev = flag(&args, "--sdev", 1.0f64)?;

    println!(
        "large frame bench start rows={} cols={} planes={} a={} s={} h={} sdev={} threads={} chunk_env={:?}",
        rows,
        cols,
        planes,
        a,
        s,
        h,
        sdev,
        rayon::current_num_threads(),
        std::env::var("NLM_ROW_CHUNK_LEN").ok()
    );

    let format = VideoFormat::float32(planes, cols, rows);
    let frame = Frame::new((0..planes).map(|p| build_plane(rows, cols, p as u64)).collect());

    let mut props = PropertyMap::new();
    props
        .set_int("a", a)
        .set_int("s", s)
        .set_float("h", h)
        .set_float("sdev", sdev);
    let filter = NlMeans2x::new(&format, &props).map_err(|e| e.to_string())?;
    let windows = (rows * cols * planes) as f64 * filter.params().search_window_size() as f64;

    let rss_before = peak_rss_mib().unwrap_or(0.0);

    let t0 = Instant::now();
    let out = filter.process(&frame).map_err(|e| e.to_string())?;
    let elapsed = t0.elapsed();
    let rss_peak = peak_rss_mib().unwrap_or(0.0);

    // Sampled checksum keeps the filtered output live.
    let checksum: f64 = out
        .planes()
        .iter()
        .flat_map(|p| p.iter().step_by((rows * cols / 4096).max(1)))
        .map(|&v| v as f64)
        .sum();

    println!(
        "large frame bench done elapsed_s={:.3} mcandidates_per_s={:.1} checksum={:.9} rss_before_mib={:.1} rss_peak_mib={:.1}",
        elapsed.as_secs_f64(),
        windows / elapsed.as_secs_f64().max(1e-9) / 1e6,
        checksum,
        rss_before,
        rss_peak
    );
    Ok(())
}
