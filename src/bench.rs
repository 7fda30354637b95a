// SPDX-License-Identifier: GPL-3.0-only

//! Preview performance benchmark
//!
//! Runs the regular preview several times. After a warm-up period each run
//! counts the buffers reaching the sink for a fixed duration and samples the
//! process's CPU time and resident memory. Results are written as JSON.

use crate::backends::camera::{BackendError, BackendResult, CameraBackendType};
use crate::config::PreviewConfig;
use crate::constants::{app_info, bench};
use crate::errors::{AppError, AppResult, ConfigError};
use crate::preview::{PreviewExit, PreviewSession};
use crate::shutdown::ShutdownSignal;
use chrono::{DateTime, Utc};
use gstreamer::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Benchmark options from the command line
#[derive(Debug, Clone)]
pub struct BenchOptions {
    pub runs: u32,
    pub warmup: Duration,
    pub duration: Duration,
    pub output: Option<PathBuf>,
}

/// Metrics of one measured run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    pub run_id: u32,
    pub elapsed_s: f64,
    pub frames_rendered: u64,
    pub fps_display: f64,
    pub cpu_pct_1core: f64,
    pub mem_rss_mb: f64,
}

/// Configuration echoed into the report
#[derive(Debug, Clone, Serialize)]
pub struct BenchConfig {
    #[serde(flatten)]
    pub preview: PreviewConfig,
    pub backend: CameraBackendType,
    pub runs: u32,
    pub warmup_s: u64,
    pub duration_s: u64,
}

/// Aggregate display FPS statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FpsSummary {
    pub fps_mean: f64,
    pub fps_median: f64,
    pub fps_stddev: f64,
    pub fps_p95: f64,
    pub fps_p99: f64,
}

/// Full benchmark report
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub timestamp: String,
    pub version: String,
    pub config: BenchConfig,
    #[serde(flatten)]
    pub summary: FpsSummary,
    pub runs: Vec<RunMetrics>,
}

/// Compute summary statistics. `None` for an empty sample.
///
/// Percentiles pick `sorted[floor(n * q)]`; the standard deviation is the
/// sample deviation and 0 for a single run.
pub fn summarize(fps: &[f64]) -> Option<FpsSummary> {
    if fps.is_empty() {
        return None;
    }

    let n = fps.len();
    let mut sorted = fps.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };
    let stddev = if n > 1 {
        let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };
    let percentile = |q: f64| sorted[((n as f64 * q) as usize).min(n - 1)];

    Some(FpsSummary {
        fps_mean: round_to(mean, 2),
        fps_median: round_to(median, 2),
        fps_stddev: round_to(stddev, 2),
        fps_p95: round_to(percentile(0.95), 2),
        fps_p99: round_to(percentile(0.99), 2),
    })
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Default report file name, e.g. `benchmark-20261016T0930.json`
pub fn default_output_path(now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("benchmark-{}.json", now.format("%Y%m%dT%H%M")))
}

/// Write the report as pretty-printed JSON
pub fn write_report(report: &BenchReport, path: &Path) -> AppResult<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| AppError::Other(format!("Failed to serialize report: {}", e)))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// CPU time and resident memory of this process
#[derive(Debug, Clone, Copy)]
struct ResourceSample {
    cpu: Duration,
    rss_bytes: u64,
}

fn sample_resources() -> std::io::Result<ResourceSample> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: getrusage fills the struct it is given; zeroed is a valid rusage.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    // SAFETY: initialized above (zeroed and then written by the kernel)
    let usage = unsafe { usage.assume_init() };

    let timeval = |tv: libc::timeval| {
        Duration::from_secs(tv.tv_sec as u64) + Duration::from_micros(tv.tv_usec as u64)
    };
    let cpu = timeval(usage.ru_utime) + timeval(usage.ru_stime);

    // Current RSS (statm field 2, in pages); ru_maxrss would only give the peak
    let statm = std::fs::read_to_string("/proc/self/statm")?;
    let pages = statm
        .split_whitespace()
        .nth(1)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    // SAFETY: sysconf has no preconditions
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) }.max(0) as u64;

    Ok(ResourceSample {
        cpu,
        rss_bytes: pages * page_size,
    })
}

/// `start + period`, rejecting periods the clock cannot represent
fn deadline_after(start: Instant, field: &'static str, period: Duration) -> AppResult<Instant> {
    start.checked_add(period).ok_or_else(|| {
        AppError::Config(ConfigError::OutOfRange {
            field,
            value: i64::try_from(period.as_secs()).unwrap_or(i64::MAX),
            max: bench::MAX_SECS as i64,
        })
    })
}

/// Warm up, then measure one run. `None` when interrupted by a signal.
pub fn run_once(
    backend: CameraBackendType,
    config: &PreviewConfig,
    options: &BenchOptions,
    shutdown: &ShutdownSignal,
    run_id: u32,
) -> AppResult<Option<RunMetrics>> {
    let session = PreviewSession::start(backend, config)?;

    let measuring = Arc::new(AtomicBool::new(false));
    let frames = Arc::new(AtomicU64::new(0));
    attach_frame_counter(&session, &measuring, &frames)?;

    let warmup_end = deadline_after(Instant::now(), "warmup", options.warmup)?;
    if session.run_until(shutdown, Some(warmup_end))? != PreviewExit::DeadlineReached {
        return Ok(None);
    }

    let before = sample_resources()?;
    let started = Instant::now();
    measuring.store(true, Ordering::SeqCst);

    let measure_end = deadline_after(started, "duration", options.duration)?;
    if session.run_until(shutdown, Some(measure_end))? != PreviewExit::DeadlineReached {
        return Ok(None);
    }

    measuring.store(false, Ordering::SeqCst);
    let elapsed = started.elapsed().as_secs_f64();
    let after = sample_resources()?;
    drop(session);

    let counted = frames.load(Ordering::SeqCst);
    let cpu = after.cpu.saturating_sub(before.cpu).as_secs_f64();

    Ok(Some(RunMetrics {
        run_id,
        elapsed_s: round_to(elapsed, 3),
        frames_rendered: counted,
        fps_display: round_to(counted as f64 / elapsed, 2),
        cpu_pct_1core: round_to(cpu / elapsed * 100.0, 1),
        mem_rss_mb: round_to(after.rss_bytes as f64 / 1024.0 / 1024.0, 1),
    }))
}

fn attach_frame_counter(
    session: &PreviewSession,
    measuring: &Arc<AtomicBool>,
    frames: &Arc<AtomicU64>,
) -> BackendResult<()> {
    let pad = session
        .sink()
        .and_then(|sink| sink.static_pad("sink"))
        .ok_or_else(|| BackendError::InitializationFailed("Preview sink has no sink pad".to_string()))?;

    let measuring = Arc::clone(measuring);
    let frames = Arc::clone(frames);
    pad.add_probe(gstreamer::PadProbeType::BUFFER, move |_, _| {
        if measuring.load(Ordering::Relaxed) {
            frames.fetch_add(1, Ordering::Relaxed);
        }
        gstreamer::PadProbeReturn::Ok
    });

    debug!("Frame counter attached to preview sink");
    Ok(())
}

/// Run the whole benchmark and write the report.
///
/// Interrupted benchmarks still write the runs completed so far.
pub fn run(
    backend: CameraBackendType,
    config: &PreviewConfig,
    options: &BenchOptions,
    shutdown: &ShutdownSignal,
) -> AppResult<Option<PathBuf>> {
    let mut results = Vec::new();

    for run_id in 1..=options.runs {
        println!("Run {}/{} …", run_id, options.runs);
        match run_once(backend, config, options, shutdown, run_id)? {
            Some(metrics) => {
                println!(
                    "  FPS={}  CPU={}%  MEM={} MB",
                    metrics.fps_display, metrics.cpu_pct_1core, metrics.mem_rss_mb
                );
                results.push(metrics);
            }
            None => {
                warn!(run_id, "Benchmark interrupted");
                break;
            }
        }
    }

    let fps: Vec<f64> = results.iter().map(|r| r.fps_display).collect();
    let Some(summary) = summarize(&fps) else {
        info!("No completed runs, no report written");
        return Ok(None);
    };

    let now = Utc::now();
    let report = BenchReport {
        timestamp: now.to_rfc3339(),
        version: app_info::version().to_string(),
        config: BenchConfig {
            preview: config.clone(),
            backend,
            runs: options.runs,
            warmup_s: options.warmup.as_secs(),
            duration_s: options.duration.as_secs(),
        },
        summary,
        runs: results,
    };

    println!();
    println!("=== Summary ===");
    println!("  mean FPS : {}", summary.fps_mean);
    println!("  median   : {}", summary.fps_median);
    println!("  stddev   : {}", summary.fps_stddev);

    let path = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(now));
    write_report(&report, &path)?;
    println!();
    println!("Results written to {}", path.display());

    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_single_run() {
        let summary = summarize(&[29.5]).unwrap();
        assert_eq!(summary.fps_mean, 29.5);
        assert_eq!(summary.fps_median, 29.5);
        assert_eq!(summary.fps_stddev, 0.0);
        assert_eq!(summary.fps_p95, 29.5);
    }

    #[test]
    fn test_summarize_statistics() {
        let summary = summarize(&[30.0, 28.0, 29.0, 31.0]).unwrap();
        assert_eq!(summary.fps_mean, 29.5);
        assert_eq!(summary.fps_median, 29.5);
        // sample stddev of {28,29,30,31} = sqrt(5/3)
        assert_eq!(summary.fps_stddev, 1.29);
        // floor(4 * 0.95) = 3 -> largest value
        assert_eq!(summary.fps_p95, 31.0);
        assert_eq!(summary.fps_p99, 31.0);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn test_deadline_overflow_rejected() {
        let err = deadline_after(Instant::now(), "warmup", Duration::MAX).unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::OutOfRange { field: "warmup", .. })
        ));
        assert_eq!(err.exit_code(), 64);

        let now = Instant::now();
        let end = deadline_after(now, "duration", Duration::from_secs(30)).unwrap();
        assert_eq!(end - now, Duration::from_secs(30));
    }

    #[test]
    fn test_sample_resources() {
        let sample = sample_resources().unwrap();
        assert!(sample.rss_bytes > 0);
    }
}
