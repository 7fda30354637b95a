// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for benchmark reporting

use chrono::{TimeZone, Utc};
use picamviewer::bench::{
    BenchConfig, BenchReport, RunMetrics, default_output_path, summarize, write_report,
};
use picamviewer::{CameraBackendType, PreviewConfig};

fn metrics(run_id: u32, fps: f64) -> RunMetrics {
    RunMetrics {
        run_id,
        elapsed_s: 30.0,
        frames_rendered: (fps * 30.0) as u64,
        fps_display: fps,
        cpu_pct_1core: 12.5,
        mem_rss_mb: 48.2,
    }
}

#[test]
fn test_default_output_path() {
    let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 12).unwrap();
    assert_eq!(
        default_output_path(now).to_string_lossy(),
        "benchmark-20261016T0930.json"
    );
}

#[test]
fn test_report_written_as_json() {
    let runs = vec![metrics(1, 29.8), metrics(2, 30.0), metrics(3, 29.9)];
    let fps: Vec<f64> = runs.iter().map(|r| r.fps_display).collect();
    let summary = summarize(&fps).unwrap();

    let report = BenchReport {
        timestamp: "2026-10-16T09:30:12+00:00".to_string(),
        version: "test".to_string(),
        config: BenchConfig {
            preview: PreviewConfig::default(),
            backend: CameraBackendType::Libcamera,
            runs: 3,
            warmup_s: 10,
            duration_s: 30,
        },
        summary,
        runs,
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    write_report(&report, &path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(json["fps_median"], 29.9);
    assert_eq!(json["config"]["width"], 1920);
    assert_eq!(json["config"]["rotation"], 0);
    assert_eq!(json["config"]["backend"], "Libcamera");
    assert_eq!(json["runs"].as_array().unwrap().len(), 3);
    assert_eq!(json["runs"][0]["run_id"], 1);
}

#[test]
fn test_write_report_to_missing_dir_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("report.json");

    let report = BenchReport {
        timestamp: String::new(),
        version: String::new(),
        config: BenchConfig {
            preview: PreviewConfig::default(),
            backend: CameraBackendType::Legacy,
            runs: 1,
            warmup_s: 0,
            duration_s: 1,
        },
        summary: summarize(&[30.0]).unwrap(),
        runs: vec![metrics(1, 30.0)],
    };

    let err = write_report(&report, &path).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}
