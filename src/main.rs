// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use picamviewer::config::{self, Rotation};
use picamviewer::constants::{app_info, bench, defaults, exit_codes};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

mod cli;

#[derive(Parser, Debug)]
#[command(name = "picamviewer")]
#[command(about = "Show a Raspberry Pi camera preview full-screen")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
// Preview options belong after `bench`, never before it
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(flatten)]
    preview: PreviewArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by the preview and the benchmark
#[derive(Args, Debug, Clone)]
struct PreviewArgs {
    /// Preview width in pixels
    #[arg(long, default_value_t = defaults::WIDTH, value_parser = config::parse_width, allow_negative_numbers = true)]
    width: u32,

    /// Preview height in pixels
    #[arg(long, default_value_t = defaults::HEIGHT, value_parser = config::parse_height, allow_negative_numbers = true)]
    height: u32,

    /// Camera framerate
    #[arg(long, default_value_t = defaults::FRAMERATE, value_parser = config::parse_framerate, allow_negative_numbers = true)]
    framerate: u32,

    /// Show preview full-screen (default)
    #[arg(long, conflicts_with = "no_fullscreen")]
    fullscreen: bool,

    /// Show preview in a window
    #[arg(long = "no-fullscreen")]
    no_fullscreen: bool,

    /// Camera rotation in degrees: 0, 90, 180 or 270
    #[arg(long, default_value = "0", value_parser = config::parse_rotation, allow_negative_numbers = true)]
    rotation: Rotation,

    /// X display to use, e.g. ':0' (default: DISPLAY, then ':0')
    #[arg(long)]
    display: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Measure preview FPS, CPU and memory usage
    Bench {
        #[command(flatten)]
        preview: PreviewArgs,

        /// Number of measurement runs
        #[arg(long, default_value_t = bench::RUNS, value_parser = clap::value_parser!(u32).range(1..=i64::from(bench::MAX_RUNS)))]
        runs: u32,

        /// Warm-up seconds per run
        #[arg(long, default_value_t = bench::WARMUP_SECS, value_parser = clap::value_parser!(u64).range(0..=bench::MAX_SECS))]
        warmup: u64,

        /// Measurement seconds per run
        #[arg(long, default_value_t = bench::DURATION_SECS, value_parser = clap::value_parser!(u64).range(1..=bench::MAX_SECS))]
        duration: u64,

        /// Output JSON file (default: benchmark-<UTC timestamp>.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Exit status for a failed parse: usage errors must not reuse exit
/// status 2 (no camera backend); `--help` and `--version` succeed.
fn parse_error_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        exit_codes::USAGE
    } else {
        exit_codes::SUCCESS
    }
}

fn main() -> ExitCode {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=picamviewer=debug,gst=warn
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if let Err(io) = e.print() {
                error!(error = %io, "Failed to print command line message");
            }
            return ExitCode::from(parse_error_code(&e));
        }
    };

    info!(version = app_info::version(), "PiCamViewer starting");

    let result = match cli.command {
        Some(Commands::Bench {
            preview,
            runs,
            warmup,
            duration,
            output,
        }) => cli::run_bench(&preview, runs, warmup, duration, output),
        None => cli::run_preview(&cli.preview),
    };

    match result {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(err) => {
            error!(exit_code = err.exit_code(), "{}", err);
            // Diagnostics go to stderr as well so they survive RUST_LOG=off
            eprintln!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("picamviewer").chain(args.iter().copied()))
    }

    fn exit_code_for(args: &[&str]) -> u8 {
        parse_error_code(&parse(args).unwrap_err())
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.preview.width, defaults::WIDTH);
        assert_eq!(cli.preview.height, defaults::HEIGHT);
        assert_eq!(cli.preview.framerate, defaults::FRAMERATE);
        assert!(!cli.preview.no_fullscreen);
        assert_eq!(cli.preview.rotation, Rotation::None);
        assert!(cli.preview.display.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_720p60_rotated() {
        let cli = parse(&[
            "--width",
            "1280",
            "--height",
            "720",
            "--framerate",
            "60",
            "--rotation",
            "90",
            "--display",
            ":1",
        ])
        .unwrap();

        assert_eq!(cli.preview.width, 1280);
        assert_eq!(cli.preview.height, 720);
        assert_eq!(cli.preview.framerate, 60);
        assert_eq!(cli.preview.rotation, Rotation::Rotate90);
        assert_eq!(cli.preview.display.as_deref(), Some(":1"));
    }

    #[test]
    fn test_invalid_options_exit_64() {
        for args in [
            &["--rotation", "45"][..],
            &["--width", "0"][..],
            &["--height", "-720"][..],
            &["--framerate", "thirty"][..],
            &["--fullscreen", "--no-fullscreen"][..],
            &["--unknown"][..],
        ] {
            assert_eq!(exit_code_for(args), exit_codes::USAGE, "args: {:?}", args);
        }
    }

    #[test]
    fn test_help_and_version_exit_0() {
        assert_eq!(exit_code_for(&["--help"]), exit_codes::SUCCESS);
        assert_eq!(exit_code_for(&["--version"]), exit_codes::SUCCESS);
    }

    #[test]
    fn test_bench_takes_its_own_preview_options() {
        let cli = parse(&["bench", "--width", "640", "--runs", "2"]).unwrap();
        match cli.command {
            Some(Commands::Bench { preview, runs, .. }) => {
                assert_eq!(preview.width, 640);
                assert_eq!(runs, 2);
            }
            other => panic!("expected bench, got {:?}", other),
        }
    }

    #[test]
    fn test_preview_options_before_bench_rejected() {
        assert_eq!(exit_code_for(&["--width", "640", "bench"]), exit_codes::USAGE);
    }

    #[test]
    fn test_bench_bounds() {
        for args in [
            &["bench", "--warmup", "18446744073709551615"][..],
            &["bench", "--duration", "0"][..],
            &["bench", "--duration", "86401"][..],
            &["bench", "--runs", "0"][..],
            &["bench", "--runs", "4294967295"][..],
        ] {
            assert_eq!(exit_code_for(args), exit_codes::USAGE, "args: {:?}", args);
        }

        let cli = parse(&["bench", "--warmup", "0", "--duration", "86400"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Bench {
                warmup: 0,
                duration: 86_400,
                ..
            })
        ));
    }
}
