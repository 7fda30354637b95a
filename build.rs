// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=PICAMVIEWER_VERSION");

    // Distribution packages set the version explicitly (no .git in the tarball)
    let version = match std::env::var("PICAMVIEWER_VERSION") {
        Ok(v) if !v.trim().is_empty() => v,
        _ => describe_version(),
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Version string derived from `git describe`.
///
/// - exact tag `v0.2.0`            -> `0.2.0`
/// - after a tag `v0.2.0-3-gabc1234` -> `0.2.0+3.abc1234`
/// - no tags at all                -> `<crate version>+<short hash>`
fn describe_version() -> String {
    let crate_version = env!("CARGO_PKG_VERSION");

    let described = git(&["describe", "--tags", "--match", "v*"]);
    let Some(described) = described else {
        return match git(&["rev-parse", "--short", "HEAD"]) {
            Some(hash) => format!("{}+{}", crate_version, hash),
            None => crate_version.to_string(),
        };
    };

    let described = described.strip_prefix('v').unwrap_or(&described);
    let parts: Vec<&str> = described.rsplitn(3, '-').collect();
    match parts.as_slice() {
        [hash, commits, tag] => {
            let hash = hash.strip_prefix('g').unwrap_or(hash);
            format!("{}+{}.{}", tag, commits, hash)
        }
        _ => described.to_string(),
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}
