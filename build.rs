//! Embeds a human readable version string as `BUILD_INFO_HUMAN`.
//!
//! Uses `git describe` when the build happens inside a tagged checkout and
//! falls back to `v{CARGO_PKG_VERSION}-{timestamp}-{commit}` otherwise.

use std::process::Command;

use chrono::{DateTime, Utc};

fn main() {
    for path in ["src", "build.rs", "Cargo.toml"] {
        println!("cargo:rerun-if-changed={path}");
    }

    let version = env!("CARGO_PKG_VERSION");
    let describe = git(&["describe", "--tags", "--always", "--dirty"])
        .filter(|desc| desc.starts_with('v') || desc.contains("-g"))
        .unwrap_or_else(snapshot_version);

    println!("cargo:rustc-env=BUILD_INFO_HUMAN={version} ({describe})");
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Version for untagged checkouts and source tarballs.
fn snapshot_version() -> String {
    let commit = git(&["rev-parse", "--short=12", "HEAD"]);
    let dirty = git(&["status", "--porcelain"]).is_some();

    // Clean checkouts are stamped with the commit time so rebuilds agree.
    let stamp = git(&["log", "-1", "--format=%ct"])
        .filter(|_| !dirty)
        .and_then(|secs| secs.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
        .format("%Y%m%d%H%M%S");

    format!(
        "v{}-{stamp}-{}{}",
        env!("CARGO_PKG_VERSION"),
        commit.as_deref().unwrap_or("unknown"),
        if dirty { "+dirty" } else { "" }
    )
}
