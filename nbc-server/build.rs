//! Build script for nbc-server
//!
//! Exposes GIT_HASH, BUILD_TIMESTAMP and BUILD_PROFILE to the crate for the
//! startup log line, the page footer and /health.
//!
//! Release tarballs have no `.git`; set `NBC_GIT_HASH` to stamp them.

use std::path::PathBuf;
use std::process::Command;

const HASH_OVERRIDE_ENV: &str = "NBC_GIT_HASH";

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string()).filter(|s| !s.is_empty())
}

/// Files whose change means HEAD moved: HEAD itself and the branch it points at
fn watch_git_head() {
    let Some(git_dir) = git(&["rev-parse", "--git-dir"]).map(PathBuf::from) else {
        return;
    };
    println!("cargo:rerun-if-changed={}", git_dir.join("HEAD").display());
    if let Some(branch) = git(&["symbolic-ref", "-q", "HEAD"]) {
        println!("cargo:rerun-if-changed={}", git_dir.join(branch).display());
    }
    println!("cargo:rerun-if-changed={}", git_dir.join("packed-refs").display());
}

fn main() {
    println!("cargo:rerun-if-env-changed={}", HASH_OVERRIDE_ENV);
    println!("cargo:rerun-if-changed=build.rs");
    watch_git_head();

    let git_hash = std::env::var(HASH_OVERRIDE_ENV)
        .ok()
        .filter(|h| !h.trim().is_empty())
        .or_else(|| git(&["rev-parse", "--short=8", "HEAD"]))
        .unwrap_or_else(|| "unknown".to_string());

    let build_timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_timestamp);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
}
