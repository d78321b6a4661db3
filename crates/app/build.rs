use std::env;
use std::process::Command;

/// Trimmed stdout of a git invocation, if git is present and succeeds
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn env_or(key: &str, fallback: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// CI ref first, then git, then the crate version for source tarballs
fn repo_version() -> String {
    env::var("CI_BUILD_REF")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| git(&["describe", "--always", "--dirty", "--tags"]))
        .or_else(|| git(&["rev-parse", "--short", "HEAD"]))
        .unwrap_or_else(|| env_or("CARGO_PKG_VERSION", "unknown"))
}

fn main() {
    for path in ["build.rs", "../../.git/HEAD", "../../.git/refs/heads"] {
        println!("cargo:rerun-if-changed={}", path);
    }

    let vars = [
        ("BUILD_PROFILE", env_or("PROFILE", "unknown")),
        ("REPO_VERSION", repo_version()),
        ("BUILD_TIMESTAMP", chrono::Utc::now().to_rfc3339()),
    ];
    for (key, value) in vars {
        println!("cargo:rustc-env={}={}", key, value);
    }
}
