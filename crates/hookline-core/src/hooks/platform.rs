//! Platform filtering for hooks
//!
//! Platforms are identifiers such as `linux-x86_64` or `osx-aarch_64`.
//! Filter entries may be:
//!
//! - `*`: matches every platform
//! - An OS family without architecture (`osx`): matches `osx` and `osx-*`
//! - A regex (contains `^$.*+?[](){}\|`): anchored regex match
//! - Anything else: exact match

use regex::Regex;
use std::collections::BTreeSet;

/// Check if a pattern contains regex metacharacters
fn contains_regex_metacharacters(pattern: &str) -> bool {
    pattern.chars().any(|c| {
        matches!(
            c,
            '^' | '$' | '.' | '*' | '+' | '?' | '[' | ']' | '(' | ')' | '{' | '}' | '\\' | '|'
        )
    })
}

/// Match a platform against a single filter entry
///
/// # Examples
///
/// ```
/// use hookline_core::hooks::platform::platform_matches;
///
/// assert!(platform_matches("*", "linux-x86_64"));
/// assert!(platform_matches("linux-x86_64", "linux-x86_64"));
/// assert!(platform_matches("osx", "osx-aarch_64"));
/// assert!(!platform_matches("osx", "osxfoo"));
/// assert!(platform_matches("linux-.*", "linux-riscv64"));
/// assert!(!platform_matches("linux-x86_64", "linux-aarch_64"));
/// ```
pub fn platform_matches(pattern: &str, platform: &str) -> bool {
    let pattern = pattern.trim();
    match pattern {
        "*" => true,
        p if p == platform => true,
        p if contains_regex_metacharacters(p) => Regex::new(&format!("^(?:{})$", p))
            .map(|re| re.is_match(platform))
            .unwrap_or(false),
        p if !p.contains('-') => platform
            .strip_prefix(p)
            .is_some_and(|rest| rest.starts_with('-')),
        _ => false,
    }
}

fn any_matches(patterns: &BTreeSet<String>, platform: &str) -> bool {
    patterns.iter().any(|p| platform_matches(p, platform))
}

/// Decide whether the current platform is accepted.
///
/// Precedence: excludes, then includes, then the legacy `platforms` set,
/// otherwise unrestricted.
///
/// `current` must not be empty.
pub fn accepts(
    current: &str,
    includes: &BTreeSet<String>,
    excludes: &BTreeSet<String>,
    legacy_platforms: &BTreeSet<String>,
) -> bool {
    debug_assert!(!current.is_empty(), "current platform must be set");

    if any_matches(excludes, current) {
        false
    } else if !includes.is_empty() {
        any_matches(includes, current)
    } else if !legacy_platforms.is_empty() {
        any_matches(legacy_platforms, current)
    } else {
        true
    }
}

/// Platform identifier of the running host, e.g. `linux-x86_64`
pub fn host_platform() -> String {
    let os = match std::env::consts::OS {
        "macos" => "osx",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "aarch64" => "aarch_64",
        other => other,
    };
    format!("{}-{}", os, arch)
}
