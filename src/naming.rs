//! Naming conventions shared by the site generator and the version tooling.
//!
//! ## ToC Files
//!
//! Every (language, version) pair owns one hand-maintained ToC file and, for
//! production builds, one generated ToC file. Both live flat in the ToC
//! directory; dots in the version become dashes so the site generator can use
//! the stem as a data key:
//!
//! - `("en", "dev")` → `en_dev_manual.yml` / `en_dev-generated.yml`
//! - `("fr", "6.1.0")` → `fr_6-1-0_manual.yml` / `fr_6-1-0-generated.yml`
//!
//! ## Version Numbers
//!
//! Released versions use one of three shapes, and [`next_version`] bumps each
//! shape its own way:
//!
//! - `"6.x"` → `"7.x"` (major-only line)
//! - `"2.0"` → `"2.1"`
//! - `"5.4.1"` → `"5.5.0"`

/// Suffix shared by every generated ToC file; `clean` removes files ending in it.
pub const GENERATED_TOC_SUFFIX: &str = "-generated.yml";

/// Version-string component used inside ToC file names.
fn toc_version_key(version: &str) -> String {
    version.replace('.', "-")
}

/// File name of the hand-maintained ToC for a (language, version) pair.
pub fn manual_toc_name(language: &str, version: &str) -> String {
    format!("{}_{}_manual.yml", language, toc_version_key(version))
}

/// File name of the generated ToC for a (language, version) pair.
pub fn generated_toc_name(language: &str, version: &str) -> String {
    format!(
        "{}_{}{}",
        language,
        toc_version_key(version),
        GENERATED_TOC_SUFFIX
    )
}

/// Compute the version that follows `latest`.
///
/// Returns `None` when `latest` does not have one of the recognized shapes
/// (`N.x`, `a.b`, `a.b.c`).
pub fn next_version(latest: &str) -> Option<String> {
    let parts: Vec<&str> = latest.trim().split('.').collect();
    match parts.as_slice() {
        [major, "x"] => {
            let major: u32 = major.parse().ok()?;
            Some(format!("{}.x", major + 1))
        }
        [major, minor] => {
            let major: u32 = major.parse().ok()?;
            let minor: u32 = minor.parse().ok()?;
            Some(format!("{}.{}", major, minor + 1))
        }
        [major, minor, patch] => {
            let major: u32 = major.parse().ok()?;
            let minor: u32 = minor.parse().ok()?;
            // patch must still be numeric even though it is reset
            let _: u32 = patch.parse().ok()?;
            Some(format!("{}.{}.0", major, minor + 1))
        }
        _ => None,
    }
}
