//! Product version information.
//!
//! Release builds inject `ASSAY_VERSION` and `ASSAY_BUILD` at compile time;
//! local builds fall back to the crate version and carry no build id.

/// Version string used when no release version was compiled in.
pub const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Product name shown in version output and the shell banner.
pub const PRODUCT_NAME: &str = "assay";

/// The release version, if one was injected at build time.
pub fn release_version() -> Option<&'static str> {
    option_env!("ASSAY_VERSION").filter(|v| !v.is_empty())
}

/// The build identifier (e.g. a commit hash), if one was injected.
pub fn build() -> Option<&'static str> {
    option_env!("ASSAY_BUILD").filter(|b| !b.is_empty())
}

/// The effective version: the release version or [`DEFAULT_VERSION`].
pub fn version() -> &'static str {
    release_version().unwrap_or(DEFAULT_VERSION)
}

/// One-line version and build description, as printed by `assay version`.
pub fn info() -> String {
    format_info(version(), build())
}

fn format_info(version: &str, build: Option<&str>) -> String {
    match build {
        Some(build) => format!("{PRODUCT_NAME} {version} ({build})"),
        None => format!("{PRODUCT_NAME} {version}"),
    }
}
