//! Configuration for the command line, parsed from TOML.

use std::num::NonZeroU64;
use std::path::PathBuf;

use serde::Deserialize;
pub use validator::Validate;

/// The default config, also used as the editor template by the CLI.
pub const DEFAULT_CONFIG_STR: &str = include_str!("default.toml");

fn default_start_page() -> NonZeroU64 {
    NonZeroU64::MIN
}

/// One crawl run, as configured by the user.
#[non_exhaustive]
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct Config {
    /// The blog to crawl, e.g. `staff` for `staff.tumblr.com`.
    #[validate(length(min = 1, message = "blog must not be empty"))]
    pub blog: String,
    /// Where images and tag files are written.
    pub download_dir: PathBuf,
    /// Request timeout in seconds. 0 disables the timeout.
    pub timeout: u64,
    /// First listing page to fetch.
    #[serde(default = "default_start_page")]
    pub start_page: NonZeroU64,
    /// Stop once this page was processed. Absent means: crawl until the
    /// blog runs out of pages.
    #[serde(default)]
    pub page_ceiling: Option<u64>,
    /// Stop once this step index was processed.
    #[serde(default)]
    pub step_ceiling: Option<u64>,
    /// Also write a `manifest.json` with every record's metadata.
    #[serde(default)]
    pub manifest: bool,
}
