pub const APP_NAME: &str = "wikimap";

/// Prefix of snapshot directories inside the archive root when none is configured.
pub const DEFAULT_BUILD_PREFIX: &str = "build";

/// Name of the configuration record inside every snapshot directory.
pub const CONFIG_FILENAME: &str = "config";

/// Name of the rendered run summary inside every snapshot directory.
pub const SUMMARY_FILENAME: &str = "summary";

/// Advisory lock file inside the archive root.
pub const LOCK_FILENAME: &str = ".lock";

/// Environment variable naming the archive root.
pub const BUILDPATH_ENV: &str = "WIKIMAP_BUILDPATH";

/// Environment variable overriding the snapshot directory prefix.
pub const BUILD_PREFIX_ENV: &str = "WIKIMAP_BUILD_PREFIX";
