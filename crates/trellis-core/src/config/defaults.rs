//! Built-in configuration defaults.

/// Default catalog file, relative to the working directory.
pub const DEFAULT_CATALOG_FILE: &str = ".trellis/catalog.json";

/// Default page size for paginated REST sources.
pub const DEFAULT_SYNC_PAGE_SIZE: usize = 100;

/// Default merge policy name.
pub const DEFAULT_SYNC_POLICY: &str = "smart";
