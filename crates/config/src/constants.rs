//! Built-in defaults for the monitoring hub deployment
//!
//! Everything here can be overridden through the config file or environment;
//! these are only the values used when nothing else is set.

pub const DEFAULT_CATALOG_URL: &str = "https://sckyzo.github.io/monitoring-hub/catalog.json";

pub const DEFAULT_GITHUB_REPO: &str = "SckyzO/monitoring-hub";
pub const GITHUB_API_BASE: &str = "https://api.github.com";

pub const EXPORTERS_DIR: &str = "exporters";
pub const CATALOG_DIR: &str = "catalog";
pub const OUTPUT_DIR: &str = "site";
