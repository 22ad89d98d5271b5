//! Filesystem path constants.

/// Default config file path. A missing file means built-in defaults.
pub const DEFAULT_CONFIG: &str = "/etc/autodown/config.yaml";
