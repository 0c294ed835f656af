//! Shared constants

/// User agent presented by the launched browser.
///
/// Chrome ships a new stable roughly every 4 weeks; bump this quarterly.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Directory `write_to_file` is confined to when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "agent_output";

/// Config file probed in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Environment variable holding the model API key by default.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
