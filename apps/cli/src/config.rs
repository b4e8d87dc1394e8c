//! CLI configuration loading and merging.

use starwatch_core::{ConfigResult, StarwatchConfig};
use std::path::Path;

/// Load and merge CLI configuration.
///
/// Configuration precedence:
/// 1. CLI arguments (handled by clap and the command modules)
/// 2. Environment variables
/// 3. `--config` file, or the local config file (./starwatch.toml)
/// 4. Global config file (~/.starwatch/config.toml)
/// 5. Defaults
pub fn load_config(explicit: Option<&Path>) -> ConfigResult<StarwatchConfig> {
    Ok(StarwatchConfig::load(explicit)?.with_process_env())
}
