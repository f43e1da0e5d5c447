//! Configuration file loading for storytime
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `STORYTIME_<SECTION>__<KEY>` (e.g. `STORYTIME_AGENT__MAX_TOOL_TURNS`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./storytime.toml` or `./.storytime.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/storytime/config.toml`
//!    (fallback `~/.config/storytime/config.toml`)
//! 5. Default values

mod error;
mod file_config;
mod loader;

pub use error::ConfigError;
pub use file_config::{
    ConfigIssue, FileAgentConfig, FileConfig, FileLoggingConfig, FileModelsConfig,
    FileOpenAiConfig, FilePerplexityConfig, FileProvidersConfig, FileSimulationConfig,
    FileStorageConfig, Severity,
};
pub use loader::ConfigLoader;
