//! Configuration errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Missing credentials for {provider}: environment variable {env} is not set")]
    MissingCredentials { provider: &'static str, env: String },
}
