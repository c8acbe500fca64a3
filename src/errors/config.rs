use std::env::VarError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The variable is set but is not valid unicode.
    #[error("Environment variable error for {key}: {source}")]
    EnvVar {
        key: String,
        #[source]
        source: VarError,
    },

    /// The variable (or its default) could not be parsed into the expected type.
    #[error("Could not parse {key}: {message}")]
    Parse { key: String, message: String },
}
