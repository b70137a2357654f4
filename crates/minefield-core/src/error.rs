//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while setting up a minefield.
///
/// Running a minefield cannot fail once it is built. Missing mines and
/// refused insertions are reported through `Option`.
#[derive(Debug, Error)]
pub enum MinefieldError {
    /// The configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The targeting worker pool could not be started.
    #[error("failed to start targeting workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts() {
        let err: MinefieldError = ConfigError::NoTeams.into();
        assert!(matches!(err, MinefieldError::Config(ConfigError::NoTeams)));
        assert_eq!(err.to_string(), "invalid configuration: team count must be at least 1");
    }
}
