//! Error types.

use thiserror::Error;

use crate::engine::ComponentId;

#[derive(Debug, Error)]
pub enum Error {
    /// State-driven re-renders kept queueing more work past the configured bound.
    #[error("state-driven re-renders did not settle after {limit} passes")]
    RerenderLimit { limit: usize },

    /// The component instance behind a handle has been unmounted.
    #[error("component instance {0} is no longer mounted")]
    StaleHandle(ComponentId),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
