use hz_core::{AgentId, HzError, ProfileId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("{what} length {got} does not match agent count {expected}")]
    AgentCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error("agent {agent} references unknown avoidance profile {profile}")]
    UnknownProfile {
        agent:   AgentId,
        profile: ProfileId,
    },

    #[error("invalid grid layout: {0}")]
    InvalidGrid(String),

    #[error(transparent)]
    Core(#[from] HzError),
}

pub type SimResult<T> = Result<T, SimError>;
