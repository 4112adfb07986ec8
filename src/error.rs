use crate::runtime::node::NodeIdentifier;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("node params must be a mapping, found {0}")]
    ParamsNotMapping(&'static str),
}

/// Failure of a single attempt, tagged with the step that raised it.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("failed to initialize ports")]
    PortInit(#[source] anyhow::Error),

    #[error("failed to read incoming edge '{edge}'")]
    EdgeRead {
        edge: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to translate node config")]
    ConfigTranslation(#[from] ConfigError),

    #[error("operator initialization failed")]
    OperatorInitialize(#[source] anyhow::Error),

    #[error("operator run failed")]
    OperatorRun(#[source] anyhow::Error),

    #[error("attempt panicked: {0}")]
    Panicked(String),

    #[error("failed to flush outgoing edge '{edge}'")]
    EdgeFlush {
        edge: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Terminal cause recorded when a node run ends in `Failed`.
///
/// Only the last attempt's error is kept. Errors from earlier attempts are
/// logged and dropped.
#[derive(Debug, Error)]
pub enum NodeFailure {
    #[error("node identifier '{0}' is not usable")]
    InvalidIdentifier(NodeIdentifier),

    #[error("node failed after {attempts} attempt(s)")]
    RetriesExhausted {
        attempts: u64,
        #[source]
        source: AttemptError,
    },
}

impl NodeFailure {
    pub fn attempt_error(&self) -> Option<&AttemptError> {
        match self {
            NodeFailure::InvalidIdentifier(_) => None,
            NodeFailure::RetriesExhausted { source, .. } => Some(source),
        }
    }
}
