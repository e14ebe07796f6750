// ABOUTME: Action-graph error types with SNAFU pattern.
// ABOUTME: Unifies lifecycle, port and metadata failures for programmatic handling.

use snafu::Snafu;

use super::lifecycle::LifecycleError;
use super::metadata::MetadataError;
use super::ports::PortError;

/// Unified error for building a scheduler action graph.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ActionGraphError {
    #[snafu(display("lifecycle bundle resolution failed: {source}"))]
    Lifecycle { source: LifecycleError },

    #[snafu(display("port resolution failed: {source}"))]
    Ports { source: PortError },

    #[snafu(display("execution metadata rejected: {source}"))]
    Metadata { source: MetadataError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionGraphErrorKind {
    /// No lifecycle bundle configured for the lifecycle type and stack.
    InvalidStack,
    /// A relative lifecycle bundle with no file server to serve it.
    MissingFileServer,
    /// Image declares ports but none of them are TCP.
    NoTcpPorts,
    /// Execution metadata is not valid JSON of the expected shape.
    InvalidMetadata,
}

impl ActionGraphError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ActionGraphErrorKind {
        match self {
            ActionGraphError::Lifecycle {
                source: LifecycleError::InvalidStack(_),
            } => ActionGraphErrorKind::InvalidStack,
            ActionGraphError::Lifecycle {
                source: LifecycleError::NoFileServer(_),
            } => ActionGraphErrorKind::MissingFileServer,
            ActionGraphError::Ports {
                source: PortError::NoTcpPorts,
            } => ActionGraphErrorKind::NoTcpPorts,
            ActionGraphError::Metadata { .. } => ActionGraphErrorKind::InvalidMetadata,
        }
    }
}

impl From<LifecycleError> for ActionGraphError {
    fn from(source: LifecycleError) -> Self {
        ActionGraphError::Lifecycle { source }
    }
}

impl From<PortError> for ActionGraphError {
    fn from(source: PortError) -> Self {
        ActionGraphError::Ports { source }
    }
}

impl From<MetadataError> for ActionGraphError {
    fn from(source: MetadataError) -> Self {
        ActionGraphError::Metadata { source }
    }
}
