use crate::pipeline::PipelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("gerrit: {0}")]
    Gateway(#[from] gerrit_client::Error),

    #[error("pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    /// The checker registry and this connector disagree about a UUID
    #[error("uuid {uuid:?} had unknown prefix")]
    UnknownCheckerKind { uuid: String },

    /// A configured kind that could never be parsed back out of a UUID
    #[error("invalid checker kind {kind:?}: must be non-empty and contain no '-'")]
    InvalidCheckerKind { kind: String },

    #[error("unsupported checker prefix {prefix:?}; supported: {}", .supported.join(", "))]
    UnsupportedPrefix {
        prefix: String,
        supported: Vec<String>,
    },

    /// The check executor is gone; nothing will ever drain the queue again
    #[error("check queue closed")]
    QueueClosed,
}
