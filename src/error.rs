//! Error types for jsonize operations.

use html::{NodeId, ParseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("document has no root node")]
    EmptyInput,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("malformed tree at node {node}: {reason}")]
    MalformedTree { node: NodeId, reason: &'static str },

    #[error("tree is deeper than the limit of {0}")]
    DepthLimitExceeded(usize),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
