use thiserror::Error;

use crate::model::NodeId;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("node {0} no longer exists")]
    NodeGone(NodeId),
    #[error("node {0} is not an editable element")]
    NotEditable(NodeId),
    #[error("page bridge: {0}")]
    Bridge(String),
}
