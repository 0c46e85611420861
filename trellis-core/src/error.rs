//! Error types.
//!
//! Stale nodes and unknown event ids are not errors: the operations that can
//! meet them report `bool` or `Option` instead. The types here cover the
//! boundaries where a caller asked for a result and did not get one.

use thiserror::Error;

use crate::dom::NodeRef;

/// Failures of DOM method invocation.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("node {0} no longer exists")]
    StaleNode(NodeRef),

    #[error("method `{0}` is not supported by this host")]
    UnsupportedMethod(String),

    #[error("unexpected return value: {0}")]
    Conversion(#[from] serde_json::Error),
}

/// Failures of the RPC client.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("no function registered under `{0}`")]
    UnknownFunction(String),

    #[error("failed to convert rpc payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("failed to encode rpc frame: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode rpc frame: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}
