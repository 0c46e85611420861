//! RPC
//!
//! A named-function channel between this side and a remote host. Both sides
//! register handlers under string names; a call is a fire-and-forget
//! [`RpcMessage`] naming the remote function.
//!
//! # How Back Channels Work
//!
//! 1. `remote_callable_with_back_channel(name, callback)` returns a callable.
//! 2. Each call registers a temporary function named
//!    `"<name>::response::<n>"` that wraps `callback`.
//! 3. The message sent to `name` carries `[responseId, args]`; the remote
//!    side answers by calling `responseId`.
//! 4. The temporary function unregisters itself when the answer arrives, so
//!    each request gets exactly one callback invocation.
//!
//! Every inbound message is a new loop tick: after its handler ran, the
//! client drains its event context.

mod client;
mod loopback;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use client::{RemoteCallable, RpcClient, RpcHandler};
pub use loopback::LoopbackTransport;

use crate::error::RpcError;

/// One call across the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcMessage {
    pub function: String,
    pub payload: Value,
}

impl RpcMessage {
    pub fn new(function: impl Into<String>, payload: Value) -> Self {
        Self {
            function: function.into(),
            payload,
        }
    }
}

/// Sends messages to the remote side.
pub trait RpcTransport {
    fn send(&self, message: RpcMessage) -> Result<(), RpcError>;
}
