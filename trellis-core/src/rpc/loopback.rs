//! In-memory transport.
//!
//! Two endpoints share a pair of frame queues. Messages are encoded to
//! MessagePack on send and decoded on delivery, so payloads cross the same
//! serialization boundary a real host connection would.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::trace;

use super::{RpcClient, RpcMessage, RpcTransport};
use crate::error::RpcError;

type FrameQueue = Rc<RefCell<VecDeque<Vec<u8>>>>;

/// One end of an in-memory channel.
#[derive(Clone, Default)]
pub struct LoopbackTransport {
    outbox: FrameQueue,
    inbox: FrameQueue,
}

impl LoopbackTransport {
    /// Two connected endpoints: what one sends, the other receives.
    pub fn pair() -> (Self, Self) {
        let forward = FrameQueue::default();
        let backward = FrameQueue::default();
        (
            Self {
                outbox: forward.clone(),
                inbox: backward.clone(),
            },
            Self {
                outbox: backward,
                inbox: forward,
            },
        )
    }

    /// Frames waiting to be delivered to this endpoint.
    pub fn pending(&self) -> usize {
        self.inbox.borrow().len()
    }

    /// Deliver waiting frames to `client`, including frames sent while
    /// delivering. Stops at the first frame that fails to decode or names an
    /// unknown function.
    pub fn pump(&self, client: &RpcClient) -> Result<usize, RpcError> {
        let mut delivered = 0;
        loop {
            let frame = self.inbox.borrow_mut().pop_front();
            let Some(frame) = frame else {
                break;
            };
            let message: RpcMessage = rmp_serde::from_slice(&frame)?;
            trace!(function = %message.function, bytes = frame.len(), "delivering rpc frame");
            client.receive(message)?;
            delivered += 1;
        }
        Ok(delivered)
    }
}

impl RpcTransport for LoopbackTransport {
    fn send(&self, message: RpcMessage) -> Result<(), RpcError> {
        let frame = rmp_serde::to_vec_named(&message)?;
        self.outbox.borrow_mut().push_back(frame);
        Ok(())
    }
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::cell::Cell;

    #[test]
    fn round_trip_through_both_ends() {
        let (front, back) = LoopbackTransport::pair();
        let frontend = RpcClient::new(Rc::new(front.clone()));
        let backend = RpcClient::new(Rc::new(back.clone()));

        let responder = backend.clone();
        backend.register_function("sum", move |payload| {
            let response_id = payload[0].as_str().unwrap_or_default().to_owned();
            let total: i64 = payload[1]
                .as_array()
                .map(|items| items.iter().filter_map(Value::as_i64).sum())
                .unwrap_or_default();
            responder.call_remote(&response_id, &total).expect("sent");
        });

        let result = Rc::new(Cell::new(0));
        let result_clone = result.clone();
        frontend
            .remote_callable_with_back_channel("sum", move |value| {
                result_clone.set(value.as_i64().unwrap_or_default());
            })
            .call(&[1, 2, 3])
            .expect("sent");

        assert_eq!(back.pending(), 1);
        assert_eq!(back.pump(&backend).expect("delivered"), 1);
        assert_eq!(front.pump(&frontend).expect("delivered"), 1);
        assert_eq!(result.get(), 6);
        assert_eq!(frontend.function_count(), 0);
    }

    #[test]
    fn unknown_function_stops_pump() {
        let (front, back) = LoopbackTransport::pair();
        let frontend = RpcClient::new(Rc::new(front));
        let backend = RpcClient::new(Rc::new(back.clone()));

        frontend.call_remote("nobody", &json!({ "a": 1 })).expect("sent");
        frontend.call_remote("nobody", &json!(null)).expect("sent");

        assert!(matches!(back.pump(&backend), Err(RpcError::UnknownFunction(_))));
        assert_eq!(back.pending(), 1);
    }
}
