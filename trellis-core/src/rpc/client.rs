//! RPC client.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::{RpcMessage, RpcTransport};
use crate::error::RpcError;
use crate::event::{EventContext, WeakEventContext};

/// Handler of an inbound call.
pub type RpcHandler = Rc<dyn Fn(Value)>;

struct ClientInner {
    transport: Rc<dyn RpcTransport>,
    functions: RefCell<IndexMap<String, RpcHandler>>,
    events: Option<WeakEventContext>,
    next_response: Cell<u64>,
}

/// Registers local functions and calls remote ones.
///
/// # Example
///
/// ```rust,ignore
/// let client = RpcClient::with_event_context(Rc::new(transport), runtime.events());
///
/// let files = files.clone();
/// client
///     .remote_callable_with_back_channel("fs::list", move |listing| {
///         files.set(serde_json::from_value(listing).unwrap_or_default());
///     })
///     .call(&"/home")?;
/// ```
#[derive(Clone)]
pub struct RpcClient {
    inner: Rc<ClientInner>,
}

impl RpcClient {
    pub fn new(transport: Rc<dyn RpcTransport>) -> Self {
        Self::build(transport, None)
    }

    /// A client that drains `events` after every inbound call.
    pub fn with_event_context(transport: Rc<dyn RpcTransport>, events: &EventContext) -> Self {
        Self::build(transport, Some(events.downgrade()))
    }

    fn build(transport: Rc<dyn RpcTransport>, events: Option<WeakEventContext>) -> Self {
        Self {
            inner: Rc::new(ClientInner {
                transport,
                functions: RefCell::new(IndexMap::new()),
                events,
                next_response: Cell::new(0),
            }),
        }
    }

    /// Register `handler` under `name`, replacing any previous handler.
    pub fn register_function<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(Value) + 'static,
    {
        self.inner
            .functions
            .borrow_mut()
            .insert(name.into(), Rc::new(handler));
    }

    /// Returns whether a handler was registered under `name`.
    pub fn unregister_function(&self, name: &str) -> bool {
        self.inner.functions.borrow_mut().shift_remove(name).is_some()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.inner.functions.borrow().contains_key(name)
    }

    pub fn function_count(&self) -> usize {
        self.inner.functions.borrow().len()
    }

    /// Dispatch an inbound call, then drain the event context.
    pub fn receive(&self, message: RpcMessage) -> Result<(), RpcError> {
        let handler = self.inner.functions.borrow().get(&message.function).cloned();
        let Some(handler) = handler else {
            warn!(function = %message.function, "rpc call to unknown function");
            return Err(RpcError::UnknownFunction(message.function));
        };

        debug!(function = %message.function, "dispatching rpc call");
        handler(message.payload);

        if let Some(events) = self.inner.events.as_ref().and_then(WeakEventContext::upgrade) {
            events.execute_active_events();
        }
        Ok(())
    }

    /// Call a remote function with a serialized payload.
    pub fn call_remote<P>(&self, function: &str, payload: &P) -> Result<(), RpcError>
    where
        P: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(payload)?;
        self.inner.transport.send(RpcMessage::new(function, payload))
    }

    pub fn remote_callable(&self, name: impl Into<String>) -> RemoteCallable {
        RemoteCallable {
            client: self.clone(),
            name: name.into(),
            back_channel: None,
        }
    }

    /// A callable whose calls are answered through `callback`.
    pub fn remote_callable_with_back_channel<F>(&self, name: impl Into<String>, callback: F) -> RemoteCallable
    where
        F: Fn(Value) + 'static,
    {
        RemoteCallable {
            client: self.clone(),
            name: name.into(),
            back_channel: Some(Rc::new(callback)),
        }
    }

    fn next_response_id(&self, name: &str) -> String {
        let n = self.inner.next_response.get();
        self.inner.next_response.set(n + 1);
        format!("{name}::response::{n}")
    }

    fn downgrade(&self) -> Weak<ClientInner> {
        Rc::downgrade(&self.inner)
    }
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("functions", &self.inner.functions.borrow().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A named remote function.
#[derive(Clone)]
pub struct RemoteCallable {
    client: RpcClient,
    name: String,
    back_channel: Option<RpcHandler>,
}

impl RemoteCallable {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send one call. With a back channel, the callback runs once when the
    /// answer arrives.
    pub fn call<A>(&self, args: &A) -> Result<(), RpcError>
    where
        A: Serialize + ?Sized,
    {
        let Some(callback) = &self.back_channel else {
            return self.send(args);
        };

        let response_id = self.client.next_response_id(&self.name);
        let client = self.client.downgrade();
        let callback = callback.clone();
        let own_name = response_id.clone();
        self.client.register_function(response_id.clone(), move |response| {
            if let Some(inner) = client.upgrade() {
                RpcClient { inner }.unregister_function(&own_name);
            }
            callback(response);
        });

        let args = serde_json::to_value(args);
        let sent = args
            .map_err(RpcError::from)
            .and_then(|args| self.client.call_remote(&self.name, &(response_id.as_str(), args)));
        if sent.is_err() {
            self.client.unregister_function(&response_id);
        }
        sent.inspect_err(|err| error!(function = %self.name, %err, "remote call failed"))
    }

    fn send<A>(&self, args: &A) -> Result<(), RpcError>
    where
        A: Serialize + ?Sized,
    {
        self.client
            .call_remote(&self.name, args)
            .inspect_err(|err| error!(function = %self.name, %err, "remote call failed"))
    }
}

impl fmt::Debug for RemoteCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCallable")
            .field("name", &self.name)
            .field("back_channel", &self.back_channel.is_some())
            .finish()
    }
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
