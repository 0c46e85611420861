//! Runtime
//!
//! A [`Runtime`] is the explicit context every render call receives: the
//! live DOM (host plus node arena), the event context that reactive
//! bindings register into, and the root node renders attach to.
//!
//! The application owns the runtime. Handles are cheap to clone; reactive
//! events keep a [`WeakRuntime`] so the runtime is torn down with the last
//! application handle.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dom::{Dom, DomHost, NodeRef};
use crate::element::reactive::FragmentStack;
use crate::element::{ElementRenderer, Renderer};
use crate::event::{EventContext, EventContextConfig, WeakEventContext};

/// Runtime configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub events: EventContextConfig,
}

impl RuntimeConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Explicit rendering context.
///
/// # Example
///
/// ```rust,ignore
/// let document = MemoryDom::new();
/// let runtime = Runtime::new(Rc::new(document.clone()));
///
/// let name = Observed::new(String::from("world"));
/// runtime.render(&p([]).text_observed(&name));
///
/// name.set(String::from("trellis"));
/// runtime.execute_active_events();
/// ```
#[derive(Clone)]
pub struct Runtime {
    dom: Dom,
    events: EventContext,
    root: NodeRef,
    fragments: FragmentStack,
}

/// Non-owning handle to a [`Runtime`].
#[derive(Clone)]
pub struct WeakRuntime {
    dom: Dom,
    events: WeakEventContext,
    root: NodeRef,
    fragments: FragmentStack,
}

impl WeakRuntime {
    pub fn upgrade(&self) -> Option<Runtime> {
        Some(Runtime {
            dom: self.dom.clone(),
            events: self.events.upgrade()?,
            root: self.root,
            fragments: self.fragments.clone(),
        })
    }
}

impl Runtime {
    /// Create a runtime rendering into `host`'s body.
    pub fn new(host: Rc<dyn DomHost>) -> Self {
        Self::with_config(host, RuntimeConfig::default())
    }

    pub fn with_config(host: Rc<dyn DomHost>, config: RuntimeConfig) -> Self {
        let dom = Dom::new(host);
        let root = dom.adopt(dom.host().body());
        debug!(?config, "runtime created");
        Self {
            dom,
            events: EventContext::with_config(config.events),
            root,
            fragments: FragmentStack::default(),
        }
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn events(&self) -> &EventContext {
        &self.events
    }

    /// The node wrapping the host's body.
    pub fn root(&self) -> NodeRef {
        self.root
    }

    pub fn downgrade(&self) -> WeakRuntime {
        WeakRuntime {
            dom: self.dom.clone(),
            events: self.events.downgrade(),
            root: self.root,
            fragments: self.fragments.clone(),
        }
    }

    pub(crate) fn fragment_scopes(&self) -> &FragmentStack {
        &self.fragments
    }

    /// Append `renderer`'s output to the root.
    pub fn render(&self, renderer: &ElementRenderer) -> Option<NodeRef> {
        renderer(self, self.root, &Renderer::append())
    }

    /// Destroy `node` and its subtree, and unregister their reactive
    /// bindings. Stale handles are ignored.
    pub fn destroy(&self, node: NodeRef) {
        for id in self.dom.destroy(node) {
            self.events.remove_event(id);
        }
    }

    /// Destroy every child and fragment member of `node`. Stable children are
    /// detached instead.
    pub fn clear_children(&self, node: NodeRef) {
        for child in self.dom.take_children(node) {
            self.discard(child);
        }
    }

    /// Destroy `node`, or detach it if it is stable.
    pub(crate) fn discard(&self, node: NodeRef) {
        if self.dom.is_stable(node) {
            self.detach(node);
        } else {
            self.destroy(node);
        }
    }

    /// Take `node` out of the tree without destroying it.
    pub(crate) fn detach(&self, node: NodeRef) {
        self.dom.unlink(node);
        if let Some(native) = self.dom.native(node) {
            self.dom.host().remove(native);
        }
    }

    /// Report a problem to the log and the host console.
    pub fn warn(&self, message: &str) {
        warn!("{message}");
        self.dom.host().warn(message);
    }

    /// Drain the event context.
    pub fn execute_active_events(&self) {
        self.events.execute_active_events();
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("dom", &self.dom)
            .field("events", &self.events)
            .field("root", &self.root)
            .finish()
    }
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;
    use crate::element::{class, div, span};
    use crate::reactive::Observed;

    fn setup() -> (Runtime, MemoryDom) {
        let document = MemoryDom::new();
        let runtime = Runtime::new(Rc::new(document.clone()));
        (runtime, document)
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config = RuntimeConfig::from_json(r#"{ "events": {} }"#).expect("valid json");
        assert_eq!(config, RuntimeConfig::default());

        let config = RuntimeConfig::from_json(r#"{ "events": { "clean_interval": 8 } }"#).expect("valid json");
        assert_eq!(config.events.clean_interval, 8);
    }

    #[test]
    fn render_appends_to_body() {
        let (rt, document) = setup();
        rt.render(&div([class().value("app")]).text("hi"));
        assert_eq!(document.inner_html(document.body()), r#"<div class="app">hi</div>"#);
    }

    #[test]
    fn destroy_unregisters_bindings() {
        let (rt, document) = setup();
        let label = Observed::new(String::from("a"));
        let node = rt.render(&div([class().observed(&label)]).render()).expect("rendered");
        assert_eq!(rt.events().event_count(), 1);

        rt.destroy(node);
        assert_eq!(rt.events().event_count(), 0);
        assert_eq!(document.inner_html(document.body()), "");
    }

    #[test]
    fn clear_children_detaches_stable_nodes() {
        let (rt, document) = setup();
        let container = rt.render(&div([]).render()).expect("rendered");
        let kept = rt.append_element(container, &span([])).expect("created");
        let dropped = rt.append_element(container, &span([])).expect("created");
        rt.dom().set_stable(kept, true);

        rt.clear_children(container);

        assert!(rt.dom().is_alive(kept));
        assert!(!rt.dom().is_alive(dropped));
        assert_eq!(rt.dom().parent(kept), None);
        assert_eq!(document.inner_html(document.body()), "<div></div>");
    }

    #[test]
    fn weak_runtime_expires_with_event_context() {
        let (rt, _document) = setup();
        let weak = rt.downgrade();
        assert!(weak.upgrade().is_some());
        drop(rt);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn warn_reaches_host_console() {
        let (rt, document) = setup();
        rt.warn("careful");
        assert_eq!(document.warnings(), vec!["careful".to_owned()]);
    }
}
