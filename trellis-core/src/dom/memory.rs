//! In-Memory DOM
//!
//! `MemoryDom` is a small document model implementing [`DomHost`]. It backs
//! headless rendering and every test in this crate: tests keep a clone of
//! the handle to inspect what the core did to the tree.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use super::host::{DomHost, DomListener, NativeHandle};
use crate::error::DomError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum MemoryNodeKind {
    Element { tag: String, namespace: Option<String> },
    Text,
    Comment,
}

struct MemoryNode {
    kind: MemoryNodeKind,
    attributes: IndexMap<String, String>,
    properties: IndexMap<String, Value>,
    /// Data of text and comment nodes.
    data: String,
    parent: Option<NativeHandle>,
    children: Vec<NativeHandle>,
    listeners: Vec<(String, DomListener)>,
}

impl MemoryNode {
    fn new(kind: MemoryNodeKind, data: &str) -> Self {
        Self {
            kind,
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
            data: data.to_owned(),
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

struct Document {
    nodes: HashMap<NativeHandle, MemoryNode>,
    body: NativeHandle,
    next: u64,
    warnings: Vec<String>,
}

impl Document {
    fn new() -> Self {
        let body = NativeHandle::from_raw(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            body,
            MemoryNode::new(
                MemoryNodeKind::Element {
                    tag: "body".to_owned(),
                    namespace: None,
                },
                "",
            ),
        );
        Self {
            nodes,
            body,
            next: 1,
            warnings: Vec::new(),
        }
    }

    fn insert(&mut self, node: MemoryNode) -> NativeHandle {
        let handle = NativeHandle::from_raw(self.next);
        self.next += 1;
        self.nodes.insert(handle, node);
        handle
    }

    fn detach(&mut self, node: NativeHandle) {
        let parent = self.nodes.get_mut(&node).and_then(|n| n.parent.take());
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| *child != node);
        }
    }

    fn set_parent(&mut self, node: NativeHandle, parent: NativeHandle) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.parent = Some(parent);
        }
    }

    fn text_content(&self, node: NativeHandle, out: &mut String) {
        let Some(entry) = self.nodes.get(&node) else {
            return;
        };
        match entry.kind {
            MemoryNodeKind::Text => out.push_str(&entry.data),
            MemoryNodeKind::Comment => {}
            MemoryNodeKind::Element { .. } => {
                for child in &entry.children {
                    self.text_content(*child, out);
                }
            }
        }
    }

    fn outer_html(&self, node: NativeHandle, out: &mut String) {
        let Some(entry) = self.nodes.get(&node) else {
            return;
        };
        match &entry.kind {
            MemoryNodeKind::Text => out.push_str(&escape(&entry.data)),
            MemoryNodeKind::Comment => {
                let _ = write!(out, "<!--{}-->", entry.data);
            }
            MemoryNodeKind::Element { tag, .. } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in &entry.attributes {
                    let _ = write!(out, " {}=\"{}\"", key, escape(value));
                }
                out.push('>');
                for child in &entry.children {
                    self.outer_html(*child, out);
                }
                let _ = write!(out, "</{}>", tag);
            }
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Shared handle to an in-memory document.
///
/// # Example
///
/// ```rust,ignore
/// let document = MemoryDom::new();
/// let runtime = Runtime::new(Rc::new(document.clone()));
///
/// runtime.render(&div([]).text("hello"));
/// assert_eq!(document.inner_html(document.body()), "<div>hello</div>");
/// ```
#[derive(Clone)]
pub struct MemoryDom {
    document: Rc<RefCell<Document>>,
}

impl MemoryDom {
    /// Create a document holding only an empty `<body>`.
    pub fn new() -> Self {
        Self {
            document: Rc::new(RefCell::new(Document::new())),
        }
    }

    /// Whether the handle refers to a node that was not released.
    pub fn contains(&self, node: NativeHandle) -> bool {
        self.document.borrow().nodes.contains_key(&node)
    }

    /// Number of nodes that were not released, the body included.
    pub fn node_count(&self) -> usize {
        self.document.borrow().nodes.len()
    }

    pub fn parent(&self, node: NativeHandle) -> Option<NativeHandle> {
        self.document.borrow().nodes.get(&node)?.parent
    }

    pub fn children(&self, node: NativeHandle) -> Vec<NativeHandle> {
        self.document
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Tag name of an element; `None` for text and comment nodes.
    pub fn tag_name(&self, node: NativeHandle) -> Option<String> {
        match &self.document.borrow().nodes.get(&node)?.kind {
            MemoryNodeKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn namespace(&self, node: NativeHandle) -> Option<String> {
        match &self.document.borrow().nodes.get(&node)?.kind {
            MemoryNodeKind::Element { namespace, .. } => namespace.clone(),
            _ => None,
        }
    }

    pub fn is_text(&self, node: NativeHandle) -> bool {
        self.document
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.kind == MemoryNodeKind::Text)
            .unwrap_or(false)
    }

    pub fn is_comment(&self, node: NativeHandle) -> bool {
        self.document
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.kind == MemoryNodeKind::Comment)
            .unwrap_or(false)
    }

    pub fn attribute(&self, node: NativeHandle, key: &str) -> Option<String> {
        self.document.borrow().nodes.get(&node)?.attributes.get(key).cloned()
    }

    pub fn property(&self, node: NativeHandle, key: &str) -> Option<Value> {
        self.document.borrow().nodes.get(&node)?.properties.get(key).cloned()
    }

    /// Data of a text or comment node.
    pub fn node_value(&self, node: NativeHandle) -> Option<String> {
        let document = self.document.borrow();
        let entry = document.nodes.get(&node)?;
        match entry.kind {
            MemoryNodeKind::Element { .. } => None,
            _ => Some(entry.data.clone()),
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NativeHandle) -> String {
        let mut out = String::new();
        self.document.borrow().text_content(node, &mut out);
        out
    }

    /// Serialized node, children included.
    pub fn outer_html(&self, node: NativeHandle) -> String {
        let mut out = String::new();
        self.document.borrow().outer_html(node, &mut out);
        out
    }

    /// Serialized children of a node.
    pub fn inner_html(&self, node: NativeHandle) -> String {
        let document = self.document.borrow();
        let mut out = String::new();
        if let Some(entry) = document.nodes.get(&node) {
            for child in &entry.children {
                document.outer_html(*child, &mut out);
            }
        }
        out
    }

    /// Warnings printed through [`DomHost::warn`].
    pub fn warnings(&self) -> Vec<String> {
        self.document.borrow().warnings.clone()
    }

    /// Call every listener registered for `event` on `node`.
    ///
    /// Returns the number of listeners called.
    pub fn dispatch_event(&self, node: NativeHandle, event: &str, payload: Value) -> usize {
        let listeners: Vec<DomListener> = match self.document.borrow().nodes.get(&node) {
            Some(entry) => entry
                .listeners
                .iter()
                .filter(|(name, _)| name == event)
                .map(|(_, listener)| listener.clone())
                .collect(),
            None => Vec::new(),
        };

        for listener in &listeners {
            listener(&payload);
        }
        listeners.len()
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl DomHost for MemoryDom {
    fn body(&self) -> NativeHandle {
        self.document.borrow().body
    }

    fn create_element(&self, tag: &str) -> NativeHandle {
        let kind = MemoryNodeKind::Element {
            tag: tag.to_owned(),
            namespace: None,
        };
        self.document.borrow_mut().insert(MemoryNode::new(kind, ""))
    }

    fn create_element_ns(&self, namespace: &str, tag: &str) -> NativeHandle {
        let kind = MemoryNodeKind::Element {
            tag: tag.to_owned(),
            namespace: Some(namespace.to_owned()),
        };
        self.document.borrow_mut().insert(MemoryNode::new(kind, ""))
    }

    fn create_text_node(&self, text: &str) -> NativeHandle {
        self.document
            .borrow_mut()
            .insert(MemoryNode::new(MemoryNodeKind::Text, text))
    }

    fn create_comment(&self, text: &str) -> NativeHandle {
        self.document
            .borrow_mut()
            .insert(MemoryNode::new(MemoryNodeKind::Comment, text))
    }

    fn set_attribute(&self, node: NativeHandle, key: &str, value: &str) {
        if let Some(entry) = self.document.borrow_mut().nodes.get_mut(&node) {
            entry.attributes.insert(key.to_owned(), value.to_owned());
        }
    }

    fn remove_attribute(&self, node: NativeHandle, key: &str) {
        if let Some(entry) = self.document.borrow_mut().nodes.get_mut(&node) {
            entry.attributes.shift_remove(key);
        }
    }

    fn set_property(&self, node: NativeHandle, key: &str, value: Value) {
        if let Some(entry) = self.document.borrow_mut().nodes.get_mut(&node) {
            entry.properties.insert(key.to_owned(), value);
        }
    }

    fn get_property(&self, node: NativeHandle, key: &str) -> Value {
        match key {
            "textContent" => Value::String(self.text_content(node)),
            "nodeValue" => self.node_value(node).map(Value::String).unwrap_or(Value::Null),
            _ => self.property(node, key).unwrap_or(Value::Null),
        }
    }

    fn append_child(&self, parent: NativeHandle, child: NativeHandle) {
        let mut document = self.document.borrow_mut();
        if !document.nodes.contains_key(&parent) {
            return;
        }
        document.detach(child);
        document.set_parent(child, parent);
        if let Some(entry) = document.nodes.get_mut(&parent) {
            entry.children.push(child);
        }
    }

    fn insert_before(&self, parent: NativeHandle, child: NativeHandle, reference: NativeHandle) {
        let mut document = self.document.borrow_mut();
        if !document.nodes.contains_key(&parent) {
            return;
        }
        document.detach(child);
        document.set_parent(child, parent);
        if let Some(entry) = document.nodes.get_mut(&parent) {
            match entry.children.iter().position(|c| *c == reference) {
                Some(index) => entry.children.insert(index, child),
                None => entry.children.push(child),
            }
        }
    }

    fn replace_with(&self, node: NativeHandle, replacement: NativeHandle) {
        let mut document = self.document.borrow_mut();
        let Some(parent) = document.nodes.get(&node).and_then(|n| n.parent) else {
            return;
        };
        document.detach(replacement);
        if let Some(entry) = document.nodes.get_mut(&parent) {
            if let Some(slot) = entry.children.iter_mut().find(|c| **c == node) {
                *slot = replacement;
            }
        }
        document.set_parent(replacement, parent);
        if let Some(entry) = document.nodes.get_mut(&node) {
            entry.parent = None;
        }
    }

    fn remove(&self, node: NativeHandle) {
        self.document.borrow_mut().detach(node);
    }

    fn set_text_content(&self, node: NativeHandle, text: &str) {
        let mut document = self.document.borrow_mut();
        let is_element = match document.nodes.get(&node) {
            Some(entry) => matches!(entry.kind, MemoryNodeKind::Element { .. }),
            None => return,
        };

        if !is_element {
            if let Some(entry) = document.nodes.get_mut(&node) {
                entry.data = text.to_owned();
            }
            return;
        }

        let children = document
            .nodes
            .get_mut(&node)
            .map(|entry| std::mem::take(&mut entry.children))
            .unwrap_or_default();
        for child in children {
            if let Some(entry) = document.nodes.get_mut(&child) {
                entry.parent = None;
            }
        }
        if !text.is_empty() {
            let text_node = document.insert(MemoryNode::new(MemoryNodeKind::Text, text));
            document.set_parent(text_node, node);
            if let Some(entry) = document.nodes.get_mut(&node) {
                entry.children.push(text_node);
            }
        }
    }

    fn set_node_value(&self, node: NativeHandle, value: &str) {
        if let Some(entry) = self.document.borrow_mut().nodes.get_mut(&node) {
            if !matches!(entry.kind, MemoryNodeKind::Element { .. }) {
                entry.data = value.to_owned();
            }
        }
    }

    fn add_event_listener(&self, node: NativeHandle, event: &str, listener: DomListener) {
        if let Some(entry) = self.document.borrow_mut().nodes.get_mut(&node) {
            entry.listeners.push((event.to_owned(), listener));
        }
    }

    fn call_method(&self, node: NativeHandle, method: &str, args: &[Value]) -> Result<Value, DomError> {
        let key = args.first().and_then(Value::as_str).unwrap_or_default();
        match method {
            "getAttribute" => Ok(self
                .attribute(node, key)
                .map(Value::String)
                .unwrap_or(Value::Null)),
            "hasAttribute" => Ok(Value::Bool(self.attribute(node, key).is_some())),
            "hasChildNodes" => Ok(Value::Bool(!self.children(node).is_empty())),
            "childElementCount" => {
                let count = self
                    .children(node)
                    .into_iter()
                    .filter(|child| self.tag_name(*child).is_some())
                    .count();
                Ok(Value::from(count))
            }
            _ => Err(DomError::UnsupportedMethod(method.to_owned())),
        }
    }

    fn release(&self, node: NativeHandle) {
        let mut document = self.document.borrow_mut();
        if node == document.body {
            return;
        }
        document.detach(node);
        document.nodes.remove(&node);
    }

    fn warn(&self, message: &str) {
        self.document.borrow_mut().warnings.push(message.to_owned());
    }
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
