use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

use dom::NodeKey;

use crate::element::Element;

/// Prop key carrying the raw value of a text element.
pub const NODE_VALUE: &str = "nodeValue";

/// Context passed to event handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    /// The node the event was dispatched at.
    pub node: NodeKey,
    /// The node whose listener is running (differs from `node` while bubbling).
    pub current: NodeKey,
    /// The event type (e.g. "click", "input").
    pub event_type: String,
}

/// Shared event listener. Two handlers are equal only when they are the same
/// allocation, so a handler kept stable with `use_callback` diffs as unchanged.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&EventContext)>);

impl EventHandler {
    #[inline]
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&EventContext) + 'static,
    {
        Self(Rc::new(handler))
    }

    #[inline]
    pub fn call(&self, context: &EventContext) {
        (self.0)(context);
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "EventHandler({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// A single property value. Everything except handlers is passed to the host
/// as an opaque string.
#[derive(Debug, Clone, Default)]
pub enum PropValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Handler(EventHandler),
}

impl PropValue {
    /// String form handed to the host, or `None` for handlers.
    pub fn to_attr_string(&self) -> Option<String> {
        match self {
            Self::Null => Some(String::new()),
            Self::Bool(value) => Some(value.to_string()),
            Self::Int(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::Str(value) => Some(value.clone()),
            Self::Handler(_) => None,
        }
    }
}

/// Floats compare bitwise, so a `NaN` prop equals itself and `0.0` differs
/// from `-0.0`, matching the strings the host receives.
impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(left), Self::Bool(right)) => left == right,
            (Self::Int(left), Self::Int(right)) => left == right,
            (Self::Float(left), Self::Float(right)) => left.to_bits() == right.to_bits(),
            (Self::Str(left), Self::Str(right)) => left == right,
            (Self::Handler(left), Self::Handler(right)) => left == right,
            _ => false,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        Self::Handler(value)
    }
}

/// Event name for a listener prop key: `onClick` listens for `click`.
pub fn event_name(key: &str) -> Option<String> {
    key.strip_prefix("on")
        .filter(|rest| !rest.is_empty())
        .map(str::to_lowercase)
}

/// Property mapping of an element. Keys are kept sorted so diffs and host
/// updates come out in a stable order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    attrs: BTreeMap<String, PropValue>,
    children: Vec<Element>,
}

impl Props {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Props::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        self.attrs.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.attrs.get(key)
    }

    /// Convenience accessor for string props.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.attrs.get(key)? {
            PropValue::Str(value) => Some(value),
            PropValue::Null
            | PropValue::Bool(_)
            | PropValue::Int(_)
            | PropValue::Float(_)
            | PropValue::Handler(_) => None,
        }
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attrs.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn set_children(&mut self, children: Vec<Element>) {
        self.children = children;
    }

    pub(crate) fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }
}

/// Host-facing difference between two prop mappings, in the order the host
/// must apply it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropsDiff {
    /// Events whose listener disappeared or changed.
    pub removed_listeners: Vec<String>,
    /// Attributes absent from the new props.
    pub removed_attrs: Vec<String>,
    /// Attributes that are new or changed.
    pub set_attrs: Vec<(String, PropValue)>,
    /// Events with a new or changed listener.
    pub added_listeners: Vec<(String, EventHandler)>,
}

impl PropsDiff {
    pub fn is_empty(&self) -> bool {
        self.removed_listeners.is_empty()
            && self.removed_attrs.is_empty()
            && self.set_attrs.is_empty()
            && self.added_listeners.is_empty()
    }

    /// Number of individual entries in the diff.
    pub fn len(&self) -> usize {
        self.removed_listeners.len()
            + self.removed_attrs.len()
            + self.set_attrs.len()
            + self.added_listeners.len()
    }

    /// Value to set for `key`, if the diff sets it.
    pub fn set_value(&self, key: &str) -> Option<&PropValue> {
        self.set_attrs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

/// Compute the delta that turns `prev` into `next` on a host node.
///
/// `children` never take part; they are reconciled as fibers.
pub fn diff(prev: &Props, next: &Props) -> PropsDiff {
    let mut delta = PropsDiff::default();
    for (key, old) in &prev.attrs {
        let new = next.attrs.get(key);
        match event_name(key) {
            Some(event) => {
                if new != Some(old) {
                    delta.removed_listeners.push(event);
                }
            }
            None => {
                if new.is_none() {
                    delta.removed_attrs.push(key.clone());
                }
            }
        }
    }
    for (key, value) in &next.attrs {
        if prev.attrs.get(key) == Some(value) {
            continue;
        }
        match (event_name(key), value) {
            (Some(event), PropValue::Handler(handler)) => {
                delta.added_listeners.push((event, handler.clone()));
            }
            (Some(_), _) => {}
            (None, _) => delta.set_attrs.push((key.clone(), value.clone())),
        }
    }
    delta
}
