//! Immutable element descriptors and the builders that produce them.

use core::any::{TypeId, type_name};
use core::fmt;
use std::rc::Rc;

use anyhow::Error;

use crate::hooks::Hooks;
use crate::props::{EventHandler, NODE_VALUE, PropValue, Props};

/// Signature of a component's render function.
pub type RenderFn = dyn Fn(&mut Hooks<'_>, &Props) -> Result<Element, Error>;

/// A component render function together with its identity.
///
/// Identity is the Rust type of the function, so every element built from
/// the same `fn` item (or the same closure expression) reconciles as the same
/// component, whatever it captured.
#[derive(Clone)]
pub struct ComponentFn {
    id: TypeId,
    name: &'static str,
    render: Rc<RenderFn>,
}

impl ComponentFn {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&mut Hooks<'_>, &Props) -> Result<Element, Error> + 'static,
    {
        let full = type_name::<F>();
        let name = full.rsplit("::").next().unwrap_or(full);
        Self {
            id: TypeId::of::<F>(),
            name,
            render: Rc::new(render),
        }
    }

    /// Short type name used in diagnostics.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(&self, hooks: &mut Hooks<'_>, props: &Props) -> Result<Element, Error> {
        (self.render)(hooks, props)
    }
}

impl PartialEq for ComponentFn {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for ComponentFn {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "Component({})", self.name)
    }
}

/// What an element renders as.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    Host(String),
    Text,
    Component(ComponentFn),
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        Self::Host(tag.to_owned())
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        Self::Host(tag)
    }
}

impl From<ComponentFn> for ElementType {
    fn from(component: ComponentFn) -> Self {
        Self::Component(component)
    }
}

/// Immutable description of one node and its children. Clones share props.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    ty: ElementType,
    props: Rc<Props>,
}

impl Element {
    pub fn new(ty: ElementType, props: Props) -> Self {
        Self {
            ty,
            props: Rc::new(props),
        }
    }

    /// A host element such as `div`.
    pub fn host(tag: impl Into<String>) -> Self {
        Self::new(ElementType::Host(tag.into()), Props::new())
    }

    /// A text element carrying `value` as its `nodeValue`.
    pub fn text(value: impl Into<PropValue>) -> Self {
        Self::new(ElementType::Text, Props::new().with(NODE_VALUE, value))
    }

    pub fn component<F>(render: F) -> Self
    where
        F: Fn(&mut Hooks<'_>, &Props) -> Result<Element, Error> + 'static,
    {
        Self::new(ElementType::Component(ComponentFn::new(render)), Props::new())
    }

    pub const fn ty(&self) -> &ElementType {
        &self.ty
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn shared_props(&self) -> Rc<Props> {
        Rc::clone(&self.props)
    }

    #[must_use]
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.props).insert(key, value);
        self
    }

    /// Attach a listener; `on("click", ..)` is stored under the `onclick` key.
    #[must_use]
    pub fn on(self, event: &str, handler: EventHandler) -> Self {
        self.prop(format!("on{event}"), handler)
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        Rc::make_mut(&mut self.props).push_child(child.into().into_element());
        self
    }

    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Child>,
    {
        let props = Rc::make_mut(&mut self.props);
        for child in children {
            props.push_child(child.into().into_element());
        }
        self
    }
}

/// A child as accepted by the builders: an element or a primitive that gets
/// wrapped into a text element.
#[derive(Debug, Clone)]
pub enum Child {
    Element(Element),
    Value(PropValue),
}

impl Child {
    pub fn into_element(self) -> Element {
        match self {
            Self::Element(element) => element,
            Self::Value(value) => Element::text(value),
        }
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Self::Value(value.into())
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        Self::Value(value.into())
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Self::Value(value.into())
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Self::Value(value.into())
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Self::Value(value.into())
    }
}

/// Build an element from a type, its props and its children.
///
/// Primitive children become text elements; the children replace any that
/// `props` already carried.
pub fn create_element<I>(ty: impl Into<ElementType>, mut props: Props, children: I) -> Element
where
    I: IntoIterator,
    I::Item: Into<Child>,
{
    props.set_children(
        children
            .into_iter()
            .map(|child| child.into().into_element())
            .collect(),
    );
    Element::new(ty.into(), props)
}
