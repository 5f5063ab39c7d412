use std::rc::Rc;

use anyhow::Error;
use dom::NodeKey;
use indextree::{Arena, Node, NodeId};

use crate::element::{Element, ElementType};
use crate::error::RenderError;
use crate::hooks::HookSlot;
use crate::props::Props;

/// Host mutation a fiber needs at commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectTag {
    #[default]
    None,
    Placement,
    Update,
    Deletion,
}

/// One unit of render work. Tree links live in the arena; `alternate` points
/// at the counterpart in the committed tree while a pass is in flight.
#[derive(Debug)]
pub(crate) struct Fiber {
    /// `None` for the root fiber, which stands for the render container.
    pub ty: Option<ElementType>,
    pub props: Rc<Props>,
    pub host: Option<NodeKey>,
    pub alternate: Option<NodeId>,
    pub effect_tag: EffectTag,
    pub hooks: Vec<HookSlot>,
}

impl Fiber {
    pub(crate) fn root(container: NodeKey, element: Element, alternate: Option<NodeId>) -> Self {
        let mut props = Props::new();
        props.set_children(vec![element]);
        Self {
            ty: None,
            props: Rc::new(props),
            host: Some(container),
            alternate,
            effect_tag: EffectTag::None,
            hooks: Vec::new(),
        }
    }

    pub(crate) fn placement(element: &Element) -> Self {
        Self {
            ty: Some(element.ty().clone()),
            props: element.shared_props(),
            host: None,
            alternate: None,
            effect_tag: EffectTag::Placement,
            hooks: Vec::new(),
        }
    }

    pub(crate) fn update(element: &Element, host: Option<NodeKey>, alternate: NodeId) -> Self {
        Self {
            ty: Some(element.ty().clone()),
            props: element.shared_props(),
            host,
            alternate: Some(alternate),
            effect_tag: EffectTag::Update,
            hooks: Vec::new(),
        }
    }

    /// Short label for logs and errors.
    pub(crate) fn describe(&self) -> String {
        match &self.ty {
            None => "#root".to_owned(),
            Some(ElementType::Host(tag)) => format!("<{tag}>"),
            Some(ElementType::Text) => "#text".to_owned(),
            Some(ElementType::Component(component)) => component.name().to_owned(),
        }
    }
}

pub(crate) fn fiber(arena: &Arena<Fiber>, id: NodeId) -> Result<&Fiber, Error> {
    if id.is_removed(arena) {
        return Err(RenderError::MissingFiber.into());
    }
    arena
        .get(id)
        .map(Node::get)
        .ok_or_else(|| RenderError::MissingFiber.into())
}

pub(crate) fn fiber_mut(arena: &mut Arena<Fiber>, id: NodeId) -> Result<&mut Fiber, Error> {
    if id.is_removed(arena) {
        return Err(RenderError::MissingFiber.into());
    }
    arena
        .get_mut(id)
        .map(Node::get_mut)
        .ok_or_else(|| RenderError::MissingFiber.into())
}

/// The unit to work on after `finished`: its first child, else the nearest
/// next sibling of itself or an ancestor below `root`, else none.
pub(crate) fn next_unit(arena: &Arena<Fiber>, finished: NodeId, root: NodeId) -> Option<NodeId> {
    let node = arena.get(finished)?;
    if let Some(child) = node.first_child() {
        return Some(child);
    }
    let mut cursor = finished;
    while cursor != root {
        let current = arena.get(cursor)?;
        if let Some(sibling) = current.next_sibling() {
            return Some(sibling);
        }
        cursor = current.parent()?;
    }
    None
}
