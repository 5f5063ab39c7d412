use std::collections::HashMap;

use anyhow::{Context as _, Error, anyhow, bail};
use indextree::{Arena, Node, NodeId};
use log::trace;
use smallvec::SmallVec;

use crate::{DOMSubscriber, DOMUpdate, NodeKey};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeKind {
    #[default]
    Document,
    Element {
        tag: String,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DOMNode {
    pub key: NodeKey,
    pub kind: NodeKind,
    pub attrs: SmallVec<(String, String), 4>,
    pub listeners: SmallVec<String, 2>,
}

impl DOMNode {
    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(attr_name, _)| attr_name == name)
            .map(|(_, value)| value.as_str())
    }

    fn set_attr(&mut self, name: String, value: String) {
        if let Some(entry) = self.attrs.iter_mut().find(|(attr_name, _)| *attr_name == name) {
            entry.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }

    fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|entry| entry.0 != name);
    }
}

/// Arena-backed document. Nodes created by updates start detached and join the
/// visible tree when appended under the root (directly or transitively).
#[derive(Clone)]
pub struct Document {
    pub(crate) dom: Arena<DOMNode>,
    pub(crate) root: NodeId,
    index: HashMap<NodeKey, NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut dom = Arena::new();
        let root = dom.new_node(DOMNode::default());
        let mut index = HashMap::new();
        index.insert(NodeKey::ROOT, root);
        Self { dom, root, index }
    }

    /// Whether the key names a live node (attached or detached).
    pub fn contains(&self, key: NodeKey) -> bool {
        self.index.contains_key(&key)
    }

    /// Number of live nodes, including the root.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.len() <= 1
    }

    pub fn node(&self, key: NodeKey) -> Option<&DOMNode> {
        let id = self.index.get(&key)?;
        self.dom.get(*id).map(Node::get)
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        let id = self.index.get(&key)?;
        let parent = self.dom.get(*id)?.parent()?;
        self.dom.get(parent).map(|node| node.get().key)
    }

    /// Children of a node in document order.
    pub fn children(&self, key: NodeKey) -> Vec<NodeKey> {
        let Some(id) = self.index.get(&key) else {
            return Vec::new();
        };
        id.children(&self.dom)
            .filter_map(|child| self.dom.get(child).map(|node| node.get().key))
            .collect()
    }

    /// Concatenated text of every text node below `key`, in document order.
    pub fn text_content(&self, key: NodeKey) -> String {
        let Some(id) = self.index.get(&key) else {
            return String::new();
        };
        id.descendants(&self.dom)
            .filter_map(|desc| match &self.dom.get(desc)?.get().kind {
                NodeKind::Text { text } => Some(text.as_str()),
                NodeKind::Document | NodeKind::Element { .. } => None,
            })
            .collect()
    }

    /// Keys of all nodes reachable from the root whose tag matches (case-insensitive).
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeKey> {
        self.root
            .descendants(&self.dom)
            .filter_map(|desc| {
                let node = self.dom.get(desc)?.get();
                match &node.kind {
                    NodeKind::Element { tag: node_tag } if node_tag.eq_ignore_ascii_case(tag) => {
                        Some(node.key)
                    }
                    NodeKind::Document | NodeKind::Element { .. } | NodeKind::Text { .. } => None,
                }
            })
            .collect()
    }

    fn lookup(&self, key: NodeKey) -> Result<NodeId, Error> {
        self.index
            .get(&key)
            .copied()
            .ok_or_else(|| anyhow!("Unknown node {key:?}"))
    }

    fn node_mut(&mut self, key: NodeKey) -> Result<&mut DOMNode, Error> {
        let id = self.lookup(key)?;
        self.dom
            .get_mut(id)
            .map(Node::get_mut)
            .ok_or_else(|| anyhow!("Node {key:?} was removed from the arena"))
    }

    fn insert_node(&mut self, key: NodeKey, kind: NodeKind) -> Result<(), Error> {
        if self.index.contains_key(&key) {
            bail!("Node {key:?} already exists");
        }
        let id = self.dom.new_node(DOMNode {
            key,
            kind,
            ..DOMNode::default()
        });
        self.index.insert(key, id);
        Ok(())
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let keys: Vec<NodeKey> = id
            .descendants(&self.dom)
            .filter_map(|desc| self.dom.get(desc).map(|node| node.get().key))
            .collect();
        for key in keys {
            self.index.remove(&key);
        }
        id.remove_subtree(&mut self.dom);
    }
}

impl DOMSubscriber for Document {
    fn apply_update(&mut self, update: DOMUpdate) -> Result<(), Error> {
        trace!("Applying {update:?}");
        let target = update.target();
        self.apply(update)
            .with_context(|| format!("Rejected update targeting {target:?}"))
    }
}

impl Document {
    fn apply(&mut self, update: DOMUpdate) -> Result<(), Error> {
        match update {
            DOMUpdate::CreateElement { node, tag } => self.insert_node(node, NodeKind::Element { tag }),
            DOMUpdate::CreateText { node, text } => self.insert_node(node, NodeKind::Text { text }),
            DOMUpdate::SetAttr { node, name, value } => {
                self.node_mut(node)?.set_attr(name, value);
                Ok(())
            }
            DOMUpdate::RemoveAttr { node, name } => {
                self.node_mut(node)?.remove_attr(&name);
                Ok(())
            }
            DOMUpdate::SetText { node, text } => match &mut self.node_mut(node)?.kind {
                NodeKind::Text { text: current } => {
                    *current = text;
                    Ok(())
                }
                NodeKind::Document | NodeKind::Element { .. } => {
                    Err(anyhow!("SetText on non-text node {node:?}"))
                }
            },
            DOMUpdate::AddListener { node, event } => {
                let target = self.node_mut(node)?;
                if !target.listeners.contains(&event) {
                    target.listeners.push(event);
                }
                Ok(())
            }
            DOMUpdate::RemoveListener { node, event } => {
                self.node_mut(node)?.listeners.retain(|name| *name != event);
                Ok(())
            }
            DOMUpdate::AppendChild { parent, child } => {
                let parent_id = self.lookup(parent)?;
                let child_id = self.lookup(child)?;
                child_id.detach(&mut self.dom);
                parent_id.checked_append(child_id, &mut self.dom)?;
                Ok(())
            }
            DOMUpdate::RemoveChild { parent, child } => {
                let parent_id = self.lookup(parent)?;
                let child_id = self.lookup(child)?;
                let actual = self.dom.get(child_id).and_then(Node::parent);
                if actual != Some(parent_id) {
                    bail!("Node {child:?} is not a child of {parent:?}");
                }
                self.remove_subtree(child_id);
                Ok(())
            }
        }
    }
}
