//! The boundary between the committer and a display surface.

use core::mem;
use std::collections::HashMap;

use anyhow::{Error, anyhow, bail};
use dom::{DOMSubscriber as _, DOMUpdate, Document, NodeKey, NodeKeyManager};
use log::{debug, trace};
use tokio::sync::broadcast;

use crate::props::{EventContext, EventHandler, NODE_VALUE, PropValue, PropsDiff};

/// What kind of host node to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKind {
    Element(String),
    Text,
}

/// Capabilities the committer needs from a display surface.
///
/// Calls only happen during a commit. `finish_commit` closes a commit that
/// went through; `abort_commit` is called instead when it failed part way.
pub trait HostAdapter {
    /// Create a detached node and apply its initial props.
    ///
    /// # Errors
    /// Implementation defined.
    fn create_node(&mut self, kind: &HostKind, initial: &PropsDiff) -> Result<NodeKey, Error>;

    /// Apply a non-empty prop delta to an existing node.
    ///
    /// # Errors
    /// Implementation defined.
    fn apply_props(&mut self, node: NodeKey, diff: &PropsDiff) -> Result<(), Error>;

    /// Append `child` as the last child of `parent`.
    ///
    /// # Errors
    /// Implementation defined.
    fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), Error>;

    /// Remove `child` and everything below it from `parent`.
    ///
    /// # Errors
    /// Implementation defined.
    fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), Error>;

    /// Whether `node` can serve as a render container.
    fn contains(&self, _node: NodeKey) -> bool {
        true
    }

    /// The commit went through; publish whatever was staged.
    ///
    /// # Errors
    /// Implementation defined.
    fn finish_commit(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// The commit failed; drop whatever was staged.
    fn abort_commit(&mut self) {}
}

type Listeners = HashMap<NodeKey, HashMap<String, EventHandler>>;

/// Host adapter over an in-memory [`Document`].
///
/// Every commit becomes one `DOMUpdate` batch that is applied to the owned
/// document and broadcast to subscribers. Listener props are kept in a
/// registry so host events can be dispatched back into components.
pub struct DomHost {
    document: Document,
    keys: NodeKeyManager,
    batch: Vec<DOMUpdate>,
    staged_listeners: Vec<(NodeKey, String, Option<EventHandler>)>,
    listeners: Listeners,
    out_updater: broadcast::Sender<Vec<DOMUpdate>>,
    commits: u64,
}

impl Default for DomHost {
    fn default() -> Self {
        Self::new()
    }
}

impl DomHost {
    pub fn new() -> Self {
        Self::with_channel_capacity(64)
    }

    /// Create a host whose broadcast channel keeps up to `capacity` batches
    /// for slow subscribers.
    pub fn with_channel_capacity(capacity: usize) -> Self {
        let (out_updater, _) = broadcast::channel(capacity.max(1));
        Self {
            document: Document::new(),
            keys: NodeKeyManager::new(1),
            batch: Vec::new(),
            staged_listeners: Vec::new(),
            listeners: HashMap::new(),
            out_updater,
            commits: 0,
        }
    }

    /// Receive every committed batch from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<DOMUpdate>> {
        self.out_updater.subscribe()
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Batches published so far.
    pub const fn commits(&self) -> u64 {
        self.commits
    }

    /// Number of events `node` listens to.
    pub fn listener_count(&self, node: NodeKey) -> usize {
        self.listeners.get(&node).map_or(0, HashMap::len)
    }

    /// Dispatch `event_type` at `node`, running its listener and then those of
    /// its ancestors. Returns how many listeners ran.
    ///
    /// # Errors
    /// Returns an error if `node` is not in the document.
    pub fn dispatch(&self, node: NodeKey, event_type: &str) -> Result<usize, Error> {
        if !self.document.contains(node) {
            bail!("Cannot dispatch {event_type} to unknown node {node:?}");
        }
        let mut invoked = 0;
        let mut current = Some(node);
        while let Some(key) = current {
            if let Some(handler) = self
                .listeners
                .get(&key)
                .and_then(|events| events.get(event_type))
            {
                trace!("Dispatching {event_type} to {key:?}");
                handler.call(&EventContext {
                    node,
                    current: key,
                    event_type: event_type.to_owned(),
                });
                invoked += 1;
            }
            current = self.document.parent(key);
        }
        Ok(invoked)
    }

    fn stage_props(&mut self, node: NodeKey, diff: &PropsDiff) {
        for event in &diff.removed_listeners {
            self.batch.push(DOMUpdate::RemoveListener {
                node,
                event: event.clone(),
            });
            self.staged_listeners.push((node, event.clone(), None));
        }
        for name in &diff.removed_attrs {
            let update = if name == NODE_VALUE {
                DOMUpdate::SetText {
                    node,
                    text: String::new(),
                }
            } else {
                DOMUpdate::RemoveAttr {
                    node,
                    name: name.clone(),
                }
            };
            self.batch.push(update);
        }
        for (name, value) in &diff.set_attrs {
            let Some(text) = value.to_attr_string() else {
                continue;
            };
            let update = if name == NODE_VALUE {
                DOMUpdate::SetText { node, text }
            } else {
                DOMUpdate::SetAttr {
                    node,
                    name: name.clone(),
                    value: text,
                }
            };
            self.batch.push(update);
        }
        for (event, handler) in &diff.added_listeners {
            self.batch.push(DOMUpdate::AddListener {
                node,
                event: event.clone(),
            });
            self.staged_listeners
                .push((node, event.clone(), Some(handler.clone())));
        }
    }
}

impl HostAdapter for DomHost {
    fn create_node(&mut self, kind: &HostKind, initial: &PropsDiff) -> Result<NodeKey, Error> {
        let node = self.keys.mint();
        match kind {
            HostKind::Element(tag) => {
                self.batch.push(DOMUpdate::CreateElement {
                    node,
                    tag: tag.clone(),
                });
                self.stage_props(node, initial);
            }
            HostKind::Text => {
                let text = initial
                    .set_value(NODE_VALUE)
                    .and_then(PropValue::to_attr_string)
                    .unwrap_or_default();
                self.batch.push(DOMUpdate::CreateText { node, text });
            }
        }
        Ok(node)
    }

    fn apply_props(&mut self, node: NodeKey, diff: &PropsDiff) -> Result<(), Error> {
        self.stage_props(node, diff);
        Ok(())
    }

    fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), Error> {
        self.batch.push(DOMUpdate::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), Error> {
        self.batch.push(DOMUpdate::RemoveChild { parent, child });
        Ok(())
    }

    fn contains(&self, node: NodeKey) -> bool {
        self.document.contains(node)
    }

    fn finish_commit(&mut self) -> Result<(), Error> {
        let batch = mem::take(&mut self.batch);
        let staged = mem::take(&mut self.staged_listeners);
        if batch.is_empty() {
            return Ok(());
        }

        // Applied to a scratch copy so a rejected update leaves the live document as it was.
        let mut next = self.document.clone();
        for update in batch.iter().cloned() {
            next.apply_update(update)?;
        }
        self.document = next;
        for (node, event, handler) in staged {
            let events = self.listeners.entry(node).or_default();
            match handler {
                Some(handler) => {
                    events.insert(event, handler);
                }
                None => {
                    events.remove(&event);
                }
            }
        }
        let document = &self.document;
        self.listeners
            .retain(|node, events| !events.is_empty() && document.contains(*node));

        self.commits += 1;
        debug!("Published batch #{} with {} updates", self.commits, batch.len());
        if self.out_updater.receiver_count() > 0 {
            self.out_updater
                .send(batch)
                .map_err(|err| anyhow!("Failed to broadcast DOM batch: {err}"))?;
        }
        Ok(())
    }

    fn abort_commit(&mut self) {
        debug!("Dropping {} staged updates", self.batch.len());
        self.batch.clear();
        self.staged_listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::props::{Props, diff};

    fn button_props(handler: &EventHandler) -> PropsDiff {
        diff(
            &Props::new(),
            &Props::new().with("class", "primary").with("onclick", handler.clone()),
        )
    }

    #[test]
    fn nothing_reaches_the_document_before_finish() -> Result<(), Error> {
        let mut host = DomHost::new();
        let node = host.create_node(&HostKind::Element("div".into()), &PropsDiff::default())?;
        host.append_child(NodeKey::ROOT, node)?;
        assert!(!host.document().contains(node));

        host.finish_commit()?;
        assert_eq!(host.document().children(NodeKey::ROOT), vec![node]);
        assert_eq!(host.commits(), 1);
        Ok(())
    }

    #[test]
    fn text_nodes_take_their_value_from_the_initial_props() -> Result<(), Error> {
        let mut host = DomHost::new();
        let initial = diff(&Props::new(), &Props::new().with(NODE_VALUE, "Count: 1"));
        let node = host.create_node(&HostKind::Text, &initial)?;
        host.append_child(NodeKey::ROOT, node)?;
        host.finish_commit()?;
        assert_eq!(host.document().text_content(NodeKey::ROOT), "Count: 1");

        let change = diff(
            &Props::new().with(NODE_VALUE, "Count: 1"),
            &Props::new().with(NODE_VALUE, "Count: 2"),
        );
        host.apply_props(node, &change)?;
        host.finish_commit()?;
        assert_eq!(host.document().text_content(NodeKey::ROOT), "Count: 2");
        Ok(())
    }

    #[test]
    fn listeners_dispatch_and_bubble() -> Result<(), Error> {
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        let handler = EventHandler::new(move |context| {
            assert_eq!(context.event_type, "click");
            counter.set(counter.get() + 1);
        });

        let mut host = DomHost::new();
        let outer = host.create_node(&HostKind::Element("div".into()), &button_props(&handler))?;
        let inner = host.create_node(&HostKind::Element("button".into()), &button_props(&handler))?;
        host.append_child(outer, inner)?;
        host.append_child(NodeKey::ROOT, outer)?;
        host.finish_commit()?;

        assert_eq!(host.listener_count(inner), 1);
        assert_eq!(host.dispatch(inner, "click")?, 2);
        assert_eq!(host.dispatch(inner, "input")?, 0);
        assert_eq!(clicks.get(), 2);
        assert!(host.dispatch(NodeKey(999), "click").err().is_some());
        Ok(())
    }

    #[test]
    fn removed_nodes_lose_their_listeners() -> Result<(), Error> {
        let handler = EventHandler::new(|_| {});
        let mut host = DomHost::new();
        let node = host.create_node(&HostKind::Element("button".into()), &button_props(&handler))?;
        host.append_child(NodeKey::ROOT, node)?;
        host.finish_commit()?;
        host.remove_child(NodeKey::ROOT, node)?;
        host.finish_commit()?;
        assert_eq!(host.listener_count(node), 0);
        Ok(())
    }

    #[test]
    fn rejected_batches_leave_the_document_as_it_was() -> Result<(), Error> {
        let mut host = DomHost::new();
        let kept = host.create_node(&HostKind::Element("p".into()), &PropsDiff::default())?;
        host.append_child(NodeKey::ROOT, kept)?;
        host.finish_commit()?;
        let before = host.document().to_json_value();

        host.remove_child(NodeKey::ROOT, kept)?;
        let orphan = host.create_node(&HostKind::Element("span".into()), &PropsDiff::default())?;
        host.append_child(NodeKey(999), orphan)?;
        assert!(host.finish_commit().err().is_some());

        assert_eq!(host.document().to_json_value(), before);
        assert_eq!(host.document().children(NodeKey::ROOT), vec![kept]);
        assert!(!host.document().contains(orphan));
        assert_eq!(host.commits(), 1);
        Ok(())
    }

    #[test]
    fn aborted_commits_publish_nothing() -> Result<(), Error> {
        let mut host = DomHost::new();
        let mut receiver = host.subscribe();
        let node = host.create_node(&HostKind::Element("p".into()), &PropsDiff::default())?;
        host.append_child(NodeKey::ROOT, node)?;
        host.abort_commit();
        host.finish_commit()?;

        assert!(host.document().is_empty());
        assert!(receiver.try_recv().err().is_some());
        assert_eq!(host.commits(), 0);
        Ok(())
    }
}
