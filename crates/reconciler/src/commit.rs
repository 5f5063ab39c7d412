use core::mem;
use std::rc::Rc;

use anyhow::Error;
use dom::NodeKey;
use indextree::{Node, NodeId};
use log::{debug, trace, warn};

use crate::element::ElementType;
use crate::error::RenderError;
use crate::fiber::{EffectTag, fiber, fiber_mut};
use crate::hooks::HookSlot;
use crate::host::{HostAdapter, HostKind};
use crate::props::{Props, diff};
use crate::scheduler::Renderer;
use crate::telemetry::{CommitSummary, maybe_emit};

fn host_kind(ty: Option<&ElementType>) -> Option<HostKind> {
    match ty? {
        ElementType::Host(tag) => Some(HostKind::Element(tag.clone())),
        ElementType::Text => Some(HostKind::Text),
        ElementType::Component(_) => None,
    }
}

impl<H: HostAdapter> Renderer<H> {
    /// Apply the finished work-in-progress tree to the host and make it current.
    pub(crate) fn commit_root(&mut self) -> Result<(), Error> {
        let root = self.wip_root.ok_or(RenderError::MissingFiber)?;
        let deletions = mem::take(&mut self.deletions);
        let mut summary = CommitSummary::default();

        if let Err(err) = self.apply_to_host(root, &deletions, &mut summary) {
            warn!("Commit failed, keeping the previous tree: {err:#}");
            self.host.abort_commit();
            self.deletions = deletions;
            self.discard_work_in_progress();
            return Err(err);
        }

        let fibers: Vec<NodeId> = root.descendants(&self.arena).collect();
        for id in &fibers {
            for slot in &fiber(&self.arena, *id)?.hooks {
                if let HookSlot::State(state) = slot {
                    state.acknowledge();
                }
            }
        }
        if let Some(previous) = self.current_root.replace(root) {
            previous.remove_subtree(&mut self.arena);
        }
        for id in fibers {
            let node = fiber_mut(&mut self.arena, id)?;
            node.alternate = None;
            node.effect_tag = EffectTag::None;
        }
        self.wip_root = None;
        self.next_unit = None;

        for effect in mem::take(&mut self.pending_effects) {
            trace!("Running effect of {}", effect.component());
            effect.run();
            summary.effects_run += 1;
        }
        self.stats.record_commit(summary);
        debug!(
            "Committed pass: {} placed, {} updated, {} deleted, {} host calls",
            summary.placements, summary.updates, summary.deletions, summary.host_mutations
        );
        maybe_emit(self.config.telemetry_enabled, &self.stats);
        Ok(())
    }

    fn apply_to_host(&mut self, root: NodeId, deletions: &[NodeId], summary: &mut CommitSummary) -> Result<(), Error> {
        self.commit_deletions(deletions, summary)?;
        self.commit_children(root, summary)?;
        self.host.finish_commit()
    }

    fn commit_deletions(&mut self, deletions: &[NodeId], summary: &mut CommitSummary) -> Result<(), Error> {
        for id in deletions {
            let parent = self.host_parent(*id)?;
            let roots = self.host_roots(*id)?;
            if roots.is_empty() {
                return Err(RenderError::DetachedDeletion {
                    component: fiber(&self.arena, *id)?.describe(),
                }
                .into());
            }
            for node in roots {
                self.host.remove_child(parent, node)?;
                summary.host_mutations += 1;
            }
            summary.deletions += 1;
        }
        Ok(())
    }

    fn commit_children(&mut self, id: NodeId, summary: &mut CommitSummary) -> Result<(), Error> {
        let children: Vec<NodeId> = id.children(&self.arena).collect();
        for child in children {
            self.commit_work(child, summary)?;
        }
        Ok(())
    }

    fn commit_work(&mut self, id: NodeId, summary: &mut CommitSummary) -> Result<(), Error> {
        let (tag, kind, host, props, alternate) = {
            let node = fiber(&self.arena, id)?;
            (
                node.effect_tag,
                host_kind(node.ty.as_ref()),
                node.host,
                Rc::clone(&node.props),
                node.alternate,
            )
        };
        match tag {
            EffectTag::Placement => {
                summary.placements += 1;
                let Some(kind) = kind else {
                    return self.commit_children(id, summary);
                };
                let initial = diff(&Props::new(), &props);
                let node = self.host.create_node(&kind, &initial)?;
                summary.host_mutations += 1;
                fiber_mut(&mut self.arena, id)?.host = Some(node);
                // The subtree is complete before it becomes reachable.
                self.commit_children(id, summary)?;
                let parent = self.host_parent(id)?;
                self.host.append_child(parent, node)?;
                summary.host_mutations += 1;
                Ok(())
            }
            EffectTag::Update => {
                summary.updates += 1;
                if let (Some(node), Some(alternate), Some(_)) = (host, alternate, kind) {
                    let previous = Rc::clone(&fiber(&self.arena, alternate)?.props);
                    let delta = diff(&previous, &props);
                    if !delta.is_empty() {
                        self.host.apply_props(node, &delta)?;
                        summary.host_mutations += 1;
                    }
                }
                self.commit_children(id, summary)
            }
            EffectTag::None | EffectTag::Deletion => self.commit_children(id, summary),
        }
    }

    /// Host node of the closest ancestor that has one.
    fn host_parent(&self, id: NodeId) -> Result<NodeKey, Error> {
        let mut cursor = self.arena.get(id).and_then(Node::parent);
        while let Some(ancestor) = cursor {
            if let Some(host) = fiber(&self.arena, ancestor)?.host {
                return Ok(host);
            }
            cursor = self.arena.get(ancestor).and_then(Node::parent);
        }
        Err(RenderError::MissingFiber.into())
    }

    /// Topmost host nodes inside the subtree of `id`, looking through components.
    fn host_roots(&self, id: NodeId) -> Result<Vec<NodeKey>, Error> {
        if let Some(host) = fiber(&self.arena, id)?.host {
            return Ok(vec![host]);
        }
        let mut roots = Vec::new();
        for child in id.children(&self.arena) {
            roots.extend(self.host_roots(child)?);
        }
        Ok(roots)
    }
}

#[cfg(test)]
mod tests {
    use dom::DOMUpdate;

    use super::*;
    use crate::element::Element;
    use crate::fiber::Fiber;
    use crate::host::DomHost;

    #[test]
    fn placed_subtrees_arrive_complete() -> Result<(), Error> {
        let mut renderer = Renderer::new(DomHost::new());
        let mut receiver = renderer.host().subscribe();
        renderer.render(
            Element::host("section").child(Element::host("p").child("hello")),
            NodeKey::ROOT,
        )?;
        renderer.flush_sync()?;

        let batch = receiver.try_recv()?;
        let root_append = batch
            .iter()
            .position(|update| {
                matches!(update, DOMUpdate::AppendChild { parent, .. } if *parent == NodeKey::ROOT)
            })
            .ok_or_else(|| anyhow::anyhow!("section never attached"))?;
        assert_eq!(root_append, batch.len() - 1);
        assert_eq!(renderer.stats().last_commit.placements, 3);
        assert_eq!(renderer.stats().last_commit.host_mutations, 6);
        Ok(())
    }

    #[test]
    fn superseded_tree_is_freed_after_commit() -> Result<(), Error> {
        let mut renderer = Renderer::new(DomHost::new());
        let tree = || Element::host("div").child("a").child("b");
        renderer.render(tree(), NodeKey::ROOT)?;
        renderer.flush_sync()?;
        let committed = renderer.fiber_count();

        renderer.render(tree(), NodeKey::ROOT)?;
        renderer.flush_sync()?;
        assert_eq!(renderer.fiber_count(), committed);
        assert_eq!(renderer.stats().last_commit.host_mutations, 0);
        assert_eq!(renderer.stats().last_commit.updates, 3);
        Ok(())
    }

    #[test]
    fn deletions_remove_host_roots_below_components() -> Result<(), Error> {
        fn badge(_hooks: &mut crate::Hooks<'_>, _props: &Props) -> Result<Element, Error> {
            Ok(Element::host("span").child("new"))
        }

        let mut renderer = Renderer::new(DomHost::new());
        renderer.render(Element::host("div").child(Element::component(badge)), NodeKey::ROOT)?;
        renderer.flush_sync()?;
        assert_eq!(renderer.host().document().elements_by_tag("span").len(), 1);

        renderer.render(Element::host("div").child(Element::host("em")), NodeKey::ROOT)?;
        renderer.flush_sync()?;
        let document = renderer.host().document();
        assert!(document.elements_by_tag("span").is_empty());
        assert_eq!(document.elements_by_tag("em").len(), 1);
        assert_eq!(renderer.stats().last_commit.deletions, 1);
        Ok(())
    }

    #[test]
    fn deleting_a_subtree_without_host_nodes_fails_the_commit() -> Result<(), Error> {
        fn hollow(_hooks: &mut crate::Hooks<'_>, _props: &Props) -> Result<Element, Error> {
            Ok(Element::text(""))
        }

        let mut renderer = Renderer::new(DomHost::new());
        renderer.render(Element::host("div"), NodeKey::ROOT)?;
        renderer.flush_sync()?;
        let before = renderer.host().document().to_json_value();
        let published = renderer.host().commits();

        renderer.render(Element::host("div"), NodeKey::ROOT)?;
        let committed = renderer.current_root.ok_or(RenderError::MissingFiber)?;
        let orphan = renderer
            .arena
            .new_node(Fiber::placement(&Element::component(hollow)));
        committed.checked_append(orphan, &mut renderer.arena)?;
        renderer.deletions.push(orphan);

        let error = renderer
            .flush_sync()
            .err()
            .ok_or_else(|| anyhow::anyhow!("hostless deletion went unnoticed"))?;
        assert_eq!(
            error.downcast_ref::<RenderError>(),
            Some(&RenderError::DetachedDeletion {
                component: "hollow".to_owned(),
            })
        );
        assert_eq!(renderer.host().document().to_json_value(), before);
        assert_eq!(renderer.host().commits(), published);
        assert!(!renderer.has_pending_work());
        Ok(())
    }
}
