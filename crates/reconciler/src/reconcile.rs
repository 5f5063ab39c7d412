use anyhow::Error;
use indextree::{Node, NodeId};

use crate::element::Element;
use crate::fiber::{EffectTag, Fiber, fiber, fiber_mut};
use crate::host::HostAdapter;
use crate::scheduler::Renderer;

impl<H: HostAdapter> Renderer<H> {
    /// Build the children of `parent` for this pass, pairing `elements` with
    /// the committed children of its alternate by position.
    ///
    /// Equal types keep the old host node (`Update`); anything else places a
    /// new fiber and queues the old one for deletion.
    pub(crate) fn reconcile_children(&mut self, parent: NodeId, elements: &[Element]) -> Result<(), Error> {
        let alternate = fiber(&self.arena, parent)?.alternate;
        let mut old = alternate
            .and_then(|id| self.arena.get(id))
            .and_then(Node::first_child);
        let mut index = 0;

        while index < elements.len() || old.is_some() {
            let element = elements.get(index);
            let (matched, next_old) = match old {
                Some(old_id) => {
                    let previous = fiber(&self.arena, old_id)?;
                    let same_type =
                        element.is_some_and(|candidate| previous.ty.as_ref() == Some(candidate.ty()));
                    let next = self.arena.get(old_id).and_then(Node::next_sibling);
                    (same_type.then_some((old_id, previous.host)), next)
                }
                None => (None, None),
            };

            if let Some(element) = element {
                let produced = match matched {
                    Some((old_id, host)) => Fiber::update(element, host, old_id),
                    None => Fiber::placement(element),
                };
                let id = self.arena.new_node(produced);
                parent.checked_append(id, &mut self.arena)?;
            }
            if let (Some(old_id), None) = (old, matched) {
                fiber_mut(&mut self.arena, old_id)?.effect_tag = EffectTag::Deletion;
                self.deletions.push(old_id);
            }

            old = next_old;
            index += 1;
        }
        Ok(())
    }
}
