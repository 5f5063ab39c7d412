#![allow(dead_code, reason = "Each test binary uses a different subset of helpers")]

use anyhow::{Error, bail};
use dom::NodeKey;
use reconciler::{DomHost, Element, HostAdapter, HostKind, Hooks, Props, PropsDiff, handler};

pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().unwrap_or_default();
}

/// `DomHost` wrapper that records every adapter call and can be told to fail
/// when asked to create a given tag.
#[derive(Default)]
pub struct RecordingHost {
    pub inner: DomHost,
    pub calls: Vec<String>,
    pub fail_on_tag: Option<String>,
}

impl HostAdapter for RecordingHost {
    fn create_node(&mut self, kind: &HostKind, initial: &PropsDiff) -> Result<NodeKey, Error> {
        if matches!((kind, &self.fail_on_tag), (HostKind::Element(tag), Some(failing)) if tag == failing) {
            bail!("refusing to create {kind:?}");
        }
        self.calls.push(format!("create {kind:?}"));
        self.inner.create_node(kind, initial)
    }

    fn apply_props(&mut self, node: NodeKey, diff: &PropsDiff) -> Result<(), Error> {
        self.calls.push(format!("props {node:?}"));
        self.inner.apply_props(node, diff)
    }

    fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), Error> {
        self.calls.push(format!("append {child:?} to {parent:?}"));
        self.inner.append_child(parent, child)
    }

    fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), Error> {
        self.calls.push(format!("remove {child:?} from {parent:?}"));
        self.inner.remove_child(parent, child)
    }

    fn contains(&self, node: NodeKey) -> bool {
        self.inner.contains(node)
    }

    fn finish_commit(&mut self) -> Result<(), Error> {
        self.inner.finish_commit()
    }

    fn abort_commit(&mut self) {
        self.inner.abort_commit();
    }
}

/// A text line and a button that increments it.
pub fn counter(hooks: &mut Hooks<'_>, _props: &Props) -> Result<Element, Error> {
    let (count, set_count) = hooks.use_state(1i32)?;
    let on_click = hooks.use_callback(
        handler!([set_count], |_ctx| set_count.update(|value| value + 1)),
        (),
    )?;
    Ok(Element::host("div")
        .child(format!("Count: {count}"))
        .child(Element::host("button").on("click", on_click)))
}

/// Key of the only `<button>` in the host document.
pub fn button(host: &DomHost) -> Result<NodeKey, Error> {
    match host.document().elements_by_tag("button").as_slice() {
        [button] => Ok(*button),
        other => bail!("expected one button, found {}", other.len()),
    }
}

/// Ordered list with one `<li>` per entry.
pub fn list(items: &[&str]) -> Element {
    Element::host("ul").children(items.iter().map(|item| Element::host("li").child(*item)))
}
