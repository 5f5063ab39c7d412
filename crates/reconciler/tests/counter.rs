//! End-to-end: a counter rendered into `DomHost`, clicked through the host.

mod common;

use anyhow::Error;
use dom::{DOMMirror, DOMUpdate, Document, NodeKey};
use reconciler::{DomHost, Element, Renderer};

use common::{button, counter, init_logging};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_render_creates_container_text_and_button() -> Result<(), Error> {
        init_logging();
        let mut renderer = Renderer::new(DomHost::new());
        renderer.render(Element::component(counter), NodeKey::ROOT)?;
        assert_eq!(renderer.flush_sync()?, 1);

        let host = renderer.host();
        let document = host.document();
        assert_eq!(document.len(), 4);
        assert_eq!(document.elements_by_tag("div").len(), 1);
        assert_eq!(document.text_content(NodeKey::ROOT), "Count: 1");
        assert_eq!(host.listener_count(button(host)?), 1);
        assert_eq!(renderer.stats().last_commit.placements, 4);
        Ok(())
    }

    #[test]
    fn one_click_changes_only_the_text() -> Result<(), Error> {
        init_logging();
        let mut renderer = Renderer::new(DomHost::new());
        let mut updates = renderer.host().subscribe();
        renderer.render(Element::component(counter), NodeKey::ROOT)?;
        renderer.flush_sync()?;
        updates.try_recv()?;

        let clicked = renderer.host().dispatch(button(renderer.host())?, "click")?;
        assert_eq!(clicked, 1);
        assert!(renderer.has_pending_work());
        assert_eq!(renderer.flush_sync()?, 1);

        let batch = updates.try_recv()?;
        assert!(matches!(
            batch.as_slice(),
            [DOMUpdate::SetText { text, .. }] if text == "Count: 2"
        ));
        assert_eq!(renderer.stats().last_commit.host_mutations, 1);
        assert_eq!(
            renderer.host().document().text_content(NodeKey::ROOT),
            "Count: 2"
        );
        Ok(())
    }

    #[test]
    fn clicks_between_passes_are_all_applied() -> Result<(), Error> {
        let mut renderer = Renderer::new(DomHost::new());
        renderer.render(Element::component(counter), NodeKey::ROOT)?;
        renderer.flush_sync()?;

        let target = button(renderer.host())?;
        for _ in 0..3 {
            renderer.host().dispatch(target, "click")?;
        }
        assert_eq!(renderer.flush_sync()?, 1);
        assert_eq!(
            renderer.host().document().text_content(NodeKey::ROOT),
            "Count: 4"
        );
        Ok(())
    }

    #[test]
    fn mirror_follows_the_host_document() -> Result<(), Error> {
        let mut renderer = Renderer::new(DomHost::new());
        let mut mirror = DOMMirror::new(renderer.host().subscribe(), Document::new());
        renderer.render(Element::component(counter), NodeKey::ROOT)?;
        renderer.flush_sync()?;
        let target = button(renderer.host())?;
        renderer.host().dispatch(target, "click")?;
        renderer.flush_sync()?;

        assert_eq!(mirror.try_update_sync()?, 2);
        assert_eq!(
            mirror.mirror().to_json_value(),
            renderer.host().document().to_json_value()
        );
        assert_eq!(
            format!("{:?}", mirror.mirror()),
            format!("{:?}", renderer.host().document())
        );
        Ok(())
    }
}
