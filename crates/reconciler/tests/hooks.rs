//! Hook behaviour across committed and abandoned passes.

mod common;

use core::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::{Error, anyhow};
use dom::NodeKey;
use reconciler::{
    DomHost, Element, HookKind, Hooks, LoopStatus, PropValue, Props, RenderError, Renderer,
    StateSetter, UnitDeadline,
};

use common::init_logging;

#[cfg(test)]
mod tests {
    use super::*;

    /// What a tracked component saw and did, shared with the test.
    #[derive(Default)]
    struct Tracker {
        setter: RefCell<Option<StateSetter<i32>>>,
        renders: Cell<u32>,
        memo_runs: Cell<u32>,
        effects: Rc<Cell<u32>>,
        refs: RefCell<Vec<Rc<RefCell<u32>>>>,
    }

    impl Tracker {
        fn setter(&self) -> Result<StateSetter<i32>, Error> {
            self.setter
                .borrow()
                .clone()
                .ok_or_else(|| anyhow!("tracked component never rendered"))
        }
    }

    /// A component using one hook of each kind, reporting into `shared`.
    fn tracked(shared: &Rc<Tracker>) -> Element {
        let tracker = Rc::clone(shared);
        Element::component(move |hooks, _props| {
            tracker.renders.set(tracker.renders.get() + 1);
            let (value, set_value) = hooks.use_state(0i32)?;
            let answer = hooks.use_memo(
                || {
                    tracker.memo_runs.set(tracker.memo_runs.get() + 1);
                    42i32
                },
                (),
            )?;
            let reference = hooks.use_ref(0u32)?;
            let effects = Rc::clone(&tracker.effects);
            hooks.use_effect(move || effects.set(effects.get() + 1), value)?;

            *tracker.setter.borrow_mut() = Some(set_value);
            tracker.refs.borrow_mut().push(reference);
            Ok(Element::text(format!("value={value} answer={answer}")))
        })
    }

    /// Calls a ref hook only while the `extra` prop is set.
    fn toggled(hooks: &mut Hooks<'_>, props: &Props) -> Result<Element, Error> {
        let (label, _set_label) = hooks.use_state(String::from("stable"))?;
        if props.get("extra") == Some(&PropValue::Bool(true)) {
            hooks.use_ref(0u8)?;
        }
        Ok(Element::host("p").child(label))
    }

    fn mounted(shared: &Rc<Tracker>) -> Result<Renderer<DomHost>, Error> {
        init_logging();
        let mut renderer = Renderer::new(DomHost::new());
        renderer.render(tracked(shared), NodeKey::ROOT)?;
        renderer.flush_sync()?;
        Ok(renderer)
    }

    fn text(renderer: &Renderer<DomHost>) -> String {
        renderer.host().document().text_content(NodeKey::ROOT)
    }

    #[test]
    fn hooks_keep_their_slots_across_passes() -> Result<(), Error> {
        let shared = Rc::new(Tracker::default());
        let mut renderer = mounted(&shared)?;
        let first_setter = shared.setter()?;

        first_setter.set(3);
        renderer.flush_sync()?;
        renderer.render(tracked(&shared), NodeKey::ROOT)?;
        renderer.flush_sync()?;

        assert_eq!(shared.renders.get(), 3);
        assert_eq!(shared.memo_runs.get(), 1);
        assert_eq!(shared.setter()?, first_setter);
        let refs = shared.refs.borrow();
        assert_eq!(refs.len(), 3);
        assert!(refs.iter().all(|reference| Rc::ptr_eq(reference, &refs[0])));
        assert_eq!(text(&renderer), "value=3 answer=42");
        Ok(())
    }

    #[test]
    fn effects_run_only_when_deps_change() -> Result<(), Error> {
        let shared = Rc::new(Tracker::default());
        let mut renderer = mounted(&shared)?;
        assert_eq!(shared.effects.get(), 1);

        renderer.render(tracked(&shared), NodeKey::ROOT)?;
        renderer.flush_sync()?;
        assert_eq!(shared.effects.get(), 1);

        shared.setter()?.set(1);
        renderer.flush_sync()?;
        assert_eq!(shared.effects.get(), 2);

        shared.setter()?.set(1);
        renderer.flush_sync()?;
        assert_eq!(shared.effects.get(), 2);
        assert_eq!(renderer.stats().effects_run_total, 2);
        Ok(())
    }

    #[test]
    fn effects_wait_for_the_commit() -> Result<(), Error> {
        init_logging();
        let shared = Rc::new(Tracker::default());
        let mut renderer = Renderer::new(DomHost::new());
        renderer.render(tracked(&shared), NodeKey::ROOT)?;

        for _ in 0..2 {
            assert_eq!(renderer.work_loop(&UnitDeadline::new(1))?, LoopStatus::Yielded);
            assert_eq!(shared.effects.get(), 0);
        }
        assert_eq!(shared.renders.get(), 1);
        assert_eq!(renderer.work_loop(&UnitDeadline::new(1))?, LoopStatus::Committed);
        assert_eq!(shared.effects.get(), 1);
        assert_eq!(renderer.stats().yields, 2);
        assert_eq!(renderer.work_loop(&UnitDeadline::new(1))?, LoopStatus::Idle);
        Ok(())
    }

    #[test]
    fn abandoned_pass_keeps_queued_updates_and_drops_its_effects() -> Result<(), Error> {
        let shared = Rc::new(Tracker::default());
        let mut renderer = mounted(&shared)?;
        let setter = shared.setter()?;

        setter.set(5);
        assert_eq!(renderer.work_loop(&UnitDeadline::new(2))?, LoopStatus::Yielded);
        assert_eq!(shared.renders.get(), 2);

        setter.update(|value| value + 1);
        assert_eq!(renderer.flush_sync()?, 1);

        assert_eq!(renderer.stats().passes_abandoned, 1);
        assert_eq!(shared.renders.get(), 3);
        assert_eq!(shared.effects.get(), 2);
        assert_eq!(setter.pending(), 0);
        assert_eq!(text(&renderer), "value=6 answer=42");
        Ok(())
    }

    #[test]
    fn hook_order_violation_keeps_the_committed_tree() -> Result<(), Error> {
        init_logging();
        let mut renderer = Renderer::new(DomHost::new());
        renderer.render(Element::component(toggled), NodeKey::ROOT)?;
        renderer.flush_sync()?;
        let before = renderer.host().document().to_json_value();

        renderer.render(Element::component(toggled).prop("extra", true), NodeKey::ROOT)?;
        let error = renderer
            .flush_sync()
            .err()
            .ok_or_else(|| anyhow!("conditional hook went unnoticed"))?;
        assert_eq!(
            error.downcast_ref::<RenderError>(),
            Some(&RenderError::HookOrderViolation {
                component: "toggled",
                index: 1,
                expected: None,
                found: Some(HookKind::Ref),
            })
        );
        assert_eq!(renderer.host().document().to_json_value(), before);
        assert!(!renderer.has_pending_work());

        renderer.render(Element::component(toggled), NodeKey::ROOT)?;
        assert_eq!(renderer.flush_sync()?, 1);
        assert_eq!(renderer.stats().commits, 2);
        assert_eq!(text(&renderer), "stable");
        Ok(())
    }

    #[test]
    fn setters_of_removed_components_are_harmless() -> Result<(), Error> {
        let shared = Rc::new(Tracker::default());
        let mut renderer = mounted(&shared)?;
        let setter = shared.setter()?;
        renderer.render(Element::host("div").child("gone"), NodeKey::ROOT)?;
        renderer.flush_sync()?;

        setter.set(9);
        assert_eq!(renderer.flush_sync()?, 1);
        assert_eq!(renderer.stats().last_commit.host_mutations, 0);
        assert_eq!(shared.renders.get(), 1);
        assert_eq!(text(&renderer), "gone");
        Ok(())
    }
}
