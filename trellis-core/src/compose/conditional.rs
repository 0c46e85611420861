//! Conditional rendering.

use super::fragment::{fragment_reactive, nil};
use crate::element::ElementRenderer;
use crate::reactive::{Observed, ObservedGenerator};

/// Render `then` while `condition` holds, `otherwise` while it does not.
///
/// The branch is re-rendered from scratch on every change of `condition`.
pub fn conditional(condition: &Observed<bool>, then: ElementRenderer, otherwise: ElementRenderer) -> ElementRenderer {
    let source = condition.downgrade();
    fragment_reactive(condition, move || {
        if source.upgrade().is_some_and(|condition| condition.get()) {
            then.clone()
        } else {
            otherwise.clone()
        }
    })
}

/// Like [`conditional`], with the condition computed from a group of
/// Observed values.
pub fn conditional_on(
    condition: ObservedGenerator<bool>,
    then: ElementRenderer,
    otherwise: ElementRenderer,
) -> ElementRenderer {
    let (group, holds) = condition.into_parts();
    fragment_reactive(group, move || if holds() { then.clone() } else { otherwise.clone() })
}

/// Render `then` while `condition` holds, nothing otherwise.
pub fn show(condition: &Observed<bool>, then: ElementRenderer) -> ElementRenderer {
    conditional(condition, then, nil())
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::dom::{DomHost, MemoryDom};
    use crate::element::{div, span};
    use crate::reactive::observe;
    use crate::Runtime;

    fn setup() -> (Runtime, MemoryDom) {
        let document = MemoryDom::new();
        let runtime = Runtime::new(Rc::new(document.clone()));
        (runtime, document)
    }

    #[test]
    fn switches_branches() {
        let (rt, document) = setup();
        let open = Observed::new(false);
        rt.render(&div([]).children([conditional(&open, span([]).text("open"), span([]).text("closed"))]));
        assert_eq!(document.inner_html(document.body()), "<div><span>closed</span><!----></div>");

        open.set(true);
        rt.execute_active_events();
        assert_eq!(document.inner_html(document.body()), "<div><span>open</span><!----></div>");
    }

    #[test]
    fn show_renders_nothing_when_false() {
        let (rt, document) = setup();
        let visible = Observed::new(true);
        rt.render(&div([]).children([show(&visible, span([]).render())]));

        visible.set(false);
        rt.execute_active_events();
        assert_eq!(document.inner_html(document.body()), "<div><!----></div>");
    }

    #[test]
    fn generated_condition_tracks_every_member() {
        let (rt, document) = setup();
        let a = Observed::new(1);
        let b = Observed::new(1);

        let (x, y) = (a.clone(), b.clone());
        let equal = observe((&a, &b)).generate(move || x.get() == y.get());
        rt.render(&div([]).children([conditional_on(equal, span([]).text("same"), span([]).text("different"))]));

        b.set(2);
        rt.execute_active_events();
        assert_eq!(document.inner_html(document.body()), "<div><span>different</span><!----></div>");

        a.set(2);
        rt.execute_active_events();
        assert_eq!(document.inner_html(document.body()), "<div><span>same</span><!----></div>");
    }
}
