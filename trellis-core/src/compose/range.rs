//! Rendering Observed lists.

use std::rc::Rc;

use super::fragment::{fragment, fragment_reactive};
use crate::element::ElementRenderer;
use crate::reactive::Observed;

/// Generator producing one renderer per current item of `observed`.
pub(crate) fn range_generator<T, F>(observed: &Observed<Vec<T>>, item: F) -> Rc<dyn Fn() -> ElementRenderer>
where
    T: 'static,
    F: Fn(usize, &T) -> ElementRenderer + 'static,
{
    let source = observed.downgrade();
    Rc::new(move || {
        let children: Vec<ElementRenderer> = source
            .upgrade()
            .map(|observed| {
                observed.with(|items| {
                    items
                        .iter()
                        .enumerate()
                        .map(|(index, value)| item(index, value))
                        .collect()
                })
            })
            .unwrap_or_default();
        fragment(children)
    })
}

/// Render one renderer per item of `observed` into the target. Any change
/// to the list re-renders every item.
pub fn range<T, F>(observed: &Observed<Vec<T>>, item: F) -> ElementRenderer
where
    T: 'static,
    F: Fn(usize, &T) -> ElementRenderer + 'static,
{
    let generate = range_generator(observed, item);
    fragment_reactive(observed, move || generate())
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dom::{DomHost, MemoryDom};
    use crate::element::{li, ul};
    use crate::Runtime;

    #[test]
    fn items_follow_list() {
        let document = MemoryDom::new();
        let rt = Runtime::new(Rc::new(document.clone()));
        let items = Observed::new(vec!["a", "b"]);

        rt.render(&ul([]).range(&items, |index, item| li([]).text(format!("{index}:{item}"))));
        assert_eq!(document.inner_html(document.body()), "<ul><li>0:a</li><li>1:b</li></ul>");

        items.update_with(|items| items.push("c"));
        rt.execute_active_events();
        assert_eq!(
            document.inner_html(document.body()),
            "<ul><li>0:a</li><li>1:b</li><li>2:c</li></ul>"
        );

        items.set(Vec::new());
        rt.execute_active_events();
        assert_eq!(document.inner_html(document.body()), "<ul></ul>");
    }

    #[test]
    fn range_as_fragment() {
        let document = MemoryDom::new();
        let rt = Runtime::new(Rc::new(document.clone()));
        let items = Observed::new(vec![1, 2]);

        rt.render(&ul([]).children([range(&items, |_, n| li([]).text(n.to_string())), li([]).text("end")]));
        assert_eq!(
            document.inner_html(document.body()),
            "<ul><li>1</li><li>2</li><!----><li>end</li></ul>"
        );

        items.set(vec![3]);
        rt.execute_active_events();
        assert_eq!(document.inner_html(document.body()), "<ul><li>3</li><!----><li>end</li></ul>");
    }
}
