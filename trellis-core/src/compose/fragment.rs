//! Fragments: several renderers materialized straight into the target.

use std::rc::Rc;

use crate::element::reactive::{reactive_fragment, Regenerate};
use crate::element::{renderer, ElementRenderer, Renderer, RendererType};
use crate::reactive::IntoObservedGroup;

/// Render each child into the target, without a wrapper element.
///
/// Children follow the placement: `Insert` places them at consecutive
/// indices, `Fragment` makes them fragment members of the target, and
/// `Replace`/`Emplace` put them where the target was before destroying it.
/// Anything else appends. Returns the node the children were rendered into.
pub fn fragment<I>(children: I) -> ElementRenderer
where
    I: IntoIterator<Item = ElementRenderer>,
{
    let children: Vec<ElementRenderer> = children.into_iter().collect();
    renderer(move |rt, target, placement| {
        if !rt.dom().is_alive(target) {
            return None;
        }

        match placement.kind {
            RendererType::Replace | RendererType::Emplace => {
                let parent = rt.dom().parent(target)?;
                let position = rt.dom().children(parent).iter().position(|child| *child == target);
                let mut created = Vec::new();
                for child in &children {
                    let child_placement = match position {
                        Some(index) => Renderer::insert(index + created.len()),
                        None => Renderer::fragment(),
                    };
                    if let Some(node) = child(rt, parent, &child_placement).filter(|node| *node != parent) {
                        created.push(node);
                    }
                }
                if position.is_none() {
                    rt.dom().move_before(parent, &created, target);
                }
                rt.destroy(target);
                Some(parent)
            }
            _ => {
                let mut index = placement.metadata;
                for child in &children {
                    let child_placement = match placement.kind {
                        RendererType::Insert => Renderer::insert(index),
                        RendererType::Fragment => Renderer::fragment(),
                        _ => Renderer::append(),
                    };
                    if child(rt, target, &child_placement).is_some_and(|node| node != target) {
                        index += 1;
                    }
                }
                Some(target)
            }
        }
    })
}

/// Render `generator`'s output into the target as fragment members, and
/// render it again whenever a member of `group` changes.
///
/// The members sit in front of an empty comment node that keeps their
/// position among the target's other children. With `Insert` the comment
/// goes in front of the child at the index; with `Replace` or `Emplace` it
/// takes the target's place. Each change discards the members of the
/// previous render.
///
/// # Example
///
/// ```rust,ignore
/// let items = Observed::new(vec!["a", "b"]);
/// let view = ul([]).children([
///     li([]).text("first"),
///     fragment_reactive(&items, {
///         let items = items.clone();
///         move || fragment(items.get().into_iter().map(|item| li([]).text(item)))
///     }),
///     li([]).text("last"),
/// ]);
/// ```
pub fn fragment_reactive<G, F>(group: G, generator: F) -> ElementRenderer
where
    G: IntoObservedGroup,
    F: Fn() -> ElementRenderer + 'static,
{
    reactive_fragment(group.into_group(), Regenerate::Children(Rc::new(generator)))
}

/// Render nothing.
pub fn nil() -> ElementRenderer {
    renderer(|_, _, _| None)
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
