//! Switch rendering.

use super::fragment::fragment_reactive;
use crate::element::{renderer, ElementRenderer};
use crate::reactive::{observe, Observed, ObservedGroup, WeakObserved};

/// Builder returned by [`switch_`].
pub struct Switch<T: 'static> {
    source: WeakObserved<T>,
    group: ObservedGroup,
    cases: Vec<(T, ElementRenderer)>,
    default: Option<ElementRenderer>,
}

/// Render the case matching the current value of `observed`.
///
/// Cases are compared in the order they were added. Without a match and
/// without a default, nothing is rendered and a warning is printed to the
/// host console.
///
/// # Example
///
/// ```rust,ignore
/// let view = switch_(&tab)
///     .case(Tab::Inbox, inbox_view())
///     .case(Tab::Sent, sent_view())
///     .default(p([]).text("nothing here"))
///     .build();
/// ```
pub fn switch_<T>(observed: &Observed<T>) -> Switch<T>
where
    T: PartialEq + 'static,
{
    Switch {
        source: observed.downgrade(),
        group: observe(observed),
        cases: Vec::new(),
        default: None,
    }
}

impl<T> Switch<T>
where
    T: PartialEq + 'static,
{
    pub fn case(mut self, value: T, renderer: ElementRenderer) -> Self {
        self.cases.push((value, renderer));
        self
    }

    pub fn default(mut self, renderer: ElementRenderer) -> Self {
        self.default = Some(renderer);
        self
    }

    pub fn build(self) -> ElementRenderer {
        let Switch {
            source,
            group,
            cases,
            default,
        } = self;

        fragment_reactive(group, move || {
            let matched = source.upgrade().and_then(|observed| {
                observed.with(|current| {
                    cases
                        .iter()
                        .find(|(value, _)| value == current)
                        .map(|(_, renderer)| renderer.clone())
                })
            });
            matched
                .or_else(|| default.clone())
                .unwrap_or_else(unmatched)
        })
    }
}

fn unmatched() -> ElementRenderer {
    renderer(|rt, _, _| {
        rt.warn("switch_: no case matches the current value and there is no default");
        None
    })
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
