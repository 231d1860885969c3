use futures::{Stream, StreamExt};

use crate::{ActionSink, EchoFilter, Marked, Origin};

/// A UI-facing consumer: built from an initial state and an action sink,
/// then fed every subsequent state.
pub trait Component {
    type State;
    type Action;

    fn new(initial: Self::State, sink: ActionSink<Marked<Self::Action>>) -> Self;

    /// The filter holding this component's last emitted token.
    fn echo_filter(&self) -> &EchoFilter;

    /// Called for states that did not originate from this component's own
    /// last action.
    fn apply(&mut self, state: &Self::State);

    /// Called for direct echoes of this component's own action. Most
    /// components have nothing left to do.
    fn acknowledge(&mut self, _state: &Self::State) {}
}

/// Feeds states to `component` until the stream ends, suppressing echoes.
pub async fn drive<C, S>(component: &mut C, states: S)
where
    C: Component,
    S: Stream<Item = Marked<C::State>>,
{
    futures::pin_mut!(states);
    while let Some(state) = states.next().await {
        match component.echo_filter().origin_of(&state) {
            Origin::Own => component.acknowledge(state.payload()),
            Origin::External => component.apply(state.payload()),
        }
    }
}
