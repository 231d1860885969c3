use futures::{stream, StreamExt};

use super::*;

#[test]
fn equal_payloads_from_different_emissions_have_different_marks() {
    let first = Marked::new("open");
    let second = Marked::new("open");

    assert_eq!(first.payload(), second.payload());
    assert!(first.has_different_mark(&second));
    assert!(!first.has_different_mark(&first.clone()));
}

#[test]
fn mark_survives_mapping_and_explicit_reuse() {
    let action = Marked::new(3_u32);
    let token = action.mark();

    let state = action.map(|n| n * 2);
    assert_eq!(state.mark(), token);
    assert_eq!(*state.payload(), 6);

    let rewrapped = Marked::with_mark(token, "derived");
    assert!(!rewrapped.has_different_mark(&state));
}

#[test]
fn tokens_are_unique_per_creation() {
    let tokens: Vec<Token> = (0..64).map(|_| Token::new()).collect();
    for (i, a) in tokens.iter().enumerate() {
        assert!(tokens[i + 1..].iter().all(|b| a != b));
    }
}

#[test]
fn echo_filter_recognises_own_emission_only() {
    let mut filter = EchoFilter::new();
    let outgoing = filter.stamp("select");

    let echo = Marked::with_mark(outgoing.mark(), "state after select");
    let foreign = Marked::new("state after select");

    assert_eq!(filter.origin_of(&echo), Origin::Own);
    assert_eq!(filter.origin_of(&foreign), Origin::External);

    filter.stamp("next");
    assert_eq!(filter.origin_of(&echo), Origin::External);
}

#[test]
fn uuid_wrappers_route_by_correlation_id() {
    let action = UuidAction::new("file-browser-1", "refresh");
    let own = UuidState::new("file-browser-1", 10);
    let other = UuidState::new("file-browser-2", 10);

    assert!(own.is_for(&action));
    assert!(!other.is_for(&action));

    let generated = UuidAction::generated("refresh");
    assert_eq!(generated.uuid.len(), 36);
    assert_ne!(generated.uuid, UuidAction::generated("refresh").uuid);
}

#[tokio::test]
async fn filter_modified_drops_unmodified_pairs() {
    let pairs = stream::iter(vec![
        StateActionPair::new(1, "a"),
        StateActionPair::unmodified(1, "b"),
        StateActionPair::new(2, "c"),
    ]);

    let states: Vec<i32> = filter_modified(pairs).collect().await;
    assert_eq!(states, vec![1, 2]);
}
