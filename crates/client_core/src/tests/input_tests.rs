use std::sync::Arc;

use super::*;
use crate::{
    record_source::RecordSource,
    review::SessionOptions,
    session::SessionState,
    test_support::{project, ScriptedSource},
};

const OPEN: InputGate = InputGate {
    can_decide: true,
    undo_available: true,
};

fn mounted() -> InputAdapter {
    let mut adapter = InputAdapter::new(KeyBindings::default(), true);
    assert!(adapter.mount());
    adapter
}

#[test]
fn default_keys_map_to_commands() {
    let adapter = mounted();
    assert_eq!(
        adapter.resolve(InputEvent::key('r'), OPEN),
        Some(ReviewCommand::Decide(Label::Relevant))
    );
    assert_eq!(
        adapter.resolve(InputEvent::key('I'), OPEN),
        Some(ReviewCommand::Decide(Label::Irrelevant))
    );
    assert_eq!(
        adapter.resolve(InputEvent::key('u'), OPEN),
        Some(ReviewCommand::Undo)
    );
    assert_eq!(adapter.resolve(InputEvent::key('x'), OPEN), None);
}

#[test]
fn modified_keys_are_ignored() {
    let adapter = mounted();
    let event = InputEvent::KeyDown {
        key: 'r',
        modifiers: Modifiers {
            ctrl: true,
            ..Modifiers::default()
        },
    };
    assert_eq!(adapter.resolve(event, OPEN), None);
}

#[test]
fn disabled_shortcuts_register_no_listener() {
    let mut adapter = InputAdapter::new(KeyBindings::default(), false);
    assert!(!adapter.mount());
    assert!(!adapter.is_listening());
    assert_eq!(adapter.resolve(InputEvent::key('r'), OPEN), None);
    assert_eq!(
        adapter.resolve(InputEvent::Action(ReviewCommand::Decide(Label::Relevant)), OPEN),
        Some(ReviewCommand::Decide(Label::Relevant))
    );
}

#[test]
fn unmount_removes_listener() {
    let mut adapter = mounted();
    adapter.unmount();
    assert!(!adapter.is_listening());
    assert_eq!(adapter.resolve(InputEvent::key('r'), OPEN), None);
}

#[test]
fn gate_drops_commands_the_session_cannot_take() {
    let adapter = mounted();
    let closed = InputGate::default();
    assert_eq!(adapter.resolve(InputEvent::key('r'), closed), None);
    assert_eq!(
        adapter.resolve(InputEvent::Action(ReviewCommand::Undo), closed),
        None
    );

    let decide_only = InputGate {
        can_decide: true,
        undo_available: false,
    };
    assert_eq!(adapter.resolve(InputEvent::key('u'), decide_only), None);
    assert!(adapter.resolve(InputEvent::key('i'), decide_only).is_some());
}

#[test]
fn custom_bindings_replace_defaults() {
    let bindings = KeyBindings {
        relevant: 'y',
        irrelevant: 'n',
        undo: 'z',
    };
    bindings.validate().expect("distinct keys");
    let mut adapter = InputAdapter::new(bindings, true);
    adapter.mount();
    assert_eq!(
        adapter.resolve(InputEvent::key('n'), OPEN),
        Some(ReviewCommand::Decide(Label::Irrelevant))
    );
    assert_eq!(adapter.resolve(InputEvent::key('r'), OPEN), None);
}

#[test]
fn conflicting_bindings_are_rejected() {
    let bindings = KeyBindings {
        relevant: 'a',
        irrelevant: 'A',
        undo: 'u',
    };
    assert!(matches!(
        bindings.validate(),
        Err(SettingsError::ConflictingKeyBindings { .. })
    ));
}

#[tokio::test]
async fn dispatch_drives_the_session() {
    let source = Arc::new(ScriptedSource::with_records([1, 2]));
    let session = ReviewSession::new(
        Arc::clone(&source) as Arc<dyn RecordSource>,
        project(),
        SessionOptions::default(),
    );
    let adapter = mounted();

    assert_eq!(adapter.dispatch(InputEvent::key('r'), &session).await, None);

    session.start().await;
    assert_eq!(adapter.dispatch(InputEvent::key('u'), &session).await, None);
    assert_eq!(
        adapter.dispatch(InputEvent::key('r'), &session).await,
        Some(ReviewCommand::Decide(Label::Relevant))
    );
    assert_eq!(
        adapter.dispatch(InputEvent::key('u'), &session).await,
        Some(ReviewCommand::Undo)
    );
    assert!(matches!(
        session.state().await,
        SessionState::Ready {
            selection: Some(Label::Relevant),
            ..
        }
    ));
}
