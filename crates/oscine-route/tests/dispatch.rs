//! Integration tests for the dispatcher: registration, match modes, match
//! policy, and bundle flattening.

use std::sync::{Arc, Mutex};

use oscine_proto::{Bundle, Message, Packet, TimeTag};
use oscine_route::{Dispatcher, HandlerError, MatchMode};

// =========================================================================
// Helpers
// =========================================================================

/// A handler that appends a label to a shared log on every invocation.
fn recording(
    log: &Arc<Mutex<Vec<String>>>,
    label: &str,
) -> impl Fn(Message) -> Result<(), HandlerError> + Send + Sync {
    let log = Arc::clone(log);
    let label = label.to_string();
    move |_msg| {
        log.lock().unwrap().push(label.clone());
        Ok(())
    }
}

fn message(addr: &str) -> Message {
    Message::new(addr)
}

// =========================================================================
// Registration
// =========================================================================

#[test]
fn register_rejects_invalid_addresses() {
    let mut dispatcher = Dispatcher::new();
    let ok = |_msg: Message| -> Result<(), HandlerError> { Ok(()) };
    assert!(dispatcher.register("no-slash", ok).is_err());
    assert!(dispatcher.register("/bad [class", ok).is_err());
    assert!(dispatcher.is_empty());
}

#[test]
fn duplicate_registration_replaces_in_place() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("/a", recording(&log, "first-a")).unwrap();
    dispatcher.register("/b", recording(&log, "b")).unwrap();
    dispatcher.register("/a", recording(&log, "second-a")).unwrap();
    assert_eq!(dispatcher.len(), 2);

    let mut bundle = Bundle::new(TimeTag::IMMEDIATE);
    bundle.push(message("/a")).push(message("/b"));
    dispatcher
        .dispatch_packet(&Packet::from(bundle), MatchMode::Pattern)
        .unwrap();

    // "/a" kept its original slot, so it still dispatches before "/b".
    assert_eq!(*log.lock().unwrap(), vec!["second-a", "b"]);
}

// =========================================================================
// Match modes and policy
// =========================================================================

#[test]
fn exact_mode_ignores_metacharacters() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("/lfo/?", recording(&log, "wild")).unwrap();

    dispatcher
        .dispatch_message(&message("/lfo/1"), MatchMode::Exact)
        .unwrap();
    assert!(log.lock().unwrap().is_empty());

    // In exact mode only the literal registered string matches.
    dispatcher
        .dispatch_message(&message("/lfo/?"), MatchMode::Exact)
        .unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["wild"]);
}

#[test]
fn pattern_mode_single_char_wildcard() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("/lfo/?", recording(&log, "hit")).unwrap();

    for addr in ["/lfo/1", "/lfo/22", "/lfo/a"] {
        dispatcher
            .dispatch_message(&message(addr), MatchMode::Pattern)
            .unwrap();
    }
    // "/lfo/22" has two characters after the slash and must not match.
    assert_eq!(*log.lock().unwrap(), vec!["hit", "hit"]);
}

#[test]
fn all_matching_handlers_run_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("/synth/*", recording(&log, "star")).unwrap();
    dispatcher.register("/unrelated", recording(&log, "none")).unwrap();
    dispatcher
        .register("/synth/freq", recording(&log, "literal"))
        .unwrap();

    dispatcher
        .dispatch_message(&message("/synth/freq"), MatchMode::Pattern)
        .unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["star", "literal"]);
}

#[test]
fn handler_error_aborts_remaining_matches() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("/x", recording(&log, "before")).unwrap();
    dispatcher
        .register("/*", |_msg: Message| -> Result<(), HandlerError> {
            Err("handler exploded".into())
        })
        .unwrap();
    dispatcher.register("/x*", recording(&log, "after")).unwrap();

    let err = dispatcher
        .dispatch_message(&message("/x"), MatchMode::Pattern)
        .unwrap_err();
    assert!(err.to_string().contains("handler exploded"));
    assert_eq!(*log.lock().unwrap(), vec!["before"]);
}

#[test]
fn handlers_see_the_arguments_from_the_start() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    {
        let seen = Arc::clone(&seen);
        dispatcher
            .register("/value", move |mut msg: Message| -> Result<(), HandlerError> {
                seen.lock().unwrap().push(msg.read_i32()?);
                Ok(())
            })
            .unwrap();
    }
    {
        let seen = Arc::clone(&seen);
        dispatcher
            .register("/*", move |mut msg: Message| -> Result<(), HandlerError> {
                // Even as a second matcher this handler gets a fresh cursor.
                seen.lock().unwrap().push(msg.read_i32()?);
                Ok(())
            })
            .unwrap();
    }

    let mut msg = message("/value");
    msg.write_i32(1122);
    dispatcher
        .dispatch_message(&msg, MatchMode::Pattern)
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![1122, 1122]);
}

// =========================================================================
// Bundles
// =========================================================================

#[test]
fn bundles_dispatch_every_packet_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("/a", recording(&log, "a")).unwrap();
    dispatcher.register("/b", recording(&log, "b")).unwrap();
    dispatcher.register("/c", recording(&log, "c")).unwrap();

    let mut inner = Bundle::new(TimeTag::IMMEDIATE);
    inner.push(message("/b"));
    let mut outer = Bundle::new(TimeTag::IMMEDIATE);
    outer.push(message("/a")).push(inner).push(message("/c"));

    dispatcher
        .dispatch_packet(&Packet::from(outer), MatchMode::Pattern)
        .unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn bundle_stops_at_the_first_handler_error() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("/a", recording(&log, "a")).unwrap();
    dispatcher
        .register("/boom", |_msg: Message| -> Result<(), HandlerError> {
            Err("bundle abort".into())
        })
        .unwrap();
    dispatcher.register("/c", recording(&log, "c")).unwrap();

    let mut bundle = Bundle::new(TimeTag::IMMEDIATE);
    bundle
        .push(message("/a"))
        .push(message("/boom"))
        .push(message("/c"));

    let err = dispatcher
        .dispatch_packet(&Packet::from(bundle), MatchMode::Pattern)
        .unwrap_err();
    assert!(err.to_string().contains("bundle abort"));
    assert_eq!(*log.lock().unwrap(), vec!["a"]);
}
