//! Sessions against a real `/bin/sh`.

use std::time::Duration;

use shellpipe::error::SessionError;
use shellpipe::{Error, PollStrategy, ReadMode, SessionBuilder, SessionState, ShellSession};

fn start(poll: PollStrategy) -> ShellSession {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut session = SessionBuilder::new()
        .profile("posix")
        .poll_strategy(poll)
        .read_timeout(Duration::from_secs(10))
        .kill_on_drop(true)
        .build()
        .unwrap();
    session
        .read_until_prompt(|_| {}, ReadMode::Buffered)
        .unwrap();
    session
}

fn run(session: &mut ShellSession, command: &str) -> String {
    let mut out = None;
    session
        .execute(
            command,
            Some(&mut |text: &str| out = Some(text.to_string())),
            ReadMode::Buffered,
        )
        .unwrap();
    out.unwrap()
}

#[test]
fn test_echo() {
    let mut session = start(PollStrategy::Spin);
    assert_eq!(session.state(), SessionState::ProcessRunning);
    assert!(session.pid().is_some());
    assert_eq!(run(&mut session, "echo hello"), "hello\n");
}

#[test]
fn test_silent_command_is_empty() {
    let mut session = start(PollStrategy::Readiness(Duration::from_millis(20)));
    assert_eq!(run(&mut session, "true"), "");
    assert_eq!(run(&mut session, "cd /"), "");
}

#[test]
fn test_multiple_commands_share_state() {
    let mut session = start(PollStrategy::Sleep(Duration::from_millis(1)));
    assert_eq!(run(&mut session, "cd /"), "");
    assert_eq!(run(&mut session, "pwd"), "/\n");
    run(&mut session, "GREETING=hi");
    assert_eq!(run(&mut session, "echo $GREETING there"), "hi there\n");
}

#[test]
fn test_send_command() {
    let mut session = start(PollStrategy::Spin);
    let response = session.send_command("printf 'a\\nb\\n'").unwrap();
    assert_eq!(response.lines().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(response.result, response.raw_result);
}

#[test]
fn test_stderr_folded_into_output() {
    let mut session = start(PollStrategy::Spin);
    assert_eq!(run(&mut session, "echo oops >&2"), "oops\n");
}

#[test]
fn test_streaming_final_call_has_everything() {
    let mut session = start(PollStrategy::Readiness(Duration::from_millis(20)));

    let mut calls = Vec::new();
    session
        .execute(
            "echo one; sleep 0.2; echo two",
            Some(&mut |text: &str| calls.push(text.to_string())),
            ReadMode::Streaming,
        )
        .unwrap();

    assert_eq!(calls.last().unwrap(), "one\ntwo\n");
    for call in &calls {
        assert!("one\ntwo\n".starts_with(call.as_str()));
    }
}

#[test]
fn test_timeout_is_recoverable() {
    let mut session = SessionBuilder::new()
        .poll_strategy(PollStrategy::Readiness(Duration::from_millis(10)))
        .read_timeout(Duration::from_millis(200))
        .kill_on_drop(true)
        .build()
        .unwrap();
    session.read_until_prompt(|_| {}, ReadMode::Buffered).unwrap();

    session.write("sleep 1; echo late\n").unwrap();
    let err = session
        .read_until_prompt(|_| {}, ReadMode::Buffered)
        .unwrap_err();
    assert!(matches!(err, Error::Session(SessionError::ReadTimeout(_))));
    assert!(!err.is_fatal());

    let mut out = String::new();
    for _ in 0..20 {
        match session.read_until_prompt(|text| out = text.to_string(), ReadMode::Buffered) {
            Ok(()) => break,
            Err(Error::Session(SessionError::ReadTimeout(_))) => continue,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(out, "late\n");
}

#[test]
fn test_terminate() {
    let mut session = start(PollStrategy::Spin);
    session.terminate();
    assert_eq!(session.state(), SessionState::Terminated);
    assert!(session.send_command("echo hi").is_err());
}
