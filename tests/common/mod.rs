#![allow(dead_code)]

use cmdgraph::grammar::ResolveError;
use cmdgraph::grammar::command::Outcome;
use cmdgraph::shell::ShellError;

/// Function pointer type for asserting submit results in `#[case]` attributes.
pub type SubmitAssertion = fn(&Result<Outcome, ShellError>);

pub fn assert_silent(actual: &Result<Outcome, ShellError>) {
    assert!(
        matches!(actual, Ok(Outcome::Silent)),
        "expected Silent, got {:?}",
        actual
    );
}

pub fn assert_exit(actual: &Result<Outcome, ShellError>) {
    assert!(
        matches!(actual, Ok(Outcome::Exit)),
        "expected Exit, got {:?}",
        actual
    );
}

pub fn assert_unknown_notice(actual: &Result<Outcome, ShellError>) {
    assert!(
        matches!(actual, Ok(Outcome::Text(t)) if t.starts_with("unknown command: ")),
        "expected unknown command notice, got {:?}",
        actual
    );
}

pub fn assert_incomplete(actual: &Result<Outcome, ShellError>) {
    assert!(
        matches!(
            actual,
            Err(ShellError::Resolve(ResolveError::IncompleteCommand(_)))
        ),
        "expected IncompleteCommand, got {:?}",
        actual
    );
}

pub fn assert_ambiguous(actual: &Result<Outcome, ShellError>) {
    assert!(
        matches!(
            actual,
            Err(ShellError::Resolve(ResolveError::AmbiguousCommand(_)))
        ),
        "expected AmbiguousCommand, got {:?}",
        actual
    );
}

pub fn assert_reply(actual: &Result<Outcome, ShellError>, expected: &str) {
    match actual {
        Ok(Outcome::Text(text)) => assert_eq!(text, expected),
        other => panic!("expected reply {expected:?}, got {other:?}"),
    }
}

pub fn argv(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
