mod grammar_properties;
mod notation_to_dispatch;

use cmdgraph::grammar::ResolveError;
use cmdgraph::grammar::command::{Command, Invocation, Outcome, Registry};
use cmdgraph::grammar::resolver::Resolution;
use cmdgraph::grammar::segment::{Segment, keyword};

fn silent(_: &Invocation) -> anyhow::Result<Outcome> {
    Ok(Outcome::Silent)
}

fn kw(name: &str) -> Segment {
    keyword(name).unwrap().into()
}

fn argv(input: &[&str]) -> Vec<String> {
    input.iter().map(|s| s.to_string()).collect()
}

fn registry_of(commands: Vec<(&str, Vec<Segment>)>) -> Registry {
    let mut registry = Registry::new();
    for (name, scheme) in commands {
        registry.register(Command::new(name, scheme, silent).unwrap());
    }
    registry
}

fn resolve(registry: &Registry, input: &[&str]) -> Result<Resolution, ResolveError> {
    registry.resolve(&input.join(" "), &argv(input))
}

type ResolveAssertion = fn(&Result<Resolution, ResolveError>);

fn assert_resolved(actual: &Result<Resolution, ResolveError>) {
    assert!(actual.is_ok(), "expected a resolution, got {:?}", actual.as_ref().err());
}

fn assert_unknown(actual: &Result<Resolution, ResolveError>) {
    assert!(
        matches!(actual, Err(ResolveError::UnknownCommand(_))),
        "expected UnknownCommand, got {:?}",
        actual.as_ref().err()
    );
}

fn assert_incomplete(actual: &Result<Resolution, ResolveError>) {
    assert!(
        matches!(actual, Err(ResolveError::IncompleteCommand(_))),
        "expected IncompleteCommand, got {:?}",
        actual.as_ref().err()
    );
}
