use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cmdgraph::grammar::ResolveError;
use cmdgraph::grammar::resolver::Binding;
use cmdgraph::grammar::segment::{VariableType, optional, union, variable};
use cmdgraph::grammar::value::Value;
use rstest::rstest;

use super::{
    ResolveAssertion, argv, assert_incomplete, assert_resolved, assert_unknown, kw, registry_of,
    resolve,
};

fn invokable_count(registry: &cmdgraph::grammar::command::Registry, input: &[&str]) -> usize {
    registry
        .match_all(&argv(input))
        .iter()
        .filter(|m| m.result.is_invokable())
        .count()
}

// ========================================
// Sequencing and optional chains
// ========================================

#[rstest]
#[case::exact(&["cmd", "x", "y"], assert_resolved as ResolveAssertion)]
#[case::missing_last(&["cmd", "x"], assert_incomplete as ResolveAssertion)]
#[case::extra_token(&["cmd", "x", "y", "z"], assert_unknown as ResolveAssertion)]
fn mandatory_segments_consume_every_token(
    #[case] input: &[&str],
    #[case] assertion: ResolveAssertion,
) {
    let registry = registry_of(vec![(
        "cmd",
        vec![variable("a").unwrap().into(), variable("b").unwrap().into()],
    )]);
    assertion(&resolve(&registry, input));
}

#[rstest]
#[case::none(&["cmd"], 1)]
#[case::first(&["cmd", "a"], 1)]
#[case::second(&["cmd", "b"], 1)]
#[case::both(&["cmd", "a", "b"], 1)]
#[case::reversed(&["cmd", "b", "a"], 0)]
#[case::repeated(&["cmd", "a", "a"], 0)]
fn trailing_optionals_reach_every_ordered_subset(#[case] input: &[&str], #[case] expected: usize) {
    let registry = registry_of(vec![(
        "cmd",
        vec![optional([kw("a")]), optional([kw("b")])],
    )]);
    assert_eq!(invokable_count(&registry, input), expected);
}

#[test]
fn mandatory_segment_between_optionals_is_still_required() {
    let registry = registry_of(vec![(
        "cmd",
        vec![optional([kw("a")]), kw("mid"), optional([kw("b")])],
    )]);
    assert_resolved(&resolve(&registry, &["cmd", "mid"]));
    assert_resolved(&resolve(&registry, &["cmd", "a", "mid", "b"]));
    assert_incomplete(&resolve(&registry, &["cmd", "a"]));
    assert_unknown(&resolve(&registry, &["cmd", "b"]));
}

// ========================================
// Unions
// ========================================

#[rstest]
#[case::first_branch(&["cmd", "a"], assert_resolved as ResolveAssertion)]
#[case::second_branch(&["cmd", "b"], assert_resolved as ResolveAssertion)]
#[case::both_branches(&["cmd", "a", "b"], assert_unknown as ResolveAssertion)]
#[case::no_branch(&["cmd"], assert_incomplete as ResolveAssertion)]
fn union_branches_are_exclusive(#[case] input: &[&str], #[case] assertion: ResolveAssertion) {
    let registry = registry_of(vec![("cmd", vec![union([vec![kw("a")], vec![kw("b")]])])]);
    assertion(&resolve(&registry, input));
}

#[test]
fn union_branch_partial_does_not_leak_into_sibling() {
    let registry = registry_of(vec![(
        "cmd",
        vec![union([vec![kw("add"), kw("now")], vec![kw("remove")]])],
    )]);
    let matches = registry.match_all(&argv(&["cmd", "add", "re"]));
    assert!(matches.is_empty());
}

// ========================================
// Variables
// ========================================

#[test]
fn rest_variable_collects_one_value_per_token() {
    let registry = registry_of(vec![("cmd", vec![variable("x").unwrap().rest().into()])]);
    let resolution = resolve(&registry, &["cmd", "a", "b", "c"]).unwrap();
    assert_eq!(
        resolution.variables.get("x"),
        Some(&Binding::List(vec!["a".into(), "b".into(), "c".into()]))
    );
}

#[rstest]
#[case::narrowed("pu", vec!["push", "pull"], false)]
#[case::unique_prefix("pa", vec!["pause"], false)]
#[case::exact("push", vec!["push"], true)]
fn enum_candidates_narrow_with_input(
    #[case] token: &str,
    #[case] expected: Vec<&str>,
    #[case] invokable: bool,
) {
    let registry = registry_of(vec![(
        "git",
        vec![
            variable("op")
                .unwrap()
                .enumerated(["push", "pull", "pause"])
                .into(),
        ],
    )]);
    let matches = registry.match_all(&argv(&["git", token]));
    assert_eq!(matches.len(), 1);
    let result = &matches[0].result;
    assert_eq!(result.is_invokable(), invokable);
    assert_eq!(result.is_partial(), !invokable);

    let last = result.last().unwrap();
    assert_eq!(last.enums, expected);
    if invokable {
        assert_eq!(last.value, Some(Value::Text("push".into())));
    } else {
        assert_eq!(last.value, None);
    }
}

#[test]
fn provider_runs_once_per_match() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let registry = registry_of(vec![(
        "checkout",
        vec![
            variable("branch")
                .unwrap()
                .provider(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    vec!["main".to_string(), "dev".to_string(), "main".to_string()]
                })
                .rest()
                .into(),
        ],
    )]);

    let matches = registry.match_all(&argv(&["checkout", "main", "dev", "m"]));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].result.last().unwrap().enums, vec!["main"]);

    registry.match_all(&argv(&["checkout", ""]));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[rstest]
#[case::number(VariableType::Number, "3.14", Some(Value::Number(3.14)))]
#[case::not_a_number(VariableType::Number, "pi", None)]
#[case::boolean_true(VariableType::Boolean, "true", Some(Value::Boolean(true)))]
#[case::boolean_false(VariableType::Boolean, "false", Some(Value::Boolean(false)))]
#[case::boolean_other(VariableType::Boolean, "yes", None)]
fn typed_variables_coerce_their_token(
    #[case] kind: VariableType,
    #[case] token: &str,
    #[case] expected: Option<Value>,
) {
    let registry = registry_of(vec![("set", vec![variable("v").unwrap().of_type(kind).into()])]);
    let resolved = resolve(&registry, &["set", token]);
    match expected {
        Some(value) => assert_eq!(
            resolved.unwrap().variables.get("v"),
            Some(&Binding::Single(value))
        ),
        None => assert_unknown(&resolved),
    }
}

// ========================================
// Ambiguity scoring
// ========================================

#[test]
fn typed_variable_outranks_string() {
    let registry = registry_of(vec![
        (
            "set",
            vec![variable("v").unwrap().of_type(VariableType::String).into()],
        ),
        (
            "set",
            vec![variable("v").unwrap().of_type(VariableType::Number).into()],
        ),
    ]);
    let resolution = resolve(&registry, &["set", "5"]).unwrap();
    assert_eq!(resolution.command.usage(), "set <v: number>");
    assert_eq!(
        resolution.variables.get("v"),
        Some(&Binding::Single(Value::Number(5.0)))
    );
}

#[test]
fn keyword_outranks_enum_and_free_text() {
    let registry = registry_of(vec![
        ("log", vec![kw("tail")]),
        ("log", vec![variable("mode").unwrap().enumerated(["tail", "head"]).into()]),
        ("log", vec![variable("file").unwrap().into()]),
    ]);
    let resolution = resolve(&registry, &["log", "tail"]).unwrap();
    assert_eq!(resolution.command.usage(), "log tail");

    let resolution = resolve(&registry, &["log", "head"]).unwrap();
    assert_eq!(resolution.command.usage(), r#"log <mode: "tail"|"head">"#);
}

#[test]
fn tie_between_commands_is_ambiguous() {
    let registry = registry_of(vec![
        ("open", vec![variable("path").unwrap().into()]),
        (
            "open",
            vec![variable("url").unwrap().of_type(VariableType::String).into()],
        ),
    ]);
    let err = resolve(&registry, &["open", "x"]).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::AmbiguousCommand(ref names) if names == &["open", "open"]
    ));
}

// ========================================
// End to end
// ========================================

#[test]
fn ban_binds_address() {
    let registry = registry_of(vec![(
        "ban",
        vec![variable("ip").unwrap().of_type(VariableType::String).into()],
    )]);
    let resolution = resolve(&registry, &["ban", "1.2.3.4"]).unwrap();
    assert_eq!(resolution.command.name(), "ban");
    assert_eq!(
        resolution.variables.get("ip"),
        Some(&Binding::Single("1.2.3.4".into()))
    );
    assert_eq!(resolution.segments(), vec!["ban", "<ip: string>"]);
}
