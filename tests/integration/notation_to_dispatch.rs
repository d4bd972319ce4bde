use cmdgraph::grammar::command::{Command, Invocation, Outcome, Registry};
use cmdgraph::grammar::scheme_parser::parse_scheme;
use cmdgraph::shell::Shell;
use rstest::{fixture, rstest};

fn echo_bindings(inv: &Invocation) -> anyhow::Result<Outcome> {
    let pairs: Vec<String> = inv
        .variables
        .iter()
        .map(|(name, binding)| format!("{name}={binding}"))
        .collect();
    Ok(Outcome::Text(format!("{} {}", inv.command, pairs.join(" "))))
}

#[fixture]
fn shell() -> Shell {
    let mut registry = Registry::new();
    for (name, grammar) in [
        ("deploy", r#"<env:"staging"|"prod"> [<force:flag>]"#),
        ("remind", "<when:date> <message...>"),
        ("remote", "(add <name> <url> | remove <name>)"),
        ("scale", "<replicas:number> [to <target:number>]"),
    ] {
        let scheme = parse_scheme(grammar).unwrap();
        registry.register(Command::new(name, scheme, echo_bindings).unwrap());
    }
    Shell::new(registry).unwrap()
}

#[rstest]
#[case::enum_only("deploy prod", "deploy env=prod")]
#[case::flag("deploy staging force", "deploy env=staging force=true")]
#[case::date_and_rest(
    "remind 2024-05-01 call mom",
    "remind message=call mom when=2024-05-01T00:00:00+00:00"
)]
#[case::union_add("remote add origin git@host:repo", "remote name=origin url=git@host:repo")]
#[case::union_remove("remote remove origin", "remote name=origin")]
#[case::optional_group("scale 3 to 0x10", "scale replicas=3 target=16")]
#[case::optional_skipped("scale 3", "scale replicas=3")]
fn notation_commands_dispatch(shell: Shell, #[case] line: &str, #[case] expected: &str) {
    assert_eq!(shell.submit(line).unwrap(), Outcome::Text(expected.into()));
}

#[rstest]
#[case::bad_enum("deploy dev")]
#[case::bad_date("remind someday call mom")]
#[case::bad_number("scale three")]
fn notation_rejects_mistyped_tokens(shell: Shell, #[case] line: &str) {
    assert_eq!(
        shell.submit(line).unwrap(),
        Outcome::Text(format!("unknown command: {line}"))
    );
}

#[rstest]
fn hints_walk_the_union(shell: Shell) {
    let report = shell.hints("remote ");
    assert_eq!(report.candidates(), vec!["add", "remove"]);

    let report = shell.hints("remote re");
    assert_eq!(report.hints.len(), 1);
    assert_eq!(report.hints[0].segment, "remove");
    assert!(report.hints[0].partial);
}

#[rstest]
fn untyped_variable_accepts_empty_token(shell: Shell) {
    let report = shell.hints("remote add origin ");
    assert!(report.has_invokable());
    assert_eq!(report.hints[0].segment, "<url>");
}

#[rstest]
fn partial_flag_is_a_hint_not_a_command(shell: Shell) {
    let report = shell.hints("deploy prod fo");
    assert_eq!(report.hints.len(), 1);
    assert_eq!(report.hints[0].segment, "<force: flag>");
    assert!(!report.has_invokable());
}

#[rstest]
fn help_lists_notation_usage(shell: Shell) {
    let Outcome::Text(text) = shell.submit("help remote").unwrap() else {
        panic!("help should reply with text");
    };
    assert_eq!(text, "remote (add <name> <url> | remove <name>)");
}
