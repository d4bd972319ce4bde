//! Textual grammar notation.
//!
//! The notation mirrors the canonical display form of segments:
//! - `word` or `'quoted words'` -> keyword
//! - `<name>`, `<name:type>` -> variable
//! - `<name:"a"|"b">` -> enumerated variable
//! - `<name...>`, `<name:type...>` -> rest variable
//! - `[ ... ]` -> optional group, nesting allowed
//! - `( ... | ... )` -> union of branches

use std::iter::Peekable;
use std::vec::IntoIter;

use super::scheme_lexer::{LexToken, tokenize};
use super::segment::{Segment, Variable, VariableType, keyword, optional, union, variable};
use super::{NotationError, SchemeError};

/// Parse notation into a scheme.
pub fn parse_scheme(source: &str) -> Result<Vec<Segment>, SchemeError> {
    let mut tokens = tokenize(source)?.into_iter().peekable();
    let segments = parse_sequence(&mut tokens)?;
    match tokens.next() {
        None => Ok(segments),
        Some(LexToken::CloseBracket(pos)) => Err(unexpected(']', pos)),
        Some(LexToken::CloseParen(pos)) => Err(unexpected(')', pos)),
        Some(LexToken::Pipe(pos)) => Err(unexpected('|', pos)),
        Some(other) => Err(NotationError::InvalidSyntax(format!("unexpected token {other:?}")).into()),
    }
}

fn unexpected(ch: char, pos: usize) -> SchemeError {
    NotationError::InvalidSyntax(format!("unexpected '{ch}' at position {pos}")).into()
}

type Tokens = Peekable<IntoIter<LexToken>>;

/// Parse segments until a closing token (left unconsumed) or end of input.
fn parse_sequence(tokens: &mut Tokens) -> Result<Vec<Segment>, SchemeError> {
    let mut segments = Vec::new();

    while let Some(token) = tokens.peek() {
        if matches!(
            token,
            LexToken::CloseBracket(_) | LexToken::CloseParen(_) | LexToken::Pipe(_)
        ) {
            break;
        }
        let Some(token) = tokens.next() else {
            break;
        };
        let segment = match token {
            LexToken::Word(word) | LexToken::Quoted(word) => keyword(word)?.into(),
            LexToken::Placeholder { content, .. } => parse_placeholder(&content)?.into(),
            LexToken::OpenBracket(pos) => parse_optional(tokens, pos)?,
            LexToken::OpenParen(pos) => parse_union(tokens, pos)?,
            LexToken::CloseBracket(_) | LexToken::CloseParen(_) | LexToken::Pipe(_) => break,
        };
        segments.push(segment);
    }

    Ok(segments)
}

fn parse_optional(tokens: &mut Tokens, start: usize) -> Result<Segment, SchemeError> {
    let inner = parse_sequence(tokens)?;
    match tokens.next() {
        Some(LexToken::CloseBracket(_)) => {}
        Some(LexToken::CloseParen(pos)) => return Err(unexpected(')', pos)),
        Some(LexToken::Pipe(pos)) => return Err(unexpected('|', pos)),
        _ => return Err(NotationError::UnclosedSquareBracket(start).into()),
    }
    if inner.is_empty() {
        return Err(
            NotationError::InvalidSyntax(format!("empty optional group at position {start}"))
                .into(),
        );
    }
    Ok(optional(inner))
}

fn parse_union(tokens: &mut Tokens, start: usize) -> Result<Segment, SchemeError> {
    let mut branches = Vec::new();
    loop {
        let branch = parse_sequence(tokens)?;
        if branch.is_empty() {
            return Err(NotationError::EmptyAlternative.into());
        }
        branches.push(branch);
        match tokens.next() {
            Some(LexToken::Pipe(_)) => continue,
            Some(LexToken::CloseParen(_)) => break,
            Some(LexToken::CloseBracket(pos)) => return Err(unexpected(']', pos)),
            _ => return Err(NotationError::UnclosedParen(start).into()),
        }
    }
    Ok(union(branches))
}

/// Interpret the inside of `<...>`: `name[:type|:"a"|"b"][...]`.
fn parse_placeholder(content: &str) -> Result<Variable, SchemeError> {
    let (body, rest) = match content.strip_suffix("...") {
        Some(body) => (body, true),
        None => (content, false),
    };

    let (name, annotation) = match body.split_once(':') {
        Some((name, annotation)) => (name, Some(annotation)),
        None => (body, None),
    };

    let mut var = variable(name)?;
    match annotation {
        None => {}
        Some("") => {
            return Err(
                NotationError::InvalidSyntax(format!("missing type after '{name}:'")).into(),
            );
        }
        Some(annotation) if annotation.starts_with('"') || annotation.starts_with('\'') => {
            var = var.enumerated(parse_choices(annotation)?);
        }
        Some(annotation) => {
            var = var.of_type(annotation.parse::<VariableType>()?);
        }
    }

    if rest {
        var = var.rest();
    }
    Ok(var)
}

/// Parse `"a"|"b"|'c'` into its unquoted choices.
fn parse_choices(annotation: &str) -> Result<Vec<String>, SchemeError> {
    let mut choices = Vec::new();
    let mut chars = annotation.chars().peekable();

    loop {
        let Some(quote @ ('"' | '\'')) = chars.next() else {
            return Err(NotationError::InvalidSyntax(format!(
                "enum choices must be quoted: {annotation}"
            ))
            .into());
        };
        let mut choice = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == quote {
                closed = true;
                break;
            }
            choice.push(c);
        }
        if !closed {
            return Err(
                NotationError::InvalidSyntax(format!("unclosed quote in choices: {annotation}")).into(),
            );
        }
        if choice.is_empty() {
            return Err(NotationError::EmptyAlternative.into());
        }
        choices.push(choice);

        match chars.next() {
            None => break,
            Some('|') => continue,
            Some(c) => {
                return Err(NotationError::InvalidSyntax(format!(
                    "unexpected '{c}' in choices: {annotation}"
                ))
                .into());
            }
        }
    }

    Ok(choices)
}
