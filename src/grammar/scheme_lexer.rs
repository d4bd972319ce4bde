use super::NotationError;

/// Raw token of the textual grammar notation. Positions are byte offsets
/// into the source string and only feed error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexToken {
    /// Bare word, e.g. `ban`
    Word(String),
    /// Quoted word; may contain whitespace
    Quoted(String),
    /// Content between `<` and `>`, whitespace outside quotes removed
    Placeholder { content: String, pos: usize },
    OpenBracket(usize),
    CloseBracket(usize),
    OpenParen(usize),
    CloseParen(usize),
    Pipe(usize),
}

/// Split grammar notation into [`LexToken`]s.
pub fn tokenize(source: &str) -> Result<Vec<LexToken>, NotationError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '"' | '\'' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == ch {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(NotationError::InvalidSyntax(format!(
                        "unclosed quote starting at position {pos}"
                    )));
                }
                tokens.push(LexToken::Quoted(value));
            }
            '<' => {
                chars.next();
                let mut content = String::new();
                let mut quote: Option<char> = None;
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    match quote {
                        Some(q) => {
                            if c == q {
                                quote = None;
                            }
                            content.push(c);
                        }
                        None => match c {
                            '>' => {
                                closed = true;
                                break;
                            }
                            '"' | '\'' => {
                                quote = Some(c);
                                content.push(c);
                            }
                            c if c.is_whitespace() => {}
                            c => content.push(c),
                        },
                    }
                }
                if !closed {
                    return Err(NotationError::UnclosedAngleBracket(pos));
                }
                tokens.push(LexToken::Placeholder { content, pos });
            }
            '>' => {
                return Err(NotationError::InvalidSyntax(format!(
                    "unexpected '>' at position {pos}"
                )));
            }
            '[' | ']' | '(' | ')' | '|' => {
                chars.next();
                tokens.push(match ch {
                    '[' => LexToken::OpenBracket(pos),
                    ']' => LexToken::CloseBracket(pos),
                    '(' => LexToken::OpenParen(pos),
                    ')' => LexToken::CloseParen(pos),
                    _ => LexToken::Pipe(pos),
                });
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if is_word_boundary(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(LexToken::Word(word));
            }
        }
    }

    Ok(tokens)
}

fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | '|' | '<' | '>' | '"' | '\'')
}
