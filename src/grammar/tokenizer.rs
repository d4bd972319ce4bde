use super::TokenizeError;

/// How trailing whitespace is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizeMode {
    /// Submitted lines: trailing whitespace is insignificant.
    Strict,
    /// Buffers being edited: trailing whitespace starts a new, empty token
    /// so the matcher reports what may come next.
    Tolerant,
}

/// Split a line into argv using shell-like quoting.
///
/// Single quotes are literal, double quotes honor `\"`, `\\`, `\$` and
/// `` \` `` escapes, and a backslash outside quotes escapes the next
/// character. Quoted empty strings produce empty tokens.
pub fn tokenize(input: &str, mode: TokenizeMode) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut chars = input.trim_start().chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
                chars.next();
            }
            '\'' => {
                has_token = true;
                chars.next();
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(TokenizeError::UnclosedQuote),
                    }
                }
            }
            '"' => {
                has_token = true;
                chars.next();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => current.push(c),
                            Some('\n') => {}
                            // unknown escape keeps its backslash
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(TokenizeError::UnclosedQuote),
                        },
                        Some(c) => current.push(c),
                        None => return Err(TokenizeError::UnclosedQuote),
                    }
                }
            }
            '\\' => {
                has_token = true;
                chars.next();
                match chars.next() {
                    Some('\n') | None => {}
                    Some(c) => current.push(c),
                }
            }
            _ => {
                has_token = true;
                current.push(ch);
                chars.next();
            }
        }
    }

    if has_token {
        tokens.push(current);
    } else if mode == TokenizeMode::Tolerant && !tokens.is_empty() {
        tokens.push(String::new());
    }

    Ok(tokens)
}
