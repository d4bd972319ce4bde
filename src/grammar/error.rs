#[derive(Debug, thiserror::Error)]
pub enum NotationError {
    #[error("unclosed angle bracket at position {0}")]
    UnclosedAngleBracket(usize),
    #[error("unclosed square bracket at position {0}")]
    UnclosedSquareBracket(usize),
    #[error("unclosed parenthesis at position {0}")]
    UnclosedParen(usize),
    #[error("empty alternative")]
    EmptyAlternative,
    #[error("invalid syntax: {0}")]
    InvalidSyntax(String),
}

/// Malformed command declarations. These surface at registration time and
/// indicate a programming error, never a user input problem.
#[derive(Debug, thiserror::Error)]
pub enum SchemeError {
    #[error("missing keyword name")]
    MissingKeywordName,
    #[error("missing variable name")]
    MissingVariableName,
    #[error("unsupported variable type: {0}")]
    UnsupportedVariableType(String),
    #[error("grammar notation error: {0}")]
    Notation(#[from] NotationError),
}

#[derive(Debug, thiserror::Error)]
pub enum TokenizeError {
    #[error("unclosed quote")]
    UnclosedQuote,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("incomplete command: {0}")]
    IncompleteCommand(String),
    #[error("ambiguous command, candidates: {}", .0.join(", "))]
    AmbiguousCommand(Vec<String>),
}
