use crate::grammar::{ResolveError, TokenizeError};

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("parse error: {0}")]
    Tokenize(#[from] TokenizeError),
    #[error("command failed: {0:#}")]
    Callback(anyhow::Error),
}
