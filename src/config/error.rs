use crate::grammar::SchemeError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_saphyr::Error),
    #[error("scheme error: {0}")]
    Scheme(#[from] SchemeError),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("validation errors:\n{}", .0.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed '{{' in template '{0}'")]
    UnclosedBrace(String),
    #[error("empty placeholder in template '{0}'")]
    EmptyPlaceholder(String),
}
