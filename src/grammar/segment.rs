//! Declarative vocabulary for command grammars.
//!
//! A command scheme is an ordered list of [`Segment`]s. Keywords and
//! variables are "solid" segments that consume exactly one input token;
//! optional groups and unions only shape how solid segments are wired
//! together by the graph compiler.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::SchemeError;
use super::value::Value;

static NEXT_SEGMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a solid segment. Clones share the id, so a segment reused in
/// several positions of one scheme compiles to a single graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(u64);

impl SegmentId {
    fn next() -> Self {
        Self(NEXT_SEGMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    Any,
    Number,
    String,
    Boolean,
    Date,
    Flag,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::Any => "any",
            VariableType::Number => "number",
            VariableType::String => "string",
            VariableType::Boolean => "boolean",
            VariableType::Date => "date",
            VariableType::Flag => "flag",
        }
    }
}

impl FromStr for VariableType {
    type Err = SchemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(VariableType::Any),
            "number" => Ok(VariableType::Number),
            "string" => Ok(VariableType::String),
            "boolean" => Ok(VariableType::Boolean),
            "date" => Ok(VariableType::Date),
            "flag" => Ok(VariableType::Flag),
            other => Err(SchemeError::UnsupportedVariableType(other.to_string())),
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lazily evaluated source of enum candidates.
pub type EnumProvider = Arc<dyn Fn() -> Vec<String> + Send + Sync>;

/// Literal token that must appear verbatim.
#[derive(Debug, Clone)]
pub struct Keyword {
    id: SegmentId,
    name: String,
    comment: Option<String>,
}

impl Keyword {
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment_text(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// Named placeholder bound to one input token (or every trailing token for
/// rest variables).
#[derive(Clone)]
pub struct Variable {
    id: SegmentId,
    name: String,
    kind: Option<VariableType>,
    choices: Vec<String>,
    provider: Option<EnumProvider>,
    rest: bool,
    default: Option<Value>,
    comment: Option<String>,
}

impl Variable {
    pub fn of_type(mut self, kind: VariableType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restrict the variable to a fixed candidate list. Duplicates are
    /// dropped; first occurrence order is kept.
    pub fn enumerated<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = dedup_ordered(choices.into_iter().map(Into::into));
        self
    }

    pub fn provider<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Vec<String> + Send + Sync + 'static,
    {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn rest(mut self) -> Self {
        self.rest = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Option<VariableType> {
        self.kind
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn provider_fn(&self) -> Option<&EnumProvider> {
        self.provider.as_ref()
    }

    /// True when candidates come from a static list or a provider.
    pub fn is_enumerated(&self) -> bool {
        !self.choices.is_empty() || self.provider.is_some()
    }

    pub fn is_rest(&self) -> bool {
        self.rest
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn comment_text(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("choices", &self.choices)
            .field("provider", &self.provider.as_ref().map(|_| "<provider>"))
            .field("rest", &self.rest)
            .field("default", &self.default)
            .finish()
    }
}

/// One element of a command scheme.
#[derive(Debug, Clone)]
pub enum Segment {
    Keyword(Keyword),
    Variable(Variable),
    /// Nested sequence that may be skipped entirely.
    Optional(Vec<Segment>),
    /// Alternative nested sequences; exactly one must match.
    Union(Vec<Vec<Segment>>),
}

impl From<Keyword> for Segment {
    fn from(keyword: Keyword) -> Self {
        Segment::Keyword(keyword)
    }
}

impl From<Variable> for Segment {
    fn from(variable: Variable) -> Self {
        Segment::Variable(variable)
    }
}

pub fn keyword(name: impl Into<String>) -> Result<Keyword, SchemeError> {
    let name = name.into();
    if name.is_empty() {
        return Err(SchemeError::MissingKeywordName);
    }
    Ok(Keyword {
        id: SegmentId::next(),
        name,
        comment: None,
    })
}

pub fn variable(name: impl Into<String>) -> Result<Variable, SchemeError> {
    let name = name.into();
    if name.is_empty() {
        return Err(SchemeError::MissingVariableName);
    }
    Ok(Variable {
        id: SegmentId::next(),
        name,
        kind: None,
        choices: Vec::new(),
        provider: None,
        rest: false,
        default: None,
        comment: None,
    })
}

pub fn optional(segments: impl IntoIterator<Item = Segment>) -> Segment {
    Segment::Optional(segments.into_iter().collect())
}

pub fn union(branches: impl IntoIterator<Item = Vec<Segment>>) -> Segment {
    Segment::Union(branches.into_iter().collect())
}

/// Render a whole scheme in canonical help form, space separated.
pub fn render_scheme(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Keyword(keyword) => f.write_str(&keyword.name),
            Segment::Variable(variable) => write!(f, "{variable}"),
            Segment::Optional(inner) => write!(f, "[{}]", render_scheme(inner)),
            Segment::Union(branches) => {
                let rendered: Vec<String> = branches.iter().map(|b| render_scheme(b)).collect();
                write!(f, "({})", rendered.join(" | "))
            }
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rest = if self.rest { "..." } else { "" };
        if !self.choices.is_empty() {
            let quoted: Vec<String> = self.choices.iter().map(|c| format!("\"{c}\"")).collect();
            write!(f, "<{}: {}{rest}>", self.name, quoted.join("|"))
        } else if self.provider.is_some() {
            write!(f, "<{}: <provider>{rest}>", self.name)
        } else if let Some(kind) = self.kind {
            write!(f, "<{}: {kind}{rest}>", self.name)
        } else {
            write!(f, "<{}{rest}>", self.name)
        }
    }
}

/// Every variable declared in `segments`, including those nested in
/// optional groups and union branches, in declaration order.
pub fn scheme_variables(segments: &[Segment]) -> Vec<&Variable> {
    let mut out = Vec::new();
    collect_variables(segments, &mut out);
    out
}

fn collect_variables<'a>(segments: &'a [Segment], out: &mut Vec<&'a Variable>) {
    for segment in segments {
        match segment {
            Segment::Variable(v) => out.push(v),
            Segment::Optional(inner) => collect_variables(inner, out),
            Segment::Union(branches) => {
                for branch in branches {
                    collect_variables(branch, out);
                }
            }
            Segment::Keyword(_) => {}
        }
    }
}

fn dedup_ordered(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}
