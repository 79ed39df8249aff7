//! Parser-agnostic view of a source file.
//!
//! Extractors only ever see the types in this module: declarations with
//! their leading comment, decorators, class members and literal values, and
//! member-call chains. The concrete tree-sitter walker lives in
//! [`typescript`].

pub mod typescript;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use typescript::SourceParser;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("syntax error near line {line}")]
    Syntax { line: usize },
    #[error("failed to load the TypeScript grammar")]
    Grammar(#[from] tree_sitter::LanguageError),
    #[error("parser produced no tree")]
    NoTree,
}

/// Anything that may carry a leading documentation comment.
pub trait Documented {
    /// Raw text of the nearest leading comment, delimiters included.
    fn leading_comment(&self) -> Option<&str>;
}

impl Documented for str {
    fn leading_comment(&self) -> Option<&str> {
        if self.trim().is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// A literal-ish expression value, as far as the syntax tree exposes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Number(String),
    Bool(bool),
    Object(Vec<(String, Value)>),
    Array(Vec<Value>),
    Call(Call),
    /// Anything else, as source text.
    Expr(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a property of an object literal.
    pub fn property(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(props) => props.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Value::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Render the value back as TypeScript-ish source text.
    pub fn source_text(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Value::Number(n) => n.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Object(props) if props.is_empty() => "{}".to_string(),
            Value::Object(props) => {
                let inner: Vec<String> = props
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.source_text()))
                    .collect();
                format!("{{ {} }}", inner.join(", "))
            }
            Value::Array(items) => {
                let inner: Vec<String> = items.iter().map(Value::source_text).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Call(call) => {
                let args: Vec<String> = call.args.iter().map(Value::source_text).collect();
                format!(
                    "{}{}({})",
                    call.callee,
                    call.type_args.as_deref().map(|t| format!("<{t}>")).unwrap_or_default(),
                    args.join(", ")
                )
            }
            Value::Expr(text) => text.clone(),
        }
    }
}

/// A call such as `input.required<string>('x')` or `new EventEmitter<T>()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Callee as written, e.g. `input.required`, `new EventEmitter`, `option`.
    pub callee: String,
    /// Generic arguments without the angle brackets.
    pub type_args: Option<String>,
    pub args: Vec<Value>,
    /// 1-based line of the callee.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub name: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Class,
    Function,
    Const,
    Variable,
    Interface,
    TypeAlias,
    Enum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Method,
    Getter,
    Setter,
}

/// A class member.
#[derive(Debug, Clone)]
pub struct Member {
    pub kind: MemberKind,
    pub name: String,
    pub line: usize,
    pub comment: Option<String>,
    /// A `// ...` comment on the same line, after the member.
    pub trailing_comment: Option<String>,
    pub decorators: Vec<Decorator>,
    /// Type annotation without the leading colon.
    pub type_annotation: Option<String>,
    pub value: Option<Value>,
    pub optional: bool,
}

impl Member {
    pub fn decorator(&self, name: &str) -> Option<&Decorator> {
        self.decorators.iter().find(|d| d.name == name)
    }
}

impl Documented for Member {
    fn leading_comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// A top-level declaration.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    pub line: usize,
    pub exported: bool,
    pub comment: Option<String>,
    pub decorators: Vec<Decorator>,
    pub members: Vec<Member>,
    /// Initializer of a variable declaration.
    pub value: Option<Value>,
}

impl Declaration {
    pub fn decorator(&self, name: &str) -> Option<&Decorator> {
        self.decorators.iter().find(|d| d.name == name)
    }
}

impl Documented for Declaration {
    fn leading_comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// An expression statement of chained member calls, e.g.
/// `program.command('x').option('-f').action(run)`.
#[derive(Debug, Clone)]
pub struct CallChain {
    pub line: usize,
    pub comment: Option<String>,
    /// Receiver the chain starts from (`program`).
    pub receiver: String,
    /// Calls in source order.
    pub calls: Vec<Call>,
}

impl Documented for CallChain {
    fn leading_comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// Everything the extractors need from one file.
#[derive(Debug, Clone, Default)]
pub struct ParsedSource {
    pub declarations: Vec<Declaration>,
    pub call_chains: Vec<CallChain>,
}

impl ParsedSource {
    /// Exported declarations in source order.
    pub fn exported_declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(|d| d.exported)
    }
}

/// Read and parse a file from disk.
pub fn parse_path(parser: &mut SourceParser, path: &Path) -> Result<ParsedSource, SourceError> {
    let text = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parser.parse(path, &text)
}
