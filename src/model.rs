//! Data model for extracted records, diagnostics and run statistics.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// The closed set of record kinds the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Component,
    Command,
    Pattern,
}

impl RecordKind {
    /// Singular noun used in diagnostics ("component `Foo`").
    pub fn noun(self) -> &'static str {
        match self {
            RecordKind::Component => "component",
            RecordKind::Command => "command",
            RecordKind::Pattern => "pattern",
        }
    }

    /// Plural slug used in phase names ("extract-components").
    pub fn slug(self) -> &'static str {
        match self {
            RecordKind::Component => "components",
            RecordKind::Command => "commands",
            RecordKind::Pattern => "patterns",
        }
    }
}

/// Where a record was declared. Never part of a record's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Path relative to the project root, `/`-separated.
    pub source_file: String,
    /// 1-based line of the declaration name.
    pub line: usize,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_file, self.line)
    }
}

/// Shape shared by every extracted record.
pub trait DocRecord {
    const KIND: RecordKind;

    fn name(&self) -> &str;

    /// Key of the record in the generated data table.
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.name())
    }

    fn description(&self) -> &str;
    fn example(&self) -> Option<&str>;
    fn provenance(&self) -> &Provenance;

    /// First required field that is empty, if any.
    fn missing_required(&self) -> Option<&'static str>;
}

// -- Components ---------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentInput {
    pub name: String,
    pub type_name: String,
    pub default: Option<String>,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentOutput {
    pub name: String,
    pub type_name: String,
    pub description: String,
}

/// An Angular component declared with `@Component`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRecord {
    pub name: String,
    pub selector: String,
    pub category: String,
    pub description: String,
    pub inputs: Vec<ComponentInput>,
    pub outputs: Vec<ComponentOutput>,
    pub usage: Option<String>,
    pub best_practices: Vec<String>,
    pub related: Vec<String>,
    pub provenance: Provenance,
}

impl DocRecord for ComponentRecord {
    const KIND: RecordKind = RecordKind::Component;

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn example(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    fn missing_required(&self) -> Option<&'static str> {
        if self.selector.trim().is_empty() {
            Some("selector")
        } else {
            None
        }
    }
}

// -- Commands -----------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Boolean,
    String,
    Number,
}

impl OptionType {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionType::Boolean => "boolean",
            OptionType::String => "string",
            OptionType::Number => "number",
        }
    }
}

/// Literal default of a command option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionDefault {
    Bool(bool),
    /// Kept as source text so the generated literal matches it exactly.
    Number(String),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOption {
    pub name: String,
    pub alias: Option<String>,
    pub value_type: OptionType,
    pub default: Option<OptionDefault>,
    pub description: String,
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// A CLI command registered through a `.command('...')` call chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub name: String,
    pub alias: Option<String>,
    pub description: String,
    pub usage: String,
    pub arguments: Vec<CommandArgument>,
    pub options: Vec<CommandOption>,
    pub examples: Vec<String>,
    pub notes: Vec<String>,
    pub provenance: Provenance,
}

impl DocRecord for CommandRecord {
    const KIND: RecordKind = RecordKind::Command;

    fn name(&self) -> &str {
        &self.name
    }

    /// Command names are kebab-case; the table key is their camelCase form.
    fn key(&self) -> Cow<'_, str> {
        if !self.name.contains(['-', ':']) {
            return Cow::Borrowed(&self.name);
        }
        let mut key = String::with_capacity(self.name.len());
        let mut upper = false;
        for c in self.name.chars() {
            if c == '-' || c == ':' {
                upper = true;
            } else if upper {
                key.extend(c.to_uppercase());
                upper = false;
            } else {
                key.push(c);
            }
        }
        Cow::Owned(key)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn example(&self) -> Option<&str> {
        self.examples.first().map(String::as_str)
    }

    fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    fn missing_required(&self) -> Option<&'static str> {
        if self.usage.trim().is_empty() {
            Some("usage")
        } else {
            None
        }
    }
}

/// A CRUD generator package tier listed in the CLI quick reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    pub description: String,
    pub features: Vec<String>,
    pub use_cases: Vec<String>,
    pub command: String,
}

// -- Patterns -----------------------------------------------------------------

/// A reusable code pattern declared as a documented constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRecord {
    pub name: String,
    pub title: String,
    pub category: String,
    pub language: String,
    pub description: String,
    pub code: String,
    pub notes: Vec<String>,
    pub related: Vec<String>,
    pub provenance: Provenance,
}

impl DocRecord for PatternRecord {
    const KIND: RecordKind = RecordKind::Pattern;

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn example(&self) -> Option<&str> {
        if self.code.is_empty() {
            None
        } else {
            Some(&self.code)
        }
    }

    fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    fn missing_required(&self) -> Option<&'static str> {
        if self.code.trim().is_empty() {
            Some("code")
        } else {
            None
        }
    }
}

// -- Diagnostics --------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warn => f.write_str("warn"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A problem found while extracting from one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingError {
    pub file_path: String,
    pub message: String,
    pub line_number: Option<usize>,
    pub severity: Severity,
}

impl ParsingError {
    pub fn warn(file_path: &str, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            file_path: file_path.to_string(),
            message: message.into(),
            line_number: line,
            severity: Severity::Warn,
        }
    }

    pub fn error(file_path: &str, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            file_path: file_path.to_string(),
            message: message.into(),
            line_number: line,
            severity: Severity::Error,
        }
    }

    /// `path:line` or just `path`.
    pub fn location(&self) -> String {
        match self.line_number {
            Some(line) => format!("{}:{}", self.file_path, line),
            None => self.file_path.clone(),
        }
    }
}

/// Outcome of extracting one file.
///
/// `success` is false only when nothing usable could be built from the file;
/// warnings may accompany a successful result.
#[derive(Debug)]
pub struct ParseResult<T> {
    pub records: Vec<T>,
    pub errors: Vec<ParsingError>,
    pub success: bool,
}

impl<T> ParseResult<T> {
    pub fn failed(error: ParsingError) -> Self {
        Self {
            records: Vec::new(),
            errors: vec![error],
            success: false,
        }
    }
}

/// Per-file line of an extraction, kept for verbose progress output.
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub path: String,
    pub records: usize,
    pub success: bool,
}

/// Everything one extractor produced.
#[derive(Debug)]
pub struct Extraction<T> {
    pub records: Vec<T>,
    pub errors: Vec<ParsingError>,
    pub files: Vec<FileSummary>,
}

impl<T> Default for Extraction<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            errors: Vec::new(),
            files: Vec::new(),
        }
    }
}

// -- Orchestration ------------------------------------------------------------

/// One step of the sync state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ParseArgs,
    Extract(RecordKind),
    Generate(RecordKind),
    Validate(RecordKind),
    Write(RecordKind),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::ParseArgs => f.write_str("parse-args"),
            Phase::Extract(kind) => write!(f, "extract-{}", kind.slug()),
            Phase::Generate(kind) => write!(f, "generate-{}", kind.slug()),
            Phase::Validate(kind) => write!(f, "validate-{}", kind.slug()),
            Phase::Write(kind) => write!(f, "write-{}", kind.slug()),
        }
    }
}

/// A whole phase failed to produce its output.
#[derive(Debug, Clone)]
pub struct SyncError {
    pub phase: Phase,
    pub message: String,
    pub file_path: Option<String>,
    /// Rendered cause chain of the underlying error.
    pub original_error: Option<String>,
}

/// Summary counters of one run.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    pub components_found: usize,
    pub commands_found: usize,
    pub patterns_found: usize,
    pub packages_found: usize,
    pub files_generated: Vec<PathBuf>,
    pub time_elapsed: Duration,
}
