//! Generators: trait-based emission of the TypeScript data modules.
//!
//! Every module has the same frame: a `//` header, the record interfaces,
//! optional domain preamble, then
//! `export const <name>: Record<string, <Info>> = { ... };`
//! with entries sorted by name.

pub mod commands;
pub mod components;
pub mod patterns;

use crate::model::DocRecord;
use std::collections::HashSet;

pub use commands::CommandsGenerator;
pub use components::ComponentsGenerator;
pub use patterns::PatternsGenerator;

/// Emits one data module.
pub trait ModuleGenerator {
    type Record: DocRecord;

    /// Short name shown in the header ("components").
    fn label(&self) -> &str;

    /// Glob patterns the records were extracted from.
    fn sources(&self) -> &[String];

    /// Name of the exported data constant.
    fn export_name(&self) -> &str;

    /// Name of the per-record interface.
    fn info_type(&self) -> &str;

    /// Interfaces and any other declarations placed before the table.
    fn write_preamble(&self, out: &mut String, records: &[&Self::Record]);

    /// Body of one entry, indented by four spaces, each field ending in `,\n`.
    fn write_fields(&self, out: &mut String, record: &Self::Record);

    /// Lookup helpers after the table.
    fn write_helpers(&self, _out: &mut String) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    pub code: String,
    pub warnings: Vec<String>,
    pub record_count: usize,
}

/// Render `records` into a module.
///
/// Records whose key is not a valid identifier, whose required field is
/// empty, or whose key was already emitted are left out with a warning.
pub fn generate<G: ModuleGenerator>(generator: &G, records: &[G::Record]) -> GeneratedModule {
    let mut sorted: Vec<&G::Record> = records.iter().collect();
    sorted.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.key().cmp(&b.key())));

    let noun = G::Record::KIND.noun();
    let mut warnings = Vec::new();
    let mut keys: HashSet<String> = HashSet::new();
    let mut kept: Vec<&G::Record> = Vec::with_capacity(sorted.len());

    for record in sorted {
        let key = record.key();
        if !is_valid_identifier(&key) {
            warnings.push(format!(
                "excluded {noun} `{}` ({}): `{key}` is not a valid identifier",
                record.name(),
                record.provenance()
            ));
        } else if let Some(field) = record.missing_required() {
            warnings.push(format!(
                "excluded {noun} `{}` ({}): required field `{field}` is empty",
                record.name(),
                record.provenance()
            ));
        } else if !keys.insert(key.to_string()) {
            warnings.push(format!(
                "excluded {noun} `{}` ({}): duplicate key `{key}`",
                record.name(),
                record.provenance()
            ));
        } else {
            kept.push(record);
        }
    }

    let mut out = String::new();
    write_header(&mut out, generator);
    generator.write_preamble(&mut out, &kept);

    out.push_str(&format!(
        "export const {}: Record<string, {}> = {{\n",
        generator.export_name(),
        generator.info_type()
    ));
    for record in &kept {
        out.push_str(&format!("  {}: {{\n", record.key()));
        generator.write_fields(&mut out, record);
        out.push_str("  },\n");
    }
    out.push_str("};\n");
    generator.write_helpers(&mut out);

    GeneratedModule {
        code: out,
        warnings,
        record_count: kept.len(),
    }
}

fn write_header<G: ModuleGenerator>(out: &mut String, generator: &G) {
    out.push_str(&format!(
        "// Generated by mcp-sync ({} generator). Do not edit by hand.\n",
        generator.label()
    ));
    out.push_str("//\n// Sources:\n");
    for source in generator.sources() {
        out.push_str(&format!("//   {}\n", source));
    }
    out.push_str("//\n// Regenerate with: mcp-sync\n\n");
}

// -- Identifiers --------------------------------------------------------------

const RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "new", "null", "package", "private", "protected", "public", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// An ASCII JavaScript identifier that is not a reserved word.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !RESERVED_WORDS.contains(&name)
}

// -- Literals -----------------------------------------------------------------

/// Body of a single-quoted string literal.
pub fn escape_single(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '`' => out.push_str("\\`"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

/// Body of a template literal; newlines stay verbatim.
pub fn escape_template(s: &str) -> String {
    s.replace('\\', "\\\\").replace('`', "\\`").replace('$', "\\$")
}

pub fn quote(s: &str) -> String {
    format!("'{}'", escape_single(s))
}

pub fn template(s: &str) -> String {
    format!("`{}`", escape_template(s))
}

// -- Field writers ------------------------------------------------------------

/// `<indent>name: 'value',`
pub fn write_str_field(out: &mut String, indent: usize, name: &str, value: &str) {
    out.push_str(&format!("{:indent$}{}: {},\n", "", name, quote(value)));
}

/// `<indent>name: `value`,`
pub fn write_template_field(out: &mut String, indent: usize, name: &str, value: &str) {
    out.push_str(&format!("{:indent$}{}: {},\n", "", name, template(value)));
}

pub fn write_opt_str_field(out: &mut String, indent: usize, name: &str, value: Option<&str>) {
    if let Some(v) = value {
        write_str_field(out, indent, name, v);
    }
}

/// A string array, on one line when empty.
pub fn write_string_array(out: &mut String, indent: usize, name: &str, items: &[String]) {
    if items.is_empty() {
        out.push_str(&format!("{:indent$}{}: [],\n", "", name));
        return;
    }
    out.push_str(&format!("{:indent$}{}: [\n", "", name));
    for item in items {
        out.push_str(&format!("{:w$}{},\n", "", quote(item), w = indent + 2));
    }
    out.push_str(&format!("{:indent$}],\n", ""));
}

/// Like [`write_string_array`] but with template literals.
pub fn write_template_array(out: &mut String, indent: usize, name: &str, items: &[String]) {
    if items.is_empty() {
        out.push_str(&format!("{:indent$}{}: [],\n", "", name));
        return;
    }
    out.push_str(&format!("{:indent$}{}: [\n", "", name));
    for item in items {
        out.push_str(&format!("{:w$}{},\n", "", template(item), w = indent + 2));
    }
    out.push_str(&format!("{:indent$}],\n", ""));
}

/// Omitted entirely when empty.
pub fn write_opt_string_array(out: &mut String, indent: usize, name: &str, items: &[String]) {
    if !items.is_empty() {
        write_string_array(out, indent, name, items);
    }
}
