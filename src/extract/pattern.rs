//! Code patterns: `const` declarations tagged `@pattern`, or exported
//! constants whose name ends in `Pattern`.

use super::{missing_doc, non_empty, related, Extractor};
use crate::comment::{dedent, DocComment};
use crate::model::*;
use crate::source::{Declaration, DeclarationKind, ParsedSource, Value};

pub struct PatternExtractor;

impl Extractor for PatternExtractor {
    type Record = PatternRecord;

    fn extract_file(&self, source: &ParsedSource, rel_path: &str) -> ParseResult<PatternRecord> {
        let mut records = Vec::new();
        let mut errors = Vec::new();

        for decl in source
            .declarations
            .iter()
            .filter(|d| d.kind == DeclarationKind::Const)
        {
            let doc = DocComment::of(decl);
            let tags = doc.tags();
            let by_name = decl.exported && decl.name.ends_with("Pattern");
            if !tags.contains("pattern") && !by_name {
                continue;
            }
            if !doc.is_jsdoc() {
                errors.push(missing_doc(rel_path, decl.line, RecordKind::Pattern, &decl.name));
            }

            let code = doc
                .examples()
                .into_iter()
                .next()
                .or_else(|| initializer_code(decl))
                .unwrap_or_default();

            records.push(PatternRecord {
                name: decl.name.clone(),
                title: non_empty(tags.get("pattern"))
                    .map(str::to_string)
                    .unwrap_or_else(|| title_from_name(&decl.name)),
                category: non_empty(tags.get("category")).unwrap_or("general").to_string(),
                language: non_empty(tags.get("language"))
                    .unwrap_or("typescript")
                    .to_string(),
                description: doc.description(),
                code,
                notes: tags.get_all("note").into_iter().map(str::to_string).collect(),
                related: related(&tags),
                provenance: Provenance {
                    source_file: rel_path.to_string(),
                    line: decl.line,
                },
            });
        }

        ParseResult {
            records,
            errors,
            success: true,
        }
    }
}

/// String initializer, or the `code` property of an object initializer.
fn initializer_code(decl: &Declaration) -> Option<String> {
    let value = match decl.value.as_ref()? {
        Value::Object(_) => decl.value.as_ref()?.property("code")?,
        other => other,
    };
    let text = value.as_str()?;
    let lines: Vec<&str> = text.lines().collect();
    Some(dedent(&lines)).filter(|code| !code.is_empty())
}

/// `crudServicePattern` → `Crud Service`.
fn title_from_name(name: &str) -> String {
    let stem = name.strip_suffix("Pattern").unwrap_or(name);
    let mut title = String::with_capacity(stem.len() + 4);
    for (i, c) in stem.chars().enumerate() {
        if i == 0 {
            title.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            title.push(' ');
            title.push(c);
        } else if c == '_' {
            title.push(' ');
        } else {
            title.push(c);
        }
    }
    title
}
