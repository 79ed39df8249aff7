//! Extractors: one per record kind, sharing file discovery and merging.

pub mod command;
pub mod component;
pub mod pattern;
pub mod reference;

use crate::comment::Tags;
use crate::config::ExtractorConfig;
use crate::model::*;
use crate::source::{self, ParsedSource, SourceError, SourceParser};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use command::CommandExtractor;
pub use component::ComponentExtractor;
pub use pattern::PatternExtractor;
pub use reference::QuickReference;

/// Builds records from one parsed file.
pub trait Extractor: Sync {
    type Record: DocRecord + Send;

    /// `rel_path` is the file path relative to the project root.
    fn extract_file(&self, source: &ParsedSource, rel_path: &str) -> ParseResult<Self::Record>;
}

/// The extractor as a whole could not run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid glob pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("no files matched {}", patterns.join(", "))]
    NoMatches { patterns: Vec<String> },
}

/// Run `extractor` over every file matched by `config.patterns`.
///
/// Files are parsed in parallel and merged in sorted path order. Within a
/// file, errors are ordered by line. Records with a name already seen are
/// dropped with an error naming both locations.
pub fn extract<E: Extractor>(
    extractor: &E,
    root: &Path,
    config: &ExtractorConfig,
) -> Result<Extraction<E::Record>, ExtractError> {
    let (files, unreadable) = discover(root, config)?;

    let results: Vec<(String, ParseResult<E::Record>)> = files
        .par_iter()
        .map_init(SourceParser::new, |parser, path| {
            let rel = relative_path(root, path);
            let result = match parser {
                Ok(parser) => match source::parse_path(parser, path) {
                    Ok(parsed) => extractor.extract_file(&parsed, &rel),
                    Err(err) => ParseResult::failed(source_error(&rel, &err)),
                },
                Err(err) => ParseResult::failed(source_error(&rel, err)),
            };
            (rel, result)
        })
        .collect();

    let mut extraction = Extraction {
        errors: unreadable,
        ..Default::default()
    };
    let mut seen: HashMap<String, Provenance> = HashMap::new();
    for (rel, result) in results {
        let mut errors = result.errors;
        let mut kept = 0;
        for record in result.records {
            if let Some(first) = seen.get(record.name()) {
                errors.push(ParsingError::error(
                    &rel,
                    Some(record.provenance().line),
                    format!(
                        "duplicate {} `{}`: first defined at {}, also defined at {}",
                        E::Record::KIND.noun(),
                        record.name(),
                        first,
                        record.provenance()
                    ),
                ));
                continue;
            }
            seen.insert(record.name().to_string(), record.provenance().clone());
            extraction.records.push(record);
            kept += 1;
        }
        errors.sort_by_key(|e| e.line_number.unwrap_or(0));

        extraction.files.push(FileSummary {
            path: rel,
            records: kept,
            success: result.success,
        });
        extraction.errors.extend(errors);
    }

    Ok(extraction)
}

/// Expand the configured globs under `root`, sorted and de-duplicated.
///
/// Entries the walk could not read come back as errors next to the files.
fn discover(
    root: &Path,
    config: &ExtractorConfig,
) -> Result<(Vec<PathBuf>, Vec<ParsingError>), ExtractError> {
    let base = glob::Pattern::escape(&root.to_string_lossy());
    let mut files = Vec::new();
    let mut errors = Vec::new();
    for pattern in &config.patterns {
        let full = format!("{}/{}", base.trim_end_matches('/'), pattern);
        let matches = glob::glob(&full).map_err(|source| {
            ExtractError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            }
        })?;
        for entry in matches {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(err) => errors.push(ParsingError::error(
                    &relative_path(root, err.path()),
                    None,
                    format!("failed to read path: {}", err.error()),
                )),
            }
        }
    }
    files.sort();
    files.dedup();
    errors.dedup();

    if files.is_empty() && config.require_matches {
        return Err(ExtractError::NoMatches {
            patterns: config.patterns.clone(),
        });
    }
    Ok((files, errors))
}

/// `/`-separated path relative to `root`.
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn source_error(rel: &str, err: &SourceError) -> ParsingError {
    match err {
        SourceError::Syntax { line } => ParsingError::error(rel, Some(*line), err.to_string()),
        SourceError::Read { source, .. } => {
            ParsingError::error(rel, None, format!("failed to read file: {source}"))
        }
        _ => ParsingError::error(rel, None, err.to_string()),
    }
}

/// Warning for a declaration that matched but carries no JSDoc.
fn missing_doc(rel: &str, line: usize, kind: RecordKind, name: &str) -> ParsingError {
    ParsingError::warn(
        rel,
        Some(line),
        format!("{} `{}` has no documentation comment", kind.noun(), name),
    )
}

/// `@related A, B` and `@see C` values, split on commas.
fn related(tags: &Tags) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in tags.get_all("related").into_iter().chain(tags.get_all("see")) {
        for item in value.split([',', '\n']) {
            let item = item.trim();
            if !item.is_empty() && !out.iter().any(|r| r == item) {
                out.push(item.to_string());
            }
        }
    }
    out
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(patterns: &[&str]) -> ExtractorConfig {
        ExtractorConfig {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            output: "patterns.ts".to_string(),
            category_root: None,
            require_matches: true,
            reference: None,
        }
    }

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    const DOCUMENTED: &str = "/**\n * A pattern.\n * @pattern Foo\n */\nexport const fooPattern = `x`;\n";

    #[test]
    fn duplicates_keep_first_and_name_both_locations() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "p/a.ts", DOCUMENTED);
        write(dir.path(), "p/b.ts", DOCUMENTED);

        let out = extract(&PatternExtractor, dir.path(), &config(&["p/*.ts"])).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].provenance.source_file, "p/a.ts");
        assert_eq!(out.errors.len(), 1);
        let err = &out.errors[0];
        assert_eq!(err.severity, Severity::Error);
        assert!(err.message.contains("p/a.ts:5"), "{}", err.message);
        assert!(err.message.contains("p/b.ts:5"), "{}", err.message);
    }

    #[test]
    fn unparseable_file_is_isolated() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "p/1.ts", &DOCUMENTED.replace("fooPattern", "onePattern"));
        write(dir.path(), "p/2.ts", "export const = ;\n");
        write(dir.path(), "p/3.ts", &DOCUMENTED.replace("fooPattern", "threePattern"));

        let out = extract(&PatternExtractor, dir.path(), &config(&["p/*.ts"])).unwrap();
        let names: Vec<&str> = out.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["onePattern", "threePattern"]);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].file_path, "p/2.ts");
        assert_eq!(out.errors[0].severity, Severity::Error);
        assert!(!out.files[1].success);
    }

    #[test]
    fn overlapping_globs_are_deduplicated() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "p/a.ts", DOCUMENTED);
        let out = extract(&PatternExtractor, dir.path(), &config(&["p/*.ts", "p/a.ts"])).unwrap();
        assert_eq!(out.files.len(), 1);
        assert!(out.errors.is_empty());
    }

    #[test]
    fn zero_matches_is_a_phase_error_when_required() {
        let dir = TempDir::new().unwrap();
        let err = extract(&PatternExtractor, dir.path(), &config(&["none/*.ts"])).unwrap_err();
        assert!(matches!(err, ExtractError::NoMatches { .. }));

        let mut optional = config(&["none/*.ts"]);
        optional.require_matches = false;
        let out = extract(&PatternExtractor, dir.path(), &optional).unwrap();
        assert!(out.records.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "p/a.ts", DOCUMENTED);
        write(dir.path(), "p/locked/b.ts", DOCUMENTED);
        let locked = dir.path().join("p/locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Permission bits do not apply to this user.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let out = extract(&PatternExtractor, dir.path(), &config(&["p/**/*.ts"])).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.errors.len(), 1);
        let err = &out.errors[0];
        assert_eq!(err.severity, Severity::Error);
        assert_eq!(err.file_path, "p/locked");
        assert!(err.message.starts_with("failed to read path:"), "{}", err.message);
    }

    #[test]
    fn invalid_glob() {
        let dir = TempDir::new().unwrap();
        let err = extract(&PatternExtractor, dir.path(), &config(&["p/[.ts"])).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidPattern { .. }));
    }
}
