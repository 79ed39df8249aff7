//! Sync orchestration: extract all kinds concurrently, then per kind
//! generate, validate in memory, and either preview or write atomically.

use crate::config::{ExtractorConfig, SyncConfig};
use crate::extract::{
    self, CommandExtractor, ComponentExtractor, ExtractError, PatternExtractor, QuickReference,
};
use crate::generate::{self, CommandsGenerator, ComponentsGenerator, ModuleGenerator, PatternsGenerator};
use crate::model::*;
use crate::report::{FileOutcome, Preview, SyncReport, Warning};
use crate::source::{DeclarationKind, SourceParser};
use similar::{ChangeTag, TextDiff};
use std::error::Error as StdError;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub dry_run: bool,
    pub verbose: bool,
    /// Arguments the command line did not recognize.
    pub unknown_args: Vec<String>,
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write a temporary file in {}", dir.display())]
    Temp {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to replace {}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

/// Run every phase and collect the outcome. Never fails as a whole; phase
/// failures end up in the report.
pub fn run(root: &Path, config: &SyncConfig, options: &SyncOptions) -> SyncReport {
    let started = Instant::now();
    let mut sync = SyncRun {
        root,
        config,
        options,
        report: SyncReport {
            dry_run: options.dry_run,
            ..Default::default()
        },
    };

    for arg in &options.unknown_args {
        warn!("unknown argument: {arg}");
        sync.report.warnings.push(Warning {
            phase: Phase::ParseArgs,
            location: None,
            message: format!("unknown argument: {arg}"),
        });
    }
    if options.dry_run {
        info!("dry run: no files will be written");
    }

    debug!("extracting from {}", root.display());
    let component_extractor = ComponentExtractor::new(config.components.category_root.clone());
    let (components, (mut commands, patterns)) = rayon::join(
        || extract::extract(&component_extractor, root, &config.components),
        || {
            rayon::join(
                || extract::extract(&CommandExtractor, root, &config.commands),
                || extract::extract(&PatternExtractor, root, &config.patterns),
            )
        },
    );

    // Results are consumed in phase-start order whatever order they finished in.
    sync.report.stats.components_found = sync.sync_kind(
        &ComponentsGenerator::new(config.components.patterns.clone()),
        &config.components,
        components,
    );
    let mut packages = Vec::new();
    if let Ok(extraction) = &mut commands {
        if !extraction.records.is_empty() {
            let reference = sync.load_reference(&config.commands);
            reference.enrich(&mut extraction.records);
            packages = reference.packages();
        }
    }
    sync.report.stats.packages_found = packages.len();
    let mut command_sources = config.commands.patterns.clone();
    command_sources.extend(config.commands.reference.iter().cloned());
    sync.report.stats.commands_found = sync.sync_kind(
        &CommandsGenerator::new(command_sources, packages),
        &config.commands,
        commands,
    );
    sync.report.stats.patterns_found = sync.sync_kind(
        &PatternsGenerator::new(config.patterns.patterns.clone()),
        &config.patterns,
        patterns,
    );

    sync.report.stats.time_elapsed = started.elapsed();
    sync.report
}

struct SyncRun<'a> {
    root: &'a Path,
    config: &'a SyncConfig,
    options: &'a SyncOptions,
    report: SyncReport,
}

impl SyncRun<'_> {
    /// Returns the number of records extracted for the kind.
    fn sync_kind<G: ModuleGenerator>(
        &mut self,
        generator: &G,
        config: &ExtractorConfig,
        extracted: Result<Extraction<G::Record>, ExtractError>,
    ) -> usize {
        let kind = G::Record::KIND;
        let extraction = match extracted {
            Ok(extraction) => extraction,
            Err(err) => {
                warn!("[{}] {err}", Phase::Extract(kind));
                self.phase_error(Phase::Extract(kind), err.to_string(), None, &err);
                return 0;
            }
        };

        for file in &extraction.files {
            debug!(
                "[{}] {}: {} record(s){}",
                Phase::Extract(kind),
                file.path,
                file.records,
                if file.success { "" } else { " (failed)" }
            );
        }
        for record in &extraction.records {
            debug!(
                "[{}] {} `{}` at {}{}{}",
                Phase::Extract(kind),
                kind.noun(),
                record.name(),
                record.provenance(),
                if record.description().is_empty() { " (no description)" } else { "" },
                if record.example().is_none() { " (no example)" } else { "" }
            );
        }
        self.report
            .diagnostics
            .extend(extraction.errors.into_iter().map(|e| (Phase::Extract(kind), e)));

        let found = extraction.records.len();
        let rel_path = self.output_path(config);
        if found == 0 {
            self.skip(kind, &rel_path, format!("no {} extracted", kind.slug()));
            return 0;
        }

        let module = generate::generate(generator, &extraction.records);
        for message in &module.warnings {
            debug!("[{}] {message}", Phase::Generate(kind));
            self.report.warnings.push(Warning {
                phase: Phase::Generate(kind),
                location: None,
                message: message.clone(),
            });
        }
        if module.record_count == 0 {
            self.skip(kind, &rel_path, format!("every extracted {} was excluded", kind.noun()));
            return found;
        }

        if let Err(message) = validate(&module.code, generator.export_name()) {
            self.report.sync_errors.push(SyncError {
                phase: Phase::Validate(kind),
                message,
                file_path: Some(rel_path),
                original_error: None,
            });
            return found;
        }

        let path = self.root.join(&rel_path);
        let existing = fs::read_to_string(&path).ok();
        let preview = preview(existing.as_deref(), &module.code);
        let diff = match (&preview, existing.as_deref()) {
            (Preview::Changed { .. }, Some(old)) if self.options.dry_run && self.options.verbose => {
                Some(unified_diff(&rel_path, old, &module.code))
            }
            _ => None,
        };

        let mut written = false;
        if !self.options.dry_run {
            match write_atomic(&path, &module.code) {
                Ok(()) => {
                    debug!("[{}] wrote {}", Phase::Write(kind), path.display());
                    written = true;
                }
                Err(err) => {
                    warn!("[{}] {err}", Phase::Write(kind));
                    self.phase_error(Phase::Write(kind), err.to_string(), Some(rel_path), &err);
                    return found;
                }
            }
        }

        self.report.stats.files_generated.push(PathBuf::from(&rel_path));
        self.report.files.push(FileOutcome {
            kind,
            path: rel_path,
            records: module.record_count,
            preview,
            diff,
            written,
            code: module.code,
        });
        found
    }

    /// The quick reference named by `config`, or an empty one when it is
    /// unset or unreadable.
    fn load_reference(&mut self, config: &ExtractorConfig) -> QuickReference {
        let phase = Phase::Extract(RecordKind::Command);
        let Some(rel) = config.reference.as_deref() else {
            return QuickReference::default();
        };
        let text = match fs::read_to_string(self.root.join(rel)) {
            Ok(text) => text,
            Err(err) => {
                warn!("[{phase}] {rel}: {err}");
                self.report.diagnostics.push((
                    phase,
                    ParsingError::warn(rel, None, format!("failed to read quick reference: {err}")),
                ));
                return QuickReference::default();
            }
        };
        let reference = QuickReference::parse(&text);
        if !reference.has_package_section() {
            self.report.diagnostics.push((
                phase,
                ParsingError::warn(rel, None, "no Package Scripts section; default packages used"),
            ));
        }
        debug!("[{phase}] read quick reference {rel}");
        reference
    }

    /// `/`-separated output path relative to the root.
    fn output_path(&self, config: &ExtractorConfig) -> String {
        let path = self.config.output_dir.join(&config.output);
        path.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn skip(&mut self, kind: RecordKind, rel_path: &str, reason: String) {
        let message = format!("{reason}; {rel_path} left untouched");
        warn!("[{}] {message}", Phase::Generate(kind));
        self.report.warnings.push(Warning {
            phase: Phase::Generate(kind),
            location: None,
            message,
        });
    }

    fn phase_error(
        &mut self,
        phase: Phase,
        message: String,
        file_path: Option<String>,
        err: &(dyn StdError + 'static),
    ) {
        self.report.sync_errors.push(SyncError {
            phase,
            message,
            file_path,
            original_error: cause_chain(err),
        });
    }
}

/// Re-parse generated code: it must be free of syntax errors and export
/// `export_name` as a constant.
fn validate(code: &str, export_name: &str) -> Result<(), String> {
    let mut parser = SourceParser::new().map_err(|e| e.to_string())?;
    let parsed = parser
        .parse(Path::new("generated.ts"), code)
        .map_err(|e| format!("generated code does not parse: {e}"))?;
    let exported = parsed
        .exported_declarations()
        .any(|d| d.kind == DeclarationKind::Const && d.name == export_name);
    if !exported {
        return Err(format!("generated code does not export `{export_name}`"));
    }
    Ok(())
}

fn preview(old: Option<&str>, new: &str) -> Preview {
    let Some(old) = old else {
        return Preview::Created {
            lines: new.lines().count(),
        };
    };
    if old == new {
        return Preview::Unchanged;
    }
    let diff = TextDiff::from_lines(old, new);
    let (mut added, mut removed) = (0, 0);
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => removed += 1,
            ChangeTag::Equal => {}
        }
    }
    Preview::Changed { added, removed }
}

fn unified_diff(rel_path: &str, old: &str, new: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{rel_path}"), &format!("b/{rel_path}"))
        .to_string()
}

/// Replace `path` with `contents` through a temporary file in the same
/// directory.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), WriteError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|source| WriteError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let temp_err = |source| WriteError::Temp {
        dir: dir.to_path_buf(),
        source,
    };
    let mut file = NamedTempFile::new_in(dir).map_err(temp_err)?;
    file.write_all(contents.as_bytes()).map_err(temp_err)?;
    // Temp files are created owner-only; the module keeps the mode it had.
    if let Some(permissions) = target_permissions(path) {
        fs::set_permissions(file.path(), permissions).map_err(temp_err)?;
    }
    file.as_file().sync_all().map_err(temp_err)?;
    file.persist(path).map_err(|source| WriteError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Mode of the file being replaced, or `0644` for a new one.
fn target_permissions(path: &Path) -> Option<fs::Permissions> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Some(meta.permissions()),
        _ => new_file_permissions(),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

/// `cause: cause of cause` below the top-level error, if any.
fn cause_chain(err: &(dyn StdError + 'static)) -> Option<String> {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    if causes.is_empty() {
        None
    } else {
        Some(causes.join(": "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn preview_kinds() {
        assert_eq!(preview(None, "a\nb\n"), Preview::Created { lines: 2 });
        assert_eq!(preview(Some("a\n"), "a\n"), Preview::Unchanged);
        assert_eq!(
            preview(Some("a\nb\nc\n"), "a\nx\nc\nd\n"),
            Preview::Changed { added: 2, removed: 1 }
        );
    }

    #[test]
    fn unified_diff_has_headers() {
        let diff = unified_diff("data/x.ts", "a\nb\n", "a\nc\n");
        assert!(diff.contains("--- a/data/x.ts"));
        assert!(diff.contains("+++ b/data/x.ts"));
        assert!(diff.contains("-b\n+c\n"));
    }

    #[test]
    fn atomic_write_creates_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/data.ts");
        write_atomic(&path, "one\n").unwrap();
        write_atomic(&path, "two\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two\n");
        assert_eq!(fs::read_dir(dir.path().join("out")).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_keeps_or_sets_readable_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;

        let fresh = dir.path().join("fresh.ts");
        write_atomic(&fresh, "new\n").unwrap();
        assert_eq!(mode(&fresh), 0o644);

        let existing = dir.path().join("existing.ts");
        fs::write(&existing, "old\n").unwrap();
        fs::set_permissions(&existing, fs::Permissions::from_mode(0o664)).unwrap();
        write_atomic(&existing, "new\n").unwrap();
        assert_eq!(mode(&existing), 0o664);
        assert_eq!(fs::read_to_string(&existing).unwrap(), "new\n");
    }

    fn pattern(name: &str) -> PatternRecord {
        PatternRecord {
            name: name.to_string(),
            title: "Alpha".to_string(),
            category: "general".to_string(),
            language: "typescript".to_string(),
            description: "An alpha pattern".to_string(),
            code: "const a = 1;".to_string(),
            notes: Vec::new(),
            related: Vec::new(),
            provenance: Provenance {
                source_file: "p/a.ts".to_string(),
                line: 1,
            },
        }
    }

    fn extraction(records: Vec<PatternRecord>) -> Result<Extraction<PatternRecord>, ExtractError> {
        Ok(Extraction {
            records,
            ..Default::default()
        })
    }

    /// Emits a module whose preamble does not parse.
    struct BrokenGenerator(PatternsGenerator);

    impl ModuleGenerator for BrokenGenerator {
        type Record = PatternRecord;

        fn label(&self) -> &str {
            self.0.label()
        }

        fn sources(&self) -> &[String] {
            self.0.sources()
        }

        fn export_name(&self) -> &str {
            self.0.export_name()
        }

        fn info_type(&self) -> &str {
            self.0.info_type()
        }

        fn write_preamble(&self, out: &mut String, _records: &[&PatternRecord]) {
            out.push_str("export const broken = {;\n\n");
        }

        fn write_fields(&self, out: &mut String, record: &PatternRecord) {
            self.0.write_fields(out, record);
        }
    }

    fn sync_run<'a>(
        root: &'a Path,
        config: &'a SyncConfig,
        options: &'a SyncOptions,
    ) -> SyncRun<'a> {
        SyncRun {
            root,
            config,
            options,
            report: SyncReport::default(),
        }
    }

    #[test]
    fn validate_rejects_broken_or_unexported_code() {
        assert!(validate("export const patterns = {};\n", "patterns").is_ok());
        let err = validate("export const patterns = {;\n", "patterns").unwrap_err();
        assert!(err.starts_with("generated code does not parse"), "{err}");
        let err = validate("const patterns = {};\n", "patterns").unwrap_err();
        assert_eq!(err, "generated code does not export `patterns`");
    }

    #[test]
    fn validation_failure_keeps_the_previous_file() {
        let dir = TempDir::new().unwrap();
        let config = SyncConfig::default();
        let options = SyncOptions::default();
        let target = dir.path().join(&config.output_dir).join(&config.patterns.output);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "// previous\n").unwrap();

        let mut run = sync_run(dir.path(), &config, &options);
        let generator = BrokenGenerator(PatternsGenerator::new(Vec::new()));
        let records = extraction(vec![pattern("alphaPattern")]);
        let found = run.sync_kind(&generator, &config.patterns, records);

        assert_eq!(found, 1);
        assert!(run.report.has_errors());
        assert_eq!(run.report.sync_errors.len(), 1);
        let err = &run.report.sync_errors[0];
        assert_eq!(err.phase, Phase::Validate(RecordKind::Pattern));
        assert_eq!(err.file_path.as_deref(), Some("libs/aegisx-mcp/src/data/patterns.ts"));
        assert!(run.report.files.is_empty());
        assert_eq!(fs::read_to_string(&target).unwrap(), "// previous\n");
    }

    #[test]
    fn write_failure_is_a_phase_error() {
        let dir = TempDir::new().unwrap();
        let config = SyncConfig::default();
        let options = SyncOptions::default();
        // A directory where the module should go cannot be replaced by a file.
        let target = dir.path().join(&config.output_dir).join(&config.patterns.output);
        fs::create_dir_all(&target).unwrap();

        let mut run = sync_run(dir.path(), &config, &options);
        let generator = PatternsGenerator::new(Vec::new());
        let records = extraction(vec![pattern("alphaPattern")]);
        run.sync_kind(&generator, &config.patterns, records);

        assert!(run.report.has_errors());
        let err = &run.report.sync_errors[0];
        assert_eq!(err.phase, Phase::Write(RecordKind::Pattern));
        assert!(err.message.starts_with("failed to replace"), "{}", err.message);
        assert!(run.report.files.is_empty());
        assert!(target.is_dir());
    }

    #[test]
    fn cause_chain_renders_sources() {
        let err = WriteError::CreateDir {
            path: PathBuf::from("x"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(cause_chain(&err).as_deref(), Some("denied"));
    }
}
