//! End-of-run report: statistics, files, warnings and errors by phase.

use crate::model::*;
use std::fmt::Write as _;

/// A non-fatal orchestration notice (unknown flag, excluded record, skipped
/// kind).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub phase: Phase,
    pub location: Option<String>,
    pub message: String,
}

/// How a generated module compares with the file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Created { lines: usize },
    Unchanged,
    Changed { added: usize, removed: usize },
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub kind: RecordKind,
    /// Path relative to the project root.
    pub path: String,
    pub records: usize,
    pub preview: Preview,
    /// Unified diff against the file on disk, verbose dry runs only.
    pub diff: Option<String>,
    pub written: bool,
    /// The generated module, byte for byte.
    pub code: String,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub dry_run: bool,
    pub stats: SyncStats,
    pub files: Vec<FileOutcome>,
    pub warnings: Vec<Warning>,
    /// Extraction diagnostics of every severity.
    pub diagnostics: Vec<(Phase, ParsingError)>,
    pub sync_errors: Vec<SyncError>,
}

impl SyncReport {
    /// Any `Error` diagnostic or any phase failure.
    pub fn has_errors(&self) -> bool {
        !self.sync_errors.is_empty()
            || self
                .diagnostics
                .iter()
                .any(|(_, d)| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.sync_errors.len()
            + self
                .diagnostics
                .iter()
                .filter(|(_, d)| d.severity == Severity::Error)
                .count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
            + self
                .diagnostics
                .iter()
                .filter(|(_, d)| d.severity == Severity::Warn)
                .count()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let title = match (self.dry_run, self.has_errors()) {
            (true, false) => "MCP SYNC DRY RUN COMPLETED",
            (true, true) => "MCP SYNC DRY RUN COMPLETED WITH ERRORS",
            (false, false) => "MCP SYNC COMPLETED SUCCESSFULLY",
            (false, true) => "MCP SYNC COMPLETED WITH ERRORS",
        };
        let rule = "=".repeat(48);
        let _ = writeln!(out, "{rule}\n{title}\n{rule}\n");

        let stats = &self.stats;
        let _ = writeln!(out, "Statistics:");
        let _ = writeln!(out, "  Components found: {}", stats.components_found);
        let _ = writeln!(out, "  Commands found:   {}", stats.commands_found);
        let _ = writeln!(out, "  Patterns found:   {}", stats.patterns_found);
        let _ = writeln!(out, "  Packages found:   {}", stats.packages_found);
        let _ = writeln!(out, "  Time taken:       {:.2}s", stats.time_elapsed.as_secs_f64());

        self.render_files(&mut out);
        self.render_warnings(&mut out);
        self.render_errors(&mut out);
        out
    }

    fn render_files(&self, out: &mut String) {
        let heading = if self.dry_run {
            "Files that would be generated"
        } else {
            "Files generated"
        };
        let _ = writeln!(out, "\n{heading}:");
        if self.files.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for file in &self.files {
            let state = match &file.preview {
                Preview::Created { lines } => format!("new, {lines} lines"),
                Preview::Unchanged => "unchanged".to_string(),
                Preview::Changed { added, removed } => format!("changed, +{added} -{removed}"),
            };
            let _ = writeln!(out, "  - {} ({} records, {})", file.path, file.records, state);
        }
        if self.dry_run {
            let _ = writeln!(out, "  [DRY RUN] No files were written");
        }
        for file in &self.files {
            if let Some(diff) = &file.diff {
                let _ = writeln!(out, "\n{diff}");
            }
        }
    }

    fn render_warnings(&self, out: &mut String) {
        if self.warning_count() == 0 {
            return;
        }
        let _ = writeln!(out, "\nWarnings ({}):", self.warning_count());
        for phase in phase_order() {
            for w in self.warnings.iter().filter(|w| w.phase == phase) {
                match &w.location {
                    Some(loc) => {
                        let _ = writeln!(out, "  [{phase}] {loc}: {}", w.message);
                    }
                    None => {
                        let _ = writeln!(out, "  [{phase}] {}", w.message);
                    }
                }
            }
            for (_, d) in self
                .diagnostics
                .iter()
                .filter(|(p, d)| *p == phase && d.severity == Severity::Warn)
            {
                let _ = writeln!(out, "  [{phase}] {}: {}", d.location(), d.message);
            }
        }
    }

    fn render_errors(&self, out: &mut String) {
        if !self.has_errors() {
            return;
        }
        let _ = writeln!(out, "\nErrors ({}):", self.error_count());
        let mut failed_phases = Vec::new();
        for phase in phase_order() {
            let mut any = false;
            for (_, d) in self
                .diagnostics
                .iter()
                .filter(|(p, d)| *p == phase && d.severity == Severity::Error)
            {
                let _ = writeln!(out, "  [{phase}] {}: {}", d.location(), d.message);
                any = true;
            }
            for err in self.sync_errors.iter().filter(|e| e.phase == phase) {
                let _ = writeln!(out, "  [{phase}] {}", err.message);
                if let Some(file) = &err.file_path {
                    let _ = writeln!(out, "    File: {file}");
                }
                if let Some(details) = &err.original_error {
                    let _ = writeln!(out, "    Details: {details}");
                }
                any = true;
            }
            if any {
                failed_phases.push(phase);
            }
        }

        let _ = writeln!(out, "\nSuggestions:");
        for phase in failed_phases {
            let _ = writeln!(out, "  {phase}:");
            for hint in suggestions(phase) {
                let _ = writeln!(out, "    - {hint}");
            }
        }
    }
}

/// Every phase in the order the report lists them.
fn phase_order() -> Vec<Phase> {
    let mut phases = vec![Phase::ParseArgs];
    for kind in [RecordKind::Component, RecordKind::Command, RecordKind::Pattern] {
        phases.extend([
            Phase::Extract(kind),
            Phase::Generate(kind),
            Phase::Validate(kind),
            Phase::Write(kind),
        ]);
    }
    phases
}

fn suggestions(phase: Phase) -> &'static [&'static str] {
    match phase {
        Phase::ParseArgs => &["Run with --help to list the supported flags"],
        Phase::Extract(_) => &[
            "Check that the source files exist and parse as TypeScript",
            "Check the glob patterns in mcp-sync.toml",
            "Rename or merge declarations that share a name",
            "Run with --verbose for per-file progress",
        ],
        Phase::Generate(_) => &[
            "Check that the extracted records have the required fields",
            "Run with --dry-run to preview without writing",
        ],
        Phase::Validate(_) => &[
            "The generated module did not parse; the file on disk was left untouched",
            "Run with --verbose to see the validation details",
        ],
        Phase::Write(_) => &[
            "Verify the output directory exists and is writable",
            "Try running with --dry-run to validate without writing",
        ],
    }
}
