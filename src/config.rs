//! Project root discovery and the optional `mcp-sync.toml`.
//!
//! Every setting has a default matching the monorepo layout, so the file
//! only needs to list what differs. Unknown keys are rejected.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "mcp-sync.toml";

/// Files that mark a directory as the project root.
const ROOT_MARKERS: &[&str] = &[CONFIG_FILE, "pnpm-workspace.yaml"];

/// Where one extractor looks and where its module goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Glob patterns relative to the project root.
    pub patterns: Vec<String>,
    /// File name inside `output_dir`.
    pub output: String,
    /// Directory whose first-level subdirectories name component categories.
    pub category_root: Option<String>,
    /// Zero matched files is a phase error when set.
    pub require_matches: bool,
    /// Markdown quick reference read alongside the sources (commands only).
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Relative to the project root.
    pub output_dir: PathBuf,
    pub components: ExtractorConfig,
    pub commands: ExtractorConfig,
    pub patterns: ExtractorConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("libs/aegisx-mcp/src/data"),
            components: ExtractorConfig {
                patterns: vec!["libs/aegisx-ui/src/lib/components/**/*.component.ts".to_string()],
                output: "components.ts".to_string(),
                category_root: Some("libs/aegisx-ui/src/lib/components".to_string()),
                require_matches: true,
                reference: None,
            },
            commands: ExtractorConfig {
                patterns: vec!["libs/aegisx-cli/bin/*.js".to_string()],
                output: "crud-commands.ts".to_string(),
                category_root: None,
                require_matches: true,
                reference: Some("libs/aegisx-cli/docs/QUICK_REFERENCE.md".to_string()),
            },
            patterns: ExtractorConfig {
                patterns: vec!["libs/aegisx-mcp/src/patterns/**/*.ts".to_string()],
                output: "patterns.ts".to_string(),
                category_root: None,
                require_matches: true,
                reference: None,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    output_dir: Option<PathBuf>,
    components: Option<ExtractorSection>,
    commands: Option<ExtractorSection>,
    patterns: Option<ExtractorSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExtractorSection {
    patterns: Option<Vec<String>>,
    output: Option<String>,
    category_root: Option<String>,
    require_matches: Option<bool>,
    reference: Option<String>,
}

impl ExtractorSection {
    fn apply(self, config: &mut ExtractorConfig) {
        if let Some(patterns) = self.patterns {
            config.patterns = patterns;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(root) = self.category_root {
            config.category_root = Some(root);
        }
        if let Some(require) = self.require_matches {
            config.require_matches = require;
        }
        if let Some(reference) = self.reference {
            // An empty path turns the reference off.
            config.reference = Some(reference).filter(|r| !r.is_empty());
        }
    }
}

impl SyncConfig {
    /// Load `mcp-sync.toml` from `root`, or the defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config: {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text)?;
        let mut config = Self::default();
        if let Some(dir) = file.output_dir {
            config.output_dir = dir;
        }
        if let Some(section) = file.components {
            section.apply(&mut config.components);
        }
        if let Some(section) = file.commands {
            section.apply(&mut config.commands);
        }
        if let Some(section) = file.patterns {
            section.apply(&mut config.patterns);
        }
        Ok(config)
    }
}

/// Nearest ancestor of `start` (inclusive) holding a root marker.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| ROOT_MARKERS.iter().any(|marker| dir.join(marker).is_file()))
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = SyncConfig::from_toml(
            "[components]\npatterns = [\"ui/**/*.ts\"]\n\n[patterns]\nrequire_matches = false\n",
        )
        .unwrap();
        assert_eq!(config.components.patterns, vec!["ui/**/*.ts"]);
        assert_eq!(config.components.output, "components.ts");
        assert_eq!(
            config.components.category_root.as_deref(),
            Some("libs/aegisx-ui/src/lib/components")
        );
        assert!(!config.patterns.require_matches);
        assert_eq!(config.commands, SyncConfig::default().commands);
    }

    #[test]
    fn reference_can_move_or_be_turned_off() {
        let default = SyncConfig::default();
        assert_eq!(
            default.commands.reference.as_deref(),
            Some("libs/aegisx-cli/docs/QUICK_REFERENCE.md")
        );
        assert_eq!(default.patterns.reference, None);

        let moved = SyncConfig::from_toml("[commands]\nreference = \"docs/CLI.md\"\n").unwrap();
        assert_eq!(moved.commands.reference.as_deref(), Some("docs/CLI.md"));
        let off = SyncConfig::from_toml("[commands]\nreference = \"\"\n").unwrap();
        assert_eq!(off.commands.reference, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(SyncConfig::from_toml("outptu_dir = \"x\"\n").is_err());
        assert!(SyncConfig::from_toml("[commands]\nglob = []\n").is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(SyncConfig::load(dir.path()).unwrap(), SyncConfig::default());
    }

    #[test]
    fn root_is_nearest_marked_ancestor() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pnpm-workspace.yaml"), "packages: []\n").unwrap();
        let nested = dir.path().join("libs/a/b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested).as_deref(), Some(dir.path()));

        fs::write(nested.join(CONFIG_FILE), "").unwrap();
        assert_eq!(find_project_root(&nested).as_deref(), Some(nested.as_path()));
    }
}
