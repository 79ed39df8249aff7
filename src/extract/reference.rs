//! The CLI quick reference (`QUICK_REFERENCE.md`).
//!
//! Supplies the package tiers of the CRUD generator, plus the shell examples
//! and notes that fill in commands whose JSDoc has none:
//!
//! ```markdown
//! ## 📦 Package Scripts
//!
//! | Script | Adds | Description |
//! |---|---|---|
//! | `pnpm run crud -- TABLE` | | Basic CRUD generation |
//! | `pnpm run crud:import -- TABLE` | `--with-import` | With bulk import (Excel/CSV) |
//! ```

use crate::model::{CommandRecord, PackageInfo};
use regex::Regex;
use std::sync::LazyLock;

/// Package tiers in the order they are emitted.
pub const PACKAGE_TIERS: [&str; 3] = ["standard", "enterprise", "full"];

static RE_PACKAGE_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s+.*Package Scripts\s*$").unwrap());

static RE_NOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(Important|Note|CRITICAL)\*\*:\s*(.*)$").unwrap());

#[derive(Debug, Clone, Default)]
pub struct QuickReference {
    listed: Vec<PackageInfo>,
    has_package_section: bool,
    examples: Vec<String>,
    notes: Vec<String>,
}

impl QuickReference {
    pub fn parse(text: &str) -> Self {
        let listed = listed_packages(text);
        Self {
            has_package_section: listed.is_some(),
            listed: listed.unwrap_or_default(),
            examples: code_lines(text),
            notes: notes(text),
        }
    }

    pub fn has_package_section(&self) -> bool {
        self.has_package_section
    }

    /// Every tier, listed or not. Unlisted tiers get a generic description.
    pub fn packages(&self) -> Vec<PackageInfo> {
        PACKAGE_TIERS
            .iter()
            .map(|&tier| match self.listed.iter().find(|p| p.name == tier) {
                Some(listed) => listed.clone(),
                None => package(tier, format!("{} CRUD package", capitalize(tier)), default_script(tier)),
            })
            .collect()
    }

    /// Code-block lines that mention `name` as a whole word.
    pub fn examples_for(&self, name: &str) -> Vec<String> {
        mentioning(&self.examples, name)
    }

    pub fn notes_for(&self, name: &str) -> Vec<String> {
        mentioning(&self.notes, name)
    }

    /// Fill in examples and notes on commands that have none of their own.
    pub fn enrich(&self, commands: &mut [CommandRecord]) {
        for command in commands {
            if command.examples.is_empty() {
                command.examples = self.examples_for(&command.name);
            }
            if command.notes.is_empty() {
                command.notes = self.notes_for(&command.name);
            }
        }
    }
}

/// Rows of the "Package Scripts" table, or `None` without that section.
fn listed_packages(text: &str) -> Option<Vec<PackageInfo>> {
    let mut lines = text
        .lines()
        .skip_while(|line| !RE_PACKAGE_SECTION.is_match(line.trim()));
    lines.next()?;

    let rows = lines
        .take_while(|line| !line.trim_start().starts_with("##"))
        .map(str::trim)
        .filter(|line| line.starts_with('|') && !line.contains("---"))
        .skip(1);

    let mut packages: Vec<PackageInfo> = Vec::new();
    for row in rows {
        let cells: Vec<&str> = row.trim_matches('|').split('|').map(str::trim).collect();
        if cells.len() < 3 {
            continue;
        }
        let script = cells[0].replace('`', "");
        let command = cells[1].replace('`', "");
        let Some(tier) = tier_of(&script, &command) else {
            continue;
        };
        if !packages.iter().any(|p| p.name == tier) {
            packages.push(package(tier, cells[2].to_string(), script));
        }
    }
    Some(packages)
}

fn tier_of(script: &str, command: &str) -> Option<&'static str> {
    if script.contains("crud:full") || command.contains("--package full") {
        Some("full")
    } else if script.contains("crud:import") || command.contains("--with-import") {
        Some("enterprise")
    } else if script.contains("crud:events") || command.contains("--with-events") {
        // Events are a flag on top of a tier.
        None
    } else if script == default_script("standard") {
        Some("standard")
    } else {
        None
    }
}

fn default_script(tier: &str) -> String {
    match tier {
        "enterprise" => "pnpm run crud:import -- TABLE".to_string(),
        "full" => "pnpm run crud:full -- TABLE".to_string(),
        _ => "pnpm run crud -- TABLE".to_string(),
    }
}

const STANDARD_FEATURES: &[&str] = &[
    "Basic CRUD operations (Create, Read, Update, Delete)",
    "List with pagination",
    "Search and filtering",
    "Soft delete support",
];
const STANDARD_USE_CASES: &[&str] = &[
    "Simple data management",
    "Prototype development",
    "Non-critical features",
];
const ENTERPRISE_FEATURES: &[&str] = &[
    "Basic CRUD operations",
    "Bulk import (Excel/CSV)",
    "Dropdown API",
    "Export functionality",
];
const ENTERPRISE_USE_CASES: &[&str] = &[
    "Data migration scenarios",
    "Bulk data management",
    "Standard business features",
];
const FULL_FEATURES: &[&str] = &[
    "Basic CRUD operations",
    "Bulk operations (import/export)",
    "Advanced validation",
    "Uniqueness checks",
    "Complex search filters",
    "Real-time events (optional)",
];
const FULL_USE_CASES: &[&str] = &[
    "Mission-critical enterprise features",
    "Complex business logic",
    "Data integrity requirements",
];

fn package(tier: &str, description: String, command: String) -> PackageInfo {
    let (features, use_cases) = match tier {
        "full" => (FULL_FEATURES, FULL_USE_CASES),
        "enterprise" => (ENTERPRISE_FEATURES, ENTERPRISE_USE_CASES),
        _ => (STANDARD_FEATURES, STANDARD_USE_CASES),
    };
    PackageInfo {
        name: tier.to_string(),
        description,
        features: features.iter().map(|f| f.to_string()).collect(),
        use_cases: use_cases.iter().map(|u| u.to_string()).collect(),
        command,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Non-comment lines inside fenced code blocks, trimmed.
fn code_lines(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut in_fence = false;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
        } else if in_fence && !trimmed.is_empty() && !trimmed.starts_with('#') {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// `**Note**:`, `**Important**:` and `**CRITICAL**:` callouts, then the
/// bullets under `**DO:**` and `**DON'T:**` headings.
fn notes(text: &str) -> Vec<String> {
    let mut notes = Vec::new();
    let mut bullets: Option<&str> = None;
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if trimmed.starts_with("##") {
            bullets = None;
            continue;
        }
        if trimmed.contains("**DO:**") {
            bullets = Some("DO");
            continue;
        }
        if trimmed.contains("**DON'T:**") {
            bullets = Some("DON'T");
            continue;
        }
        if let Some(caps) = RE_NOTE.captures(trimmed) {
            let rest = caps[2].trim();
            match &caps[1] {
                "CRITICAL" if !rest.is_empty() => notes.push(format!("CRITICAL: {rest}")),
                // An empty callout line introduces a paragraph.
                "Important" if rest.is_empty() => {
                    let mut block = Vec::new();
                    while let Some(next) = lines.next_if(|l| !l.trim().is_empty()) {
                        block.push(next.trim());
                    }
                    if !block.is_empty() {
                        notes.push(block.join("\n"));
                    }
                }
                _ if !rest.is_empty() => notes.push(rest.to_string()),
                _ => {}
            }
            continue;
        }
        if let (Some(prefix), Some(item)) = (bullets, trimmed.strip_prefix('-')) {
            let item = item.trim();
            if !item.is_empty() {
                notes.push(format!("{prefix}: {item}"));
            }
        }
    }
    notes
}

fn mentioning(items: &[String], name: &str) -> Vec<String> {
    let Ok(word) = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name))) else {
        return Vec::new();
    };
    items.iter().filter(|item| word.is_match(item)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Provenance;

    const REFERENCE: &str = "\
# CLI Quick Reference

## 📦 Package Scripts

| Script | Adds | Description |
|--------|------|-------------|
| `pnpm run crud -- TABLE` | | Basic CRUD generation |
| `pnpm run crud:import -- TABLE` | `--with-import` | With bulk import (Excel/CSV) |
| `pnpm run crud:events -- TABLE` | `--with-events` | With real-time events |
| `pnpm run crud:import -- TABLE` | | Listed twice |

## Generate

```bash
# Backend first
pnpm run crud -- products --force
./bin/cli.js generate products --target frontend
```

```typescript
const generated = true;
```

**Note**: generate overwrites files only with --force
**CRITICAL**: Run migrations before generate

**Important**:
List-tables reads the live database.
It needs DATABASE_URL.

✅ **DO:**
- Use generate with --dry-run first
- Keep table names plural

❌ **DON'T:**
- Edit generated files by hand

## Other
- not a bullet note
";

    fn command(name: &str) -> CommandRecord {
        CommandRecord {
            name: name.to_string(),
            alias: None,
            description: String::new(),
            usage: name.to_string(),
            arguments: Vec::new(),
            options: Vec::new(),
            examples: Vec::new(),
            notes: Vec::new(),
            provenance: Provenance {
                source_file: "bin/cli.js".to_string(),
                line: 1,
            },
        }
    }

    #[test]
    fn package_table_with_fallback_tier() {
        let reference = QuickReference::parse(REFERENCE);
        assert!(reference.has_package_section());

        let packages = reference.packages();
        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, PACKAGE_TIERS);

        assert_eq!(packages[0].description, "Basic CRUD generation");
        assert_eq!(packages[0].command, "pnpm run crud -- TABLE");
        assert_eq!(packages[0].features.len(), 4);
        assert_eq!(packages[1].description, "With bulk import (Excel/CSV)");
        assert_eq!(packages[1].use_cases[0], "Data migration scenarios");
        assert_eq!(packages[2].description, "Full CRUD package");
        assert_eq!(packages[2].command, "pnpm run crud:full -- TABLE");
    }

    #[test]
    fn no_package_section() {
        let reference = QuickReference::parse("# Nothing here\n");
        assert!(!reference.has_package_section());
        let packages = reference.packages();
        assert_eq!(packages.len(), 3);
        assert_eq!(packages[1].description, "Enterprise CRUD package");
        assert_eq!(packages[1].command, "pnpm run crud:import -- TABLE");
    }

    #[test]
    fn examples_mention_the_command_as_a_word() {
        let reference = QuickReference::parse(REFERENCE);
        assert_eq!(
            reference.examples_for("generate"),
            vec!["./bin/cli.js generate products --target frontend"]
        );
        assert_eq!(reference.examples_for("crud").len(), 1);
        assert!(reference.examples_for("list-tables").is_empty());
    }

    #[test]
    fn notes_by_kind() {
        let reference = QuickReference::parse(REFERENCE);
        assert_eq!(
            reference.notes_for("generate"),
            vec![
                "generate overwrites files only with --force",
                "CRITICAL: Run migrations before generate",
                "DO: Use generate with --dry-run first",
            ]
        );
        assert_eq!(
            reference.notes_for("list-tables"),
            vec!["List-tables reads the live database.\nIt needs DATABASE_URL."]
        );
        assert!(reference.notes_for("bullet").is_empty());
        assert!(reference.notes.contains(&"DON'T: Edit generated files by hand".to_string()));
    }

    #[test]
    fn enrichment_keeps_documented_examples() {
        let reference = QuickReference::parse(REFERENCE);
        let mut documented = command("generate");
        documented.examples = vec!["aegisx generate users".to_string()];
        let mut commands = vec![documented, command("list-tables")];

        reference.enrich(&mut commands);
        assert_eq!(commands[0].examples, vec!["aegisx generate users"]);
        assert_eq!(commands[0].notes.len(), 3);
        assert!(commands[1].examples.is_empty());
        assert_eq!(commands[1].notes.len(), 1);
    }
}
