//! `patterns.ts`: reusable code patterns.

use super::*;
use crate::model::PatternRecord;
use std::collections::BTreeSet;

pub struct PatternsGenerator {
    sources: Vec<String>,
}

impl PatternsGenerator {
    pub fn new(sources: Vec<String>) -> Self {
        Self { sources }
    }
}

const INTERFACES: &str = "\
export interface CodePattern {
  name: string;
  title: string;
  category: string;
  language: string;
  description: string;
  code: string;
  notes?: string[];
  relatedPatterns?: string[];
}

";

const HELPERS: &str = "
export function getAllPatterns(): CodePattern[] {
  return Object.values(patterns);
}

export function getPatternsByCategory(category: PatternCategory): CodePattern[] {
  return getAllPatterns().filter((p) => p.category === category);
}
";

impl ModuleGenerator for PatternsGenerator {
    type Record = PatternRecord;

    fn label(&self) -> &str {
        "patterns"
    }

    fn sources(&self) -> &[String] {
        &self.sources
    }

    fn export_name(&self) -> &str {
        "patterns"
    }

    fn info_type(&self) -> &str {
        "CodePattern"
    }

    fn write_preamble(&self, out: &mut String, records: &[&PatternRecord]) {
        out.push_str(INTERFACES);
        let categories: BTreeSet<&str> = records.iter().map(|r| r.category.as_str()).collect();
        let list: Vec<String> = categories.into_iter().map(quote).collect();
        out.push_str(&format!(
            "export const patternCategories = [{}] as const;\n\n",
            list.join(", ")
        ));
        out.push_str("export type PatternCategory = (typeof patternCategories)[number];\n\n");
    }

    fn write_fields(&self, out: &mut String, p: &PatternRecord) {
        write_str_field(out, 4, "name", &p.name);
        write_str_field(out, 4, "title", &p.title);
        write_str_field(out, 4, "category", &p.category);
        write_str_field(out, 4, "language", &p.language);
        write_str_field(out, 4, "description", &p.description);
        write_template_field(out, 4, "code", &p.code);
        write_opt_string_array(out, 4, "notes", &p.notes);
        write_opt_string_array(out, 4, "relatedPatterns", &p.related);
    }

    fn write_helpers(&self, out: &mut String) {
        out.push_str(HELPERS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Provenance;

    #[test]
    fn code_keeps_newlines() {
        let p = PatternRecord {
            name: "crudService".to_string(),
            title: "CRUD Service".to_string(),
            category: "backend".to_string(),
            language: "typescript".to_string(),
            description: "Thin service".to_string(),
            code: "class A {\n  run() { return `x`; }\n}".to_string(),
            notes: vec!["Note".to_string()],
            related: Vec::new(),
            provenance: Provenance {
                source_file: "p.ts".to_string(),
                line: 1,
            },
        };
        let module = generate(&PatternsGenerator::new(Vec::new()), &[p]);
        assert!(module
            .code
            .contains("    code: `class A {\n  run() { return \\`x\\`; }\n}`,\n"));
        assert!(module
            .code
            .contains("export const patternCategories = ['backend'] as const;"));
        assert!(module.code.contains("    notes: [\n      'Note',\n    ],\n"));
    }
}
