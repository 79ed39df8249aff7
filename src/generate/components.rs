//! `components.ts`: the UI component catalog.

use super::*;
use crate::model::ComponentRecord;
use std::collections::BTreeSet;

pub struct ComponentsGenerator {
    sources: Vec<String>,
}

impl ComponentsGenerator {
    pub fn new(sources: Vec<String>) -> Self {
        Self { sources }
    }
}

const INTERFACES: &str = "\
export interface ComponentInput {
  name: string;
  type: string;
  default?: string;
  description: string;
  required?: boolean;
}

export interface ComponentOutput {
  name: string;
  type: string;
  description: string;
}

export interface ComponentInfo {
  name: string;
  selector: string;
  category: string;
  description: string;
  inputs: ComponentInput[];
  outputs: ComponentOutput[];
  usage: string;
  bestPractices?: string[];
  relatedComponents?: string[];
}

";

const HELPERS: &str = "
export function getAllComponents(): ComponentInfo[] {
  return Object.values(components);
}

export function getComponentsByCategory(category: ComponentCategory): ComponentInfo[] {
  return getAllComponents().filter((c) => c.category === category);
}

export function getComponentByName(name: string): ComponentInfo | undefined {
  const q = name.toLowerCase();
  return getAllComponents().find((c) => c.name.toLowerCase() === q || c.selector === name);
}
";

impl ModuleGenerator for ComponentsGenerator {
    type Record = ComponentRecord;

    fn label(&self) -> &str {
        "components"
    }

    fn sources(&self) -> &[String] {
        &self.sources
    }

    fn export_name(&self) -> &str {
        "components"
    }

    fn info_type(&self) -> &str {
        "ComponentInfo"
    }

    fn write_preamble(&self, out: &mut String, records: &[&ComponentRecord]) {
        out.push_str(INTERFACES);

        let categories: BTreeSet<&str> = records.iter().map(|r| r.category.as_str()).collect();
        if categories.is_empty() {
            out.push_str("export const componentCategories = [] as const;\n\n");
        } else {
            out.push_str("export const componentCategories = [\n");
            for category in categories {
                out.push_str(&format!("  {},\n", quote(category)));
            }
            out.push_str("] as const;\n\n");
        }
        out.push_str("export type ComponentCategory = (typeof componentCategories)[number];\n\n");
    }

    fn write_fields(&self, out: &mut String, c: &ComponentRecord) {
        write_str_field(out, 4, "name", &c.name);
        write_str_field(out, 4, "selector", &c.selector);
        write_str_field(out, 4, "category", &c.category);
        write_str_field(out, 4, "description", &c.description);

        if c.inputs.is_empty() {
            out.push_str("    inputs: [],\n");
        } else {
            out.push_str("    inputs: [\n");
            for input in &c.inputs {
                out.push_str("      {\n");
                write_str_field(out, 8, "name", &input.name);
                write_str_field(out, 8, "type", &input.type_name);
                write_opt_str_field(out, 8, "default", input.default.as_deref());
                write_str_field(out, 8, "description", &input.description);
                if input.required {
                    out.push_str("        required: true,\n");
                }
                out.push_str("      },\n");
            }
            out.push_str("    ],\n");
        }

        if c.outputs.is_empty() {
            out.push_str("    outputs: [],\n");
        } else {
            out.push_str("    outputs: [\n");
            for output in &c.outputs {
                out.push_str("      {\n");
                write_str_field(out, 8, "name", &output.name);
                write_str_field(out, 8, "type", &output.type_name);
                write_str_field(out, 8, "description", &output.description);
                out.push_str("      },\n");
            }
            out.push_str("    ],\n");
        }

        write_template_field(out, 4, "usage", c.usage.as_deref().unwrap_or(""));
        write_opt_string_array(out, 4, "bestPractices", &c.best_practices);
        write_opt_string_array(out, 4, "relatedComponents", &c.related);
    }

    fn write_helpers(&self, out: &mut String) {
        out.push_str(HELPERS);
    }
}
