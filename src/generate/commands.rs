//! `crud-commands.ts`: the CLI command reference, the CRUD package tiers
//! and the troubleshooting table.

use super::*;
use crate::model::{CommandRecord, OptionDefault, PackageInfo};

pub struct CommandsGenerator {
    sources: Vec<String>,
    packages: Vec<PackageInfo>,
}

impl CommandsGenerator {
    pub fn new(sources: Vec<String>, packages: Vec<PackageInfo>) -> Self {
        Self { sources, packages }
    }
}

const INTERFACES: &str = "\
export interface CommandArgument {
  name: string;
  description: string;
  required: boolean;
}

export interface CommandOption {
  name: string;
  alias?: string;
  type: 'boolean' | 'string' | 'number';
  default?: string | boolean | number;
  description: string;
  choices?: string[];
}

export interface CommandInfo {
  name: string;
  alias?: string;
  description: string;
  usage: string;
  arguments: CommandArgument[];
  options: CommandOption[];
  examples: string[];
  notes?: string[];
}

export interface PackageInfo {
  name: string;
  description: string;
  features: string[];
  useCases: string[];
  command: string;
}

export interface TroubleshootingItem {
  problem: string;
  solution: string;
  example: string;
}

";

/// Maintained by hand: problem, solution, example.
const TROUBLESHOOTING: &[(&str, &str, &str)] = &[
    (
        "Module not found errors",
        "Run pnpm install to ensure all dependencies are available",
        "pnpm install && pnpm run build",
    ),
    (
        "TypeScript compilation errors",
        "Ensure all dependencies are installed and restart TypeScript server",
        "pnpm install && pnpm run build",
    ),
    (
        "Routes not registered",
        "Check if --no-register was used, manually register in app.ts if needed",
        "import { productsRoutes } from './modules/products/products.routes';",
    ),
    (
        "Frontend generation fails",
        "Generate backend first, then frontend separately",
        "pnpm run crud -- products --force && ./bin/cli.js generate products --target frontend --force",
    ),
];

const HELPERS: &str = "
export function getAllCommands(): CommandInfo[] {
  return Object.values(commands);
}

export function getCommand(name: string): CommandInfo | undefined {
  return getAllCommands().find((c) => c.name === name || c.alias === name);
}

export function getAllPackages(): PackageInfo[] {
  return packages;
}

export function getTroubleshooting(): TroubleshootingItem[] {
  return troubleshooting;
}

export function buildCommand(
  tableName: string,
  options: {
    target?: 'backend' | 'frontend';
    package?: 'standard' | 'enterprise' | 'full';
    withImport?: boolean;
    withEvents?: boolean;
    force?: boolean;
    dryRun?: boolean;
    domain?: string;
    schema?: string;
    shell?: string;
    section?: string;
    smartStats?: boolean;
    directDb?: boolean;
    noRoles?: boolean;
    migrationOnly?: boolean;
    multipleRoles?: boolean;
  },
): string {
  const frontend = options.target === 'frontend';
  const parts: string[] = [];

  if (frontend) {
    parts.push('./bin/cli.js generate', tableName, '--target frontend');
  } else {
    if (options.package === 'full' || (options.withImport && options.withEvents)) {
      parts.push('pnpm run crud:full --');
    } else if (options.package === 'enterprise' || options.withImport) {
      parts.push('pnpm run crud:import --');
    } else if (options.withEvents) {
      parts.push('pnpm run crud:events --');
    } else {
      parts.push('pnpm run crud --');
    }
    parts.push(tableName);
  }

  if (options.domain) parts.push(`--domain ${options.domain}`);
  if (options.schema && options.schema !== 'public') parts.push(`--schema ${options.schema}`);

  if (frontend) {
    if (options.withImport) parts.push('--with-import');
    if (options.withEvents) parts.push('--with-events');
    if (options.shell) parts.push(`--shell ${options.shell}`);
    if (options.section) parts.push(`--section ${options.section}`);
    if (options.smartStats) parts.push('--smart-stats');
  } else {
    if (options.directDb) parts.push('--direct-db');
    if (options.noRoles) parts.push('--no-roles');
    if (options.migrationOnly) parts.push('--migration-only');
    if (options.multipleRoles) parts.push('--multiple-roles');
  }

  if (options.force) parts.push('--force');
  if (options.dryRun) parts.push('--dry-run');

  return parts.join(' ');
}
";

fn default_literal(default: &OptionDefault) -> String {
    match default {
        OptionDefault::Bool(b) => b.to_string(),
        OptionDefault::Number(n) => n.clone(),
        OptionDefault::Str(s) => quote(s),
    }
}

impl ModuleGenerator for CommandsGenerator {
    type Record = CommandRecord;

    fn label(&self) -> &str {
        "commands"
    }

    fn sources(&self) -> &[String] {
        &self.sources
    }

    fn export_name(&self) -> &str {
        "commands"
    }

    fn info_type(&self) -> &str {
        "CommandInfo"
    }

    fn write_preamble(&self, out: &mut String, _records: &[&CommandRecord]) {
        out.push_str(INTERFACES);

        out.push_str("export const packages: PackageInfo[] = [\n");
        for pkg in &self.packages {
            out.push_str("  {\n");
            write_str_field(out, 4, "name", &pkg.name);
            write_str_field(out, 4, "description", &pkg.description);
            write_string_array(out, 4, "features", &pkg.features);
            write_string_array(out, 4, "useCases", &pkg.use_cases);
            write_str_field(out, 4, "command", &pkg.command);
            out.push_str("  },\n");
        }
        out.push_str("];\n\n");

        out.push_str("export const troubleshooting: TroubleshootingItem[] = [\n");
        for (problem, solution, example) in TROUBLESHOOTING {
            out.push_str("  {\n");
            write_str_field(out, 4, "problem", problem);
            write_str_field(out, 4, "solution", solution);
            write_str_field(out, 4, "example", example);
            out.push_str("  },\n");
        }
        out.push_str("];\n\n");
    }

    fn write_fields(&self, out: &mut String, cmd: &CommandRecord) {
        write_str_field(out, 4, "name", &cmd.name);
        write_opt_str_field(out, 4, "alias", cmd.alias.as_deref());
        write_str_field(out, 4, "description", &cmd.description);
        write_str_field(out, 4, "usage", &cmd.usage);

        if cmd.arguments.is_empty() {
            out.push_str("    arguments: [],\n");
        } else {
            out.push_str("    arguments: [\n");
            for arg in &cmd.arguments {
                out.push_str("      {\n");
                write_str_field(out, 8, "name", &arg.name);
                write_str_field(out, 8, "description", &arg.description);
                out.push_str(&format!("        required: {},\n", arg.required));
                out.push_str("      },\n");
            }
            out.push_str("    ],\n");
        }

        if cmd.options.is_empty() {
            out.push_str("    options: [],\n");
        } else {
            out.push_str("    options: [\n");
            for opt in &cmd.options {
                out.push_str("      {\n");
                write_str_field(out, 8, "name", &opt.name);
                write_opt_str_field(out, 8, "alias", opt.alias.as_deref());
                write_str_field(out, 8, "type", opt.value_type.as_str());
                if let Some(default) = &opt.default {
                    out.push_str(&format!("        default: {},\n", default_literal(default)));
                }
                write_str_field(out, 8, "description", &opt.description);
                write_opt_string_array(out, 8, "choices", &opt.choices);
                out.push_str("      },\n");
            }
            out.push_str("    ],\n");
        }

        write_template_array(out, 4, "examples", &cmd.examples);
        write_opt_string_array(out, 4, "notes", &cmd.notes);
    }

    fn write_helpers(&self, out: &mut String) {
        out.push_str(HELPERS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::QuickReference;
    use crate::model::{CommandArgument, CommandOption, OptionType, Provenance};

    #[test]
    fn keyed_by_camel_case_name() {
        let cmd = CommandRecord {
            name: "list-tables".to_string(),
            alias: Some("lt".to_string()),
            description: "List tables".to_string(),
            usage: "list-tables [schema]".to_string(),
            arguments: vec![CommandArgument {
                name: "schema".to_string(),
                description: String::new(),
                required: false,
            }],
            options: vec![CommandOption {
                name: "format".to_string(),
                alias: None,
                value_type: OptionType::String,
                default: Some(OptionDefault::Str("table".to_string())),
                description: "Output format".to_string(),
                choices: vec!["table".to_string(), "json".to_string()],
            }],
            examples: vec!["aegisx list-tables\naegisx lt public".to_string()],
            notes: Vec::new(),
            provenance: Provenance {
                source_file: "bin/cli.js".to_string(),
                line: 3,
            },
        };
        let module = generate(&CommandsGenerator::new(Vec::new(), Vec::new()), &[cmd]);
        let code = &module.code;
        assert!(code.contains("  listTables: {\n    name: 'list-tables',\n    alias: 'lt',\n"));
        assert!(code.contains("        required: false,\n"));
        assert!(code.contains("        type: 'string',\n        default: 'table',\n"));
        assert!(code.contains("        choices: [\n          'table',\n          'json',\n        ],\n"));
        assert!(code.contains("    examples: [\n      `aegisx list-tables\naegisx lt public`,\n    ],\n"));
        assert!(!code.contains("notes:"));
    }

    #[test]
    fn packages_and_troubleshooting_precede_the_table() {
        let reference = QuickReference::parse("");
        let cmd = CommandRecord {
            name: "generate".to_string(),
            alias: None,
            description: "Generate".to_string(),
            usage: "generate <table>".to_string(),
            arguments: Vec::new(),
            options: Vec::new(),
            examples: Vec::new(),
            notes: Vec::new(),
            provenance: Provenance {
                source_file: "bin/cli.js".to_string(),
                line: 1,
            },
        };
        let generator = CommandsGenerator::new(Vec::new(), reference.packages());
        let code = generate(&generator, &[cmd]).code;

        assert!(code.contains(
            "  {\n    name: 'full',\n    description: 'Full CRUD package',\n    features: [\n      'Basic CRUD operations',\n"
        ));
        assert!(code.contains("    useCases: [\n      'Simple data management',\n"));
        assert!(code.contains("    command: 'pnpm run crud:import -- TABLE',\n"));
        assert_eq!(code.matches("    problem: '").count(), 4);
        assert!(code.contains(
            "    example: 'import { productsRoutes } from \\'./modules/products/products.routes\\';',\n"
        ));

        let packages = code.find("export const packages: PackageInfo[]").unwrap();
        let troubleshooting = code.find("export const troubleshooting").unwrap();
        let table = code.find("export const commands: Record<string, CommandInfo>").unwrap();
        assert!(packages < troubleshooting && troubleshooting < table);
        for helper in ["getAllPackages()", "getTroubleshooting()", "export function buildCommand("] {
            assert!(code.contains(helper), "{helper}");
        }
    }

    #[test]
    fn default_literals() {
        assert_eq!(default_literal(&OptionDefault::Bool(false)), "false");
        assert_eq!(default_literal(&OptionDefault::Number("100".to_string())), "100");
        assert_eq!(default_literal(&OptionDefault::Str("it's".to_string())), "'it\\'s'");
    }
}
