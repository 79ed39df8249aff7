//! CLI commands registered through commander-style call chains:
//!
//! ```js
//! /** JSDoc overrides .description() */
//! program
//!   .command('generate <table>')
//!   .alias('g')
//!   .description('Generate CRUD module')
//!   .option('-p, --package <standard|enterprise|full>', 'Package', 'standard')
//!   .action(run);
//! ```

use super::{missing_doc, Extractor};
use crate::comment::DocComment;
use crate::model::*;
use crate::source::{Call, CallChain, ParsedSource, Value};
use regex::Regex;
use std::sync::LazyLock;

static RE_LONG_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--([A-Za-z0-9][\w-]*)(?:\s+[<\[]([^>\]]+)[>\]])?").unwrap());

static RE_SHORT_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-([A-Za-z0-9])(?:\s|$)").unwrap());

pub struct CommandExtractor;

impl Extractor for CommandExtractor {
    type Record = CommandRecord;

    fn extract_file(&self, source: &ParsedSource, rel_path: &str) -> ParseResult<CommandRecord> {
        let mut records = Vec::new();
        let mut errors = Vec::new();

        for chain in &source.call_chains {
            for (index, segment) in command_segments(chain).into_iter().enumerate() {
                // The statement's comment documents the first command only.
                let doc = if index == 0 {
                    DocComment::of(chain)
                } else {
                    DocComment::default()
                };
                if let Some(record) = build(segment, &doc, rel_path, &mut errors) {
                    records.push(record);
                }
            }
        }

        ParseResult {
            records,
            errors,
            success: true,
        }
    }
}

/// Split a chain at every `.command('...')` call.
fn command_segments(chain: &CallChain) -> Vec<&[Call]> {
    let starts: Vec<usize> = chain
        .calls
        .iter()
        .enumerate()
        .filter(|(_, call)| {
            call.callee == "command" && call.args.first().and_then(Value::as_str).is_some()
        })
        .map(|(i, _)| i)
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(chain.calls.len());
            &chain.calls[start..end]
        })
        .collect()
}

fn build(
    calls: &[Call],
    doc: &DocComment,
    rel_path: &str,
    errors: &mut Vec<ParsingError>,
) -> Option<CommandRecord> {
    let head = calls.first()?;
    let usage = head.args.first().and_then(Value::as_str)?.trim().to_string();
    let name = usage
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_matches(['[', ']'])
        .to_string();
    if name.is_empty() {
        errors.push(ParsingError::warn(
            rel_path,
            Some(head.line),
            "`.command()` with an empty name",
        ));
        return None;
    }

    let mut record = CommandRecord {
        name,
        alias: None,
        description: String::new(),
        usage: usage.clone(),
        arguments: usage.split_whitespace().skip(1).filter_map(argument).collect(),
        options: Vec::new(),
        examples: Vec::new(),
        notes: Vec::new(),
        provenance: Provenance {
            source_file: rel_path.to_string(),
            line: head.line,
        },
    };

    for call in &calls[1..] {
        let first = call.args.first().and_then(Value::as_str);
        match call.callee.as_str() {
            "alias" => {
                if record.alias.is_none() {
                    record.alias = first.map(str::to_string);
                }
            }
            "description" => {
                if let Some(text) = first {
                    record.description = text.trim().to_string();
                }
            }
            "argument" => {
                let Some(mut arg) = first.and_then(argument) else {
                    continue;
                };
                arg.description = string_arg(call, 1);
                match record.arguments.iter_mut().find(|a| a.name == arg.name) {
                    Some(existing) => existing.description = arg.description,
                    None => record.arguments.push(arg),
                }
            }
            "option" | "requiredOption" => match first.and_then(|flags| option(flags, call)) {
                Some(opt) => record.options.push(opt),
                None => errors.push(ParsingError::warn(
                    rel_path,
                    Some(call.line),
                    format!("command `{}`: option without a `--long` flag", record.name),
                )),
            },
            _ => {}
        }
    }

    let has_description = !record.description.is_empty();
    if doc.is_jsdoc() {
        let description = doc.description();
        if !description.is_empty() {
            record.description = description;
        }
        let tags = doc.tags();
        record.examples = doc.examples();
        record.notes = tags.get_all("note").into_iter().map(str::to_string).collect();
        for param in doc.params() {
            if let Some(arg) = record.arguments.iter_mut().find(|a| a.name == param.name) {
                if arg.description.is_empty() {
                    arg.description = param.description;
                }
            }
        }
        for value in doc.unmatched_params() {
            errors.push(ParsingError::warn(
                rel_path,
                Some(head.line),
                format!(
                    "command `{}`: @param `{}` is not of the form `name - description`",
                    record.name, value
                ),
            ));
        }
    } else if !has_description {
        errors.push(missing_doc(rel_path, head.line, RecordKind::Command, &record.name));
    }

    Some(record)
}

/// `<name>` is required, `[name]` optional; a trailing `...` is dropped.
fn argument(token: &str) -> Option<CommandArgument> {
    let (inner, required) = if let Some(inner) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        (inner, true)
    } else if let Some(inner) = token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        (inner, false)
    } else {
        return None;
    };
    let name = inner.trim_end_matches("...").trim();
    if name.is_empty() {
        return None;
    }
    Some(CommandArgument {
        name: name.to_string(),
        description: String::new(),
        required,
    })
}

fn string_arg(call: &Call, index: usize) -> String {
    call.args
        .get(index)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Parse a commander flag string such as `-a, --app <app>`.
fn option(flags: &str, call: &Call) -> Option<CommandOption> {
    let long = RE_LONG_FLAG.captures(flags)?;
    let placeholder = long.get(2).map(|m| m.as_str().trim());

    let alias = flags
        .split([',', '|'])
        .map(str::trim)
        .find_map(|part| RE_SHORT_FLAG.captures(part).map(|c| c[1].to_string()));

    let choices: Vec<String> = match placeholder {
        Some(p) if p.contains('|') => p.split('|').map(|c| c.trim().to_string()).collect(),
        _ => Vec::new(),
    };

    // The third argument may be a parser function; the default follows it.
    let default = call.args.iter().skip(2).find_map(|arg| match arg {
        Value::Bool(b) => Some(OptionDefault::Bool(*b)),
        Value::Number(n) => Some(OptionDefault::Number(n.clone())),
        Value::Str(s) => Some(OptionDefault::Str(s.clone())),
        _ => None,
    });

    let value_type = match (placeholder, &default) {
        (None, _) => OptionType::Boolean,
        (Some(_), Some(OptionDefault::Number(_))) => OptionType::Number,
        (Some(_), _) => OptionType::String,
    };

    Some(CommandOption {
        name: long[1].to_string(),
        alias,
        value_type,
        default,
        description: string_arg(call, 1),
        choices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceParser;
    use std::path::Path;

    fn run(src: &str) -> ParseResult<CommandRecord> {
        let parsed = SourceParser::new()
            .unwrap()
            .parse(Path::new("cli.js"), src)
            .unwrap();
        CommandExtractor.extract_file(&parsed, "bin/cli.js")
    }

    const CLI: &str = r#"
const { Command } = require('commander');
const program = new Command();

/**
 * Generate a CRUD module for a table.
 *
 * @param table - Database table name
 * @example
 *   aegisx generate users --package full
 * @example
 *   aegisx g posts -f
 * @note Run migrations first
 */
program
  .command('generate [table]')
  .alias('g')
  .description('Generate CRUD')
  .option('-p, --package <standard|enterprise|full>', 'Feature package', 'standard')
  .option('-f, --force', 'Overwrite files', false)
  .option('--limit <n>', 'Row limit', parseInt, 100)
  .option('-a, --app <app>', 'Target app')
  .action(async (table, options) => {
    program.command('nested').action(() => {});
  });

program
  .command('list-tables')
  .description('List database tables')
  .argument('[schema]', 'Schema name')
  .action(listTables);

program.command('undocumented <x>').action(run);
"#;

    #[test]
    fn commands_from_chains() {
        let result = run(CLI);
        let names: Vec<&str> = result.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["generate", "nested", "list-tables", "undocumented"]);

        let generate = &result.records[0];
        assert_eq!(generate.usage, "generate [table]");
        assert_eq!(generate.alias.as_deref(), Some("g"));
        assert_eq!(generate.description, "Generate a CRUD module for a table.");
        assert_eq!(
            generate.examples,
            vec!["aegisx generate users --package full", "aegisx g posts -f"]
        );
        assert_eq!(generate.notes, vec!["Run migrations first"]);
        assert_eq!(
            generate.arguments,
            vec![CommandArgument {
                name: "table".to_string(),
                description: "Database table name".to_string(),
                required: false,
            }]
        );
        assert_eq!(generate.provenance.line, 16);

        let opts = &generate.options;
        assert_eq!(opts.len(), 4);
        assert_eq!(opts[0].name, "package");
        assert_eq!(opts[0].alias.as_deref(), Some("p"));
        assert_eq!(opts[0].value_type, OptionType::String);
        assert_eq!(opts[0].choices, vec!["standard", "enterprise", "full"]);
        assert_eq!(opts[0].default, Some(OptionDefault::Str("standard".to_string())));
        assert_eq!(opts[1].value_type, OptionType::Boolean);
        assert_eq!(opts[1].default, Some(OptionDefault::Bool(false)));
        assert_eq!(opts[2].value_type, OptionType::Number);
        assert_eq!(opts[2].default, Some(OptionDefault::Number("100".to_string())));
        assert_eq!(opts[2].alias, None);
        assert_eq!(opts[3].default, None);

        let list = &result.records[2];
        assert_eq!(list.description, "List database tables");
        assert_eq!(list.arguments[0].description, "Schema name");
        assert!(!list.arguments[0].required);
    }

    #[test]
    fn missing_docs_warn_once_per_command() {
        let result = run(CLI);
        let warned: Vec<&str> = result
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(
            warned,
            [
                "command `nested` has no documentation comment",
                "command `undocumented` has no documentation comment",
            ]
        );
        assert!(result.errors.iter().all(|e| e.severity == Severity::Warn));
        let undocumented = &result.records[3];
        assert!(undocumented.arguments[0].required);
    }

    #[test]
    fn const_bound_parent_and_its_subcommands() {
        let src = r#"
const program = new Command();

/**
 * Manage code templates.
 */
const templates = program
  .command('templates')
  .alias('t')
  .description('Template management');

templates
  .command('list')
  .description('List available templates')
  .action(() => {});

let config = program.command('config').description('Manage configuration');
config.command('show').description('Show the configuration');
"#;
        let result = run(src);
        let names: Vec<&str> = result.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["templates", "list", "config", "show"]);

        let templates = &result.records[0];
        assert_eq!(templates.alias.as_deref(), Some("t"));
        assert_eq!(templates.description, "Manage code templates.");
        assert_eq!(templates.provenance.line, 8);
        assert_eq!(result.records[2].description, "Manage configuration");
        assert!(result.errors.is_empty(), "{:?}", result.errors);
    }

    #[test]
    fn chained_subcommands_split() {
        let result = run("program.command('a').description('A').command('b').description('B');\n");
        let names: Vec<(&str, &str)> = result
            .records
            .iter()
            .map(|r| (r.name.as_str(), r.description.as_str()))
            .collect();
        assert_eq!(names, [("a", "A"), ("b", "B")]);
    }
}
