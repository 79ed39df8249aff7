//! Angular components: classes decorated with `@Component({ selector })`.
//!
//! Inputs come from `@Input()` fields and setters or from `input()`,
//! `input.required()` and `model()` initializers; outputs from `@Output()`
//! fields or `output()` initializers.

use super::{missing_doc, non_empty, related, Extractor};
use crate::comment::DocComment;
use crate::model::*;
use crate::source::{Call, Declaration, DeclarationKind, Member, MemberKind, ParsedSource, Value};

pub struct ComponentExtractor {
    category_root: Option<String>,
}

impl ComponentExtractor {
    pub fn new(category_root: Option<String>) -> Self {
        Self {
            category_root: category_root.map(|r| r.trim_end_matches('/').to_string()),
        }
    }

    /// First directory below the category root, `general` for files placed
    /// directly in it or outside it.
    fn category_for(&self, rel_path: &str) -> String {
        let Some(root) = self.category_root.as_deref() else {
            return "general".to_string();
        };
        let rest = if root.is_empty() {
            Some(rel_path)
        } else {
            rel_path
                .strip_prefix(root)
                .and_then(|rest| rest.strip_prefix('/'))
        };
        match rest.and_then(|rest| rest.split_once('/')) {
            Some((dir, _)) => dir.to_string(),
            None => "general".to_string(),
        }
    }
}

impl Extractor for ComponentExtractor {
    type Record = ComponentRecord;

    fn extract_file(&self, source: &ParsedSource, rel_path: &str) -> ParseResult<ComponentRecord> {
        let mut records = Vec::new();
        let mut errors = Vec::new();

        for decl in source
            .declarations
            .iter()
            .filter(|d| d.kind == DeclarationKind::Class)
        {
            let Some(component) = decl.decorator("Component") else {
                continue;
            };
            let doc = DocComment::of(decl);
            if !doc.is_jsdoc() {
                errors.push(missing_doc(rel_path, decl.line, RecordKind::Component, &decl.name));
            }
            let tags = doc.tags();

            let selector = component
                .args
                .first()
                .and_then(|arg| arg.property("selector"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            let (inputs, outputs) = members(decl);

            records.push(ComponentRecord {
                name: decl.name.clone(),
                selector,
                category: non_empty(tags.get("category"))
                    .map(str::to_string)
                    .unwrap_or_else(|| self.category_for(rel_path)),
                description: doc.description(),
                inputs,
                outputs,
                usage: doc.examples().into_iter().next(),
                best_practices: tags
                    .get_all("bestPractice")
                    .into_iter()
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect(),
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

fn members(decl: &Declaration) -> (Vec<ComponentInput>, Vec<ComponentOutput>) {
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();

    for member in &decl.members {
        if member.name.starts_with('#') {
            continue;
        }
        if let Some(input) = decorated_input(member).or_else(|| signal_input(member)) {
            inputs.push(input);
        } else if let Some(output) = decorated_output(member).or_else(|| signal_output(member)) {
            outputs.push(output);
        }
    }
    (inputs, outputs)
}

fn member_description(member: &Member) -> String {
    let description = DocComment::of(member).description();
    if !description.is_empty() {
        return description;
    }
    member
        .trailing_comment
        .as_deref()
        .map(|c| DocComment::parse(c).description())
        .unwrap_or_default()
}

/// `@Input() name: T = value` or `@Input() set name(v: T)`.
fn decorated_input(member: &Member) -> Option<ComponentInput> {
    if !matches!(member.kind, MemberKind::Field | MemberKind::Setter) {
        return None;
    }
    let decorator = member.decorator("Input")?;
    let options = decorator.args.first();
    let alias = options.and_then(|o| {
        o.as_str()
            .or_else(|| o.property("alias").and_then(Value::as_str))
    });
    let required = options
        .and_then(|o| o.property("required"))
        .is_some_and(|v| *v == Value::Bool(true));

    Some(ComponentInput {
        name: alias.unwrap_or(&member.name).to_string(),
        type_name: member
            .type_annotation
            .clone()
            .or_else(|| member.value.as_ref().map(literal_type))
            .unwrap_or_else(|| "unknown".to_string()),
        default: if required {
            None
        } else {
            member.value.as_ref().map(Value::source_text)
        },
        description: member_description(member),
        required,
    })
}

/// `name = input<T>(default)`, `input.required<T>()`, `model<T>(default)`.
fn signal_input(member: &Member) -> Option<ComponentInput> {
    let call = member.value.as_ref()?.as_call()?;
    let required = match call.callee.as_str() {
        "input" | "model" => false,
        "input.required" | "model.required" => true,
        _ => return None,
    };
    let (default, options) = if required {
        (None, call.args.first())
    } else {
        (call.args.first(), call.args.get(1))
    };
    let alias = options
        .and_then(|o| o.property("alias"))
        .and_then(Value::as_str);

    Some(ComponentInput {
        name: alias.unwrap_or(&member.name).to_string(),
        type_name: signal_type(call, default),
        default: default.map(Value::source_text),
        description: member_description(member),
        required,
    })
}

fn decorated_output(member: &Member) -> Option<ComponentOutput> {
    let decorator = member.decorator("Output")?;
    let alias = decorator.args.first().and_then(Value::as_str);
    let type_name = member
        .type_annotation
        .as_deref()
        .map(payload_type)
        .or_else(|| {
            member
                .value
                .as_ref()
                .and_then(Value::as_call)
                .map(|call| call.type_args.clone().unwrap_or_else(|| "void".to_string()))
        })
        .unwrap_or_else(|| "void".to_string());

    Some(ComponentOutput {
        name: alias.unwrap_or(&member.name).to_string(),
        type_name,
        description: member_description(member),
    })
}

/// `name = output<T>()`.
fn signal_output(member: &Member) -> Option<ComponentOutput> {
    let call = member.value.as_ref()?.as_call()?;
    if call.callee != "output" {
        return None;
    }
    let alias = call
        .args
        .first()
        .and_then(|o| o.property("alias"))
        .and_then(Value::as_str);
    Some(ComponentOutput {
        name: alias.unwrap_or(&member.name).to_string(),
        type_name: call.type_args.clone().unwrap_or_else(|| "void".to_string()),
        description: member_description(member),
    })
}

fn signal_type(call: &Call, default: Option<&Value>) -> String {
    call.type_args
        .clone()
        .or_else(|| default.map(literal_type))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Type of a literal initializer, as far as it can be read off the syntax.
fn literal_type(value: &Value) -> String {
    match value {
        Value::Str(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Array(_) => "unknown[]",
        Value::Object(_) => "object",
        Value::Call(_) | Value::Expr(_) => "unknown",
    }
    .to_string()
}

/// `EventEmitter<T>` → `T`.
fn payload_type(annotation: &str) -> String {
    for wrapper in ["EventEmitter<", "OutputEmitterRef<"] {
        if let Some(inner) = annotation
            .strip_prefix(wrapper)
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return inner.trim().to_string();
        }
    }
    annotation.to_string()
}
