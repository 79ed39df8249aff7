//! tree-sitter walker producing a [`ParsedSource`].
//!
//! `.ts`/`.js` files use the TypeScript grammar, `.tsx`/`.jsx` the TSX one.
//! A tree containing any ERROR or MISSING node is rejected as a syntax error.

use super::*;
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Owns one parser per grammar. Not shareable across threads; create one per
/// worker.
pub struct SourceParser {
    typescript: Parser,
    tsx: Parser,
}

impl SourceParser {
    pub fn new() -> Result<Self, SourceError> {
        let mut typescript = Parser::new();
        typescript.set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())?;
        let mut tsx = Parser::new();
        tsx.set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())?;
        Ok(Self { typescript, tsx })
    }

    /// Parse source text. `path` only selects the grammar.
    pub fn parse(&mut self, path: &Path, text: &str) -> Result<ParsedSource, SourceError> {
        let parser = match path.extension().and_then(|e| e.to_str()) {
            Some("tsx" | "jsx") => &mut self.tsx,
            _ => &mut self.typescript,
        };
        let tree = parser.parse(text, None).ok_or(SourceError::NoTree)?;
        let root = tree.root_node();
        if root.has_error() {
            let line = first_error(root)
                .map(|node| node.start_position().row + 1)
                .unwrap_or(1);
            return Err(SourceError::Syntax { line });
        }

        let walker = Walker { src: text };
        let mut parsed = ParsedSource::default();
        walker.program(root, &mut parsed);
        walker.collect_chains(root, &mut parsed.call_chains);
        Ok(parsed)
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

struct Walker<'s> {
    src: &'s str,
}

impl<'s> Walker<'s> {
    fn text(&self, node: Node) -> &'s str {
        &self.src[node.byte_range()]
    }

    fn program(&self, root: Node, out: &mut ParsedSource) {
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if child.kind() == "export_statement" {
                self.export_statement(child, out);
            } else {
                let comment = self.leading_comment(child);
                self.declaration(child, false, Vec::new(), comment, out);
            }
        }
    }

    fn export_statement(&self, node: Node, out: &mut ParsedSource) {
        let Some(decl) = node.child_by_field_name("declaration") else {
            return;
        };
        let mut cursor = node.walk();
        let decorators: Vec<Decorator> = node
            .children(&mut cursor)
            .filter(|c| c.kind() == "decorator")
            .map(|c| self.decorator(c))
            .collect();
        let comment = self
            .leading_comment(decl)
            .or_else(|| self.leading_comment(node));
        self.declaration(decl, true, decorators, comment, out);
    }

    fn declaration(
        &self,
        node: Node,
        exported: bool,
        mut decorators: Vec<Decorator>,
        comment: Option<String>,
        out: &mut ParsedSource,
    ) {
        let kind = match node.kind() {
            "class_declaration" | "abstract_class_declaration" => DeclarationKind::Class,
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                DeclarationKind::Function
            }
            "interface_declaration" => DeclarationKind::Interface,
            "type_alias_declaration" => DeclarationKind::TypeAlias,
            "enum_declaration" => DeclarationKind::Enum,
            "lexical_declaration" | "variable_declaration" => {
                self.variables(node, exported, comment, out);
                return;
            }
            _ => return,
        };
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };

        let mut members = Vec::new();
        if kind == DeclarationKind::Class {
            let mut cursor = node.walk();
            decorators.extend(
                node.children(&mut cursor)
                    .filter(|c| c.kind() == "decorator")
                    .map(|c| self.decorator(c)),
            );
            if let Some(body) = node.child_by_field_name("body") {
                members = self.members(body);
            }
        }

        out.declarations.push(Declaration {
            kind,
            name: self.text(name).to_string(),
            line: line_of(name),
            exported,
            comment,
            decorators,
            members,
            value: None,
        });
    }

    fn variables(&self, node: Node, exported: bool, comment: Option<String>, out: &mut ParsedSource) {
        let kind = if self.text(node).trim_start().starts_with("const") {
            DeclarationKind::Const
        } else {
            DeclarationKind::Variable
        };
        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            // Destructuring patterns have no single name.
            let Some(name) = declarator
                .child_by_field_name("name")
                .filter(|n| n.kind() == "identifier")
            else {
                continue;
            };
            out.declarations.push(Declaration {
                kind,
                name: self.text(name).to_string(),
                line: line_of(name),
                exported,
                comment: comment.clone(),
                decorators: Vec::new(),
                members: Vec::new(),
                value: declarator.child_by_field_name("value").map(|v| self.value(v)),
            });
        }
    }

    // -- Class members --------------------------------------------------------

    fn members(&self, body: Node) -> Vec<Member> {
        let mut members = Vec::new();
        // Method decorators are siblings of the method inside the class body.
        let mut pending: Vec<Decorator> = Vec::new();
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            match child.kind() {
                "decorator" => pending.push(self.decorator(child)),
                "public_field_definition" | "field_definition" => {
                    let mut member = self.field(child);
                    let mut decorators = std::mem::take(&mut pending);
                    decorators.append(&mut member.decorators);
                    member.decorators = decorators;
                    members.push(member);
                }
                "method_definition" => {
                    let mut member = self.method(child);
                    member.decorators = std::mem::take(&mut pending);
                    members.push(member);
                }
                "comment" => {}
                _ => pending.clear(),
            }
        }
        members
    }

    fn field(&self, node: Node) -> Member {
        let mut decorators = Vec::new();
        let mut optional = false;
        let mut type_annotation = None;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "decorator" => decorators.push(self.decorator(child)),
                "?" => optional = true,
                "type_annotation" => type_annotation = Some(self.type_annotation(child)),
                _ => {}
            }
        }
        let name = node.child_by_field_name("name");
        Member {
            kind: MemberKind::Field,
            name: name.map(|n| self.text(n).to_string()).unwrap_or_default(),
            line: line_of(name.unwrap_or(node)),
            comment: self.leading_comment(node),
            trailing_comment: self.trailing_comment(node),
            decorators,
            type_annotation,
            value: node.child_by_field_name("value").map(|v| self.value(v)),
            optional,
        }
    }

    fn method(&self, node: Node) -> Member {
        let mut kind = MemberKind::Method;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "get" => kind = MemberKind::Getter,
                "set" => kind = MemberKind::Setter,
                _ => {}
            }
        }
        let type_annotation = match kind {
            // A setter's type is its parameter's type.
            MemberKind::Setter => node.child_by_field_name("parameters").and_then(|params| {
                let mut cursor = params.walk();
                let first = params.named_children(&mut cursor).next()?;
                let mut inner = first.walk();
                let annotation = first
                    .children(&mut inner)
                    .find(|c| c.kind() == "type_annotation")?;
                Some(self.type_annotation(annotation))
            }),
            _ => node
                .child_by_field_name("return_type")
                .map(|t| self.type_annotation(t)),
        };
        let name = node.child_by_field_name("name");
        Member {
            kind,
            name: name.map(|n| self.text(n).to_string()).unwrap_or_default(),
            line: line_of(name.unwrap_or(node)),
            comment: self.leading_comment(node),
            trailing_comment: None,
            decorators: Vec::new(),
            type_annotation,
            value: None,
            optional: false,
        }
    }

    fn type_annotation(&self, node: Node) -> String {
        self.text(node).trim_start_matches(':').trim().to_string()
    }

    // -- Comments -------------------------------------------------------------

    /// Closest comment run directly before `node`. A block comment in the run
    /// wins over line comments; a trailing comment of the previous statement
    /// ends the run.
    fn leading_comment(&self, node: Node) -> Option<String> {
        let mut prev = node.prev_sibling();
        while let Some(p) = prev {
            if matches!(p.kind(), "decorator" | "export" | "default") {
                prev = p.prev_sibling();
            } else {
                break;
            }
        }

        let mut fallback: Option<Node> = None;
        while let Some(comment) = prev.filter(|p| p.kind() == "comment") {
            if self.is_trailing(comment) {
                break;
            }
            if self.text(comment).starts_with("/*") {
                return Some(self.text(comment).to_string());
            }
            fallback.get_or_insert(comment);
            prev = comment.prev_sibling();
        }
        fallback.map(|c| self.text(c).to_string())
    }

    fn is_trailing(&self, comment: Node) -> bool {
        match comment.prev_sibling() {
            Some(before) => {
                before.kind() != "comment"
                    && before.kind() != "{"
                    && before.end_position().row == comment.start_position().row
            }
            None => false,
        }
    }

    fn trailing_comment(&self, node: Node) -> Option<String> {
        let mut next = node.next_sibling();
        while let Some(n) = next.filter(|n| n.kind() == ";" || n.kind() == ",") {
            next = n.next_sibling();
        }
        next.filter(|n| n.kind() == "comment" && n.start_position().row == node.end_position().row)
            .map(|n| self.text(n).to_string())
    }

    // -- Expressions ----------------------------------------------------------

    fn decorator(&self, node: Node) -> Decorator {
        let mut cursor = node.walk();
        let expr = node
            .named_children(&mut cursor)
            .find(|c| c.kind() != "comment");
        match expr {
            Some(expr) if expr.kind() == "call_expression" => {
                let call = self.call(expr);
                Decorator {
                    name: call.callee,
                    args: call.args,
                }
            }
            Some(expr) => Decorator {
                name: self.text(expr).to_string(),
                args: Vec::new(),
            },
            None => Decorator {
                name: self.text(node).trim_start_matches('@').to_string(),
                args: Vec::new(),
            },
        }
    }

    /// A `call_expression` or `new_expression`.
    fn call(&self, node: Node) -> Call {
        let callee = if node.kind() == "new_expression" {
            let ctor = node
                .child_by_field_name("constructor")
                .map(|c| self.text(c))
                .unwrap_or_default();
            format!("new {ctor}")
        } else {
            node.child_by_field_name("function")
                .map(|f| self.text(f).to_string())
                .unwrap_or_default()
        };

        let mut type_args = None;
        let mut args = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "type_arguments" => {
                    let text = self.text(child);
                    let inner = text.strip_prefix('<').unwrap_or(text);
                    let inner = inner.strip_suffix('>').unwrap_or(inner);
                    type_args = Some(inner.trim().to_string());
                }
                "arguments" => {
                    let mut inner = child.walk();
                    args = child
                        .named_children(&mut inner)
                        .filter(|a| a.kind() != "comment")
                        .map(|a| self.value(a))
                        .collect();
                }
                _ => {}
            }
        }

        Call {
            callee,
            type_args,
            args,
            line: line_of(node),
        }
    }

    fn value(&self, node: Node) -> Value {
        match node.kind() {
            "string" => Value::Str(unescape(strip_delimiters(self.text(node)))),
            "template_string" => {
                let mut cursor = node.walk();
                let interpolated = node
                    .named_children(&mut cursor)
                    .any(|c| c.kind() == "template_substitution");
                if interpolated {
                    Value::Expr(self.text(node).to_string())
                } else {
                    Value::Str(unescape(strip_delimiters(self.text(node))))
                }
            }
            "number" => Value::Number(self.text(node).to_string()),
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "unary_expression" if self.text(node).starts_with('-') => {
                let operand_is_number = node
                    .child_by_field_name("argument")
                    .is_some_and(|a| a.kind() == "number");
                if operand_is_number {
                    Value::Number(self.text(node).to_string())
                } else {
                    Value::Expr(self.text(node).to_string())
                }
            }
            "object" => {
                let mut props = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    match child.kind() {
                        "pair" => {
                            let (Some(key), Some(value)) = (
                                child.child_by_field_name("key"),
                                child.child_by_field_name("value"),
                            ) else {
                                continue;
                            };
                            let key = match key.kind() {
                                "string" => unescape(strip_delimiters(self.text(key))),
                                _ => self.text(key).to_string(),
                            };
                            props.push((key, self.value(value)));
                        }
                        "shorthand_property_identifier" => {
                            let name = self.text(child).to_string();
                            props.push((name.clone(), Value::Expr(name)));
                        }
                        _ => {}
                    }
                }
                Value::Object(props)
            }
            "array" => {
                let mut cursor = node.walk();
                Value::Array(
                    node.named_children(&mut cursor)
                        .filter(|c| c.kind() != "comment")
                        .map(|c| self.value(c))
                        .collect(),
                )
            }
            "call_expression" | "new_expression" => Value::Call(self.call(node)),
            "parenthesized_expression" | "as_expression" | "satisfies_expression" => {
                let mut cursor = node.walk();
                let inner = node
                    .named_children(&mut cursor)
                    .find(|c| c.kind() != "comment");
                match inner {
                    Some(inner) => self.value(inner),
                    None => Value::Expr(self.text(node).to_string()),
                }
            }
            _ => Value::Expr(self.text(node).to_string()),
        }
    }

    // -- Call chains ----------------------------------------------------------

    fn collect_chains(&self, node: Node, out: &mut Vec<CallChain>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "expression_statement" => {
                    let mut inner = child.walk();
                    let expr = child
                        .named_children(&mut inner)
                        .find(|c| c.kind() != "comment");
                    if let Some(expr) = expr {
                        self.push_chain(expr, child, out);
                    }
                }
                // `const sub = program.command('x')...`
                "lexical_declaration" | "variable_declaration" => {
                    let statement = child
                        .parent()
                        .filter(|p| p.kind() == "export_statement")
                        .unwrap_or(child);
                    let mut inner = child.walk();
                    for declarator in child.named_children(&mut inner) {
                        if declarator.kind() != "variable_declarator" {
                            continue;
                        }
                        if let Some(value) = declarator.child_by_field_name("value") {
                            self.push_chain(value, statement, out);
                        }
                    }
                }
                _ => {}
            }
            self.collect_chains(child, out);
        }
    }

    /// Record `expr` as a chain documented by the comment before `statement`.
    fn push_chain(&self, expr: Node, statement: Node, out: &mut Vec<CallChain>) {
        if expr.kind() != "call_expression" {
            return;
        }
        let (receiver, calls) = self.unwind(expr);
        if !receiver.is_empty() && !calls.is_empty() {
            out.push(CallChain {
                line: line_of(statement),
                comment: self.leading_comment(statement),
                receiver,
                calls,
            });
        }
    }

    /// Split `a.b(x).c(y)` into the receiver `a` and calls `[b(x), c(y)]`.
    fn unwind(&self, node: Node) -> (String, Vec<Call>) {
        if node.kind() == "call_expression" {
            let member = node
                .child_by_field_name("function")
                .filter(|f| f.kind() == "member_expression");
            if let Some(member) = member {
                if let (Some(object), Some(property)) = (
                    member.child_by_field_name("object"),
                    member.child_by_field_name("property"),
                ) {
                    let (receiver, mut calls) = self.unwind(object);
                    let mut call = self.call(node);
                    call.callee = self.text(property).to_string();
                    call.line = line_of(property);
                    calls.push(call);
                    return (receiver, calls);
                }
            }
        }
        (self.text(node).to_string(), Vec::new())
    }
}

/// Drop the quote/backtick characters around a literal.
fn strip_delimiters(literal: &str) -> &str {
    let mut chars = literal.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if open == close && matches!(open, '\'' | '"' | '`') => {
            &literal[1..literal.len() - 1]
        }
        _ => literal,
    }
}

/// Resolve the escape sequences of a string literal body.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            // Line continuation.
            Some('\n') => {}
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> ParsedSource {
        SourceParser::new()
            .unwrap()
            .parse(Path::new("test.ts"), src)
            .unwrap()
    }

    #[test]
    fn decorated_exported_class() {
        let src = r#"
import { Component, Input } from '@angular/core';

/**
 * A button.
 */
@Component({
  selector: 'ax-button',
  standalone: true,
})
export class AxButtonComponent {
  /** Visual style */
  @Input() variant: 'primary' | 'secondary' = 'primary';
  @Input() disabled = false; // Disable the button
  label = input.required<string>();
}
"#;
        let parsed = parse(src);
        let class = parsed.exported_declarations().next().unwrap();
        assert_eq!(class.name, "AxButtonComponent");
        assert_eq!(class.kind, DeclarationKind::Class);
        assert!(class.comment.as_deref().unwrap().contains("A button."));

        let component = class.decorator("Component").unwrap();
        let selector = component.args[0].property("selector").unwrap();
        assert_eq!(selector.as_str(), Some("ax-button"));

        assert_eq!(class.members.len(), 3);
        let variant = &class.members[0];
        assert_eq!(variant.name, "variant");
        assert!(variant.decorator("Input").is_some());
        assert_eq!(variant.comment.as_deref(), Some("/** Visual style */"));
        assert_eq!(variant.type_annotation.as_deref(), Some("'primary' | 'secondary'"));

        let disabled = &class.members[1];
        assert_eq!(disabled.comment, None);
        assert_eq!(disabled.trailing_comment.as_deref(), Some("// Disable the button"));
        assert_eq!(disabled.value, Some(Value::Bool(false)));

        // The trailing comment of `disabled` is not the leading comment of `label`.
        let label = &class.members[2];
        assert_eq!(label.comment, None);
        let call = label.value.as_ref().and_then(Value::as_call).unwrap();
        assert_eq!(call.callee, "input.required");
        assert_eq!(call.type_args.as_deref(), Some("string"));
    }

    #[test]
    fn closest_block_comment_wins() {
        let src = "/** first */\n/** second */\nexport const a = 1;\n";
        let parsed = parse(src);
        assert_eq!(parsed.declarations[0].comment.as_deref(), Some("/** second */"));
    }

    #[test]
    fn template_and_string_values() {
        let src = "export const p = `line 1\n  line \\`2\\``;\nexport const q = 'it\\'s';\n";
        let parsed = parse(src);
        assert_eq!(
            parsed.declarations[0].value,
            Some(Value::Str("line 1\n  line `2`".to_string()))
        );
        assert_eq!(parsed.declarations[1].value, Some(Value::Str("it's".to_string())));
    }

    #[test]
    fn call_chains() {
        let src = r#"
// Generate command
program
  .command('generate [table]')
  .alias('g')
  .option('-f, --force', 'Force overwrite')
  .action(async () => {});
"#;
        let parsed = parse(src);
        assert_eq!(parsed.call_chains.len(), 1);
        let chain = &parsed.call_chains[0];
        assert_eq!(chain.receiver, "program");
        let callees: Vec<&str> = chain.calls.iter().map(|c| c.callee.as_str()).collect();
        assert_eq!(callees, ["command", "alias", "option", "action"]);
        assert_eq!(chain.calls[0].line, 4);
        assert_eq!(chain.comment.as_deref(), Some("// Generate command"));
    }

    #[test]
    fn syntax_error_reports_line() {
        let err = SourceParser::new()
            .unwrap()
            .parse(Path::new("bad.ts"), "export const a = 1;\nexport class {\n")
            .unwrap_err();
        assert!(matches!(err, SourceError::Syntax { .. }), "got {err:?}");
    }
}
