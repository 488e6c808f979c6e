//! Codegen module
//!
//! Prints the output syntax tree as JavaScript with JSX. Source slices
//! (`Raw` expressions and bodies) are emitted as written; operands whose
//! precedence cannot be read off the text are parenthesized.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::ast::{
    ArrowFunction, AttrValue, ClassDeclaration, ClassMember, Expr, FunctionBody, ImportDeclaration,
    MethodKind, Module, ModuleItem, Stmt, UiAttribute, UiChild, UiElement,
};

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_$][\w$]*$").unwrap();
    /// `a`, `a.b.c`, `this.x`, numbers. Safe in any operand position.
    static ref SIMPLE_RAW_RE: Regex =
        Regex::new(r"^(?:[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*|\d+(?:\.\d+)?)$").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRECEDENCE
// ═══════════════════════════════════════════════════════════════════════════════

const PREC_LOWEST: u8 = 0;
const PREC_ASSIGN: u8 = 2;
const PREC_CONDITIONAL: u8 = 3;
const PREC_AND: u8 = 5;
const PREC_ADDITIVE: u8 = 13;
const PREC_CALL: u8 = 19;
const PREC_PRIMARY: u8 = 20;

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Raw(code) if SIMPLE_RAW_RE.is_match(code.trim()) => PREC_PRIMARY,
        Expr::Raw(_) => PREC_LOWEST,
        Expr::Identifier(_)
        | Expr::StringLiteral(_)
        | Expr::Null
        | Expr::Json(_)
        | Expr::Element(_) => PREC_PRIMARY,
        Expr::Member { .. } | Expr::Call { .. } => PREC_CALL,
        Expr::Concat(_) => PREC_ADDITIVE,
        Expr::And { .. } => PREC_AND,
        Expr::Conditional { .. } => PREC_CONDITIONAL,
        Expr::Arrow(_) => PREC_ASSIGN,
    }
}

fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}

/// Double-quoted JavaScript string literal.
pub(crate) fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

// ═══════════════════════════════════════════════════════════════════════════════
// MODULE
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_module(module: &Module) -> String {
    let mut out = String::new();
    let mut previous_import = false;

    for item in &module.items {
        let (text, is_import) = match item {
            ModuleItem::Import(import) => (print_import(import), true),
            ModuleItem::ExportDefaultClass(class) => (print_class(class, true), false),
            ModuleItem::Verbatim { code } => (
                code.trim_start_matches(['\n', '\r']).trim_end().to_string(),
                false,
            ),
        };
        if !out.is_empty() {
            out.push_str(if is_import && previous_import { "\n" } else { "\n\n" });
        }
        out.push_str(&text);
        previous_import = is_import;
    }

    out.push('\n');
    out
}

pub fn print_import(import: &ImportDeclaration) -> String {
    let named = format!("{{ {} }}", import.named.join(", "));
    let named = if import.named.is_empty() { "{}".to_string() } else { named };
    let clause = match (&import.default, import.named.is_empty()) {
        (Some(default), true) => default.clone(),
        (Some(default), false) => format!("{}, {}", default, named),
        (None, _) => named,
    };
    format!("import {} from {};", clause, quote(&import.source))
}

pub fn print_class(class: &ClassDeclaration, export_default: bool) -> String {
    let mut out = String::new();
    for decorator in &class.decorators {
        out.push('@');
        out.push_str(&expr_at(decorator, PREC_CALL, 0));
        out.push('\n');
    }
    if export_default {
        out.push_str("export default ");
    }
    out.push_str("class ");
    out.push_str(&class.name);
    if let Some(super_class) = &class.super_class {
        out.push_str(" extends ");
        out.push_str(&expr_at(super_class, PREC_CALL, 0));
    }
    out.push_str(" {\n");

    let members: Vec<String> = class.body.iter().map(|member| print_member(member, 1)).collect();
    out.push_str(&members.join("\n\n"));
    if !members.is_empty() {
        out.push('\n');
    }
    out.push('}');
    out
}

fn print_member(member: &ClassMember, indent: usize) -> String {
    match member {
        ClassMember::Property { name, value } => {
            let text = match value {
                Expr::Raw(code) if !has_top_level_comma(code) => code.trim().to_string(),
                other => expr_at(other, PREC_ASSIGN, indent),
            };
            format!("{}{} = {};", pad(indent), name, text)
        }
        ClassMember::Method {
            name,
            kind,
            is_async,
            is_generator,
            params,
            return_type,
            body,
        } => {
            let mut head = pad(indent);
            if *is_async {
                head.push_str("async ");
            }
            match kind {
                MethodKind::Get => head.push_str("get "),
                MethodKind::Set => head.push_str("set "),
                MethodKind::Method => {}
            }
            if *is_generator {
                head.push('*');
            }
            head.push_str(&format!("{}({})", name, params));
            if let Some(return_type) = return_type {
                head.push_str(&format!(": {}", return_type));
            }
            format!("{} {}", head, block_body(body, indent))
        }
    }
}

/// Whether a source slice is a sequence expression (`a, b`). Commas nested
/// in brackets, strings, templates or comments do not count.
fn has_top_level_comma(code: &str) -> bool {
    let mut depth = 0usize;
    let mut chars = code.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '"' | '\'' | '`' => {
                while let Some(inner) = chars.next() {
                    if inner == '\\' {
                        chars.next();
                    } else if inner == c {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = ' ';
                for inner in chars.by_ref() {
                    if previous == '*' && inner == '/' {
                        break;
                    }
                    previous = inner;
                }
            }
            ',' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

/// A function body as a block. A concise body becomes `{ return expr; }`.
fn block_body(body: &FunctionBody, indent: usize) -> String {
    match body {
        FunctionBody::Raw(code) => code.clone(),
        FunctionBody::Statements(stmts) => {
            let mut out = String::from("{\n");
            for stmt in stmts {
                out.push_str(&pad(indent + 1));
                out.push_str(&print_stmt(stmt, indent + 1));
                out.push('\n');
            }
            out.push_str(&pad(indent));
            out.push('}');
            out
        }
        FunctionBody::Expression(expr) => format!(
            "{{\n{}return {};\n{}}}",
            pad(indent + 1),
            expr_at(expr, PREC_LOWEST, indent + 1),
            pad(indent)
        ),
    }
}

fn print_stmt(stmt: &Stmt, indent: usize) -> String {
    match stmt {
        Stmt::Return { argument } => format!("return {};", expr_at(argument, PREC_LOWEST, indent)),
        Stmt::DestructureConst { keys, init } => format!(
            "const {{ {} }} = {};",
            keys.join(", "),
            expr_at(init, PREC_ASSIGN, indent)
        ),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSIONS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_expr(expr: &Expr) -> String {
    expr_at(expr, PREC_LOWEST, 0)
}

/// Prints `expr` where the surrounding syntax needs at least `min`.
fn expr_at(expr: &Expr, min: u8, indent: usize) -> String {
    let text = expr_text(expr, indent);
    if precedence(expr) < min {
        format!("({})", text)
    } else {
        text
    }
}

fn expr_text(expr: &Expr, indent: usize) -> String {
    match expr {
        Expr::Raw(code) => code.trim().to_string(),
        Expr::Identifier(name) => name.clone(),
        Expr::StringLiteral(value) => quote(value),
        Expr::Null => "null".to_string(),
        Expr::Concat(parts) => parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                let min = if i == 0 { PREC_ADDITIVE } else { PREC_ADDITIVE + 1 };
                expr_at(part, min, indent)
            })
            .collect::<Vec<_>>()
            .join(" + "),
        Expr::And { left, right } => format!(
            "{} && {}",
            expr_at(left, PREC_AND, indent),
            expr_at(right, PREC_AND + 1, indent)
        ),
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => format!(
            "{} ? {} : {}",
            expr_at(test, PREC_CONDITIONAL + 1, indent),
            expr_at(consequent, PREC_ASSIGN, indent),
            expr_at(alternate, PREC_CONDITIONAL, indent)
        ),
        Expr::Member { object, property } => {
            format!("{}.{}", expr_at(object, PREC_CALL, indent), property)
        }
        Expr::Call { callee, arguments } => format!(
            "{}({})",
            expr_at(callee, PREC_CALL, indent),
            arguments
                .iter()
                .map(|arg| expr_at(arg, PREC_ASSIGN, indent))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Expr::Arrow(arrow) => print_arrow(arrow, indent),
        Expr::Element(element) => print_element(element, indent),
        Expr::Json(value) => print_json(value, indent),
    }
}

fn print_arrow(arrow: &ArrowFunction, indent: usize) -> String {
    let mut out = String::new();
    if arrow.is_async {
        out.push_str("async ");
    }
    out.push_str(&format!("({})", arrow.params));
    if let Some(return_type) = &arrow.return_type {
        out.push_str(&format!(": {}", return_type));
    }
    out.push_str(" => ");
    match &arrow.body {
        // A source slice is already a complete expression; only an object
        // literal needs wrapping.
        FunctionBody::Expression(body) => match body.as_ref() {
            Expr::Raw(code) if code.trim_start().starts_with('{') => {
                out.push_str(&format!("({})", code.trim()))
            }
            Expr::Raw(code) => out.push_str(code.trim()),
            other => out.push_str(&expr_at(other, PREC_ASSIGN, indent)),
        },
        body => out.push_str(&block_body(body, indent)),
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSX
// ═══════════════════════════════════════════════════════════════════════════════

fn print_element(element: &UiElement, indent: usize) -> String {
    let mut open = format!("<{}", element.tag_name);
    for attr in &element.attributes {
        open.push(' ');
        open.push_str(&print_attribute(attr, indent));
    }

    if element.children.is_empty() {
        return format!("{} />", open);
    }

    let inline = element
        .children
        .iter()
        .all(|child| !matches!(child, UiChild::Element(_)));
    if inline {
        let parts: Vec<String> = element
            .children
            .iter()
            .map(|child| print_child(child, indent, false))
            .collect();
        if parts.iter().all(|part| !part.contains('\n')) {
            return format!("{}>{}</{}>", open, parts.concat(), element.tag_name);
        }
    }

    let mut out = format!("{}>\n", open);
    for child in &element.children {
        let text = print_child(child, indent + 1, true);
        if text.is_empty() {
            continue;
        }
        out.push_str(&pad(indent + 1));
        out.push_str(&text);
        out.push('\n');
    }
    out.push_str(&pad(indent));
    out.push_str(&format!("</{}>", element.tag_name));
    out
}

fn print_attribute(attr: &UiAttribute, indent: usize) -> String {
    match &attr.value {
        None => attr.key.clone(),
        Some(AttrValue::Literal(text)) if text.contains('"') => {
            format!("{}={{{}}}", attr.key, quote(text))
        }
        Some(AttrValue::Literal(text)) => format!("{}=\"{}\"", attr.key, text),
        Some(AttrValue::Expression(expr)) => {
            format!("{}={{{}}}", attr.key, expr_at(expr, PREC_LOWEST, indent))
        }
    }
}

fn print_child(child: &UiChild, indent: usize, multiline: bool) -> String {
    match child {
        UiChild::Element(element) => print_element(element, indent),
        UiChild::Text(text) => {
            let text = if multiline { text.trim() } else { text.as_str() };
            if text.contains(['{', '}', '<', '>']) {
                format!("{{{}}}", quote(text))
            } else {
                text.to_string()
            }
        }
        UiChild::Expression(expr) => format!("{{{}}}", expr_at(expr, PREC_LOWEST, indent)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON
// ═══════════════════════════════════════════════════════════════════════════════

/// JSON value as a JavaScript literal; keys are unquoted where possible.
fn print_json(value: &Value, indent: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) if items.iter().all(|item| !item.is_object() && !item.is_array()) => format!(
            "[{}]",
            items
                .iter()
                .map(|item| print_json(item, indent))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Value::Array(items) => {
            let lines: Vec<String> = items
                .iter()
                .map(|item| format!("{}{}", pad(indent + 1), print_json(item, indent + 1)))
                .collect();
            format!("[\n{}\n{}]", lines.join(",\n"), pad(indent))
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let lines: Vec<String> = map
                .iter()
                .map(|(key, value)| {
                    let key = if IDENTIFIER_RE.is_match(key) {
                        key.clone()
                    } else {
                        quote(key)
                    };
                    format!("{}{}: {}", pad(indent + 1), key, print_json(value, indent + 1))
                })
                .collect();
            format!("{{\n{}\n{}}}", lines.join(",\n"), pad(indent))
        }
    }
}
