//! `{{ }}` interpolation scanning for text and attribute values.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;

use crate::ast::Expr;
use crate::codegen::quote;
use crate::error::{Result, TransformError};

lazy_static! {
    /// Non-greedy, may span lines.
    static ref MUSTACHE_RE: Regex = Regex::new(r"(?s)\{\{(.+?)\}\}").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Expression(String),
}

/// Result of scanning a raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// No interpolation at all; the value is kept unchanged.
    Raw(String),
    Expression(Interpolation),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolation {
    pub segments: Vec<Segment>,
}

pub fn parse_content(content: &str) -> Content {
    if !MUSTACHE_RE.is_match(content) {
        return Content::Raw(content.to_string());
    }

    let mut segments = Vec::new();
    let mut last_index = 0;
    for caps in MUSTACHE_RE.captures_iter(content) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last_index {
            segments.push(Segment::Literal(content[last_index..whole.start()].to_string()));
        }
        segments.push(Segment::Expression(inner.as_str().trim().to_string()));
        last_index = whole.end();
    }
    if last_index < content.len() {
        segments.push(Segment::Literal(content[last_index..].to_string()));
    }

    Content::Expression(Interpolation { segments })
}

impl Interpolation {
    /// Concatenation source: literals JSON-quoted, expressions parenthesized,
    /// joined with `+`.
    pub fn to_source(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => quote(text),
                Segment::Expression(code) => format!("({})", code),
            })
            .collect::<Vec<_>>()
            .join("+")
    }

    /// Checks the concatenation with the script parser and builds the
    /// expression node. A lone `{{expr}}` becomes the expression itself.
    pub fn into_expression(self) -> Result<Expr> {
        validate_expression(&self.to_source())?;

        let mut parts: Vec<Expr> = self
            .segments
            .into_iter()
            .map(|segment| match segment {
                Segment::Literal(text) => Expr::StringLiteral(text),
                Segment::Expression(code) => Expr::Raw(code),
            })
            .collect();

        if parts.len() == 1 {
            if let Some(only) = parts.pop() {
                return Ok(only);
            }
        }
        Ok(Expr::Concat(parts))
    }
}

fn validate_expression(code: &str) -> Result<()> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    match Parser::new(&allocator, code, source_type).parse_expression() {
        Ok(_) => Ok(()),
        Err(errors) => Err(TransformError::ExpressionSyntax {
            source_text: code.to_string(),
            message: errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        }),
    }
}
