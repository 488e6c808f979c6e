//! Script Transformer
//!
//! Parses the registration script, applies the namespace rewrites, and
//! replaces each top-level `Page`/`Component`/`App` call with the exported
//! class built from its definition object. Registration calls nested deeper
//! are validated but left in place. Everything else in the script is
//! carried over verbatim.

use log::{debug, warn};
use oxc_allocator::Allocator;
use oxc_ast::ast::{CallExpression, Expression, ObjectExpression, Program, Statement};
use oxc_ast_visit::Visit;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

use crate::ast::{Expr, Module, ModuleItem};
use crate::component::{ComponentDefinition, DefinitionExtractor, RegistrationKind};
use crate::error::{Result, TransformError};
use crate::finalize::prepend_imports;
use crate::options::TransformOptions;
use crate::renamer::{collect_rewrites, Rewrites};

/// Script used when a page has none.
pub const DEFAULT_SCRIPT: &str = "Page({})";

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptOutput {
    pub module: Module,
    pub definitions: Vec<ComponentDefinition>,
}

/// Script source to the finished module.
///
/// `returned` is the render value from the template pipeline, `config` the
/// page configuration, and `used_components` the component names listed in
/// the component library import.
pub fn parse_script(
    script: Option<&str>,
    returned: Option<Expr>,
    config: Option<&Value>,
    used_components: &BTreeSet<String>,
    opts: &TransformOptions,
) -> Result<ScriptOutput> {
    let source = script.unwrap_or(DEFAULT_SCRIPT);
    let allocator = Allocator::default();
    let source_type = SourceType::default()
        .with_typescript(true)
        .with_module(true)
        .with_jsx(true);

    let ret = Parser::new(&allocator, source, source_type).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return Err(TransformError::ScriptSyntax {
            message: ret
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        });
    }

    let rewrites = collect_rewrites(&ret.program, opts);
    debug!("collected {} namespace rewrite(s)", rewrites.len());

    let mut assembler = ModuleAssembler {
        source,
        rewrites: &rewrites,
        opts,
        returned,
        config,
        items: Vec::new(),
        definitions: Vec::new(),
        cursor: 0,
    };
    assembler.run(&ret.program)?;

    let mut module = Module {
        items: assembler.items,
    };
    prepend_imports(&mut module, used_components, opts);

    Ok(ScriptOutput {
        module,
        definitions: assembler.definitions,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// MODULE ASSEMBLY
// ═══════════════════════════════════════════════════════════════════════════════

struct ModuleAssembler<'s> {
    source: &'s str,
    rewrites: &'s Rewrites,
    opts: &'s TransformOptions,
    returned: Option<Expr>,
    config: Option<&'s Value>,
    items: Vec<ModuleItem>,
    definitions: Vec<ComponentDefinition>,
    /// End of the last slice copied into `items`.
    cursor: u32,
}

impl ModuleAssembler<'_> {
    fn run(&mut self, program: &Program<'_>) -> Result<()> {
        let mut replaced = HashSet::new();

        for stmt in &program.body {
            let Some(call) = statement_call(stmt) else {
                continue;
            };
            let Some(kind) = registration_kind(call) else {
                continue;
            };
            let Some(object) = definition_object(call) else {
                debug!(
                    "{}() at {} has no object literal argument; left unchanged",
                    kind.as_str(),
                    call.span.start
                );
                continue;
            };

            let definition = DefinitionExtractor::new(self.source, self.rewrites, self.opts)
                .extract(kind, object, self.config)?;
            let class = definition.clone().into_class(self.returned.clone(), self.opts);

            self.copy_until(stmt.span().start);
            self.items.push(ModuleItem::ExportDefaultClass(class));
            self.cursor = stmt.span().end;
            self.definitions.push(definition);
            replaced.insert(call.span.start);
        }

        let mut nested = NestedRegistrations {
            extractor: DefinitionExtractor::new(self.source, self.rewrites, self.opts),
            config: self.config,
            replaced: &replaced,
            error: None,
        };
        nested.visit_program(program);
        if let Some(error) = nested.error {
            return Err(error);
        }

        self.copy_until(program.span.end);
        Ok(())
    }

    fn copy_until(&mut self, end: u32) {
        if end <= self.cursor {
            return;
        }
        let code = self.rewrites.apply(self.source, Span::new(self.cursor, end));
        self.cursor = end;
        if !code.trim().is_empty() {
            self.items.push(ModuleItem::Verbatim { code });
        }
    }
}

fn registration_kind(call: &CallExpression<'_>) -> Option<RegistrationKind> {
    match &call.callee {
        Expression::Identifier(ident) => RegistrationKind::from_callee(&ident.name),
        _ => None,
    }
}

fn definition_object<'b, 'a>(call: &'b CallExpression<'a>) -> Option<&'b ObjectExpression<'a>> {
    match call.arguments.first()?.as_expression()?.without_parentheses() {
        Expression::ObjectExpression(object) => Some(&**object),
        _ => None,
    }
}

/// The registration call a top-level statement consists of, either as a
/// bare expression statement or as `export default Page({...})`.
fn statement_call<'b, 'a>(stmt: &'b Statement<'a>) -> Option<&'b CallExpression<'a>> {
    let expr = match stmt {
        Statement::ExpressionStatement(expr_stmt) => &expr_stmt.expression,
        Statement::ExportDefaultDeclaration(export) => export.declaration.as_expression()?,
        _ => return None,
    };
    match expr.without_parentheses() {
        Expression::CallExpression(call) => Some(&**call),
        _ => None,
    }
}

/// Validates registration calls that cannot be replaced by a class
/// declaration. They are left in place, but a malformed definition still
/// fails the conversion.
struct NestedRegistrations<'s> {
    extractor: DefinitionExtractor<'s>,
    config: Option<&'s Value>,
    replaced: &'s HashSet<u32>,
    error: Option<TransformError>,
}

impl<'a> Visit<'a> for NestedRegistrations<'_> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if self.error.is_some() {
            return;
        }
        if let Some(kind) = registration_kind(call) {
            if !self.replaced.contains(&call.span.start) {
                if let Some(object) = definition_object(call) {
                    if let Err(error) = self.extractor.extract(kind, object, self.config) {
                        self.error = Some(error);
                        return;
                    }
                }
                warn!(
                    "{}() at offset {} is not a top-level statement; left unchanged",
                    kind.as_str(),
                    call.span.start
                );
            }
        }
        oxc_ast_visit::walk::walk_call_expression(self, call);
    }
}
