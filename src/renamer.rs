//! Identifier/Call Rewriter
//!
//! Collects source edits instead of mutating the tree: each edit replaces a
//! byte span of the script with new text, and the edits are applied while
//! the script is sliced into the output module.

use oxc_ast::ast::{
    AssignmentTargetPropertyIdentifier, BindingIdentifier, BindingProperty, CallExpression,
    ExportSpecifier, Expression, IdentifierReference, ImportSpecifier, ModuleExportName,
    ObjectProperty, Program,
};
use oxc_ast_visit::Visit;
use oxc_span::Span;
use std::collections::{BTreeMap, HashSet};

use crate::options::TransformOptions;
use crate::scope::NamespaceScope;

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE EDITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Span replacements keyed by start offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rewrites {
    edits: BTreeMap<u32, (u32, String)>,
}

impl Rewrites {
    /// A later edit at the same start replaces the earlier one.
    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.edits.insert(span.start, (span.end, text.into()));
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// `source[span]` with every edit fully inside `span` applied. An edit
    /// overlapping one already applied is skipped.
    pub fn apply(&self, source: &str, span: Span) -> String {
        let mut out = String::with_capacity((span.end - span.start) as usize);
        let mut cursor = span.start;
        for (&start, (end, text)) in self.edits.range(span.start..span.end) {
            if start < cursor || *end > span.end {
                continue;
            }
            out.push_str(slice(source, cursor, start));
            out.push_str(text);
            cursor = *end;
        }
        out.push_str(slice(source, cursor, span.end));
        out
    }
}

fn slice(source: &str, start: u32, end: u32) -> &str {
    source.get(start as usize..end as usize).unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAMESPACE REWRITER
// ═══════════════════════════════════════════════════════════════════════════════

/// Renames the bound legacy namespace to the target namespace and moves
/// namespace calls (`wx.x()`, `getApp()`) under the target namespace.
pub struct NamespaceRewriter<'s> {
    scope: &'s NamespaceScope,
    legacy: &'s str,
    target: &'s str,
    app_globals: &'s [String],
    /// Start offsets of shorthand properties (`{ wx }`).
    shorthand: HashSet<u32>,
    pub rewrites: Rewrites,
}

impl<'s> NamespaceRewriter<'s> {
    pub fn new(scope: &'s NamespaceScope, opts: &'s TransformOptions) -> Self {
        Self {
            scope,
            legacy: &opts.legacy_namespace,
            target: &opts.target_namespace,
            app_globals: &opts.app_globals,
            shorthand: HashSet::new(),
            rewrites: Rewrites::default(),
        }
    }

    fn rename(&mut self, span: Span) {
        let text = if self.shorthand.contains(&span.start) {
            format!("{}: {}", self.legacy, self.target)
        } else {
            self.target.to_string()
        };
        self.rewrites.replace(span, text);
    }

    fn is_app_global(&self, ident: &IdentifierReference<'_>) -> bool {
        self.app_globals.iter().any(|name| ident.name == name.as_str()) && self.scope.is_global(ident)
    }

    fn rewrite_namespace_object(&mut self, object: &Expression<'_>) {
        if let Expression::Identifier(ident) = object {
            if ident.name == self.legacy {
                self.rewrites.replace(ident.span, self.target);
            }
        }
    }
}

impl<'a> Visit<'a> for NamespaceRewriter<'_> {
    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        if self.scope.resolves_to_legacy(ident) {
            self.rename(ident.span);
        }
    }

    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        if self.scope.declares_legacy(ident) {
            self.rename(ident.span);
        }
    }

    fn visit_object_property(&mut self, prop: &ObjectProperty<'a>) {
        if prop.shorthand {
            self.shorthand.insert(prop.span.start);
        }
        oxc_ast_visit::walk::walk_object_property(self, prop);
    }

    fn visit_binding_property(&mut self, prop: &BindingProperty<'a>) {
        if prop.shorthand {
            self.shorthand.insert(prop.span.start);
        }
        oxc_ast_visit::walk::walk_binding_property(self, prop);
    }

    fn visit_assignment_target_property_identifier(
        &mut self,
        prop: &AssignmentTargetPropertyIdentifier<'a>,
    ) {
        self.shorthand.insert(prop.binding.span.start);
        oxc_ast_visit::walk::walk_assignment_target_property_identifier(self, prop);
    }

    fn visit_import_specifier(&mut self, specifier: &ImportSpecifier<'a>) {
        if self.scope.declares_legacy(&specifier.local) && specifier.imported.name() == specifier.local.name {
            // import { wx } -> import { wx as Taro }
            self.rewrites
                .replace(specifier.span, format!("{} as {}", self.legacy, self.target));
            return;
        }
        oxc_ast_visit::walk::walk_import_specifier(self, specifier);
    }

    fn visit_export_specifier(&mut self, specifier: &ExportSpecifier<'a>) {
        if let ModuleExportName::IdentifierReference(local) = &specifier.local {
            if self.scope.resolves_to_legacy(local) && specifier.exported.name() == local.name {
                // export { wx } -> export { Taro as wx }
                self.rewrites
                    .replace(specifier.span, format!("{} as {}", self.target, self.legacy));
                return;
            }
        }
        oxc_ast_visit::walk::walk_export_specifier(self, specifier);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        match &call.callee {
            Expression::Identifier(ident) if self.is_app_global(ident) => {
                self.rewrites
                    .replace(ident.span, format!("{}.{}", self.target, ident.name));
            }
            Expression::StaticMemberExpression(member) => self.rewrite_namespace_object(&member.object),
            Expression::ComputedMemberExpression(member) => {
                self.rewrite_namespace_object(&member.object)
            }
            _ => {}
        }
        oxc_ast_visit::walk::walk_call_expression(self, call);
    }
}

/// Every namespace edit for `program`.
pub fn collect_rewrites(program: &Program<'_>, opts: &TransformOptions) -> Rewrites {
    let scope = NamespaceScope::build(program, &opts.legacy_namespace);
    let mut rewriter = NamespaceRewriter::new(&scope, opts);
    rewriter.visit_program(program);
    rewriter.rewrites
}
