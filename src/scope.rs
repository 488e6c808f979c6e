//! Scoped symbol table for the legacy namespace identifier.
//!
//! Semantic analysis resolves every identifier reference to the symbol it
//! binds to. A declaration named after the legacy namespace (`const wx = ...`,
//! a `wx` parameter, `import { wx }`) is recorded here together with every
//! reference that resolves to it. References with no symbol are globals.

use log::debug;
use oxc_ast::ast::{BindingIdentifier, IdentifierReference, Program};
use oxc_semantic::{Scoping, SemanticBuilder, SymbolId};
use std::collections::HashSet;

pub struct NamespaceScope {
    scoping: Scoping,
    legacy_symbols: HashSet<SymbolId>,
}

impl NamespaceScope {
    pub fn build(program: &Program<'_>, legacy_namespace: &str) -> Self {
        let ret = SemanticBuilder::new().build(program);
        if !ret.errors.is_empty() {
            debug!(
                "semantic analysis reported {} issue(s); continuing with resolved bindings",
                ret.errors.len()
            );
        }
        let scoping = ret.semantic.into_scoping();

        let legacy_symbols = scoping
            .symbol_ids()
            .filter(|&id| scoping.symbol_name(id) == legacy_namespace)
            .collect();

        Self {
            scoping,
            legacy_symbols,
        }
    }

    pub fn declares_legacy(&self, ident: &BindingIdentifier<'_>) -> bool {
        ident
            .symbol_id
            .get()
            .is_some_and(|id| self.legacy_symbols.contains(&id))
    }

    pub fn resolves_to_legacy(&self, ident: &IdentifierReference<'_>) -> bool {
        self.symbol_of(ident)
            .is_some_and(|id| self.legacy_symbols.contains(&id))
    }

    /// A reference that no scope declares.
    pub fn is_global(&self, ident: &IdentifierReference<'_>) -> bool {
        self.symbol_of(ident).is_none()
    }

    fn symbol_of(&self, ident: &IdentifierReference<'_>) -> Option<SymbolId> {
        let reference_id = ident.reference_id.get()?;
        self.scoping.get_reference(reference_id).symbol_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_ast_visit::Visit;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    #[derive(Default)]
    struct References {
        declarations: Vec<u32>,
        legacy: Vec<u32>,
        globals: Vec<String>,
    }

    struct Collector<'s> {
        scope: &'s NamespaceScope,
        out: References,
    }

    impl<'a> Visit<'a> for Collector<'_> {
        fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
            if self.scope.declares_legacy(ident) {
                self.out.declarations.push(ident.span.start);
            }
        }

        fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
            if self.scope.resolves_to_legacy(ident) {
                self.out.legacy.push(ident.span.start);
            } else if self.scope.is_global(ident) {
                self.out.globals.push(ident.name.to_string());
            }
        }
    }

    fn analyze(source: &str) -> References {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
        assert!(ret.errors.is_empty(), "parse errors: {:?}", ret.errors);
        let scope = NamespaceScope::build(&ret.program, "wx");
        let mut collector = Collector {
            scope: &scope,
            out: References::default(),
        };
        collector.visit_program(&ret.program);
        collector.out
    }

    #[test]
    fn test_global_namespace_is_not_bound() {
        let refs = analyze("wx.request({}); getApp();");
        assert!(refs.declarations.is_empty());
        assert!(refs.legacy.is_empty());
        assert_eq!(refs.globals, vec!["wx", "getApp"]);
    }

    #[test]
    fn test_declared_namespace_resolves_in_nested_scopes() {
        let source = "const wx = require('x');\nfunction f() { return wx.a + wx.b; }";
        let refs = analyze(source);
        assert_eq!(refs.declarations, vec![6]);
        assert_eq!(refs.legacy.len(), 2);
    }

    #[test]
    fn test_each_binding_is_tracked_separately() {
        let source = "function a(wx) { wx.x(); }\nfunction b() { { let wx = 1; wx; } }";
        let refs = analyze(source);
        assert_eq!(refs.declarations.len(), 2);
        assert_eq!(refs.legacy.len(), 2);
    }
}
