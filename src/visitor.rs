use crate::ast::{AttrValue, Expr, FunctionBody, Stmt, UiChild, UiElement};
use crate::error::Result;
use std::collections::BTreeSet;

// ═══════════════════════════════════════════════════════════════════════════════
// FOLD (OWNING REWRITE)
// ═══════════════════════════════════════════════════════════════════════════════

/// Owning traversal over the UI tree.
///
/// Rules:
/// 1. Each step consumes its node and returns the replacement; `fold_child`
///    may return zero, one or several nodes.
/// 2. The parent's child list is rebuilt from the returned nodes, so no
///    node is removed or replaced while its siblings are being walked.
/// 3. Implementers call the `walk_*` functions to descend.
pub trait UiFold {
    fn fold_element(&mut self, element: UiElement) -> Result<UiElement> {
        walk_element(self, element)
    }

    fn fold_children(&mut self, children: Vec<UiChild>) -> Result<Vec<UiChild>> {
        walk_children(self, children)
    }

    fn fold_child(&mut self, child: UiChild) -> Result<Vec<UiChild>> {
        walk_child(self, child)
    }
}

pub fn walk_element<F: UiFold + ?Sized>(folder: &mut F, mut element: UiElement) -> Result<UiElement> {
    element.children = folder.fold_children(std::mem::take(&mut element.children))?;
    Ok(element)
}

pub fn walk_children<F: UiFold + ?Sized>(
    folder: &mut F,
    children: Vec<UiChild>,
) -> Result<Vec<UiChild>> {
    let mut rebuilt = Vec::with_capacity(children.len());
    for child in children {
        rebuilt.extend(folder.fold_child(child)?);
    }
    Ok(rebuilt)
}

pub fn walk_child<F: UiFold + ?Sized>(folder: &mut F, child: UiChild) -> Result<Vec<UiChild>> {
    match child {
        UiChild::Element(element) => Ok(vec![UiChild::Element(folder.fold_element(element)?)]),
        UiChild::Text(_) | UiChild::Expression(_) => Ok(vec![child]),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VISIT (READ-ONLY)
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-only traversal that also reaches elements nested inside
/// expressions (conditional branches, loop callbacks).
pub trait UiVisitor {
    fn visit_element(&mut self, element: &UiElement) {
        walk_element_ref(self, element);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_text(&mut self, _text: &str) {}
}

pub fn walk_element_ref<V: UiVisitor + ?Sized>(visitor: &mut V, element: &UiElement) {
    for attr in &element.attributes {
        if let Some(AttrValue::Expression(expr)) = &attr.value {
            visitor.visit_expr(expr);
        }
    }
    for child in &element.children {
        match child {
            UiChild::Element(el) => visitor.visit_element(el),
            UiChild::Text(text) => visitor.visit_text(text),
            UiChild::Expression(expr) => visitor.visit_expr(expr),
        }
    }
}

pub fn walk_expr<V: UiVisitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Raw(_) | Expr::Identifier(_) | Expr::StringLiteral(_) | Expr::Null | Expr::Json(_) => {}
        Expr::Concat(parts) => parts.iter().for_each(|part| visitor.visit_expr(part)),
        Expr::And { left, right } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            visitor.visit_expr(test);
            visitor.visit_expr(consequent);
            visitor.visit_expr(alternate);
        }
        Expr::Member { object, .. } => visitor.visit_expr(object),
        Expr::Call { callee, arguments } => {
            visitor.visit_expr(callee);
            arguments.iter().for_each(|arg| visitor.visit_expr(arg));
        }
        Expr::Arrow(arrow) => walk_function_body(visitor, &arrow.body),
        Expr::Element(element) => visitor.visit_element(element),
    }
}

pub fn walk_function_body<V: UiVisitor + ?Sized>(visitor: &mut V, body: &FunctionBody) {
    match body {
        FunctionBody::Statements(stmts) => {
            for stmt in stmts {
                match stmt {
                    Stmt::Return { argument } => visitor.visit_expr(argument),
                    Stmt::DestructureConst { init, .. } => visitor.visit_expr(init),
                }
            }
        }
        FunctionBody::Expression(expr) => visitor.visit_expr(expr),
        FunctionBody::Raw(_) => {}
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TAG COLLECTION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct TagCollector {
    tags: BTreeSet<String>,
}

impl UiVisitor for TagCollector {
    fn visit_element(&mut self, element: &UiElement) {
        self.tags.insert(element.tag_name.clone());
        walk_element_ref(self, element);
    }
}

/// Every tag name in the tree, including those inside conditionals and loops.
pub fn collect_tags(root: &UiElement) -> BTreeSet<String> {
    let mut collector = TagCollector::default();
    collector.visit_element(root);
    collector.tags
}
