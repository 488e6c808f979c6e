//! Control-Flow Rewriter
//!
//! Rewrites `wx:if`/`wx:elif`/`wx:else` sibling runs into nested conditional
//! expressions and `wx:for` elements into a call on the collection.
//!
//! Chains are found by a forward scan over the already-built sibling list:
//! the chain starts at a `wx:if` element and takes each immediately
//! following element that carries `wx:elif` or `wx:else`. A `wx:else` or the
//! first sibling without either directive ends the chain; that sibling is
//! left for the scan to process normally.
//! An element carrying both `wx:for` and `wx:if` is looped first; its
//! condition is applied to each item inside the callback.

use log::{debug, warn};

use crate::ast::{ArrowFunction, AttrValue, Expr, UiChild, UiElement};
use crate::error::{Result, TransformError};
use crate::options::TransformOptions;
use crate::template::normalize_attribute_key;
use crate::visitor::{walk_children, UiFold};

pub const WX_IF: &str = "wx:if";
pub const WX_ELSE_IF: &str = "wx:elif";
pub const WX_ELSE: &str = "wx:else";
pub const WX_FOR: &str = "wx:for";
pub const WX_FOR_ITEM: &str = "wx:for-item";
pub const WX_FOR_INDEX: &str = "wx:for-index";
pub const WX_KEY: &str = "wx:key";

const DEFAULT_ITEM: &str = "item";
const DEFAULT_INDEX: &str = "index";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    If,
    Elif,
    Else,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub kind: ConditionKind,
    /// Absent only for `Else`.
    pub tester: Option<Expr>,
    pub target: UiElement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopDirective {
    pub collection: Expr,
    pub item_name: String,
    pub index_name: String,
}

pub struct ControlFlowRewriter<'o> {
    opts: &'o TransformOptions,
}

impl<'o> ControlFlowRewriter<'o> {
    pub fn new(opts: &'o TransformOptions) -> Self {
        Self { opts }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SIBLING SCAN
    // ═══════════════════════════════════════════════════════════════════════════

    fn rewrite_siblings(&self, children: Vec<UiChild>) -> Result<Vec<UiChild>> {
        let mut rewritten = Vec::with_capacity(children.len());
        let mut siblings = children.into_iter().peekable();

        while let Some(child) = siblings.next() {
            let mut element = match child {
                UiChild::Element(element) => element,
                other => {
                    rewritten.push(other);
                    continue;
                }
            };

            if element.has_attribute(WX_FOR) {
                rewritten.push(UiChild::Expression(self.rewrite_loop(element)?));
                continue;
            }

            if let Some(tester) = take_tester(&mut element, WX_IF)? {
                let mut chain = vec![Condition {
                    kind: ConditionKind::If,
                    tester: Some(tester),
                    target: element,
                }];
                while chain.last().is_some_and(|branch| branch.kind != ConditionKind::Else) {
                    let Some(UiChild::Element(next)) =
                        siblings.next_if(|c| matches!(c, UiChild::Element(el) if is_chain_branch(el)))
                    else {
                        break;
                    };
                    chain.push(take_branch(next)?);
                }
                rewritten.push(UiChild::Expression(handle_conditions(chain)?));
                continue;
            }

            if let Some(kind) = branch_kind(&element) {
                warn!(
                    "<{}> carries {:?} without a preceding wx:if; left unchanged",
                    element.tag_name, kind
                );
            }
            rewritten.push(UiChild::Element(element));
        }

        Ok(rewritten)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LOOPS
    // ═══════════════════════════════════════════════════════════════════════════

    fn take_loop(&self, element: &mut UiElement) -> Result<LoopDirective> {
        let tag = element.tag_name.clone();
        let collection = match element.take_attribute(WX_FOR).and_then(|attr| attr.value) {
            Some(AttrValue::Expression(expr)) => expr,
            _ => {
                return Err(TransformError::directive(
                    WX_FOR,
                    &tag,
                    element.line,
                    "the value must be wrapped in \"{{}}\"",
                ))
            }
        };

        let item_name = take_binding_name(element, WX_FOR_ITEM)?.unwrap_or_else(|| DEFAULT_ITEM.to_string());
        let index_name =
            take_binding_name(element, WX_FOR_INDEX)?.unwrap_or_else(|| DEFAULT_INDEX.to_string());

        let key_name = if self.opts.normalize_key_attribute {
            normalize_attribute_key(&self.opts.key_attribute)
        } else {
            self.opts.key_attribute.clone()
        };
        for attr in element.attributes.iter_mut().filter(|attr| attr.key == WX_KEY) {
            debug!("<{}> {} renamed to {}", tag, WX_KEY, key_name);
            attr.key = key_name.clone();
        }

        Ok(LoopDirective {
            collection,
            item_name,
            index_name,
        })
    }

    fn rewrite_loop(&self, mut element: UiElement) -> Result<Expr> {
        let directive = self.take_loop(&mut element)?;
        if let Some(kind) = branch_kind(&element) {
            warn!(
                "<{}> carries {:?} on a wx:for element; left as an attribute",
                element.tag_name, kind
            );
        }

        let body = match take_tester(&mut element, WX_IF)? {
            Some(tester) => Expr::and(tester, Expr::element(element)),
            None => Expr::element(element),
        };

        let callback = Expr::Arrow(Box::new(ArrowFunction::returning(
            format!("{}, {}", directive.item_name, directive.index_name),
            body,
        )));

        let callee = match &self.opts.loop_method {
            Some(method) => Expr::member(directive.collection, method.clone()),
            None => directive.collection,
        };
        Ok(Expr::call(callee, vec![callback]))
    }
}

impl UiFold for ControlFlowRewriter<'_> {
    fn fold_children(&mut self, children: Vec<UiChild>) -> Result<Vec<UiChild>> {
        let children = walk_children(self, children)?;
        self.rewrite_siblings(children)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONDITIONALS
// ═══════════════════════════════════════════════════════════════════════════════

/// Collapses a chain into one expression.
///
/// A single `if` becomes `tester && element`. Longer chains are folded from
/// the right: the last branch is `tester && element` for `elif` or the bare
/// element for `else`, and each earlier branch wraps it as
/// `tester ? element : rest`. Only the last branch may be an `else`.
pub fn handle_conditions(mut chain: Vec<Condition>) -> Result<Expr> {
    let Some(last) = chain.pop() else {
        return Ok(Expr::Null);
    };

    let base = match (last.kind, last.tester) {
        (ConditionKind::Else, _) => Expr::element(last.target),
        (_, Some(tester)) => Expr::and(tester, Expr::element(last.target)),
        (kind, None) => return Err(missing_tester(kind, &last.target)),
    };

    chain.into_iter().rev().try_fold(base, |alternate, condition| {
        match (condition.kind, condition.tester) {
            (ConditionKind::Else, _) => Err(TransformError::directive(
                WX_ELSE,
                &condition.target.tag_name,
                condition.target.line,
                "only the last branch of a chain may be wx:else",
            )),
            (_, Some(test)) => Ok(Expr::conditional(test, Expr::element(condition.target), alternate)),
            (kind, None) => Err(missing_tester(kind, &condition.target)),
        }
    })
}

fn missing_tester(kind: ConditionKind, target: &UiElement) -> TransformError {
    let directive = if kind == ConditionKind::If { WX_IF } else { WX_ELSE_IF };
    TransformError::directive(directive, &target.tag_name, target.line, "a condition value is required")
}

/// `wx:elif`/`wx:else` carried by `element`. A `wx:if` met first means the
/// element opens a new chain.
fn branch_kind(element: &UiElement) -> Option<ConditionKind> {
    for attr in &element.attributes {
        match attr.key.as_str() {
            WX_IF => return None,
            WX_ELSE_IF => return Some(ConditionKind::Elif),
            WX_ELSE => return Some(ConditionKind::Else),
            _ => {}
        }
    }
    None
}

/// Loop elements never continue a chain.
fn is_chain_branch(element: &UiElement) -> bool {
    !element.has_attribute(WX_FOR) && branch_kind(element).is_some()
}

fn take_branch(mut element: UiElement) -> Result<Condition> {
    let kind = branch_kind(&element).unwrap_or(ConditionKind::Else);
    let tester = match kind {
        ConditionKind::Elif => take_tester(&mut element, WX_ELSE_IF)?,
        _ => {
            element.take_attribute(WX_ELSE);
            None
        }
    };
    Ok(Condition {
        kind,
        tester,
        target: element,
    })
}

/// Removes `directive` and returns its condition. `{{}}` values give their
/// expression, plain text is kept as a string literal.
fn take_tester(element: &mut UiElement, directive: &str) -> Result<Option<Expr>> {
    let Some(attr) = element.take_attribute(directive) else {
        return Ok(None);
    };
    match attr.value {
        Some(AttrValue::Expression(expr)) => Ok(Some(expr)),
        Some(AttrValue::Literal(text)) => Ok(Some(Expr::StringLiteral(text))),
        None => Err(TransformError::directive(
            directive,
            &element.tag_name,
            element.line,
            "a condition value is required",
        )),
    }
}

fn take_binding_name(element: &mut UiElement, directive: &str) -> Result<Option<String>> {
    let Some(attr) = element.take_attribute(directive) else {
        return Ok(None);
    };
    match attr.value {
        Some(AttrValue::Literal(name)) => Ok(Some(name)),
        _ => Err(TransformError::directive(
            directive,
            &element.tag_name,
            element.line,
            "the value must be a plain string",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FunctionBody, Stmt, UiAttribute};

    fn el(tag: &str, attrs: &[(&str, Option<AttrValue>)]) -> UiElement {
        let mut element = UiElement::new(tag);
        for (key, value) in attrs {
            element.attributes.push(UiAttribute {
                key: key.to_string(),
                value: value.clone(),
            });
        }
        element
    }

    fn expr(code: &str) -> Option<AttrValue> {
        Some(AttrValue::Expression(Expr::Raw(code.into())))
    }

    fn lit(text: &str) -> Option<AttrValue> {
        Some(AttrValue::Literal(text.into()))
    }

    fn rewrite(children: Vec<UiChild>) -> Result<Vec<UiChild>> {
        let opts = TransformOptions::default();
        let mut root = UiElement::new("Block");
        root.children = children;
        Ok(ControlFlowRewriter::new(&opts).fold_element(root)?.children)
    }

    #[test]
    fn test_single_if() {
        let out = rewrite(vec![UiChild::Element(el("View", &[(WX_IF, expr("cond"))]))]).unwrap();
        assert_eq!(
            out,
            vec![UiChild::Expression(Expr::and(
                Expr::Raw("cond".into()),
                Expr::element(UiElement::new("View"))
            ))]
        );
    }

    #[test]
    fn test_if_elif_else_chain() {
        let out = rewrite(vec![
            UiChild::Element(el("A", &[(WX_IF, expr("a"))])),
            UiChild::Element(el("B", &[(WX_ELSE_IF, expr("b"))])),
            UiChild::Element(el("C", &[(WX_ELSE, None)])),
        ])
        .unwrap();
        assert_eq!(
            out,
            vec![UiChild::Expression(Expr::conditional(
                Expr::Raw("a".into()),
                Expr::element(UiElement::new("A")),
                Expr::conditional(
                    Expr::Raw("b".into()),
                    Expr::element(UiElement::new("B")),
                    Expr::element(UiElement::new("C")),
                ),
            ))]
        );
    }

    #[test]
    fn test_if_elif_without_else() {
        let out = rewrite(vec![
            UiChild::Element(el("A", &[(WX_IF, expr("a"))])),
            UiChild::Element(el("B", &[(WX_ELSE_IF, expr("b"))])),
        ])
        .unwrap();
        assert_eq!(
            out,
            vec![UiChild::Expression(Expr::conditional(
                Expr::Raw("a".into()),
                Expr::element(UiElement::new("A")),
                Expr::and(Expr::Raw("b".into()), Expr::element(UiElement::new("B"))),
            ))]
        );
    }

    #[test]
    fn test_gap_ends_chain() {
        let out = rewrite(vec![
            UiChild::Element(el("A", &[(WX_IF, expr("a"))])),
            UiChild::Element(el("Gap", &[])),
            UiChild::Element(el("C", &[(WX_ELSE, None)])),
        ])
        .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(
            out[0],
            UiChild::Expression(Expr::and(Expr::Raw("a".into()), Expr::element(UiElement::new("A"))))
        );
        assert_eq!(out[1], UiChild::Element(UiElement::new("Gap")));
        // The orphan else is not linked across the gap.
        assert_eq!(out[2], UiChild::Element(el("C", &[(WX_ELSE, None)])));
    }

    #[test]
    fn test_text_sibling_ends_chain() {
        let out = rewrite(vec![
            UiChild::Element(el("A", &[(WX_IF, expr("a"))])),
            UiChild::Text("between".into()),
            UiChild::Element(el("B", &[(WX_ELSE, None)])),
        ])
        .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[1], UiChild::Text("between".into()));
    }

    #[test]
    fn test_second_if_starts_new_chain() {
        let out = rewrite(vec![
            UiChild::Element(el("A", &[(WX_IF, expr("a"))])),
            UiChild::Element(el("B", &[(WX_IF, expr("b"))])),
            UiChild::Element(el("C", &[(WX_ELSE, None)])),
        ])
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[1],
            UiChild::Expression(Expr::conditional(
                Expr::Raw("b".into()),
                Expr::element(UiElement::new("B")),
                Expr::element(UiElement::new("C")),
            ))
        );
    }

    #[test]
    fn test_loop_defaults() {
        let out = rewrite(vec![UiChild::Element(el(
            "View",
            &[(WX_FOR, expr("list")), ("className", lit("row"))],
        ))])
        .unwrap();
        let expected_element = el("View", &[("className", lit("row"))]);
        assert_eq!(
            out,
            vec![UiChild::Expression(Expr::call(
                Expr::Raw("list".into()),
                vec![Expr::Arrow(Box::new(ArrowFunction::returning(
                    "item, index",
                    Expr::element(expected_element),
                )))],
            ))]
        );
    }

    #[test]
    fn test_loop_item_index_and_key() {
        let out = rewrite(vec![UiChild::Element(el(
            "View",
            &[
                (WX_FOR, expr("list")),
                (WX_FOR_ITEM, lit("it")),
                (WX_FOR_INDEX, lit("i")),
                (WX_KEY, lit("id")),
            ],
        ))])
        .unwrap();
        let UiChild::Expression(Expr::Call { arguments, .. }) = &out[0] else {
            panic!("expected call");
        };
        let Expr::Arrow(arrow) = &arguments[0] else {
            panic!("expected arrow");
        };
        assert_eq!(arrow.params, "it, i");
        let FunctionBody::Statements(stmts) = &arrow.body else {
            panic!("expected statements");
        };
        let Stmt::Return {
            argument: Expr::Element(element),
        } = &stmts[0]
        else {
            panic!("expected returned element");
        };
        assert_eq!(element.attributes, vec![UiAttribute { key: "key".into(), value: lit("id") }]);
    }

    #[test]
    fn test_loop_method_option() {
        let opts = TransformOptions {
            loop_method: Some("map".into()),
            ..TransformOptions::default()
        };
        let mut root = UiElement::new("Block");
        root.children.push(UiChild::Element(el("View", &[(WX_FOR, expr("list"))])));
        let out = ControlFlowRewriter::new(&opts).fold_element(root).unwrap();
        let UiChild::Expression(Expr::Call { callee, .. }) = &out.children[0] else {
            panic!("expected call");
        };
        assert_eq!(**callee, Expr::member(Expr::Raw("list".into()), "map"));
    }

    #[test]
    fn test_loop_requires_expression() {
        let err = rewrite(vec![UiChild::Element(el("View", &[(WX_FOR, lit("list"))]))]).unwrap_err();
        assert!(matches!(err, TransformError::DirectiveValue { ref directive, .. } if directive == WX_FOR));
    }

    #[test]
    fn test_loop_item_must_be_literal() {
        let err = rewrite(vec![UiChild::Element(el(
            "View",
            &[(WX_FOR, expr("list")), (WX_FOR_ITEM, expr("it"))],
        ))])
        .unwrap_err();
        assert!(matches!(err, TransformError::DirectiveValue { ref directive, .. } if directive == WX_FOR_ITEM));
    }

    #[test]
    fn test_loop_with_condition_applies_per_item() {
        let out = rewrite(vec![UiChild::Element(el(
            "View",
            &[(WX_IF, expr("item.show")), (WX_FOR, expr("list"))],
        ))])
        .unwrap();
        let UiChild::Expression(Expr::Call { arguments, .. }) = &out[0] else {
            panic!("expected call");
        };
        let Expr::Arrow(arrow) = &arguments[0] else {
            panic!("expected arrow");
        };
        assert_eq!(
            arrow.body,
            FunctionBody::Statements(vec![Stmt::Return {
                argument: Expr::and(Expr::Raw("item.show".into()), Expr::element(UiElement::new("View"))),
            }])
        );
    }

    #[test]
    fn test_loop_element_does_not_join_chain() {
        let out = rewrite(vec![
            UiChild::Element(el("A", &[(WX_IF, expr("a"))])),
            UiChild::Element(el("B", &[(WX_ELSE, None), (WX_FOR, expr("list"))])),
        ])
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0],
            UiChild::Expression(Expr::and(Expr::Raw("a".into()), Expr::element(UiElement::new("A"))))
        );
        let UiChild::Expression(Expr::Call { arguments, .. }) = &out[1] else {
            panic!("expected loop call");
        };
        let Expr::Arrow(arrow) = &arguments[0] else {
            panic!("expected arrow");
        };
        assert_eq!(
            arrow.body,
            FunctionBody::Statements(vec![Stmt::Return {
                argument: Expr::element(el("B", &[(WX_ELSE, None)])),
            }])
        );
    }

    #[test]
    fn test_nested_directives_are_rewritten() {
        let mut outer = el("View", &[]);
        outer.children.push(UiChild::Element(el("Text", &[(WX_IF, expr("a"))])));
        let out = rewrite(vec![UiChild::Element(outer)]).unwrap();
        let UiChild::Element(outer) = &out[0] else {
            panic!("expected element");
        };
        assert!(matches!(outer.children[0], UiChild::Expression(Expr::And { .. })));
    }

    #[test]
    fn test_literal_condition_is_string() {
        let out = rewrite(vec![UiChild::Element(el("View", &[(WX_IF, lit("yes"))]))]).unwrap();
        assert_eq!(
            out,
            vec![UiChild::Expression(Expr::and(
                Expr::StringLiteral("yes".into()),
                Expr::element(UiElement::new("View"))
            ))]
        );
    }

    #[test]
    fn test_missing_condition_is_rejected() {
        let err = rewrite(vec![UiChild::Element(el("View", &[(WX_IF, None)]))]).unwrap_err();
        assert_eq!(err.code(), "TZ-ERR-DIRECTIVE");
    }

    #[test]
    fn test_else_ends_chain() {
        let out = rewrite(vec![
            UiChild::Element(el("A", &[(WX_IF, expr("a"))])),
            UiChild::Element(el("B", &[(WX_ELSE, None)])),
            UiChild::Element(el("C", &[(WX_ELSE_IF, expr("c"))])),
        ])
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0],
            UiChild::Expression(Expr::conditional(
                Expr::Raw("a".into()),
                Expr::element(UiElement::new("A")),
                Expr::element(UiElement::new("B")),
            ))
        );
        assert_eq!(out[1], UiChild::Element(el("C", &[(WX_ELSE_IF, expr("c"))])));
    }

    #[test]
    fn test_else_before_last_branch_is_rejected() {
        let mut misplaced = UiElement::new("B");
        misplaced.line = Some(3);
        let chain = vec![
            Condition {
                kind: ConditionKind::If,
                tester: Some(Expr::Raw("a".into())),
                target: UiElement::new("A"),
            },
            Condition {
                kind: ConditionKind::Else,
                tester: None,
                target: misplaced,
            },
            Condition {
                kind: ConditionKind::Elif,
                tester: Some(Expr::Raw("c".into())),
                target: UiElement::new("C"),
            },
        ];
        let err = handle_conditions(chain).unwrap_err();
        match err {
            TransformError::DirectiveValue { directive, tag, line, .. } => {
                assert_eq!(directive, WX_ELSE);
                assert_eq!(tag, "B");
                assert_eq!(line, Some(3));
            }
            other => panic!("expected DirectiveValue, got {:?}", other),
        }
    }

    #[test]
    fn test_directive_errors_carry_element_line() {
        let mut element = el("View", &[(WX_FOR, lit("list"))]);
        element.line = Some(7);
        let err = rewrite(vec![UiChild::Element(element)]).unwrap_err();
        assert_eq!(err.markup_line(), Some(7));
    }
}
