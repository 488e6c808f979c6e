//! Template AST Builder
//!
//! Turns the parsed markup tree into the UI element tree: PascalCase tags,
//! normalized attribute keys, and `{{ }}` values built into expressions.
//! Control-flow directives are left in place for the control-flow pass.

use crate::ast::{AttrValue, Expr, UiAttribute, UiChild, UiElement};
use crate::case::{camel_case, pascal_tag};
use crate::control_flow::ControlFlowRewriter;
use crate::error::Result;
use crate::interpolation::{parse_content, Content};
use crate::markup::{parse_markup, Attribute, MarkupElement, MarkupNode};
use crate::options::TransformOptions;
use crate::visitor::{collect_tags, UiFold};
use std::collections::BTreeSet;

/// Tag of the element wrapping every top-level node.
pub const ROOT_TAG: &str = "block";

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateOutput {
    /// The render value: a `Block` element holding the page's nodes.
    pub root: Expr,
    /// Known component names appearing in `root`.
    pub used_components: BTreeSet<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Markup text to render value.
pub fn parse_wxml(markup: &str, opts: &TransformOptions) -> Result<TemplateOutput> {
    let nodes: Vec<MarkupNode> = parse_markup(markup)
        .into_iter()
        .filter(MarkupNode::is_significant)
        .collect();

    let root = build_element(&MarkupElement {
        tag_name: ROOT_TAG.to_string(),
        attributes: Vec::new(),
        children: nodes,
        line: 1,
    })?;

    let root = ControlFlowRewriter::new(opts).fold_element(root)?;

    let used_components = collect_tags(&root)
        .into_iter()
        .filter(|tag| opts.is_known_component(tag))
        .collect();

    Ok(TemplateOutput {
        root: Expr::element(root),
        used_components,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE BUILDING
// ═══════════════════════════════════════════════════════════════════════════════

fn build_node(node: &MarkupNode) -> Result<Option<UiChild>> {
    match node {
        MarkupNode::Element(element) => Ok(Some(UiChild::Element(build_element(element)?))),
        MarkupNode::Text(content) => build_text(content).map(Some),
        MarkupNode::Comment(_) => Ok(None),
    }
}

pub fn build_element(element: &MarkupElement) -> Result<UiElement> {
    let attributes = element
        .attributes
        .iter()
        .map(build_attribute)
        .collect::<Result<Vec<_>>>()?;

    let mut children = Vec::with_capacity(element.children.len());
    for child in element.children.iter().filter(|c| c.is_significant()) {
        if let Some(built) = build_node(child)? {
            children.push(built);
        }
    }

    Ok(UiElement {
        tag_name: pascal_tag(&element.tag_name),
        attributes,
        children,
        line: u32::try_from(element.line).ok(),
    })
}

fn build_text(content: &str) -> Result<UiChild> {
    match parse_content(content) {
        Content::Raw(text) => Ok(UiChild::Text(text)),
        Content::Expression(interp) => Ok(UiChild::Expression(interp.into_expression()?)),
    }
}

fn build_attribute(attr: &Attribute) -> Result<UiAttribute> {
    let value = match &attr.value {
        None => None,
        Some(raw) => Some(match parse_content(raw) {
            Content::Raw(text) => AttrValue::Literal(text),
            Content::Expression(interp) => AttrValue::Expression(interp.into_expression()?),
        }),
    };
    Ok(UiAttribute {
        key: normalize_attribute_key(&attr.key),
        value,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// ATTRIBUTE KEYS
// ═══════════════════════════════════════════════════════════════════════════════

/// `class` -> `className`, `bindtap` -> `onTap`, `catch:touchmove` ->
/// `onTouchmove`, `hover-class` -> `hoverClass`. Directive keys (`wx:` and
/// `wx-`) are returned unchanged.
pub fn normalize_attribute_key(key: &str) -> String {
    if key.starts_with("wx:") || key.starts_with("wx-") {
        return key.to_string();
    }

    let camel = camel_case(key);
    if camel == "class" {
        return "className".to_string();
    }

    let renamed = match camel.strip_prefix("bind").or_else(|| camel.strip_prefix("catch")) {
        Some(event) => format!("on{}", event),
        None => camel,
    };

    let mut chars = renamed.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('o'), Some('n'), Some(third)) => {
            let rest: String = renamed.chars().skip(3).collect();
            format!("on{}{}", third.to_uppercase(), rest)
        }
        _ => renamed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_attribute_key() {
        assert_eq!(normalize_attribute_key("class"), "className");
        assert_eq!(normalize_attribute_key("bindtap"), "onTap");
        assert_eq!(normalize_attribute_key("bind:tap"), "onTap");
        assert_eq!(normalize_attribute_key("catchtouchmove"), "onTouchmove");
        assert_eq!(normalize_attribute_key("catch:longpress"), "onLongpress");
        assert_eq!(normalize_attribute_key("hover-class"), "hoverClass");
        assert_eq!(normalize_attribute_key("data-id"), "dataId");
        assert_eq!(normalize_attribute_key("src"), "src");
        assert_eq!(normalize_attribute_key("on"), "on");
    }

    #[test]
    fn test_directive_keys_pass_through() {
        assert_eq!(normalize_attribute_key("wx:if"), "wx:if");
        assert_eq!(normalize_attribute_key("wx:for-item"), "wx:for-item");
        assert_eq!(normalize_attribute_key("wx-for"), "wx-for");
    }

    #[test]
    fn test_build_element_drops_comments_and_blank_text() {
        let nodes = parse_markup("<view>\n  <!-- c -->\n  <text>a</text>\n</view>");
        let MarkupNode::Element(view) = &nodes[0] else {
            panic!("expected element");
        };
        let built = build_element(view).unwrap();
        assert_eq!(built.tag_name, "View");
        assert_eq!(built.children.len(), 1);
        let UiChild::Element(text) = &built.children[0] else {
            panic!("expected element child");
        };
        assert_eq!(text.tag_name, "Text");
        assert_eq!(text.children, vec![UiChild::Text("a".into())]);
    }

    #[test]
    fn test_build_attribute_values() {
        let nodes = parse_markup("<view class=\"a {{b}}\" id=\"x\" hidden bindtap=\"go\"></view>");
        let MarkupNode::Element(view) = &nodes[0] else {
            panic!("expected element");
        };
        let built = build_element(view).unwrap();
        assert_eq!(built.attributes[0].key, "className");
        assert_eq!(
            built.attributes[0].value,
            Some(AttrValue::Expression(Expr::Concat(vec![
                Expr::StringLiteral("a ".into()),
                Expr::Raw("b".into()),
            ])))
        );
        assert_eq!(built.attributes[1].value, Some(AttrValue::Literal("x".into())));
        assert_eq!(built.attributes[2].value, None);
        assert_eq!(built.attributes[3].key, "onTap");
        assert_eq!(built.attributes[3].value, Some(AttrValue::Literal("go".into())));
    }

    #[test]
    fn test_text_interpolation_becomes_expression_child() {
        let nodes = parse_markup("<text>Hello {{name}}!</text>");
        let MarkupNode::Element(text) = &nodes[0] else {
            panic!("expected element");
        };
        let built = build_element(text).unwrap();
        assert_eq!(
            built.children,
            vec![UiChild::Expression(Expr::Concat(vec![
                Expr::StringLiteral("Hello ".into()),
                Expr::Raw("name".into()),
                Expr::StringLiteral("!".into()),
            ]))]
        );
    }
}
