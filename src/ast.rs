//! Output syntax tree.
//!
//! Generated structure (UI elements, conditionals, loops, classes, imports)
//! is modelled node by node. Code carried over from the input script or from
//! a `{{ }}` span is held as `Raw` source text that the printer emits
//! verbatim.

use serde::Serialize;

// ═══════════════════════════════════════════════════════════════════════════════
// UI ELEMENT TREE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiElement {
    pub tag_name: String,
    pub attributes: Vec<UiAttribute>,
    pub children: Vec<UiChild>,
    /// Markup line of the start tag; `None` for generated elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiAttribute {
    pub key: String,
    pub value: Option<AttrValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum AttrValue {
    Literal(String),
    Expression(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum UiChild {
    Element(UiElement),
    Text(String),
    Expression(Expr),
}

impl UiElement {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            line: None,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&UiAttribute> {
        self.attributes.iter().find(|attr| attr.key == key)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attribute(key).is_some()
    }

    /// Removes the first attribute named `key`, keeping the order of the rest.
    pub fn take_attribute(&mut self, key: &str) -> Option<UiAttribute> {
        let index = self.attributes.iter().position(|attr| attr.key == key)?;
        Some(self.attributes.remove(index))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSIONS AND STATEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Expr {
    /// Expression source text taken from the input.
    Raw(String),
    Identifier(String),
    StringLiteral(String),
    Null,
    /// `a + b + c`, string concatenation from an interpolation.
    Concat(Vec<Expr>),
    /// `left && right`
    And { left: Box<Expr>, right: Box<Expr> },
    /// `test ? consequent : alternate`
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Member { object: Box<Expr>, property: String },
    Call { callee: Box<Expr>, arguments: Vec<Expr> },
    Arrow(Box<ArrowFunction>),
    Element(Box<UiElement>),
    /// JSON-like object tree (page configuration).
    Json(serde_json::Value),
}

impl Expr {
    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn conditional(test: Expr, consequent: Expr, alternate: Expr) -> Self {
        Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }
    }

    pub fn member(object: Expr, property: impl Into<String>) -> Self {
        Expr::Member {
            object: Box::new(object),
            property: property.into(),
        }
    }

    pub fn call(callee: Expr, arguments: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            arguments,
        }
    }

    pub fn element(element: UiElement) -> Self {
        Expr::Element(Box::new(element))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowFunction {
    pub is_async: bool,
    /// Parameter list source without the surrounding parentheses.
    pub params: String,
    pub return_type: Option<String>,
    pub body: FunctionBody,
}

impl ArrowFunction {
    /// `(params) => { return argument; }`
    pub fn returning(params: impl Into<String>, argument: Expr) -> Self {
        Self {
            is_async: false,
            params: params.into(),
            return_type: None,
            body: FunctionBody::Statements(vec![Stmt::Return { argument }]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum FunctionBody {
    /// Generated statements.
    Statements(Vec<Stmt>),
    /// Block source including its braces.
    Raw(String),
    /// Concise arrow body.
    Expression(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Stmt {
    Return { argument: Expr },
    /// `const { a, b } = <init>;`
    DestructureConst { keys: Vec<String>, init: Expr },
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASSES AND MODULES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Method,
    Get,
    Set,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClassMember {
    Property {
        name: String,
        value: Expr,
    },
    Method {
        name: String,
        kind: MethodKind,
        is_async: bool,
        is_generator: bool,
        params: String,
        return_type: Option<String>,
        body: FunctionBody,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDeclaration {
    pub name: String,
    pub super_class: Option<Expr>,
    pub decorators: Vec<Expr>,
    pub body: Vec<ClassMember>,
}

impl ClassDeclaration {
    pub fn member(&self, name: &str) -> Option<&ClassMember> {
        self.body.iter().find(|member| match member {
            ClassMember::Property { name: n, .. } | ClassMember::Method { name: n, .. } => n == name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDeclaration {
    pub source: String,
    pub default: Option<String>,
    pub named: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ModuleItem {
    Import(ImportDeclaration),
    ExportDefaultClass(ClassDeclaration),
    /// Script source kept as written (namespace rewrites applied).
    Verbatim { code: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Module {
    pub items: Vec<ModuleItem>,
}

impl Module {
    pub fn imports(&self) -> impl Iterator<Item = &ImportDeclaration> {
        self.items.iter().filter_map(|item| match item {
            ModuleItem::Import(import) => Some(import),
            _ => None,
        })
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDeclaration> {
        self.items.iter().filter_map(|item| match item {
            ModuleItem::ExportDefaultClass(class) => Some(class),
            _ => None,
        })
    }
}
