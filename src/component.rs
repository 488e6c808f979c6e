//! Component Definition Extractor
//!
//! Reads the object literal passed to `Page`/`Component`/`App`, classifies
//! each property, and assembles the class declaration that replaces the
//! registration call.
//!
//! Property values are never re-generated: functions and plain values are
//! carried as source slices with the namespace rewrites applied.

use log::warn;
use oxc_ast::ast::{
    ArrowFunctionExpression, Expression, Function, FunctionBody as OxcFunctionBody,
    FormalParameters, ObjectExpression, ObjectProperty, ObjectPropertyKind, PropertyKey,
    PropertyKind, Statement, TSTypeAnnotation,
};
use oxc_span::{GetSpan, Span};
use serde::Serialize;
use serde_json::Value;

use crate::ast::{
    ArrowFunction, ClassDeclaration, ClassMember, Expr, FunctionBody, MethodKind, Stmt,
};
use crate::error::{Result, TransformError};
use crate::options::TransformOptions;
use crate::renamer::Rewrites;

pub const STATE_KEY: &str = "data";
pub const STATE_FIELD: &str = "state";
pub const CONFIG_FIELD: &str = "config";
pub const RENDER_METHOD: &str = "render";
pub const APP_CLASS_NAME: &str = "App";

// ═══════════════════════════════════════════════════════════════════════════════
// DEFINITION MODEL
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegistrationKind {
    Page,
    Component,
    App,
}

impl RegistrationKind {
    pub fn from_callee(name: &str) -> Option<Self> {
        match name {
            "Page" => Some(RegistrationKind::Page),
            "Component" => Some(RegistrationKind::Component),
            "App" => Some(RegistrationKind::App),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationKind::Page => "Page",
            RegistrationKind::Component => "Component",
            RegistrationKind::App => "App",
        }
    }
}

/// A function value lifted out of the definition object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionParts {
    pub kind: MethodKind,
    pub is_async: bool,
    pub is_generator: bool,
    pub params: String,
    pub return_type: Option<String>,
    pub body: FunctionBody,
}

impl FunctionParts {
    /// Plain methods and non-generator functions can become arrow properties.
    fn fits_arrow(&self) -> bool {
        self.kind == MethodKind::Method && !self.is_generator
    }

    fn into_method(self, name: String) -> ClassMember {
        ClassMember::Method {
            name,
            kind: self.kind,
            is_async: self.is_async,
            is_generator: self.is_generator,
            params: self.params,
            return_type: self.return_type,
            body: self.body,
        }
    }

    fn into_arrow(self) -> Expr {
        Expr::Arrow(Box::new(ArrowFunction {
            is_async: self.is_async,
            params: self.params,
            return_type: self.return_type,
            body: self.body,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Member {
    StateField {
        value: Expr,
    },
    LifecycleMethod {
        canonical_name: String,
        source_key: String,
        function: FunctionParts,
    },
    PlainProperty {
        name: String,
        value: Expr,
    },
    PlainMethod {
        name: String,
        function: FunctionParts,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    pub kind: RegistrationKind,
    pub state_keys: Vec<String>,
    pub members: Vec<Member>,
    pub config: Option<Value>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXTRACTION
// ═══════════════════════════════════════════════════════════════════════════════

pub struct DefinitionExtractor<'s> {
    source: &'s str,
    rewrites: &'s Rewrites,
    opts: &'s TransformOptions,
}

impl<'s> DefinitionExtractor<'s> {
    pub fn new(source: &'s str, rewrites: &'s Rewrites, opts: &'s TransformOptions) -> Self {
        Self {
            source,
            rewrites,
            opts,
        }
    }

    fn text(&self, span: Span) -> String {
        self.rewrites.apply(self.source, span)
    }

    fn raw(&self, span: Span) -> String {
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or_default()
            .to_string()
    }

    pub fn extract(
        &self,
        kind: RegistrationKind,
        object: &ObjectExpression<'_>,
        config: Option<&Value>,
    ) -> Result<ComponentDefinition> {
        // A spread anywhere rejects the object before any key is looked at.
        if let Some(spread) = object.properties.iter().find_map(|prop| match prop {
            ObjectPropertyKind::SpreadProperty(spread) => Some(spread),
            ObjectPropertyKind::ObjectProperty(_) => None,
        }) {
            return Err(TransformError::StructuralUnsupported {
                span: spread.span.into(),
            });
        }

        let mut state_keys = Vec::new();
        let mut members = Vec::with_capacity(object.properties.len());

        for prop in &object.properties {
            let ObjectPropertyKind::ObjectProperty(prop) = prop else {
                continue;
            };
            let name = self.property_name(prop)?;

            if name == STATE_KEY {
                let (value, keys) = self.state_field(prop);
                state_keys.extend(keys);
                members.push(Member::StateField { value });
                continue;
            }

            let function = self.function_parts(prop);

            if let Some(canonical) = self.opts.lifecycle.get(&name) {
                match function {
                    Some(function) => {
                        members.push(Member::LifecycleMethod {
                            canonical_name: canonical.to_string(),
                            source_key: name,
                            function,
                        });
                    }
                    None => {
                        warn!(
                            "lifecycle key `{}` holds a non-function value; kept as a property",
                            name
                        );
                        members.push(Member::PlainProperty {
                            name,
                            value: Expr::Raw(self.text(prop.value.span())),
                        });
                    }
                }
                continue;
            }

            members.push(match function {
                Some(function) => Member::PlainMethod { name, function },
                None => Member::PlainProperty {
                    name,
                    value: Expr::Raw(self.text(prop.value.span())),
                },
            });
        }

        Ok(ComponentDefinition {
            kind,
            state_keys,
            members,
            config: config.filter(|value| value.is_object()).cloned(),
        })
    }

    fn property_name(&self, prop: &ObjectProperty<'_>) -> Result<String> {
        match &prop.key {
            PropertyKey::StaticIdentifier(ident) if !prop.computed => Ok(ident.name.to_string()),
            key => Err(TransformError::InvalidKey {
                key: self.raw(key.span()),
                span: key.span().into(),
            }),
        }
    }

    /// The state initializer and its identifier keys. `data() { ... }`
    /// becomes an immediately invoked arrow over the same body.
    fn state_field(&self, prop: &ObjectProperty<'_>) -> (Expr, Vec<String>) {
        match prop.value.without_parentheses() {
            Expression::ObjectExpression(object) => {
                (Expr::Raw(self.text(prop.value.span())), object_keys(object))
            }
            Expression::FunctionExpression(func) if prop.method => {
                let keys = func
                    .body
                    .as_deref()
                    .and_then(returned_object)
                    .map(object_keys)
                    .unwrap_or_default();
                let init = ArrowFunction {
                    is_async: func.r#async,
                    params: self.params(&func.params),
                    return_type: None,
                    body: FunctionBody::Raw(self.block(func.body.as_deref(), func.span)),
                };
                (Expr::call(Expr::Arrow(Box::new(init)), Vec::new()), keys)
            }
            _ => (Expr::Raw(self.text(prop.value.span())), Vec::new()),
        }
    }

    fn function_parts(&self, prop: &ObjectProperty<'_>) -> Option<FunctionParts> {
        let kind = match prop.kind {
            PropertyKind::Init => MethodKind::Method,
            PropertyKind::Get => MethodKind::Get,
            PropertyKind::Set => MethodKind::Set,
        };
        match prop.value.without_parentheses() {
            Expression::FunctionExpression(func) => Some(self.from_function(kind, func)),
            Expression::ArrowFunctionExpression(arrow) => Some(self.from_arrow(arrow)),
            _ => None,
        }
    }

    fn from_function(&self, kind: MethodKind, func: &Function<'_>) -> FunctionParts {
        FunctionParts {
            kind,
            is_async: func.r#async,
            is_generator: func.generator,
            params: self.params(&func.params),
            return_type: func.return_type.as_deref().map(|ty| self.type_text(ty)),
            body: FunctionBody::Raw(self.block(func.body.as_deref(), func.span)),
        }
    }

    fn from_arrow(&self, arrow: &ArrowFunctionExpression<'_>) -> FunctionParts {
        let body = match (arrow.expression, arrow.body.statements.first()) {
            (true, Some(Statement::ExpressionStatement(stmt))) => {
                FunctionBody::Expression(Box::new(Expr::Raw(self.text(stmt.expression.span()))))
            }
            _ => FunctionBody::Raw(self.text(arrow.body.span)),
        };
        FunctionParts {
            kind: MethodKind::Method,
            is_async: arrow.r#async,
            is_generator: false,
            params: self.params(&arrow.params),
            return_type: arrow.return_type.as_deref().map(|ty| self.type_text(ty)),
            body,
        }
    }

    /// Parameter source without the enclosing parentheses.
    fn params(&self, params: &FormalParameters<'_>) -> String {
        let text = self.text(params.span);
        let trimmed = text.trim();
        trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed)
            .trim()
            .to_string()
    }

    fn type_text(&self, annotation: &TSTypeAnnotation<'_>) -> String {
        self.text(annotation.type_annotation.span())
    }

    fn block(&self, body: Option<&OxcFunctionBody<'_>>, fallback: Span) -> String {
        match body {
            Some(body) => self.text(body.span),
            None => {
                warn!("function without a body at {}..{}", fallback.start, fallback.end);
                "{}".to_string()
            }
        }
    }
}

fn object_keys(object: &ObjectExpression<'_>) -> Vec<String> {
    object
        .properties
        .iter()
        .filter_map(|prop| match prop {
            ObjectPropertyKind::ObjectProperty(prop) if !prop.computed => match &prop.key {
                PropertyKey::StaticIdentifier(ident) => Some(ident.name.to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// The object literal of the last top-level `return { ... }` in `body`.
fn returned_object<'b, 'a>(body: &'b OxcFunctionBody<'a>) -> Option<&'b ObjectExpression<'a>> {
    body.statements.iter().rev().find_map(|stmt| match stmt {
        Statement::ReturnStatement(ret) => match ret.argument.as_ref()?.without_parentheses() {
            Expression::ObjectExpression(object) => Some(&**object),
            _ => None,
        },
        _ => None,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASS ASSEMBLY
// ═══════════════════════════════════════════════════════════════════════════════

impl ComponentDefinition {
    /// Builds the class declaration. `render` is the value returned by the
    /// generated `render()`; `null` when absent.
    pub fn into_class(self, render: Option<Expr>, opts: &TransformOptions) -> ClassDeclaration {
        let name = match self.kind {
            RegistrationKind::App => APP_CLASS_NAME.to_string(),
            _ => opts.default_class_name.clone(),
        };

        let decorators = match self.kind {
            RegistrationKind::App => Vec::new(),
            kind => vec![Expr::call(
                Expr::Identifier(opts.decorator_helper.clone()),
                vec![Expr::StringLiteral(kind.as_str().to_string())],
            )],
        };

        let mut body: Vec<ClassMember> = self
            .members
            .into_iter()
            .map(|member| match member {
                Member::StateField { value } => ClassMember::Property {
                    name: STATE_FIELD.to_string(),
                    value,
                },
                Member::LifecycleMethod {
                    canonical_name,
                    function,
                    ..
                } => function.into_method(canonical_name),
                Member::PlainMethod { name, function } if function.fits_arrow() => ClassMember::Property {
                    name,
                    value: function.into_arrow(),
                },
                Member::PlainMethod { name, function } => function.into_method(name),
                Member::PlainProperty { name, value } => ClassMember::Property { name, value },
            })
            .collect();

        if let Some(config) = self.config {
            body.push(ClassMember::Property {
                name: CONFIG_FIELD.to_string(),
                value: Expr::Json(config),
            });
        }

        body.push(render_method(self.state_keys, render));

        ClassDeclaration {
            name,
            super_class: Some(Expr::member(
                Expr::Identifier(opts.target_namespace.clone()),
                "Component",
            )),
            decorators,
            body,
        }
    }
}

fn render_method(state_keys: Vec<String>, render: Option<Expr>) -> ClassMember {
    let mut statements = Vec::with_capacity(2);
    if !state_keys.is_empty() {
        statements.push(Stmt::DestructureConst {
            keys: state_keys,
            init: Expr::member(Expr::Identifier("this".to_string()), STATE_FIELD),
        });
    }
    statements.push(Stmt::Return {
        argument: render.unwrap_or(Expr::Null),
    });

    ClassMember::Method {
        name: RENDER_METHOD.to_string(),
        kind: MethodKind::Method,
        is_async: false,
        is_generator: false,
        params: String::new(),
        return_type: None,
        body: FunctionBody::Statements(statements),
    }
}
