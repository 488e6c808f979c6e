//! # Mini-program to class component converter
//!
//! Converts a WXML template plus its `Page`/`Component`/`App` registration
//! script into a class component whose `render()` returns JSX.
//!
//! ## Pipelines
//!
//! 1. **Template**: markup → UI element tree (PascalCase tags, normalized
//!    attribute keys, `{{ }}` values as expressions) → control-flow rewrite
//!    (`wx:if` chains become conditionals, `wx:for` becomes a callback call).
//! 2. **Script**: source → namespace rewrites (`wx` → `Taro`, `getApp()` →
//!    `Taro.getApp()`) → registration call replaced by an exported class with
//!    state, lifecycle methods, members, optional `config` and `render()`.
//! 3. **Assembly**: component, framework and decorator imports are prepended
//!    and the module is printed.
//!
//! Every call is synchronous and owns all of its state; independent pages
//! can be converted in parallel (see [`transform_project`]).

pub mod ast;
pub mod case;
pub mod codegen;
pub mod component;
pub mod control_flow;
pub mod discovery;
pub mod error;
pub mod finalize;
pub mod interpolation;
pub mod markup;
pub mod options;
pub mod renamer;
pub mod scope;
pub mod script;
pub mod template;
pub mod visitor;

#[cfg(test)]
mod script_tests;

pub use codegen::{print_expr, print_module};
pub use component::{ComponentDefinition, Member, RegistrationKind};
pub use discovery::{discover_pages, transform_project, PageReport, PageSource};
pub use error::{Result, TransformError};
pub use finalize::{transform_page, PageInput, PageOutput};
#[cfg(feature = "napi")]
pub use finalize::transform_page_native;
pub use options::{LifecycleTable, TransformOptions};
pub use script::{parse_script, ScriptOutput};
pub use template::{parse_wxml, TemplateOutput};
