//! Output Assembler
//!
//! Adds the three leading imports to a script module and runs a whole page
//! (markup, script, config) through both pipelines into printed code.

#[cfg(feature = "napi")]
use napi_derive::napi;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::ast::{ImportDeclaration, Module, ModuleItem};
use crate::codegen::print_module;
use crate::error::{Result, TransformError};
use crate::options::TransformOptions;
use crate::script::parse_script;
use crate::template::parse_wxml;

/// Inserts, in order, the component library import, the framework
/// namespace import and the decorator helper import.
pub fn prepend_imports(module: &mut Module, used_components: &BTreeSet<String>, opts: &TransformOptions) {
    let imports = [
        ImportDeclaration {
            source: opts.components_source.clone(),
            default: None,
            named: used_components.iter().cloned().collect(),
        },
        ImportDeclaration {
            source: opts.framework_source.clone(),
            default: Some(opts.target_namespace.clone()),
            named: Vec::new(),
        },
        ImportDeclaration {
            source: opts.decorator_source.clone(),
            default: Some(opts.decorator_helper.clone()),
            named: Vec::new(),
        },
    ];
    module
        .items
        .splice(0..0, imports.into_iter().map(ModuleItem::Import));
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAGE CONVERSION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageInput {
    /// Used in error messages only.
    pub path: PathBuf,
    pub wxml: Option<String>,
    pub script: Option<String>,
    /// Page configuration JSON text.
    pub json: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageOutput {
    pub code: String,
    pub module: Module,
    pub used_components: Vec<String>,
}

pub fn transform_page(input: &PageInput, opts: &TransformOptions) -> Result<PageOutput> {
    let template = input
        .wxml
        .as_deref()
        .map(|markup| parse_wxml(markup, opts))
        .transpose()?;

    let config = input
        .json
        .as_deref()
        .map(|text| {
            serde_json::from_str::<serde_json::Value>(text).map_err(|source| TransformError::Config {
                path: input.path.clone(),
                source,
            })
        })
        .transpose()?;

    let (returned, used_components) = match template {
        Some(template) => (Some(template.root), template.used_components),
        None => (None, BTreeSet::new()),
    };

    let script = parse_script(
        input.script.as_deref(),
        returned,
        config.as_ref(),
        &used_components,
        opts,
    )?;

    let code = print_module(&script.module);
    debug!(
        "converted {} ({} component(s), {} bytes)",
        input.path.display(),
        used_components.len(),
        code.len()
    );

    Ok(PageOutput {
        code,
        module: script.module,
        used_components: used_components.into_iter().collect(),
    })
}

/// Node entry: converts one page with default options and returns the code.
#[cfg(feature = "napi")]
#[napi]
pub fn transform_page_native(
    wxml: Option<String>,
    script: Option<String>,
    json: Option<String>,
) -> napi::Result<String> {
    let input = PageInput {
        path: PathBuf::from("<native>"),
        wxml,
        script,
        json,
    };
    transform_page(&input, &TransformOptions::default())
        .map(|output| output.code)
        .map_err(|e| napi::Error::from_reason(format!("[{}] {}", e.code(), e)))
}
