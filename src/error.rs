//! Error taxonomy for the conversion pipelines.
//!
//! Every error is fatal to the call that raised it. Script errors carry the
//! byte span of the offending node so the caller can render a code frame.

use std::path::PathBuf;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_SPREAD: &str = "TZ-ERR-SPREAD";
pub const ERR_KEY: &str = "TZ-ERR-KEY";
pub const ERR_DIRECTIVE: &str = "TZ-ERR-DIRECTIVE";
pub const ERR_SYNTAX: &str = "TZ-ERR-SYNTAX";
pub const ERR_EXPRESSION: &str = "TZ-ERR-EXPR";
pub const ERR_CONFIG: &str = "TZ-ERR-CONFIG";
pub const ERR_IO: &str = "TZ-ERR-IO";

/// Byte range into the script source, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub start: u32,
    pub end: u32,
}

impl From<oxc_span::Span> for SourceSpan {
    fn from(span: oxc_span::Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("spread properties are not supported in a Page/Component/App definition object")]
    StructuralUnsupported { span: SourceSpan },

    #[error("definition object keys must be plain identifiers, found `{key}`")]
    InvalidKey { key: String, span: SourceSpan },

    #[error("invalid `{directive}` on <{tag}>{}: {message}", line_suffix(.line))]
    DirectiveValue {
        directive: String,
        tag: String,
        /// 1-based markup line of the element, when it came from markup.
        line: Option<u32>,
        message: String,
    },

    #[error("failed to parse script: {message}")]
    ScriptSyntax { message: String },

    #[error("invalid template expression `{source_text}`: {message}")]
    ExpressionSyntax { source_text: String, message: String },

    #[error("invalid page config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransformError {
    pub fn code(&self) -> &'static str {
        match self {
            TransformError::StructuralUnsupported { .. } => ERR_SPREAD,
            TransformError::InvalidKey { .. } => ERR_KEY,
            TransformError::DirectiveValue { .. } => ERR_DIRECTIVE,
            TransformError::ScriptSyntax { .. } => ERR_SYNTAX,
            TransformError::ExpressionSyntax { .. } => ERR_EXPRESSION,
            TransformError::Config { .. } => ERR_CONFIG,
            TransformError::Io { .. } => ERR_IO,
        }
    }

    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            TransformError::StructuralUnsupported { span } | TransformError::InvalidKey { span, .. } => {
                Some(*span)
            }
            _ => None,
        }
    }

    /// 1-based `(line, column)` of the error inside `source`, when the error
    /// points at a script node.
    pub fn location(&self, source: &str) -> Option<(u32, u32)> {
        let span = self.span()?;
        let offset = (span.start as usize).min(source.len());
        let before = source.get(..offset)?;
        let line = before.matches('\n').count() as u32 + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() as u32 + 1,
            None => before.chars().count() as u32 + 1,
        };
        Some((line, column))
    }

    /// Markup line of a template error.
    pub fn markup_line(&self) -> Option<u32> {
        match self {
            TransformError::DirectiveValue { line, .. } => *line,
            _ => None,
        }
    }

    pub(crate) fn directive(
        directive: &str,
        tag: &str,
        line: Option<u32>,
        message: impl Into<String>,
    ) -> Self {
        TransformError::DirectiveValue {
            directive: directive.to_string(),
            tag: tag.to_string(),
            line,
            message: message.into(),
        }
    }
}

fn line_suffix(line: &Option<u32>) -> String {
    line.map(|line| format!(" (line {})", line)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, TransformError>;
