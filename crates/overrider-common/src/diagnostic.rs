//! Diagnostics surfaced to the user through miette.
//!
//! Frontend problems (syntax errors, unsupported constructs) never stop the
//! refactoring; they are collected as warnings and rendered by the host.

use crate::span::Span;
use miette::{Diagnostic as MietteDiagnostic, SourceSpan};
use thiserror::Error;

/// A non-fatal problem found while reading a file. Always rendered at
/// warning severity; fatal conditions are errors of the calling crate.
#[derive(Debug, Clone, Error, MietteDiagnostic)]
#[error("{message}")]
#[diagnostic(severity(Warning))]
pub struct Diagnostic {
    pub message: String,
    #[label("{label}")]
    pub span: Option<SourceSpan>,
    pub label: String,
    #[help]
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
            label: String::new(),
            help: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(SourceSpan::new((span.start as usize).into(), span.len() as usize));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}
