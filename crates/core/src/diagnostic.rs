//! Advisory diagnostics.
//!
//! Advisories never stop an operation. They are returned alongside the
//! result so callers can surface them, and are also emitted as `tracing`
//! warnings by the crates that raise them.

use alloc::string::String;
use core::fmt;

/// What an advisory is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// An update config that has no meaning for subscriptions was ignored.
    ConfigIgnored,
    /// A declared fragment had no prop supplied.
    MissingFragmentData,
    /// A prop was not data fetched through a fragment.
    MockData,
}

/// A non-fatal advisory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Classification.
    pub kind: DiagnosticKind,
    /// Human readable message.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
