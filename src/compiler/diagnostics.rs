//! Diagnostic framework for contract compilation
//!
//! Structural problems in a bridge contract are reported as diagnostics, not
//! errors: each carries a stable code for programmatic handling, an
//! interpolated message naming the method and declaration involved, and zero
//! or more fix suggestions identified by a stable key so tooling can apply
//! them in batch.
//!
//! # Code format
//!
//! Codes follow `CXXX` where `C` is the category (B=Bridge, P=Push shape,
//! I=Invoke shape, N=Informational) and `XXX` a numeric identifier.

use std::fmt;

/// Stable codes for contract diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // Bridge errors (B001-B099)
    /// Method signature declared directly on the bridge declaration
    MethodOnBridge,
    /// Bridge declaration has an empty uri segment
    MissingRoute,
    /// Bridge or ancestor references a method set that was never declared
    UnknownMethodSet,

    // Shape errors (P001/I001)
    /// Push-role method does not return Unit-Async
    PushShape,
    /// Invoke-role method is not asynchronous
    InvokeShape,

    // Informational (N001-N099)
    /// A later duplicate structural signature was dropped
    DuplicateSignatureDropped,
}

impl DiagnosticCode {
    /// Get the stable code string (e.g. "B001").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MethodOnBridge => "B001",
            Self::MissingRoute => "B002",
            Self::UnknownMethodSet => "B003",
            Self::PushShape => "P001",
            Self::InvokeShape => "I001",
            Self::DuplicateSignatureDropped => "N001",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Severity levels for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational note
    Note,
    /// Warning (synthesis proceeds but the contract may be wrong)
    Warning,
    /// Error (synthesis of this contract is blocked)
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Note => write!(f, "note"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Stable keys identifying fix suggestions, enabling batch application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixKey {
    /// Move a bridge-declared method into the push-role set
    MoveToPushSet,
    /// Move a bridge-declared method into the invoke-role set
    MoveToInvokeSet,
    /// Drop the result payload and return Unit-Async
    DropPayload,
    /// Wrap the declared return in Unit-Async
    WrapUnitAsync,
    /// Wrap the declared return in Value-Async, inferring the payload type
    WrapValueAsync,
}

impl FixKey {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoveToPushSet => "move-to-push-set",
            Self::MoveToInvokeSet => "move-to-invoke-set",
            Self::DropPayload => "drop-payload",
            Self::WrapUnitAsync => "wrap-unit-async",
            Self::WrapValueAsync => "wrap-value-async",
        }
    }
}

impl fmt::Display for FixKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A suggested fix, modeled as data so application is independent of any
/// editor integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixSuggestion {
    pub key: FixKey,
    pub summary: String,
}

/// What a diagnostic is about: a declaration, optionally narrowed to one of
/// its methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Declaring bridge or method set.
    pub container: String,
    pub method: Option<String>,
}

impl Subject {
    pub fn container(name: impl Into<String>) -> Self {
        Self {
            container: name.into(),
            method: None,
        }
    }

    pub fn method(container: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            method: Some(method.into()),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{}::{}", self.container, method),
            None => write!(f, "{}", self.container),
        }
    }
}

/// A single diagnostic record.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub subject: Option<Subject>,
    pub fixes: Vec<FixSuggestion>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            subject: None,
            fixes: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warning, message)
    }

    pub fn note(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Note, message)
    }

    #[must_use]
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    #[must_use]
    pub fn with_fix(mut self, key: FixKey, summary: impl Into<String>) -> Self {
        self.fixes.push(FixSuggestion {
            key,
            summary: summary.into(),
        });
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Whether this diagnostic offers a fix under the given key.
    #[must_use]
    pub fn has_fix(&self, key: FixKey) -> bool {
        self.fixes.iter().any(|f| f.key == key)
    }

    /// Format the diagnostic for display.
    #[must_use]
    pub fn format(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}[{}]: {}\n",
            self.severity, self.code, self.message
        ));

        if let Some(subject) = &self.subject {
            output.push_str(&format!("  --> {subject}\n"));
        }

        for fix in &self.fixes {
            output.push_str(&format!("  = fix({}): {}\n", fix.key, fix.summary));
        }

        for note in &self.notes {
            output.push_str(&format!("  = note: {note}\n"));
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// Collector for diagnostics during validation of one contract.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Check if there are any error-severity diagnostics.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Format all diagnostics with a trailing summary line.
    #[must_use]
    pub fn format_all(&self) -> String {
        let mut output = String::new();
        for diagnostic in &self.diagnostics {
            output.push_str(&diagnostic.format());
            output.push('\n');
        }

        let errors = self.error_count();
        let notes = self.diagnostics.len() - errors;
        if !self.diagnostics.is_empty() {
            output.push_str(&format!(
                "{}: {} error{}, {} other diagnostic{}\n",
                if errors > 0 { "aborting" } else { "finished" },
                errors,
                if errors == 1 { "" } else { "s" },
                notes,
                if notes == 1 { "" } else { "s" }
            ));
        }

        output
    }
}
