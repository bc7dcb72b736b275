use std::{fmt, path::PathBuf};

use smol_str::SmolStr;

use crate::{coverage::CoverageFeatures, mask::SanitizerMask};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiagnosticCode {
    UnknownOption,
    UnsupportedTrapValue,
    InvalidNumericValue,
    DeprecatedSyntax,
    UnsupportedOnTarget,
    IncompatibleWithTrapping,
    RttiConflict,
    MutuallyExclusiveKinds,
    MissingLto,
    UnsupportedAbiRuntime,
    MissingVisibility,
    ExplicitRecoverOfUnrecoverable,
    CoverageConflict,
    CoverageMissingBase,
    CoverageWithoutSanitizer,
    BlacklistFileMissing,
    BlacklistMalformed,
    DebugRuntimeConflict,
}

impl DiagnosticCode {
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::UnknownOption => 1,
            Self::UnsupportedTrapValue => 2,
            Self::InvalidNumericValue => 3,
            Self::DeprecatedSyntax => 4,
            Self::UnsupportedOnTarget => 100,
            Self::IncompatibleWithTrapping => 101,
            Self::RttiConflict => 102,
            Self::MutuallyExclusiveKinds => 103,
            Self::MissingLto => 104,
            Self::UnsupportedAbiRuntime => 105,
            Self::MissingVisibility => 106,
            Self::ExplicitRecoverOfUnrecoverable => 200,
            Self::CoverageConflict => 300,
            Self::CoverageMissingBase => 301,
            Self::CoverageWithoutSanitizer => 302,
            Self::BlacklistFileMissing => 400,
            Self::BlacklistMalformed => 401,
            Self::DebugRuntimeConflict => 500,
        }
    }

    pub fn as_str(self) -> String {
        format!("SAN{:04}", self.as_u16())
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => "error".fmt(f),
            Self::Warning => "warning".fmt(f),
        }
    }
}

/// What a diagnostic is about. Together with the code it forms the key
/// under which repeated diagnostics collapse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Subject {
    Kinds(SanitizerMask),
    Coverage(CoverageFeatures),
    Value(SmolStr),
    File(PathBuf),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kinds(kinds) if kinds.kinds().is_empty() => "kinds (none)".fmt(f),
            Self::Kinds(kinds) => write!(f, "kinds {kinds}"),
            Self::Coverage(features) => write!(f, "coverage {features}"),
            Self::Value(value) => write!(f, "`{value}`"),
            Self::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Note {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub subject: Subject,
    pub notes: Vec<Note>,
    /// Command-line position of the option that triggered the diagnostic.
    pub position: Option<usize>,
}

impl Diagnostic {
    pub fn new(
        code: DiagnosticCode,
        severity: Severity,
        message: impl Into<String>,
        subject: Subject,
    ) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            subject,
            notes: Vec::new(),
            position: None,
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>, subject: Subject) -> Self {
        Self::new(code, Severity::Error, message, subject)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>, subject: Subject) -> Self {
        Self::new(code, Severity::Warning, message, subject)
    }

    pub fn with_note(mut self, message: impl Into<String>) -> Self {
        self.notes.push(Note {
            message: message.into(),
        });
        self
    }

    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} @ {}",
            self.severity, self.code, self.message, self.subject
        )?;

        if let Some(position) = self.position {
            write!(f, " (arg {position})")?;
        }

        writeln!(f)?;

        for note in &self.notes {
            writeln!(f, "  note: {}", note.message)?;
        }

        Ok(())
    }
}
