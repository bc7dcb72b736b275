use std::fmt;

use rustc_hash::FxHashSet;

use crate::diagnostic::{Diagnostic, DiagnosticCode, Subject};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Diagnostics produced while resolving one command line, in emission order.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolutionReport {
    pub diagnostics: Vec<Diagnostic>,
    #[cfg_attr(feature = "serde", serde(skip))]
    seen: FxHashSet<(DiagnosticCode, Subject)>,
    #[cfg_attr(feature = "serde", serde(skip))]
    max_diagnostics: usize,
}

impl ResolutionReport {
    pub fn with_limit(max_diagnostics: usize) -> Self {
        Self {
            max_diagnostics,
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.has_errors()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|diag| diag.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|diag| !diag.is_error())
    }

    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |diag| diag.code == code)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Records `diagnostic` unless one with the same code and subject was
    /// already recorded. Once the limit is reached only errors are recorded.
    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        if !diagnostic.is_error()
            && self.max_diagnostics != 0
            && self.diagnostics.len() >= self.max_diagnostics
        {
            return;
        }

        let key = (diagnostic.code, diagnostic.subject.clone());
        if self.seen.insert(key) {
            self.diagnostics.push(diagnostic);
        }
    }
}

impl fmt::Display for ResolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.diagnostics.is_empty() {
            return "no diagnostics".fmt(f);
        }

        for diagnostic in &self.diagnostics {
            write!(f, "{diagnostic}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::SanitizerMask;

    fn thread_conflict() -> Diagnostic {
        Diagnostic::error(
            DiagnosticCode::MutuallyExclusiveKinds,
            "conflict",
            Subject::Kinds(SanitizerMask::THREAD),
        )
    }

    #[test]
    fn deduplicates_by_code_and_subject() {
        let mut report = ResolutionReport::default();
        report.push(thread_conflict());
        report.push(thread_conflict().at(3));
        report.push(Diagnostic::warning(
            DiagnosticCode::DeprecatedSyntax,
            "deprecated",
            Subject::Kinds(SanitizerMask::THREAD),
        ));

        assert_eq!(report.len(), 2);
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.warnings().count(), 1);
        assert!(report.has_errors());
    }

    #[test]
    fn limit_drops_warnings_only() {
        let mut report = ResolutionReport::with_limit(1);
        report.push(thread_conflict());
        report.push(Diagnostic::warning(
            DiagnosticCode::DeprecatedSyntax,
            "deprecated",
            Subject::Value("-fsanitize-coverage=1".into()),
        ));
        assert_eq!(report.len(), 1);

        report.push(Diagnostic::error(
            DiagnosticCode::UnknownOption,
            "unknown",
            Subject::Value("-fsanitize=foo".into()),
        ));
        assert_eq!(report.len(), 2);
        assert_eq!(report.errors().count(), 2);
    }

    #[test]
    fn empty_report() {
        let report = ResolutionReport::default();
        assert!(report.is_ok());
        assert_eq!(report.to_string(), "no diagnostics");
    }
}
