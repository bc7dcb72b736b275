//! Resolution of sanitizer command-line options.
//!
//! [`resolve`] turns the sanitizer-related arguments of one compiler
//! invocation into a [`SanitizerArgs`] plus a [`ResolutionReport`] of every
//! problem found along the way. [`SanitizerArgs::frontend_args`] lowers the
//! result to frontend flags.

mod config;
mod coverage;
mod describe;
mod diagnostic;
mod emit;
mod mask;
mod options;
mod pipeline;
mod report;
mod resolve;
mod special_case_list;
mod toolchain;

pub use config::{DriverConfig, DriverMode};
pub use coverage::CoverageFeatures;
pub use diagnostic::{Diagnostic, DiagnosticCode, Note, Severity, Subject};
pub use emit::InputKind;
pub use mask::{
    parse_sanitizer_value, SanitizerGroup, SanitizerKind, SanitizerMask, SANITIZER_GROUPS,
    SANITIZER_KINDS,
};
pub use options::{parse_integer, Arg, ArgList, OptId, OptionError};
pub use pipeline::{parse_and_resolve, resolve_jobs, resolve_with_args, ResolveError};
pub use report::ResolutionReport;
pub use resolve::{resolve, Resolution, SanitizerArgs};
pub use special_case_list::{SpecialCaseList, SpecialCaseListError};
pub use toolchain::{supported_sanitizers, RttiMode, Toolchain};
pub use sanitas_triple::TargetTriple;
