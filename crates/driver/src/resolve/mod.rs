//! Turns a command line into one consistent sanitizer configuration.
//!
//! The stages run in a fixed order: trapping kinds first (they constrain
//! which kinds may be enabled), then the enabled kinds, then everything that
//! depends on them. Every stage reports into one shared
//! [`ResolutionReport`] and never aborts; bad input shrinks the result.

mod blacklist;
mod coverage;
mod kinds;
mod last_wins;
mod recover;
mod scalars;
mod trap;

use std::path::PathBuf;

use tracing::debug;

use crate::{
    config::DriverConfig,
    coverage::CoverageFeatures,
    diagnostic::Diagnostic,
    mask::SanitizerMask,
    options::ArgList,
    report::ResolutionReport,
    toolchain::Toolchain,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

type M = SanitizerMask;

pub(crate) const NEEDS_UBSAN_RT: M = M::UNDEFINED.union(M::INTEGER).union(M::CFI);
pub(crate) const NEEDS_UBSAN_CXX_RT: M = M::VPTR.union(M::CFI);
pub(crate) const NOT_ALLOWED_WITH_TRAP: M = M::VPTR;
pub(crate) const REQUIRES_PIE: M = M::DATAFLOW;
pub(crate) const NEEDS_UNWIND_TABLES: M = M::ADDRESS
    .union(M::THREAD)
    .union(M::MEMORY)
    .union(M::DATAFLOW);
pub(crate) const SUPPORTS_COVERAGE: M = M::ADDRESS
    .union(M::MEMORY)
    .union(M::LEAK)
    .union(M::UNDEFINED)
    .union(M::INTEGER)
    .union(M::DATAFLOW);
pub(crate) const RECOVERABLE_BY_DEFAULT: M = M::UNDEFINED.union(M::INTEGER);
pub(crate) const UNRECOVERABLE: M = M::UNREACHABLE.union(M::RETURN);
pub(crate) const LEGACY_RECOVER: M = M::UNDEFINED.union(M::INTEGER);
pub(crate) const NEEDS_LTO: M = M::CFI;
pub(crate) const TRAPPING_SUPPORTED: M = M::UNDEFINED
    .difference(M::VPTR)
    .union(M::UNSIGNED_INTEGER_OVERFLOW)
    .union(M::LOCAL_BOUNDS)
    .union(M::CFI);
pub(crate) const TRAPPING_DEFAULT: M = M::CFI;
pub(crate) const CFI_CLASSES: M = M::CFI_VCALL
    .union(M::CFI_NVCALL)
    .union(M::CFI_DERIVED_CAST)
    .union(M::CFI_UNRELATED_CAST);

/// State shared by all resolution stages of one command line.
pub(crate) struct ResolveCtx<'a> {
    pub(crate) toolchain: &'a Toolchain,
    pub(crate) cfg: &'a DriverConfig,
    pub(crate) args: &'a ArgList,
    pub(crate) report: ResolutionReport,
}

impl<'a> ResolveCtx<'a> {
    fn new(toolchain: &'a Toolchain, cfg: &'a DriverConfig, args: &'a ArgList) -> Self {
        Self {
            toolchain,
            cfg,
            args,
            report: ResolutionReport::with_limit(cfg.max_diagnostics),
        }
    }

    pub(crate) fn emit(&mut self, diagnostic: Diagnostic) {
        self.report.push(diagnostic);
    }

    pub(crate) fn triple(&self) -> String {
        self.toolchain.triple.to_string()
    }
}

/// The resolved sanitizer configuration of one compilation.
///
/// Masks hold individual kinds only. `recoverable` and `trap` are always
/// subsets of `sanitizers`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SanitizerArgs {
    sanitizers: SanitizerMask,
    recoverable: SanitizerMask,
    trap: SanitizerMask,
    coverage: CoverageFeatures,
    blacklist_files: Vec<PathBuf>,
    extra_deps: Vec<PathBuf>,
    msan_track_origins: i32,
    msan_use_after_dtor: bool,
    cfi_cross_dso: bool,
    stats: bool,
    asan_field_padding: i32,
    asan_shared_runtime: bool,
    link_cxx_runtimes: bool,
    need_pie: bool,
}

impl SanitizerArgs {
    pub fn sanitizers(&self) -> SanitizerMask {
        self.sanitizers
    }

    pub fn recoverable(&self) -> SanitizerMask {
        self.recoverable
    }

    pub fn trap(&self) -> SanitizerMask {
        self.trap
    }

    pub fn coverage(&self) -> CoverageFeatures {
        self.coverage
    }

    pub fn blacklist_files(&self) -> &[PathBuf] {
        &self.blacklist_files
    }

    pub fn extra_deps(&self) -> &[PathBuf] {
        &self.extra_deps
    }

    pub fn msan_track_origins(&self) -> i32 {
        self.msan_track_origins
    }

    pub fn msan_use_after_dtor(&self) -> bool {
        self.msan_use_after_dtor
    }

    pub fn cfi_cross_dso(&self) -> bool {
        self.cfi_cross_dso
    }

    pub fn stats(&self) -> bool {
        self.stats
    }

    pub fn asan_field_padding(&self) -> i32 {
        self.asan_field_padding
    }

    pub fn has(&self, kinds: SanitizerMask) -> bool {
        self.sanitizers.intersects(kinds)
    }

    pub fn needs_asan_rt(&self) -> bool {
        self.has(M::ADDRESS)
    }

    pub fn needs_shared_asan_rt(&self) -> bool {
        self.asan_shared_runtime
    }

    pub fn needs_tsan_rt(&self) -> bool {
        self.has(M::THREAD)
    }

    pub fn needs_msan_rt(&self) -> bool {
        self.has(M::MEMORY)
    }

    pub fn needs_lsan_rt(&self) -> bool {
        self.has(M::LEAK) && !self.has(M::ADDRESS)
    }

    /// The standalone UBSan runtime is only linked when no other runtime
    /// already carries it.
    pub fn needs_ubsan_rt(&self) -> bool {
        self.sanitizers.intersects(NEEDS_UBSAN_RT.difference(self.trap))
            && !self.has(M::ADDRESS | M::MEMORY | M::THREAD)
            && !self.cfi_cross_dso
    }

    pub fn needs_dfsan_rt(&self) -> bool {
        self.has(M::DATAFLOW)
    }

    pub fn needs_safe_stack_rt(&self) -> bool {
        self.has(M::SAFE_STACK)
    }

    pub fn needs_cfi_rt(&self) -> bool {
        !self.sanitizers.intersects(M::CFI.difference(self.trap)) && self.cfi_cross_dso
    }

    pub fn needs_cfi_diag_rt(&self) -> bool {
        self.sanitizers.intersects(M::CFI.difference(self.trap)) && self.cfi_cross_dso
    }

    pub fn needs_stats_rt(&self) -> bool {
        self.stats
    }

    pub fn needs_esan_rt(&self) -> bool {
        self.has(M::EFFICIENCY)
    }

    pub fn requires_pie(&self) -> bool {
        self.need_pie || self.has(REQUIRES_PIE)
    }

    pub fn needs_unwind_tables(&self) -> bool {
        self.has(NEEDS_UNWIND_TABLES)
    }

    pub fn link_cxx_runtimes(&self) -> bool {
        self.link_cxx_runtimes
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Resolution {
    pub args: SanitizerArgs,
    pub report: ResolutionReport,
}

/// Resolves the sanitizer options in `args` for `toolchain`.
///
/// Always produces a configuration. Whether diagnostics of error severity
/// should stop the compilation is up to the caller.
pub fn resolve(toolchain: &Toolchain, cfg: &DriverConfig, args: &ArgList) -> Resolution {
    let span = tracing::debug_span!("resolve", target = %toolchain.triple);
    let _enter = span.enter();

    let mut ctx = ResolveCtx::new(toolchain, cfg, args);

    let trapping = trap::resolve_trapping(&mut ctx);
    let kinds::Kinds { enabled, all_added } = kinds::resolve_kinds(&mut ctx, trapping);
    let recoverable = recover::resolve_recoverable(&mut ctx, enabled, trapping);
    let trap = trapping & enabled;
    let blacklist::Blacklists { files, deps } = blacklist::resolve_blacklists(&mut ctx, enabled);

    let mut need_pie = false;
    let memory = scalars::memory_settings(&mut ctx, all_added, &mut need_pie);
    let cfi_cross_dso = scalars::cfi_cross_dso(&ctx, all_added, &mut need_pie);
    let stats = scalars::stats(&ctx);
    let coverage = coverage::resolve_coverage(&mut ctx, all_added);
    let address = scalars::address_settings(&mut ctx, all_added, &mut need_pie);
    let link_cxx_runtimes = scalars::link_cxx_runtimes(&ctx);

    let sanitizer_args = SanitizerArgs {
        sanitizers: enabled.kinds(),
        recoverable: recoverable.kinds(),
        trap: trap.kinds(),
        coverage,
        blacklist_files: files,
        extra_deps: deps,
        msan_track_origins: memory.track_origins,
        msan_use_after_dtor: memory.use_after_dtor,
        cfi_cross_dso,
        stats,
        asan_field_padding: address.field_padding,
        asan_shared_runtime: address.shared_runtime,
        link_cxx_runtimes,
        need_pie,
    };

    debug!(
        sanitizers = %sanitizer_args.sanitizers,
        recoverable = %sanitizer_args.recoverable,
        trap = %sanitizer_args.trap,
        coverage = %sanitizer_args.coverage,
        diagnostics = ctx.report.len(),
        "resolved sanitizer arguments"
    );

    Resolution {
        args: sanitizer_args,
        report: ctx.report,
    }
}
