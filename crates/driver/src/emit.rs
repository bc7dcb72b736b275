//! Lowers a resolved configuration to compiler-frontend flags.

use crate::{
    config::DriverConfig, coverage::CoverageFeatures, mask::SanitizerMask,
    resolve::SanitizerArgs, toolchain::Toolchain,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Language of the translation unit being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InputKind {
    #[default]
    C,
    Cxx,
}

const COVERAGE_FLAGS: &[(CoverageFeatures, &str)] = &[
    (CoverageFeatures::FUNC, "-fsanitize-coverage-type=1"),
    (CoverageFeatures::BB, "-fsanitize-coverage-type=2"),
    (CoverageFeatures::EDGE, "-fsanitize-coverage-type=3"),
    (CoverageFeatures::INDIRECT_CALLS, "-fsanitize-coverage-indirect-calls"),
    (CoverageFeatures::TRACE_BB, "-fsanitize-coverage-trace-bb"),
    (CoverageFeatures::TRACE_CMP, "-fsanitize-coverage-trace-cmp"),
    (CoverageFeatures::EIGHT_BIT_COUNTERS, "-fsanitize-coverage-8bit-counters"),
    (CoverageFeatures::TRACE_PC, "-fsanitize-coverage-trace-pc"),
];

impl SanitizerArgs {
    /// Frontend flags for this configuration, in a stable order.
    ///
    /// Coverage flags come first and are emitted even when no sanitizer is
    /// enabled.
    pub fn frontend_args(
        &self,
        toolchain: &Toolchain,
        cfg: &DriverConfig,
        input: InputKind,
    ) -> Vec<String> {
        let mut out: Vec<String> = COVERAGE_FLAGS
            .iter()
            .filter(|(feature, _)| self.coverage().contains(*feature))
            .map(|(_, flag)| flag.to_string())
            .collect();

        let sanitizers = self.sanitizers();
        if sanitizers.is_empty() {
            return out;
        }

        out.push(format!("-fsanitize={sanitizers}"));
        if !self.recoverable().is_empty() {
            out.push(format!("-fsanitize-recover={}", self.recoverable()));
        }
        if !self.trap().is_empty() {
            out.push(format!("-fsanitize-trap={}", self.trap()));
        }

        for path in self.blacklist_files() {
            out.push(format!("-fsanitize-blacklist={}", path.display()));
        }
        for path in self.extra_deps() {
            out.push(format!("-fdepfile-entry={}", path.display()));
        }

        if self.msan_track_origins() != 0 {
            out.push(format!(
                "-fsanitize-memory-track-origins={}",
                self.msan_track_origins()
            ));
        }
        if self.msan_use_after_dtor() {
            out.push("-fsanitize-memory-use-after-dtor".to_string());
        }
        if self.cfi_cross_dso() {
            out.push("-fsanitize-cfi-cross-dso".to_string());
        }
        if self.stats() {
            out.push("-fsanitize-stats".to_string());
        }
        if self.asan_field_padding() != 0 {
            out.push(format!(
                "-fsanitize-address-field-padding={}",
                self.asan_field_padding()
            ));
        }

        if self.has(SanitizerMask::MEMORY | SanitizerMask::ADDRESS) {
            out.push("-fno-assume-sane-operator-new".to_string());
        }
        if self.has(SanitizerMask::SAFE_INIT) {
            out.push("-backend-option".to_string());
            out.push("-malloc-returns-zero".to_string());
        }

        if toolchain.triple.is_os_windows() {
            self.windows_runtime_args(toolchain, cfg, input, &mut out);
        }

        out
    }

    /// MSVC-style objects pull their runtimes in through embedded linker
    /// directives.
    fn windows_runtime_args(
        &self,
        toolchain: &Toolchain,
        cfg: &DriverConfig,
        input: InputKind,
        out: &mut Vec<String>,
    ) {
        let runtime = |component: &str| {
            let path = toolchain.compiler_rt(&cfg.resource_dir, component, false);
            format!("--dependent-lib={}", path.display())
        };

        if self.needs_ubsan_rt() {
            out.push(runtime("ubsan_standalone"));
            if input == InputKind::Cxx {
                out.push(runtime("ubsan_standalone_cxx"));
            }
        }

        if self.needs_stats_rt() {
            out.push(runtime("stats_client"));
            // The executable exports the stats runtime.
            out.push(runtime("stats"));
            // 32-bit x86 mangles C symbols with a leading underscore.
            let underscore = if toolchain.triple.architecture.is_x86() {
                "_"
            } else {
                ""
            };
            out.push(format!(
                "--linker-option=/include:{underscore}__sanitizer_stats_register"
            ));
        }
    }
}
