use tracing::{debug, trace};

use super::{ResolveCtx, SUPPORTS_COVERAGE};
use crate::{
    coverage::CoverageFeatures,
    diagnostic::{Diagnostic, DiagnosticCode, Subject},
    mask::SanitizerMask,
    options::{parse_integer, Arg, OptId},
};

type C = CoverageFeatures;

const BASE_CONFLICTS: &[(C, &str, C, &str)] = &[
    (C::FUNC, "func", C::BB, "bb"),
    (C::FUNC, "func", C::EDGE, "edge"),
    (C::BB, "bb", C::EDGE, "edge"),
];

fn parse_features(ctx: &mut ResolveCtx<'_>, arg: &Arg) -> CoverageFeatures {
    let mut features = C::empty();
    for value in &arg.values {
        match C::from_feature_name(value) {
            Some(feature) => features |= feature,
            None => ctx.emit(
                Diagnostic::error(
                    DiagnosticCode::UnknownOption,
                    format!(
                        "unsupported argument '{value}' to option '{}'",
                        arg.id.name()
                    ),
                    Subject::Value(arg.spelling_of(value)),
                )
                .at(arg.index),
            ),
        }
    }
    features
}

/// The integer form accepted for compatibility, `0` through `4`.
fn legacy_level(arg: &Arg) -> Option<(CoverageFeatures, Option<&'static str>)> {
    match arg.values.as_slice() {
        [value] => parse_integer(value).and_then(C::from_legacy_level),
        _ => None,
    }
}

pub(crate) fn resolve_coverage(
    ctx: &mut ResolveCtx<'_>,
    all_added: SanitizerMask,
) -> CoverageFeatures {
    let mut features = C::empty();
    let args = ctx.args;

    for arg in args {
        match arg.id {
            OptId::SanitizeCoverage => {
                if let Some((legacy, replacement)) = legacy_level(arg) {
                    if let Some(replacement) = replacement {
                        ctx.emit(
                            Diagnostic::warning(
                                DiagnosticCode::DeprecatedSyntax,
                                format!(
                                    "argument '{}' is deprecated, use '{replacement}' instead",
                                    arg.as_str()
                                ),
                                Subject::Value(arg.as_str().into()),
                            )
                            .at(arg.index),
                        );
                    }
                    features = legacy;
                    trace!(arg = arg.as_str(), features = %features, "legacy coverage level");
                    continue;
                }

                features |= parse_features(ctx, arg);
                // trace-pc works on its own, everything else needs a
                // sanitizer that links the coverage runtime.
                if !features.contains(C::TRACE_PC) && !all_added.intersects(SUPPORTS_COVERAGE) {
                    ctx.emit(
                        Diagnostic::warning(
                            DiagnosticCode::CoverageWithoutSanitizer,
                            format!("argument unused during compilation: '{}'", arg.as_str()),
                            Subject::Value(arg.as_str().into()),
                        )
                        .at(arg.index),
                    );
                    features = C::empty();
                }
            }
            OptId::NoSanitizeCoverage => features -= parse_features(ctx, arg),
            _ => continue,
        }
        trace!(arg = arg.as_str(), features = %features, "coverage");
    }

    for &(first, first_name, second, second_name) in BASE_CONFLICTS {
        if features.contains(first | second) {
            ctx.emit(Diagnostic::error(
                DiagnosticCode::CoverageConflict,
                format!(
                    "invalid argument '-fsanitize-coverage={first_name}' not allowed with \
                     '-fsanitize-coverage={second_name}'"
                ),
                Subject::Coverage(first | second),
            ));
        }
    }

    let has_base = features.intersects(C::BASE);
    if !has_base {
        for feature in (features & C::NEEDS_BASE).iter() {
            ctx.emit(Diagnostic::error(
                DiagnosticCode::CoverageMissingBase,
                format!(
                    "invalid argument '-fsanitize-coverage={feature}' only allowed with \
                     '-fsanitize-coverage=(func|bb|edge)'"
                ),
                Subject::Coverage(feature),
            ));
        }

        if features.contains(C::TRACE_PC) {
            features |= C::EDGE;
        }
    }

    debug!(coverage = %features, "resolved coverage features");
    features
}

#[cfg(test)]
mod tests {
    use sanitas_triple::TargetTriple;

    use super::*;
    use crate::{config::DriverConfig, options::ArgList, toolchain::Toolchain};

    fn run(all_added: SanitizerMask, args: &[&str]) -> (CoverageFeatures, Vec<DiagnosticCode>) {
        let tc = Toolchain::new(TargetTriple::parse("x86_64-unknown-linux-gnu").unwrap());
        let cfg = DriverConfig::default();
        let args = ArgList::parse(args).unwrap();
        let mut ctx = ResolveCtx::new(&tc, &cfg, &args);
        let features = resolve_coverage(&mut ctx, all_added);
        let codes = ctx.report.diagnostics.iter().map(|d| d.code).collect();
        (features, codes)
    }

    #[test]
    fn legacy_levels_replace_the_set() {
        let (features, codes) = run(
            SanitizerMask::ADDRESS,
            &["-fsanitize-coverage=func,trace-cmp", "-fsanitize-coverage=3"],
        );
        assert_eq!(features, C::EDGE);
        assert_eq!(codes, [DiagnosticCode::DeprecatedSyntax]);

        let (features, codes) = run(
            SanitizerMask::ADDRESS,
            &["-fsanitize-coverage=edge", "-fsanitize-coverage=0"],
        );
        assert!(features.is_empty());
        assert!(codes.is_empty());
    }

    #[test]
    fn legacy_level_ignores_sanitizers() {
        let (features, _) = run(SanitizerMask::empty(), &["-fsanitize-coverage=0x2"]);
        assert_eq!(features, C::BB);
    }

    #[test]
    fn named_features_need_a_sanitizer() {
        let (features, codes) = run(SanitizerMask::THREAD, &["-fsanitize-coverage=edge"]);
        assert!(features.is_empty());
        assert_eq!(codes, [DiagnosticCode::CoverageWithoutSanitizer]);

        let (features, codes) = run(SanitizerMask::empty(), &["-fsanitize-coverage=trace-pc"]);
        assert_eq!(features, C::TRACE_PC | C::EDGE);
        assert!(codes.is_empty());
    }

    #[test]
    fn conflicts_are_reported_but_kept() {
        let (features, codes) = run(
            SanitizerMask::ADDRESS,
            &["-fsanitize-coverage=func,bb,edge"],
        );
        assert_eq!(features, C::FUNC | C::BB | C::EDGE);
        assert_eq!(codes, [DiagnosticCode::CoverageConflict; 3]);
    }

    #[test]
    fn trace_bb_needs_a_base() {
        let (features, codes) = run(
            SanitizerMask::ADDRESS,
            &[
                "-fsanitize-coverage=edge,trace-bb,8bit-counters",
                "-fno-sanitize-coverage=edge",
            ],
        );
        assert_eq!(features, C::TRACE_BB | C::EIGHT_BIT_COUNTERS);
        assert_eq!(codes, [DiagnosticCode::CoverageMissingBase; 2]);
    }

    #[test]
    fn unknown_feature() {
        let (features, codes) = run(SanitizerMask::ADDRESS, &["-fsanitize-coverage=edge,loops"]);
        assert_eq!(features, C::EDGE);
        assert_eq!(codes, [DiagnosticCode::UnknownOption]);
    }
}
