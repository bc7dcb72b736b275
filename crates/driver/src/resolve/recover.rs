use tracing::{debug, trace};

use super::{ResolveCtx, LEGACY_RECOVER, RECOVERABLE_BY_DEFAULT, UNRECOVERABLE};
use crate::{
    diagnostic::{Diagnostic, DiagnosticCode, Subject},
    mask::{parse_arg_values, SanitizerMask},
    options::OptId,
};

/// Kinds that report and continue instead of aborting.
///
/// Scans front to back: the recover flags toggle a running set instead of
/// following last-wins per kind.
pub(crate) fn resolve_recoverable(
    ctx: &mut ResolveCtx<'_>,
    kinds: SanitizerMask,
    trapping: SanitizerMask,
) -> SanitizerMask {
    let mut recoverable = RECOVERABLE_BY_DEFAULT;
    let mut diagnosed = SanitizerMask::empty();
    let args = ctx.args;

    for arg in args {
        let replacement = match arg.id {
            OptId::SanitizeRecover => {
                recoverable |= LEGACY_RECOVER.expand_groups();
                Some("-fsanitize-recover=undefined,integer' or '-fsanitize-recover=all")
            }
            OptId::NoSanitizeRecover => {
                recoverable -= LEGACY_RECOVER.expand_groups();
                Some("-fno-sanitize-recover=undefined,integer' or '-fno-sanitize-recover=all")
            }
            OptId::SanitizeRecoverEq => {
                let add = parse_arg_values(arg, &mut ctx.report);
                let to_diagnose = add & UNRECOVERABLE & !diagnosed;
                if !to_diagnose.is_empty() {
                    ctx.emit(
                        Diagnostic::error(
                            DiagnosticCode::ExplicitRecoverOfUnrecoverable,
                            format!(
                                "unsupported argument '{to_diagnose}' to option '{}'",
                                arg.id.name()
                            ),
                            Subject::Kinds(to_diagnose),
                        )
                        .at(arg.index),
                    );
                    diagnosed |= to_diagnose;
                }
                recoverable |= add.expand_groups();
                None
            }
            OptId::NoSanitizeRecoverEq => {
                recoverable -= parse_arg_values(arg, &mut ctx.report).expand_groups();
                None
            }
            _ => continue,
        };

        trace!(arg = arg.as_str(), recoverable = %recoverable, "recover");

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
    }

    recoverable &= kinds;
    recoverable -= UNRECOVERABLE;
    // A trapping kind never reaches a runtime that could recover.
    recoverable -= trapping;

    debug!(recoverable = %recoverable, "resolved recoverable kinds");
    recoverable
}

#[cfg(test)]
mod tests {
    use sanitas_triple::TargetTriple;

    use super::*;
    use crate::{config::DriverConfig, options::ArgList, toolchain::Toolchain};

    type M = SanitizerMask;

    fn run(kinds: SanitizerMask, args: &[&str]) -> (SanitizerMask, Vec<String>) {
        let tc = Toolchain::new(TargetTriple::parse("x86_64-unknown-linux-gnu").unwrap());
        let cfg = DriverConfig::default();
        let args = ArgList::parse(args).unwrap();
        let mut ctx = ResolveCtx::new(&tc, &cfg, &args);
        let recoverable = resolve_recoverable(&mut ctx, kinds, M::CFI);
        let messages = ctx
            .report
            .diagnostics
            .iter()
            .map(|d| d.message.clone())
            .collect();
        (recoverable, messages)
    }

    #[test]
    fn undefined_recovers_by_default() {
        let kinds = M::ADDRESS | M::NULL | M::RETURN;
        let (recoverable, messages) = run(kinds, &[]);
        assert_eq!(recoverable, M::NULL);
        assert!(messages.is_empty());
    }

    #[test]
    fn scan_is_in_order() {
        let kinds = M::ADDRESS | M::NULL;
        let (recoverable, _) = run(
            kinds,
            &["-fsanitize-recover=address", "-fno-sanitize-recover=all"],
        );
        assert!(recoverable.is_empty());

        let (recoverable, _) = run(
            kinds,
            &["-fno-sanitize-recover=all", "-fsanitize-recover=address"],
        );
        assert_eq!(recoverable, M::ADDRESS);
    }

    #[test]
    fn legacy_flags_are_deprecated() {
        let (recoverable, messages) = run(M::NULL, &["-fno-sanitize-recover"]);
        assert!(recoverable.is_empty());
        assert_eq!(
            messages,
            ["argument '-fno-sanitize-recover' is deprecated, use \
              '-fno-sanitize-recover=undefined,integer' or '-fno-sanitize-recover=all' instead"]
        );
    }

    #[test]
    fn unrecoverable_kinds_are_diagnosed_once() {
        let (recoverable, messages) = run(
            M::UNREACHABLE | M::NULL,
            &[
                "-fsanitize-recover=unreachable,null",
                "-fsanitize-recover=unreachable",
            ],
        );
        assert_eq!(recoverable, M::NULL);
        assert_eq!(
            messages,
            ["unsupported argument 'unreachable' to option 'fsanitize-recover='"]
        );
    }

    #[test]
    fn trapping_kinds_do_not_recover() {
        let (recoverable, _) = run(M::CFI_ICALL | M::NULL, &["-fsanitize-recover=all"]);
        assert_eq!(recoverable, M::NULL);
    }
}
