use tracing::debug;

use super::{
    last_wins::{self, LastWinsPolicy, Toggle},
    ResolveCtx, CFI_CLASSES, NEEDS_LTO, NEEDS_UBSAN_CXX_RT, NOT_ALLOWED_WITH_TRAP,
};
use crate::{
    describe::{describe_sanitize_arg, last_argument_for_mask},
    diagnostic::{Diagnostic, DiagnosticCode, Subject},
    mask::{parse_arg_values, SanitizerMask},
    options::{Arg, OptId},
    toolchain::RttiMode,
};

type M = SanitizerMask;

/// Pairs of kinds that cannot be combined. When both sides are enabled the
/// second side is dropped. Earlier pairs take priority over later ones.
const INCOMPATIBLE_GROUPS: &[(M, M)] = &[
    (M::ADDRESS, M::THREAD),
    (M::ADDRESS, M::MEMORY),
    (M::THREAD, M::MEMORY),
    (M::LEAK, M::THREAD),
    (M::LEAK, M::MEMORY),
    (M::KERNEL_ADDRESS, M::ADDRESS),
    (M::KERNEL_ADDRESS, M::LEAK),
    (M::KERNEL_ADDRESS, M::THREAD),
    (M::KERNEL_ADDRESS, M::MEMORY),
    (M::EFFICIENCY, M::ADDRESS),
    (M::EFFICIENCY, M::LEAK),
    (M::EFFICIENCY, M::THREAD),
    (M::EFFICIENCY, M::MEMORY),
    (M::EFFICIENCY, M::KERNEL_ADDRESS),
];

pub(crate) struct Kinds {
    pub(crate) enabled: SanitizerMask,
    /// Every kind some `-fsanitize=` asked for, including kinds that were
    /// later disabled or dropped.
    pub(crate) all_added: SanitizerMask,
}

struct KindPolicy {
    supported: SanitizerMask,
    invalid_trapping: SanitizerMask,
    diagnosed: SanitizerMask,
    all_added: SanitizerMask,
}

impl LastWinsPolicy for KindPolicy {
    fn classify(&mut self, ctx: &mut ResolveCtx<'_>, arg: &Arg) -> Option<Toggle> {
        match arg.id {
            OptId::Sanitize => {
                let add = parse_arg_values(arg, &mut ctx.report);
                self.all_added |= add.expand_groups();
                Some(Toggle::Enable(add))
            }
            OptId::NoSanitize => Some(Toggle::Disable(parse_arg_values(arg, &mut ctx.report))),
            _ => None,
        }
    }

    fn admit(
        &mut self,
        ctx: &mut ResolveCtx<'_>,
        arg: &Arg,
        add: SanitizerMask,
        removed: &mut SanitizerMask,
    ) -> SanitizerMask {
        let mut add = add;

        // Groups are still unexpanded here, so whatever gets diagnosed was
        // named explicitly.
        let to_diagnose = add & self.invalid_trapping & !self.diagnosed;
        if !to_diagnose.is_empty() {
            ctx.emit(
                Diagnostic::error(
                    DiagnosticCode::IncompatibleWithTrapping,
                    format!(
                        "invalid argument '{}' not allowed with '-fsanitize-trap=undefined'",
                        describe_sanitize_arg(arg, to_diagnose)
                    ),
                    Subject::Kinds(to_diagnose),
                )
                .at(arg.index),
            );
            self.diagnosed |= to_diagnose;
        }
        add -= self.invalid_trapping;

        let to_diagnose = add & !self.supported & !self.diagnosed;
        if !to_diagnose.is_empty() {
            ctx.emit(
                Diagnostic::error(
                    DiagnosticCode::UnsupportedOnTarget,
                    format!(
                        "unsupported option '{}' for target '{}'",
                        describe_sanitize_arg(arg, to_diagnose),
                        ctx.triple()
                    ),
                    Subject::Kinds(to_diagnose),
                )
                .at(arg.index),
            );
            self.diagnosed |= to_diagnose;
        }
        add &= self.supported;

        // Checked before expansion so that `undefined` with RTTI off only
        // loses vptr silently.
        if add.intersects(M::VPTR) && ctx.toolchain.rtti_disabled() {
            let diagnostic = match ctx.toolchain.rtti_mode {
                RttiMode::DisabledImplicitly => Diagnostic::warning(
                    DiagnosticCode::RttiConflict,
                    "implicitly disabling vptr sanitizer because rtti wasn't enabled",
                    Subject::Kinds(M::VPTR),
                ),
                _ => Diagnostic::error(
                    DiagnosticCode::RttiConflict,
                    format!(
                        "invalid argument '-fsanitize=vptr' not allowed with '{}'",
                        ctx.toolchain.rtti_arg.as_deref().unwrap_or("-fno-rtti")
                    ),
                    Subject::Kinds(M::VPTR),
                ),
            };
            ctx.emit(diagnostic.at(arg.index));
            *removed |= M::VPTR;
        }

        add = add.expand_groups();
        add -= *removed;
        add -= self.invalid_trapping;
        add & self.supported
    }
}

pub(crate) fn resolve_kinds(ctx: &mut ResolveCtx<'_>, trapping: SanitizerMask) -> Kinds {
    let supported = ctx.toolchain.supported.set_group_bits();
    let mut policy = KindPolicy {
        supported,
        invalid_trapping: trapping & NOT_ALLOWED_WITH_TRAP,
        diagnosed: M::empty(),
        all_added: M::empty(),
    };
    let result = last_wins::scan(ctx, &mut policy);
    let mut kinds = result.enabled;

    kinds |= ctx.toolchain.default_sanitizers & supported & !result.removed;

    // vptr may still come from group expansion or defaults.
    if kinds.intersects(M::VPTR) && ctx.toolchain.rtti_disabled() {
        kinds -= M::VPTR;
    }

    if kinds.intersects(NEEDS_LTO) && !ctx.cfg.lto {
        let needs_lto = kinds & NEEDS_LTO;
        ctx.emit(Diagnostic::error(
            DiagnosticCode::MissingLto,
            format!(
                "invalid argument '{}' only allowed with '-flto'",
                last_argument_for_mask(ctx.args, needs_lto)
            ),
            Subject::Kinds(needs_lto),
        ));
    }

    // Without vptr support the target has no C++ ABI aware UBSan runtime.
    // Windows gets CFI anyway.
    if !supported.contains(M::VPTR) {
        let mut to_diagnose = kinds & !trapping & NEEDS_UBSAN_CXX_RT;
        if ctx.toolchain.triple.is_os_windows() {
            to_diagnose -= M::CFI;
        }
        if !to_diagnose.is_empty() {
            ctx.emit(Diagnostic::error(
                DiagnosticCode::UnsupportedAbiRuntime,
                format!(
                    "unsupported option '-fno-sanitize-trap={to_diagnose}' for target '{}'",
                    ctx.triple()
                ),
                Subject::Kinds(to_diagnose),
            ));
            kinds -= to_diagnose;
        }
    }

    for &(group, conflicting) in INCOMPATIBLE_GROUPS {
        if !kinds.intersects(group) {
            continue;
        }
        let incompatible = kinds & conflicting;
        if incompatible.is_empty() {
            continue;
        }

        ctx.emit(
            Diagnostic::error(
                DiagnosticCode::MutuallyExclusiveKinds,
                format!(
                    "invalid argument '{}' not allowed with '{}'",
                    last_argument_for_mask(ctx.args, group),
                    last_argument_for_mask(ctx.args, incompatible)
                ),
                Subject::Kinds(incompatible),
            )
            .with_note(format!("disabling '{incompatible}'")),
        );
        kinds -= incompatible;
    }

    if kinds.intersects(CFI_CLASSES)
        && !ctx.toolchain.triple.is_os_windows()
        && !ctx.args.has_arg(OptId::VisibilityEq)
    {
        let classes = kinds & CFI_CLASSES;
        ctx.emit(Diagnostic::error(
            DiagnosticCode::MissingVisibility,
            format!(
                "invalid argument '{}' only allowed with '-fvisibility='",
                last_argument_for_mask(ctx.args, classes)
            ),
            Subject::Kinds(classes),
        ));
    }

    debug!(
        enabled = %kinds,
        all_added = %policy.all_added,
        removed = %result.removed,
        "resolved sanitizer kinds"
    );

    Kinds {
        enabled: kinds,
        all_added: policy.all_added,
    }
}
