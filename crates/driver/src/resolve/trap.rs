use tracing::debug;

use super::{
    last_wins::{self, LastWinsPolicy, Toggle},
    ResolveCtx, TRAPPING_DEFAULT, TRAPPING_SUPPORTED,
};
use crate::{
    describe::describe_values,
    diagnostic::{Diagnostic, DiagnosticCode, Subject},
    mask::{parse_arg_values, SanitizerMask},
    options::{Arg, OptId},
};

struct TrapPolicy {
    supported: SanitizerMask,
}

impl LastWinsPolicy for TrapPolicy {
    fn classify(&mut self, ctx: &mut ResolveCtx<'_>, arg: &Arg) -> Option<Toggle> {
        let toggle = match arg.id {
            OptId::SanitizeTrapEq => Toggle::Enable(parse_arg_values(arg, &mut ctx.report)),
            OptId::NoSanitizeTrapEq => Toggle::Disable(parse_arg_values(arg, &mut ctx.report)),
            OptId::SanitizeTrap => Toggle::Enable(SanitizerMask::ALL_GROUP),
            OptId::NoSanitizeTrap => Toggle::Disable(SanitizerMask::ALL_GROUP),
            OptId::UndefinedTrapOnError => Toggle::Enable(SanitizerMask::UNDEFINED_GROUP),
            OptId::NoUndefinedTrapOnError => Toggle::Disable(SanitizerMask::UNDEFINED_GROUP),
            _ => return None,
        };
        Some(toggle)
    }

    fn admit(
        &mut self,
        ctx: &mut ResolveCtx<'_>,
        arg: &Arg,
        add: SanitizerMask,
        removed: &mut SanitizerMask,
    ) -> SanitizerMask {
        let invalid = add.difference(self.supported);
        if !invalid.is_empty() {
            let values = describe_values(arg, invalid);
            ctx.emit(
                Diagnostic::error(
                    DiagnosticCode::UnsupportedTrapValue,
                    format!("unsupported argument '{values}' to option '-fsanitize-trap'"),
                    Subject::Kinds(invalid),
                )
                .at(arg.index),
            );
        }

        (add & self.supported).expand_groups().difference(*removed)
    }
}

/// Kinds that trap instead of calling into a runtime, before intersecting
/// with the enabled kinds.
pub(crate) fn resolve_trapping(ctx: &mut ResolveCtx<'_>) -> SanitizerMask {
    let mut policy = TrapPolicy {
        supported: TRAPPING_SUPPORTED.set_group_bits(),
    };
    let result = last_wins::scan(ctx, &mut policy);
    let trapping = result.enabled | TRAPPING_DEFAULT.difference(result.removed);

    debug!(trapping = %trapping, "resolved trapping kinds");
    trapping
}
