//! The backward scan shared by every enable/disable option family.
//!
//! Scanning from the last argument to the first while accumulating the
//! kinds disabled so far means an enable flag only contributes what no later
//! flag turns off again.

use tracing::trace;

use super::ResolveCtx;
use crate::{mask::SanitizerMask, options::Arg};

pub(crate) enum Toggle {
    Enable(SanitizerMask),
    Disable(SanitizerMask),
}

pub(crate) trait LastWinsPolicy {
    /// Maps `arg` to the kinds it enables or disables, unexpanded. `None`
    /// for arguments of other families.
    fn classify(&mut self, ctx: &mut ResolveCtx<'_>, arg: &Arg) -> Option<Toggle>;

    /// Filters the kinds an enable flag contributes. `add` has the kinds in
    /// `removed` already taken out but may still hold group bits. The
    /// returned mask is ORed into the result as is; the policy may grow
    /// `removed` for earlier arguments.
    fn admit(
        &mut self,
        ctx: &mut ResolveCtx<'_>,
        arg: &Arg,
        add: SanitizerMask,
        removed: &mut SanitizerMask,
    ) -> SanitizerMask;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LastWins {
    pub(crate) enabled: SanitizerMask,
    pub(crate) removed: SanitizerMask,
}

pub(crate) fn scan<P: LastWinsPolicy>(ctx: &mut ResolveCtx<'_>, policy: &mut P) -> LastWins {
    let mut result = LastWins::default();
    let args = ctx.args;

    for arg in args.iter().rev() {
        match policy.classify(ctx, arg) {
            Some(Toggle::Enable(kinds)) => {
                let add = kinds.difference(result.removed);
                let add = policy.admit(ctx, arg, add, &mut result.removed);
                trace!(arg = arg.as_str(), added = %add, "enable");
                result.enabled |= add;
            }
            Some(Toggle::Disable(kinds)) => {
                let kinds = kinds.expand_groups();
                trace!(arg = arg.as_str(), removed = %kinds, "disable");
                result.removed |= kinds;
            }
            None => {}
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use sanitas_triple::TargetTriple;

    use super::*;
    use crate::{
        config::DriverConfig,
        mask::parse_arg_values_quiet,
        options::{ArgList, OptId},
        toolchain::Toolchain,
    };

    /// Accepts everything, expanding groups.
    struct Plain;

    impl LastWinsPolicy for Plain {
        fn classify(&mut self, _ctx: &mut ResolveCtx<'_>, arg: &Arg) -> Option<Toggle> {
            match arg.id {
                OptId::Sanitize => Some(Toggle::Enable(parse_arg_values_quiet(arg))),
                OptId::NoSanitize => Some(Toggle::Disable(parse_arg_values_quiet(arg))),
                _ => None,
            }
        }

        fn admit(
            &mut self,
            _ctx: &mut ResolveCtx<'_>,
            _arg: &Arg,
            add: SanitizerMask,
            removed: &mut SanitizerMask,
        ) -> SanitizerMask {
            add.expand_groups().difference(*removed)
        }
    }

    fn run(args: &[&str]) -> LastWins {
        let tc = Toolchain::new(TargetTriple::parse("x86_64-unknown-linux-gnu").unwrap());
        let cfg = DriverConfig::default();
        let args = ArgList::parse(args).unwrap();
        let mut ctx = ResolveCtx::new(&tc, &cfg, &args);
        scan(&mut ctx, &mut Plain)
    }

    #[test]
    fn later_disable_wins() {
        let result = run(&["-fsanitize=address,thread", "-fno-sanitize=thread"]);
        assert_eq!(result.enabled, SanitizerMask::ADDRESS);
        assert_eq!(result.removed, SanitizerMask::THREAD);
    }

    #[test]
    fn later_enable_wins() {
        let result = run(&["-fno-sanitize=thread", "-fsanitize=thread"]);
        assert_eq!(result.enabled, SanitizerMask::THREAD);
    }

    #[test]
    fn disabling_a_member_carves_out_of_a_group() {
        let result = run(&["-fsanitize=shift", "-fno-sanitize=shift-base"]);
        assert_eq!(
            result.enabled,
            SanitizerMask::SHIFT_GROUP | SanitizerMask::SHIFT_EXPONENT
        );
    }
}
