//! Settings that only matter once a particular sanitizer was asked for.
//!
//! Gating uses every kind ever named by `-fsanitize=`, so that sub-options
//! of a sanitizer disabled later are still consumed without complaint.

use tracing::debug;

use super::ResolveCtx;
use crate::{
    describe::last_argument_for_mask,
    diagnostic::{Diagnostic, DiagnosticCode, Subject},
    mask::SanitizerMask,
    options::{parse_integer, Arg, OptId},
};

#[derive(Debug, Default)]
pub(crate) struct MemorySettings {
    pub(crate) track_origins: i32,
    pub(crate) use_after_dtor: bool,
}

#[derive(Debug, Default)]
pub(crate) struct AddressSettings {
    pub(crate) shared_runtime: bool,
    pub(crate) field_padding: i32,
}

/// Parses a level in `0..=2`. Out-of-range values are reported and kept;
/// unparsable ones are reported and leave `current` unchanged.
fn parse_level(ctx: &mut ResolveCtx<'_>, arg: &Arg, current: i32) -> i32 {
    let value = arg.value();
    let parsed = parse_integer(value).and_then(|level| i32::try_from(level).ok());

    if !matches!(parsed, Some(0..=2)) {
        ctx.emit(
            Diagnostic::error(
                DiagnosticCode::InvalidNumericValue,
                format!("invalid value '{value}' in '{}'", arg.as_str()),
                Subject::Value(arg.as_str().into()),
            )
            .at(arg.index),
        );
    }

    parsed.unwrap_or(current)
}

pub(crate) fn memory_settings(
    ctx: &mut ResolveCtx<'_>,
    all_added: SanitizerMask,
    need_pie: &mut bool,
) -> MemorySettings {
    let mut settings = MemorySettings::default();
    if !all_added.intersects(SanitizerMask::MEMORY) {
        return settings;
    }

    let args = ctx.args;
    if let Some(arg) = args.last_arg(&[
        OptId::TrackOriginsEq,
        OptId::TrackOrigins,
        OptId::NoTrackOrigins,
    ]) {
        settings.track_origins = match arg.id {
            OptId::TrackOrigins => 2,
            OptId::NoTrackOrigins => 0,
            _ => parse_level(ctx, arg, settings.track_origins),
        };
    }
    settings.use_after_dtor = args.has_arg(OptId::UseAfterDtor);

    let triple = &ctx.toolchain.triple;
    *need_pie |= !(triple.is_os_linux() && triple.architecture.is_x86_64());

    debug!(?settings, "memory sanitizer settings");
    settings
}

pub(crate) fn cfi_cross_dso(
    ctx: &ResolveCtx<'_>,
    all_added: SanitizerMask,
    need_pie: &mut bool,
) -> bool {
    if !all_added.intersects(SanitizerMask::CFI) {
        return false;
    }

    let cross_dso = ctx.args.has_flag(
        OptId::CfiCrossDso,
        OptId::NoCfiCrossDso,
        ctx.toolchain.cfi_cross_dso_default,
    );
    // A PLT entry in place of the real address cannot be checked across
    // modules.
    *need_pie |= cross_dso;
    cross_dso
}

pub(crate) fn stats(ctx: &ResolveCtx<'_>) -> bool {
    ctx.args
        .has_flag(OptId::SanitizeStats, OptId::NoSanitizeStats, false)
}

pub(crate) fn address_settings(
    ctx: &mut ResolveCtx<'_>,
    all_added: SanitizerMask,
    need_pie: &mut bool,
) -> AddressSettings {
    let mut settings = AddressSettings::default();
    if !all_added.intersects(SanitizerMask::ADDRESS) {
        return settings;
    }

    let args = ctx.args;
    let android = ctx.toolchain.triple.is_android();
    settings.shared_runtime = args.has_arg(OptId::SharedLibasan) || android;
    *need_pie |= android;

    if let Some(arg) = args.last_arg(&[OptId::AddressFieldPadding]) {
        settings.field_padding = parse_level(ctx, arg, settings.field_padding);
    }

    let runtime = args.last_arg(&[
        OptId::RuntimeMtd,
        OptId::RuntimeMt,
        OptId::RuntimeMdd,
        OptId::RuntimeMd,
        OptId::RuntimeLdd,
        OptId::RuntimeLd,
    ]);
    if let Some(arg) = runtime {
        if matches!(
            arg.id,
            OptId::RuntimeMtd | OptId::RuntimeMdd | OptId::RuntimeLdd
        ) {
            ctx.emit(
                Diagnostic::error(
                    DiagnosticCode::DebugRuntimeConflict,
                    format!(
                        "invalid argument '{}' not allowed with '{}'",
                        arg.as_str(),
                        last_argument_for_mask(args, SanitizerMask::ADDRESS)
                    ),
                    Subject::Value(arg.as_str().into()),
                )
                .at(arg.index)
                .with_note("AddressSanitizer doesn't support linking with debug runtime libraries yet"),
            );
        }
    }

    debug!(?settings, "address sanitizer settings");
    settings
}

pub(crate) fn link_cxx_runtimes(ctx: &ResolveCtx<'_>) -> bool {
    ctx.args.has_arg(OptId::LinkCxxRuntime) || ctx.cfg.is_cxx()
}
