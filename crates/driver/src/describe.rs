//! Renders the user-facing spelling of sanitizer arguments for diagnostics.

use crate::{
    mask::{parse_arg_values_quiet, parse_sanitizer_value, SanitizerMask},
    options::{Arg, ArgList, OptId},
};

/// `-fsanitize=` followed by only those values of `arg` that select a kind
/// in `mask`.
pub fn describe_sanitize_arg(arg: &Arg, mask: SanitizerMask) -> String {
    let values: Vec<&str> = arg
        .values
        .iter()
        .filter(|value| {
            parse_sanitizer_value(value, true)
                .expand_groups()
                .intersects(mask)
        })
        .map(|value| value.as_str())
        .collect();

    format!("-fsanitize={}", values.join(","))
}

/// The values of `arg` that name a kind or group in `mask`, comma-joined.
/// Groups are matched by their own bit, not by their members.
pub fn describe_values(arg: &Arg, mask: SanitizerMask) -> String {
    let values: Vec<&str> = arg
        .values
        .iter()
        .filter(|value| parse_sanitizer_value(value, true).intersects(mask))
        .map(|value| value.as_str())
        .collect();

    if values.is_empty() {
        mask.to_string()
    } else {
        values.join(",")
    }
}

/// Describes the last `-fsanitize=` that enabled a kind of `mask` and was
/// not overridden by a later `-fno-sanitize=`.
pub fn last_argument_for_mask(args: &ArgList, mask: SanitizerMask) -> String {
    let mut mask = mask;

    for arg in args.iter().rev() {
        match arg.id {
            OptId::Sanitize => {
                let added = parse_arg_values_quiet(arg).expand_groups();
                if added.intersects(mask) {
                    return describe_sanitize_arg(arg, mask);
                }
            }
            OptId::NoSanitize => {
                mask -= parse_arg_values_quiet(arg).expand_groups();
            }
            _ => {}
        }
    }

    // Kinds that come from toolchain defaults have no argument.
    format!("-fsanitize={mask}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_matching_values() {
        let args = ArgList::parse(["-fsanitize=address,undefined,thread"]).unwrap();
        let arg = args.iter().next().unwrap();
        assert_eq!(
            describe_sanitize_arg(arg, SanitizerMask::VPTR),
            "-fsanitize=undefined"
        );
        assert_eq!(
            describe_sanitize_arg(arg, SanitizerMask::ADDRESS | SanitizerMask::THREAD),
            "-fsanitize=address,thread"
        );
    }

    #[test]
    fn skips_arguments_disabled_later() {
        let args = ArgList::parse([
            "-fsanitize=address",
            "-fsanitize=thread",
            "-fno-sanitize=thread",
        ])
        .unwrap();
        assert_eq!(
            last_argument_for_mask(&args, SanitizerMask::ADDRESS | SanitizerMask::THREAD),
            "-fsanitize=address"
        );
    }

    #[test]
    fn falls_back_to_kind_names() {
        let args = ArgList::default();
        assert_eq!(
            last_argument_for_mask(&args, SanitizerMask::SAFE_STACK),
            "-fsanitize=safe-stack"
        );
    }
}
