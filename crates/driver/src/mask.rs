//! Sanitizer kinds and the group-structured mask over them.
//!
//! Every individually selectable kind owns one bit. Groups (`undefined`,
//! `cfi`, `integer`, ...) own a synthetic bit of their own plus a static
//! member mask; [`SanitizerMask::expand_groups`] and
//! [`SanitizerMask::set_group_bits`] translate between the two views.

use std::fmt;

use bitflags::bitflags;

use crate::{
    diagnostic::{Diagnostic, DiagnosticCode, Subject},
    options::{Arg, OptId},
    report::ResolutionReport,
};

bitflags! {
    /// A set of sanitizer kinds, possibly including group bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SanitizerMask: u64 {
        const ADDRESS                   = 1 << 0;
        const KERNEL_ADDRESS            = 1 << 1;
        const MEMORY                    = 1 << 2;
        const THREAD                    = 1 << 3;
        const LEAK                      = 1 << 4;
        const ALIGNMENT                 = 1 << 5;
        const ARRAY_BOUNDS              = 1 << 6;
        const BOOL                      = 1 << 7;
        const ENUM                      = 1 << 8;
        const FLOAT_CAST_OVERFLOW       = 1 << 9;
        const FLOAT_DIVIDE_BY_ZERO      = 1 << 10;
        const FUNCTION                  = 1 << 11;
        const INTEGER_DIVIDE_BY_ZERO    = 1 << 12;
        const NONNULL_ATTRIBUTE         = 1 << 13;
        const NULL                      = 1 << 14;
        const OBJECT_SIZE               = 1 << 15;
        const RETURN                    = 1 << 16;
        const RETURNS_NONNULL_ATTRIBUTE = 1 << 17;
        const SHIFT_BASE                = 1 << 18;
        const SHIFT_EXPONENT            = 1 << 19;
        const SIGNED_INTEGER_OVERFLOW   = 1 << 20;
        const UNREACHABLE               = 1 << 21;
        const VLA_BOUND                 = 1 << 22;
        const VPTR                      = 1 << 23;
        const UNSIGNED_INTEGER_OVERFLOW = 1 << 24;
        const DATAFLOW                  = 1 << 25;
        const CFI_CAST_STRICT           = 1 << 26;
        const CFI_DERIVED_CAST          = 1 << 27;
        const CFI_ICALL                 = 1 << 28;
        const CFI_UNRELATED_CAST        = 1 << 29;
        const CFI_NVCALL                = 1 << 30;
        const CFI_VCALL                 = 1 << 31;
        const SAFE_STACK                = 1 << 32;
        const SAFE_INIT                 = 1 << 33;
        const LOCAL_BOUNDS              = 1 << 34;
        const EFFICIENCY_CACHE_FRAG     = 1 << 35;
        const EFFICIENCY_WORKING_SET    = 1 << 36;

        const SHIFT_GROUP               = 1 << 40;
        const CFI_GROUP                 = 1 << 41;
        const UNDEFINED_GROUP           = 1 << 42;
        const UNDEFINED_TRAP_GROUP      = 1 << 43;
        const INTEGER_GROUP             = 1 << 44;
        const BOUNDS_GROUP              = 1 << 45;
        const EFFICIENCY_GROUP          = 1 << 46;
        const ALL_GROUP                 = 1 << 47;
    }
}

impl SanitizerMask {
    pub const SHIFT: Self = Self::SHIFT_BASE.union(Self::SHIFT_EXPONENT);

    pub const CFI: Self = Self::CFI_DERIVED_CAST
        .union(Self::CFI_ICALL)
        .union(Self::CFI_UNRELATED_CAST)
        .union(Self::CFI_NVCALL)
        .union(Self::CFI_VCALL);

    pub const UNDEFINED: Self = Self::ALIGNMENT
        .union(Self::BOOL)
        .union(Self::ARRAY_BOUNDS)
        .union(Self::ENUM)
        .union(Self::FLOAT_CAST_OVERFLOW)
        .union(Self::FLOAT_DIVIDE_BY_ZERO)
        .union(Self::INTEGER_DIVIDE_BY_ZERO)
        .union(Self::NONNULL_ATTRIBUTE)
        .union(Self::NULL)
        .union(Self::OBJECT_SIZE)
        .union(Self::RETURN)
        .union(Self::RETURNS_NONNULL_ATTRIBUTE)
        .union(Self::SHIFT)
        .union(Self::SIGNED_INTEGER_OVERFLOW)
        .union(Self::UNREACHABLE)
        .union(Self::VLA_BOUND)
        .union(Self::FUNCTION)
        .union(Self::VPTR);

    pub const INTEGER: Self = Self::SIGNED_INTEGER_OVERFLOW
        .union(Self::UNSIGNED_INTEGER_OVERFLOW)
        .union(Self::SHIFT)
        .union(Self::INTEGER_DIVIDE_BY_ZERO);

    pub const BOUNDS: Self = Self::ARRAY_BOUNDS.union(Self::LOCAL_BOUNDS);

    pub const EFFICIENCY: Self = Self::EFFICIENCY_CACHE_FRAG.union(Self::EFFICIENCY_WORKING_SET);

    pub const GROUP_BITS: Self = Self::SHIFT_GROUP
        .union(Self::CFI_GROUP)
        .union(Self::UNDEFINED_GROUP)
        .union(Self::UNDEFINED_TRAP_GROUP)
        .union(Self::INTEGER_GROUP)
        .union(Self::BOUNDS_GROUP)
        .union(Self::EFFICIENCY_GROUP)
        .union(Self::ALL_GROUP);

    /// ORs in the members of every group whose bit is set. Group bits stay.
    pub fn expand_groups(self) -> Self {
        let mut kinds = self;
        for group in SANITIZER_GROUPS {
            if kinds.contains(group.bit) {
                kinds |= group.members;
            }
        }
        kinds
    }

    /// Sets the bit of every group that has at least one member in `self`.
    pub fn set_group_bits(self) -> Self {
        let mut kinds = self;
        for group in SANITIZER_GROUPS {
            if kinds.intersects(group.members) {
                kinds |= group.bit;
            }
        }
        kinds
    }

    /// The individual kinds of `self`, without group bits.
    pub fn kinds(self) -> Self {
        self.difference(Self::GROUP_BITS)
    }

    /// Names of the individual kinds in `self`, in declaration order.
    pub fn kind_names(self) -> impl Iterator<Item = &'static str> {
        SANITIZER_KINDS
            .iter()
            .filter(move |kind| self.contains(kind.mask))
            .map(|kind| kind.name)
    }
}

/// Comma-separated names of the individual kinds, group bits are not printed.
impl fmt::Display for SanitizerMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, name) in self.kind_names().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizerKind {
    pub name: &'static str,
    pub mask: SanitizerMask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizerGroup {
    pub name: &'static str,
    pub bit: SanitizerMask,
    pub members: SanitizerMask,
}

const fn kind(name: &'static str, mask: SanitizerMask) -> SanitizerKind {
    SanitizerKind { name, mask }
}

const fn group(name: &'static str, bit: SanitizerMask, members: SanitizerMask) -> SanitizerGroup {
    SanitizerGroup { name, bit, members }
}

/// Individually selectable kinds in declaration order. The order is also the
/// order in which masks are printed.
pub static SANITIZER_KINDS: &[SanitizerKind] = &[
    kind("address", SanitizerMask::ADDRESS),
    kind("kernel-address", SanitizerMask::KERNEL_ADDRESS),
    kind("memory", SanitizerMask::MEMORY),
    kind("thread", SanitizerMask::THREAD),
    kind("leak", SanitizerMask::LEAK),
    kind("alignment", SanitizerMask::ALIGNMENT),
    kind("array-bounds", SanitizerMask::ARRAY_BOUNDS),
    kind("bool", SanitizerMask::BOOL),
    kind("enum", SanitizerMask::ENUM),
    kind("float-cast-overflow", SanitizerMask::FLOAT_CAST_OVERFLOW),
    kind("float-divide-by-zero", SanitizerMask::FLOAT_DIVIDE_BY_ZERO),
    kind("function", SanitizerMask::FUNCTION),
    kind("integer-divide-by-zero", SanitizerMask::INTEGER_DIVIDE_BY_ZERO),
    kind("nonnull-attribute", SanitizerMask::NONNULL_ATTRIBUTE),
    kind("null", SanitizerMask::NULL),
    kind("object-size", SanitizerMask::OBJECT_SIZE),
    kind("return", SanitizerMask::RETURN),
    kind("returns-nonnull-attribute", SanitizerMask::RETURNS_NONNULL_ATTRIBUTE),
    kind("shift-base", SanitizerMask::SHIFT_BASE),
    kind("shift-exponent", SanitizerMask::SHIFT_EXPONENT),
    kind("signed-integer-overflow", SanitizerMask::SIGNED_INTEGER_OVERFLOW),
    kind("unreachable", SanitizerMask::UNREACHABLE),
    kind("vla-bound", SanitizerMask::VLA_BOUND),
    kind("vptr", SanitizerMask::VPTR),
    kind("unsigned-integer-overflow", SanitizerMask::UNSIGNED_INTEGER_OVERFLOW),
    kind("dataflow", SanitizerMask::DATAFLOW),
    kind("cfi-cast-strict", SanitizerMask::CFI_CAST_STRICT),
    kind("cfi-derived-cast", SanitizerMask::CFI_DERIVED_CAST),
    kind("cfi-icall", SanitizerMask::CFI_ICALL),
    kind("cfi-unrelated-cast", SanitizerMask::CFI_UNRELATED_CAST),
    kind("cfi-nvcall", SanitizerMask::CFI_NVCALL),
    kind("cfi-vcall", SanitizerMask::CFI_VCALL),
    kind("safe-stack", SanitizerMask::SAFE_STACK),
    kind("safe-init", SanitizerMask::SAFE_INIT),
    kind("local-bounds", SanitizerMask::LOCAL_BOUNDS),
    kind("efficiency-cache-frag", SanitizerMask::EFFICIENCY_CACHE_FRAG),
    kind("efficiency-working-set", SanitizerMask::EFFICIENCY_WORKING_SET),
];

/// Group bit to member mask. Members never contain group bits except for
/// `all`, which covers every bit.
pub static SANITIZER_GROUPS: &[SanitizerGroup] = &[
    group("shift", SanitizerMask::SHIFT_GROUP, SanitizerMask::SHIFT),
    group("cfi", SanitizerMask::CFI_GROUP, SanitizerMask::CFI),
    group("undefined", SanitizerMask::UNDEFINED_GROUP, SanitizerMask::UNDEFINED),
    // Deprecated alias of `undefined`.
    group(
        "undefined-trap",
        SanitizerMask::UNDEFINED_TRAP_GROUP,
        SanitizerMask::UNDEFINED,
    ),
    group("integer", SanitizerMask::INTEGER_GROUP, SanitizerMask::INTEGER),
    group("bounds", SanitizerMask::BOUNDS_GROUP, SanitizerMask::BOUNDS),
    group(
        "efficiency-all",
        SanitizerMask::EFFICIENCY_GROUP,
        SanitizerMask::EFFICIENCY,
    ),
    group("all", SanitizerMask::ALL_GROUP, SanitizerMask::all()),
];

/// Maps one value token to its mask. Group names map to the group bit when
/// `allow_groups` is set. Unknown names map to the empty mask.
pub fn parse_sanitizer_value(value: &str, allow_groups: bool) -> SanitizerMask {
    if let Some(kind) = SANITIZER_KINDS.iter().find(|kind| kind.name == value) {
        return kind.mask;
    }

    if allow_groups {
        if let Some(group) = SANITIZER_GROUPS.iter().find(|group| group.name == value) {
            return group.bit;
        }
    }

    SanitizerMask::empty()
}

/// Parses every value of a sanitizer list option. Unknown names are
/// reported and skipped.
pub fn parse_arg_values(arg: &Arg, report: &mut ResolutionReport) -> SanitizerMask {
    parse_values(arg, Some(report))
}

/// [`parse_arg_values`] without diagnostics.
pub fn parse_arg_values_quiet(arg: &Arg) -> SanitizerMask {
    parse_values(arg, None)
}

fn parse_values(arg: &Arg, mut report: Option<&mut ResolutionReport>) -> SanitizerMask {
    let mut kinds = SanitizerMask::empty();

    for value in &arg.values {
        // `all` is a valid group everywhere except as a selector.
        let rejected =
            arg.id == OptId::Sanitize && matches!(value.as_str(), "all" | "efficiency-all");
        let parsed = if rejected {
            SanitizerMask::empty()
        } else {
            parse_sanitizer_value(value, true)
        };

        if !parsed.is_empty() {
            kinds |= parsed;
        } else if let Some(report) = report.as_deref_mut() {
            report.push(
                Diagnostic::error(
                    DiagnosticCode::UnknownOption,
                    format!(
                        "unsupported argument '{value}' to option '{}'",
                        arg.id.name()
                    ),
                    Subject::Value(arg.spelling_of(value)),
                )
                .at(arg.index),
            );
        }
    }

    kinds
}
