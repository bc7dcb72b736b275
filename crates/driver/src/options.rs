//! The slice of the driver's option table that sanitizer resolution reads.
//!
//! Arguments keep their position in the original command line so that
//! last-wins scans and diagnostics can refer back to them. Anything not in
//! [`OPTIONS`] is skipped but still consumes a position.

use smallvec::SmallVec;
use smol_str::{format_smolstr, SmolStr};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OptId {
    Sanitize,
    NoSanitize,
    SanitizeRecover,
    NoSanitizeRecover,
    SanitizeRecoverEq,
    NoSanitizeRecoverEq,
    SanitizeTrap,
    NoSanitizeTrap,
    SanitizeTrapEq,
    NoSanitizeTrapEq,
    UndefinedTrapOnError,
    NoUndefinedTrapOnError,
    SanitizeCoverage,
    NoSanitizeCoverage,
    SanitizeBlacklist,
    NoSanitizeBlacklist,
    TrackOrigins,
    TrackOriginsEq,
    NoTrackOrigins,
    UseAfterDtor,
    CfiCrossDso,
    NoCfiCrossDso,
    SanitizeStats,
    NoSanitizeStats,
    AddressFieldPadding,
    LinkCxxRuntime,
    SharedLibasan,
    Rtti,
    NoRtti,
    Lto,
    LtoEq,
    NoLto,
    VisibilityEq,
    RuntimeMt,
    RuntimeMtd,
    RuntimeMd,
    RuntimeMdd,
    RuntimeLd,
    RuntimeLdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptKind {
    /// Exact spelling, no value.
    Flag,
    /// `-name=value`, the value must not be empty.
    Joined,
    /// `-name=value`, an empty value is allowed.
    JoinedOptional,
    /// `-name=a,b,c`, empty pieces are skipped.
    CommaJoined,
}

#[derive(Debug, Clone, Copy)]
pub struct OptInfo {
    pub id: OptId,
    pub spelling: &'static str,
    pub kind: OptKind,
}

const fn opt(id: OptId, spelling: &'static str, kind: OptKind) -> OptInfo {
    OptInfo { id, spelling, kind }
}

pub static OPTIONS: &[OptInfo] = &[
    opt(OptId::Sanitize, "-fsanitize=", OptKind::CommaJoined),
    opt(OptId::NoSanitize, "-fno-sanitize=", OptKind::CommaJoined),
    opt(OptId::SanitizeRecover, "-fsanitize-recover", OptKind::Flag),
    opt(OptId::NoSanitizeRecover, "-fno-sanitize-recover", OptKind::Flag),
    opt(OptId::SanitizeRecoverEq, "-fsanitize-recover=", OptKind::CommaJoined),
    opt(OptId::NoSanitizeRecoverEq, "-fno-sanitize-recover=", OptKind::CommaJoined),
    opt(OptId::SanitizeTrap, "-fsanitize-trap", OptKind::Flag),
    opt(OptId::NoSanitizeTrap, "-fno-sanitize-trap", OptKind::Flag),
    opt(OptId::SanitizeTrapEq, "-fsanitize-trap=", OptKind::CommaJoined),
    opt(OptId::NoSanitizeTrapEq, "-fno-sanitize-trap=", OptKind::CommaJoined),
    opt(OptId::UndefinedTrapOnError, "-fsanitize-undefined-trap-on-error", OptKind::Flag),
    opt(OptId::NoUndefinedTrapOnError, "-fno-sanitize-undefined-trap-on-error", OptKind::Flag),
    opt(OptId::SanitizeCoverage, "-fsanitize-coverage=", OptKind::CommaJoined),
    opt(OptId::NoSanitizeCoverage, "-fno-sanitize-coverage=", OptKind::CommaJoined),
    opt(OptId::SanitizeBlacklist, "-fsanitize-blacklist=", OptKind::Joined),
    opt(OptId::NoSanitizeBlacklist, "-fno-sanitize-blacklist", OptKind::Flag),
    opt(OptId::TrackOrigins, "-fsanitize-memory-track-origins", OptKind::Flag),
    opt(OptId::TrackOriginsEq, "-fsanitize-memory-track-origins=", OptKind::Joined),
    opt(OptId::NoTrackOrigins, "-fno-sanitize-memory-track-origins", OptKind::Flag),
    opt(OptId::UseAfterDtor, "-fsanitize-memory-use-after-dtor", OptKind::Flag),
    opt(OptId::CfiCrossDso, "-fsanitize-cfi-cross-dso", OptKind::Flag),
    opt(OptId::NoCfiCrossDso, "-fno-sanitize-cfi-cross-dso", OptKind::Flag),
    opt(OptId::SanitizeStats, "-fsanitize-stats", OptKind::Flag),
    opt(OptId::NoSanitizeStats, "-fno-sanitize-stats", OptKind::Flag),
    opt(OptId::AddressFieldPadding, "-fsanitize-address-field-padding=", OptKind::Joined),
    opt(OptId::LinkCxxRuntime, "-fsanitize-link-c++-runtime", OptKind::Flag),
    opt(OptId::LinkCxxRuntime, "-fsanitize-link-cxx-runtime", OptKind::Flag),
    opt(OptId::SharedLibasan, "-shared-libasan", OptKind::Flag),
    opt(OptId::Rtti, "-frtti", OptKind::Flag),
    opt(OptId::NoRtti, "-fno-rtti", OptKind::Flag),
    opt(OptId::Lto, "-flto", OptKind::Flag),
    opt(OptId::LtoEq, "-flto=", OptKind::JoinedOptional),
    opt(OptId::NoLto, "-fno-lto", OptKind::Flag),
    opt(OptId::VisibilityEq, "-fvisibility=", OptKind::Joined),
    opt(OptId::RuntimeMt, "/MT", OptKind::Flag),
    opt(OptId::RuntimeMt, "-MT", OptKind::Flag),
    opt(OptId::RuntimeMtd, "/MTd", OptKind::Flag),
    opt(OptId::RuntimeMtd, "-MTd", OptKind::Flag),
    opt(OptId::RuntimeMd, "/MD", OptKind::Flag),
    opt(OptId::RuntimeMd, "-MD", OptKind::Flag),
    opt(OptId::RuntimeMdd, "/MDd", OptKind::Flag),
    opt(OptId::RuntimeMdd, "-MDd", OptKind::Flag),
    opt(OptId::RuntimeLd, "/LD", OptKind::Flag),
    opt(OptId::RuntimeLd, "-LD", OptKind::Flag),
    opt(OptId::RuntimeLdd, "/LDd", OptKind::Flag),
    opt(OptId::RuntimeLdd, "-LDd", OptKind::Flag),
];

impl OptId {
    /// The option name as diagnostics spell it: the canonical spelling
    /// without its leading dash, e.g. `fsanitize=`.
    pub fn name(self) -> &'static str {
        OPTIONS
            .iter()
            .find(|info| info.id == self)
            .map(|info| {
                info.spelling
                    .strip_prefix('-')
                    .unwrap_or(info.spelling)
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("argument to '{option}' is missing (expected 1 value)")]
    MissingValue { option: &'static str, index: usize },
}

/// One recognised argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub id: OptId,
    pub values: SmallVec<[SmolStr; 4]>,
    /// Position in the original command line.
    pub index: usize,
    spelling: SmolStr,
}

impl Arg {
    pub fn new(id: OptId, spelling: impl Into<SmolStr>, index: usize) -> Self {
        Self {
            id,
            values: SmallVec::new(),
            index,
            spelling: spelling.into(),
        }
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.values.extend(values.into_iter().map(Into::into));
        self
    }

    /// The first value, or the empty string for flags.
    pub fn value(&self) -> &str {
        self.values.first().map(SmolStr::as_str).unwrap_or_default()
    }

    /// The argument as it appeared on the command line.
    pub fn as_str(&self) -> &str {
        &self.spelling
    }

    /// How `value` would be spelled if it had been passed to this option on
    /// its own, e.g. `-fsanitize=foo`.
    pub fn spelling_of(&self, value: &str) -> SmolStr {
        format_smolstr!("-{}{value}", self.id.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgList {
    args: Vec<Arg>,
}

impl ArgList {
    pub fn new(args: Vec<Arg>) -> Self {
        Self { args }
    }

    /// Parses a raw command line. All malformed arguments are reported, not
    /// just the first one.
    pub fn parse<I, S>(input: I) -> Result<Self, Vec<OptionError>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = Vec::new();
        let mut errors = Vec::new();

        for (index, raw) in input.into_iter().enumerate() {
            match parse_one(raw.as_ref(), index) {
                Ok(Some(arg)) => args.push(arg),
                Ok(None) => {}
                Err(err) => errors.push(err),
            }
        }

        if errors.is_empty() {
            Ok(Self { args })
        } else {
            Err(errors)
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arg> {
        self.args.iter()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn has_arg(&self, id: OptId) -> bool {
        self.args.iter().any(|arg| arg.id == id)
    }

    /// The last argument whose id is one of `ids`.
    pub fn last_arg(&self, ids: &[OptId]) -> Option<&Arg> {
        self.args.iter().rev().find(|arg| ids.contains(&arg.id))
    }

    /// Resolves a positive/negative flag pair by last occurrence.
    pub fn has_flag(&self, positive: OptId, negative: OptId, default: bool) -> bool {
        match self.last_arg(&[positive, negative]) {
            Some(arg) => arg.id == positive,
            None => default,
        }
    }
}

impl<'a> IntoIterator for &'a ArgList {
    type Item = &'a Arg;
    type IntoIter = std::slice::Iter<'a, Arg>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn parse_one(raw: &str, index: usize) -> Result<Option<Arg>, OptionError> {
    for info in OPTIONS {
        let value = match info.kind {
            OptKind::Flag => {
                if raw == info.spelling {
                    return Ok(Some(Arg::new(info.id, raw, index)));
                }
                continue;
            }
            _ => match raw.strip_prefix(info.spelling) {
                Some(value) => value,
                None => continue,
            },
        };

        let arg = Arg::new(info.id, raw, index);
        let arg = match info.kind {
            OptKind::Joined if value.is_empty() => {
                return Err(OptionError::MissingValue {
                    option: info.spelling,
                    index,
                });
            }
            OptKind::Joined | OptKind::JoinedOptional => arg.with_values([value]),
            OptKind::CommaJoined => arg.with_values(value.split(',').filter(|v| !v.is_empty())),
            OptKind::Flag => arg,
        };
        return Ok(Some(arg));
    }

    Ok(None)
}

/// Parses an integer with C-style radix detection: `0x` hex, `0b` binary,
/// a leading `0` octal, decimal otherwise. A leading `-` is accepted.
pub fn parse_integer(s: &str) -> Option<i64> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let (radix, digits) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (2, bin)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }

    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
