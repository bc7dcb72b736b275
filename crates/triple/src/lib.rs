use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A target triple of the form `arch-vendor-os[-environment]`.
///
/// OS components may carry a version suffix (`macosx10.12`, `freebsd11`);
/// the suffix is accepted and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TargetTriple {
    pub architecture: Architecture,
    pub vendor: Vendor,
    pub os: Os,
    pub environment: Option<Environment>,
}

impl TargetTriple {
    pub fn new(
        architecture: Architecture,
        vendor: Vendor,
        os: Os,
        environment: Option<Environment>,
    ) -> Self {
        Self {
            architecture,
            vendor,
            os,
            environment,
        }
    }

    pub fn parse(s: &str) -> Result<Self, InvalidTriple<'_>> {
        let mut triple = s.split('-');

        let arch = Architecture::parse(triple.next().ok_or(InvalidTriple::InvalidFormat(s))?)?;
        let vendor = Vendor::parse(triple.next().ok_or(InvalidTriple::InvalidFormat(s))?)?;
        let os = Os::parse(triple.next().ok_or(InvalidTriple::InvalidFormat(s))?)?;
        let environment = triple.next().map(Environment::parse).transpose()?;

        if triple.next().is_some() {
            return Err(InvalidTriple::InvalidFormat(s));
        }

        let triple = Self::new(arch, vendor, os, environment);
        if triple.is_windows_msvc_environment() && !triple.is_os_windows() {
            return Err(InvalidTriple::InvalidCombination);
        }
        Ok(triple)
    }

    pub fn is_os_linux(&self) -> bool {
        self.os == Os::Linux
    }

    pub fn is_android(&self) -> bool {
        matches!(
            self.environment,
            Some(Environment::Android | Environment::AndroidEabi)
        )
    }

    pub fn is_os_windows(&self) -> bool {
        self.os == Os::Windows
    }

    pub fn is_windows_msvc_environment(&self) -> bool {
        self.environment == Some(Environment::Msvc)
    }

    pub fn is_windows_itanium_environment(&self) -> bool {
        self.is_os_windows() && self.environment == Some(Environment::Itanium)
    }

    pub fn is_os_darwin(&self) -> bool {
        matches!(self.os, Os::MacOsx | Os::Ios)
    }

    pub fn is_macosx(&self) -> bool {
        self.os == Os::MacOsx
    }

    pub fn is_ios(&self) -> bool {
        self.os == Os::Ios
    }

    pub fn is_os_freebsd(&self) -> bool {
        self.os == Os::FreeBsd
    }

    pub fn is_ps4(&self) -> bool {
        self.os == Os::Ps4
    }

    /// Directory name used for the compiler runtime libraries of this OS.
    pub fn os_lib_dir(&self) -> &'static str {
        match self.os {
            Os::Linux => "linux",
            Os::Windows => "windows",
            Os::MacOsx | Os::Ios => "darwin",
            Os::FreeBsd => "freebsd",
            Os::NetBsd => "netbsd",
            Os::Ps4 => "ps4",
            Os::None => "baremetal",
        }
    }
}

impl Display for TargetTriple {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.architecture, self.vendor, self.os)?;
        if let Some(env) = self.environment {
            write!(f, "-{env}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Architecture {
    X86,
    X86_64,
    Arm,
    AArch64,
    Mips,
    Mipsel,
    Mips64,
    Mips64el,
    PowerPc64,
    PowerPc64le,
}

impl Architecture {
    fn parse(s: &str) -> Result<Self, InvalidTriple<'_>> {
        let arch = match s {
            "i386" | "i486" | "i586" | "i686" | "x86" => Self::X86,
            "x86_64" | "amd64" => Self::X86_64,
            "aarch64" | "arm64" => Self::AArch64,
            "mips" => Self::Mips,
            "mipsel" => Self::Mipsel,
            "mips64" => Self::Mips64,
            "mips64el" => Self::Mips64el,
            "powerpc64" | "ppc64" => Self::PowerPc64,
            "powerpc64le" | "ppc64le" => Self::PowerPc64le,
            _ if s.starts_with("arm") || s.starts_with("thumb") => Self::Arm,
            _ => return Err(InvalidTriple::ArchitectureNotSupported),
        };
        Ok(arch)
    }

    pub fn is_x86(self) -> bool {
        self == Self::X86
    }

    pub fn is_x86_64(self) -> bool {
        self == Self::X86_64
    }

    pub fn is_mips64(self) -> bool {
        matches!(self, Self::Mips64 | Self::Mips64el)
    }

    pub fn is_powerpc64(self) -> bool {
        matches!(self, Self::PowerPc64 | Self::PowerPc64le)
    }

    pub fn is_aarch64(self) -> bool {
        self == Self::AArch64
    }

    /// Architecture component of compiler runtime library names.
    pub fn compiler_rt_name(self) -> &'static str {
        match self {
            Self::X86 => "i386",
            other => other.as_str(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::X86 => "i686",
            Self::X86_64 => "x86_64",
            Self::Arm => "arm",
            Self::AArch64 => "aarch64",
            Self::Mips => "mips",
            Self::Mipsel => "mipsel",
            Self::Mips64 => "mips64",
            Self::Mips64el => "mips64el",
            Self::PowerPc64 => "powerpc64",
            Self::PowerPc64le => "powerpc64le",
        }
    }
}

impl Display for Architecture {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Vendor {
    Unknown,
    Pc,
    Apple,
    Scei,
}

impl Vendor {
    fn parse(s: &str) -> Result<Self, InvalidTriple<'_>> {
        match s {
            "unknown" | "" => Ok(Self::Unknown),
            "pc" => Ok(Self::Pc),
            "apple" => Ok(Self::Apple),
            "scei" => Ok(Self::Scei),
            _ => Err(InvalidTriple::VendorNotSupported),
        }
    }
}

impl Display for Vendor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Pc => write!(f, "pc"),
            Self::Apple => write!(f, "apple"),
            Self::Scei => write!(f, "scei"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Os {
    Linux,
    Windows,
    MacOsx,
    Ios,
    FreeBsd,
    NetBsd,
    Ps4,
    None,
}

impl Os {
    fn parse(s: &str) -> Result<Self, InvalidTriple<'_>> {
        // Version suffixes such as `macosx10.12` or `freebsd11` are dropped.
        Self::from_name(s)
            .or_else(|| Self::from_name(strip_version(s)))
            .ok_or(InvalidTriple::OsNotSupported)
    }

    fn from_name(name: &str) -> Option<Self> {
        let os = match name {
            "linux" => Self::Linux,
            "windows" | "win32" => Self::Windows,
            "darwin" | "macosx" | "macos" => Self::MacOsx,
            "ios" => Self::Ios,
            "freebsd" => Self::FreeBsd,
            "netbsd" => Self::NetBsd,
            "ps4" => Self::Ps4,
            "none" | "unknown" => Self::None,
            _ => return None,
        };
        Some(os)
    }
}

impl Display for Os {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
            Self::MacOsx => write!(f, "macosx"),
            Self::Ios => write!(f, "ios"),
            Self::FreeBsd => write!(f, "freebsd"),
            Self::NetBsd => write!(f, "netbsd"),
            Self::Ps4 => write!(f, "ps4"),
            Self::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Environment {
    Gnu,
    GnuEabi,
    GnuEabiHf,
    Musl,
    Android,
    AndroidEabi,
    Msvc,
    Itanium,
    Eabi,
}

impl Environment {
    fn parse(s: &str) -> Result<Self, InvalidTriple<'_>> {
        let env = match strip_version(s) {
            "gnu" => Self::Gnu,
            "gnueabi" => Self::GnuEabi,
            "gnueabihf" => Self::GnuEabiHf,
            "musl" => Self::Musl,
            "android" => Self::Android,
            "androideabi" => Self::AndroidEabi,
            "msvc" => Self::Msvc,
            "itanium" => Self::Itanium,
            "eabi" => Self::Eabi,
            _ => return Err(InvalidTriple::EnvironmentNotSupported),
        };
        Ok(env)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gnu => write!(f, "gnu"),
            Self::GnuEabi => write!(f, "gnueabi"),
            Self::GnuEabiHf => write!(f, "gnueabihf"),
            Self::Musl => write!(f, "musl"),
            Self::Android => write!(f, "android"),
            Self::AndroidEabi => write!(f, "androideabi"),
            Self::Msvc => write!(f, "msvc"),
            Self::Itanium => write!(f, "itanium"),
            Self::Eabi => write!(f, "eabi"),
        }
    }
}

fn strip_version(s: &str) -> &str {
    s.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidTriple<'a> {
    #[error("the format of triple must be `arch-vendor-os[-environment]`: but got `{0}`")]
    InvalidFormat(&'a str),

    #[error("given architecture is not supported")]
    ArchitectureNotSupported,

    #[error("given vendor is not supported")]
    VendorNotSupported,

    #[error("given operating system is not supported")]
    OsNotSupported,

    #[error("given environment is not supported")]
    EnvironmentNotSupported,

    #[error("given triple consists of invalid combination")]
    InvalidCombination,
}
