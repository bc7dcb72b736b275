//! Per-target capabilities the resolver consults.

use std::path::{Path, PathBuf};

use sanitas_triple::{Architecture, Environment, Os, TargetTriple};
use smol_str::SmolStr;

use crate::{
    mask::SanitizerMask,
    options::{ArgList, OptId},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RttiMode {
    Enabled,
    /// Off because the target defaults to no RTTI.
    DisabledImplicitly,
    /// Off because the user asked for it.
    DisabledExplicitly,
}

/// Read-only description of what a target can do.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Toolchain {
    pub triple: TargetTriple,
    pub supported: SanitizerMask,
    pub default_sanitizers: SanitizerMask,
    pub rtti_mode: RttiMode,
    /// Spelling of the argument that disabled RTTI, if any.
    pub rtti_arg: Option<SmolStr>,
    pub cfi_cross_dso_default: bool,
}

impl Toolchain {
    pub fn new(triple: TargetTriple) -> Self {
        let supported = supported_sanitizers(&triple);
        let rtti_mode = if triple.is_ps4() {
            RttiMode::DisabledImplicitly
        } else {
            RttiMode::Enabled
        };

        Self {
            triple,
            supported,
            default_sanitizers: SanitizerMask::empty(),
            rtti_mode,
            rtti_arg: None,
            cfi_cross_dso_default: false,
        }
    }

    /// Applies `-frtti` / `-fno-rtti` from the command line.
    pub fn with_args(mut self, args: &ArgList) -> Self {
        match args.last_arg(&[OptId::Rtti, OptId::NoRtti]) {
            Some(arg) if arg.id == OptId::NoRtti => {
                self.rtti_mode = RttiMode::DisabledExplicitly;
                self.rtti_arg = Some(arg.as_str().into());
            }
            Some(_) => {
                self.rtti_mode = RttiMode::Enabled;
                self.rtti_arg = None;
            }
            None => {}
        }
        self
    }

    pub fn with_rtti_mode(mut self, mode: RttiMode, arg: Option<&str>) -> Self {
        self.rtti_mode = mode;
        self.rtti_arg = arg.map(SmolStr::from);
        self
    }

    pub fn with_default_sanitizers(mut self, defaults: SanitizerMask) -> Self {
        self.default_sanitizers = defaults;
        self
    }

    pub fn rtti_disabled(&self) -> bool {
        self.rtti_mode != RttiMode::Enabled
    }

    /// Path of a compiler runtime library under `resource_dir`.
    pub fn compiler_rt(&self, resource_dir: &Path, component: &str, shared: bool) -> PathBuf {
        let triple = &self.triple;
        let msvc_like =
            triple.is_windows_msvc_environment() || triple.is_windows_itanium_environment();

        let prefix = if msvc_like { "" } else { "lib" };
        let env = if triple.is_android() { "-android" } else { "" };
        let suffix = match (shared, triple.is_os_windows(), msvc_like) {
            (true, true, _) => ".dll",
            (true, false, _) => ".so",
            (false, _, true) => ".lib",
            (false, _, false) => ".a",
        };
        let arch = match (triple.architecture, triple.environment) {
            (Architecture::Arm, Some(Environment::GnuEabiHf)) => "armhf",
            (arch, _) => arch.compiler_rt_name(),
        };

        resource_dir
            .join("lib")
            .join(triple.os_lib_dir())
            .join(format!("{prefix}clang_rt.{component}-{arch}{env}{suffix}"))
    }
}

/// Sanitizers a target can instrument for, before any user options.
pub fn supported_sanitizers(triple: &TargetTriple) -> SanitizerMask {
    type M = SanitizerMask;

    let arch = triple.architecture;
    let x86 = arch.is_x86();
    let x86_64 = arch.is_x86_64();
    let mips64 = arch.is_mips64();

    let mut supported = M::UNDEFINED.difference(M::VPTR | M::FUNCTION)
        | M::CFI.difference(M::CFI_ICALL)
        | M::CFI_CAST_STRICT
        | M::UNSIGNED_INTEGER_OVERFLOW
        | M::LOCAL_BOUNDS;
    if x86 || x86_64 {
        supported |= M::CFI_ICALL;
    }

    match triple.os {
        Os::Linux => {
            let tier1 = x86_64 || mips64 || arch.is_aarch64();
            supported |= M::ADDRESS | M::KERNEL_ADDRESS | M::VPTR | M::SAFE_STACK | M::SAFE_INIT;
            if tier1 {
                supported |= M::DATAFLOW | M::LEAK;
            }
            if tier1 || arch.is_powerpc64() {
                supported |= M::THREAD | M::MEMORY;
            }
            if x86_64 {
                supported |= M::EFFICIENCY;
            }
            if x86 || x86_64 {
                supported |= M::FUNCTION;
            }
        }
        Os::MacOsx => {
            supported |= M::ADDRESS | M::VPTR | M::SAFE_STACK | M::FUNCTION;
            if x86_64 {
                supported |= M::THREAD;
            }
        }
        Os::Ios => supported |= M::ADDRESS,
        Os::FreeBsd => {
            supported |= M::ADDRESS | M::VPTR;
            if x86_64 || mips64 {
                supported |= M::LEAK | M::THREAD;
            }
            if x86 || x86_64 {
                supported |= M::SAFE_STACK;
            }
        }
        Os::NetBsd | Os::Ps4 => supported |= M::ADDRESS | M::VPTR,
        Os::Windows => supported |= M::ADDRESS,
        Os::None => {}
    }

    supported
}
