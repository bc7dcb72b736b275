use std::path::PathBuf;

use crate::options::{ArgList, OptId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverMode {
    /// `clang`
    Gcc,
    /// `clang++`
    Gxx,
    /// `clang-cl`
    Cl,
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub mode: DriverMode,
    /// Root of the compiler's resource directory. Default blacklists and
    /// runtime libraries are looked up below it.
    pub resource_dir: PathBuf,
    pub lto: bool,
    /// Number of diagnostics after which warnings are dropped, 0 for no
    /// limit. Errors are always recorded.
    pub max_diagnostics: usize,
}

impl DriverConfig {
    pub fn for_mode(mode: DriverMode) -> Self {
        match mode {
            DriverMode::Gcc | DriverMode::Gxx => Self {
                mode,
                resource_dir: PathBuf::new(),
                lto: false,
                max_diagnostics: 0,
            },
            DriverMode::Cl => Self {
                mode,
                resource_dir: PathBuf::new(),
                lto: false,
                max_diagnostics: 100,
            },
        }
    }

    pub fn with_resource_dir(mut self, resource_dir: impl Into<PathBuf>) -> Self {
        self.resource_dir = resource_dir.into();
        self
    }

    /// Picks up `-flto[=...]` / `-fno-lto` from the command line.
    pub fn with_args(mut self, args: &ArgList) -> Self {
        if let Some(arg) = args.last_arg(&[OptId::Lto, OptId::LtoEq, OptId::NoLto]) {
            self.lto = arg.id != OptId::NoLto;
        }
        self
    }

    pub fn is_cxx(&self) -> bool {
        matches!(self.mode, DriverMode::Gxx)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::for_mode(DriverMode::Gcc)
    }
}
