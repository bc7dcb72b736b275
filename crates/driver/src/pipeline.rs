use rayon::prelude::*;
use thiserror::Error;

use crate::{
    config::DriverConfig,
    options::{ArgList, OptionError},
    report::ResolutionReport,
    resolve::{resolve, Resolution},
    toolchain::Toolchain,
};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("option parsing failed with {} error(s)", .0.len())]
    Parse(Vec<OptionError>),
    #[error("sanitizer resolution failed: {0}")]
    Rejected(ResolutionReport),
}

/// Resolves `args` after letting the toolchain and driver config pick up the
/// options they own (`-fno-rtti`, `-flto`, ...).
pub fn resolve_with_args(toolchain: &Toolchain, cfg: &DriverConfig, args: &ArgList) -> Resolution {
    let toolchain = toolchain.clone().with_args(args);
    let cfg = cfg.clone().with_args(args);
    resolve(&toolchain, &cfg, args)
}

/// Parses and resolves one command line, failing on any error diagnostic.
pub fn parse_and_resolve<I, S>(
    toolchain: &Toolchain,
    cfg: &DriverConfig,
    input: I,
) -> Result<Resolution, ResolveError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args = ArgList::parse(input).map_err(ResolveError::Parse)?;
    let resolution = resolve_with_args(toolchain, cfg, &args);
    if resolution.report.has_errors() {
        return Err(ResolveError::Rejected(resolution.report));
    }
    Ok(resolution)
}

/// Resolves independent command lines in parallel. Results keep the order of
/// `jobs`.
pub fn resolve_jobs(toolchain: &Toolchain, cfg: &DriverConfig, jobs: &[ArgList]) -> Vec<Resolution> {
    jobs.par_iter()
        .map(|args| resolve_with_args(toolchain, cfg, args))
        .collect()
}
