use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::ResolveCtx;
use crate::{
    diagnostic::{Diagnostic, DiagnosticCode, Subject},
    mask::SanitizerMask,
    options::OptId,
    special_case_list::SpecialCaseList,
};

/// Default blacklist per sanitizer, by priority.
const DEFAULT_BLACKLISTS: &[(SanitizerMask, &str)] = &[
    (SanitizerMask::ADDRESS, "asan_blacklist.txt"),
    (SanitizerMask::MEMORY, "msan_blacklist.txt"),
    (SanitizerMask::THREAD, "tsan_blacklist.txt"),
    (SanitizerMask::DATAFLOW, "dfsan_abilist.txt"),
    (SanitizerMask::CFI, "cfi_blacklist.txt"),
];

pub(crate) struct Blacklists {
    pub(crate) files: Vec<PathBuf>,
    /// User-supplied files the compilation depends on.
    pub(crate) deps: Vec<PathBuf>,
}

fn default_blacklist(kinds: SanitizerMask) -> Option<&'static str> {
    DEFAULT_BLACKLISTS
        .iter()
        .find(|(mask, _)| kinds.intersects(*mask))
        .map(|(_, name)| *name)
}

/// Location of the default blacklist for `kinds`. Without a resource
/// directory there is nowhere to look.
fn default_blacklist_path(resource_dir: &Path, kinds: SanitizerMask) -> Option<PathBuf> {
    if resource_dir.as_os_str().is_empty() {
        return None;
    }
    default_blacklist(kinds).map(|name| resource_dir.join(name))
}

pub(crate) fn resolve_blacklists(ctx: &mut ResolveCtx<'_>, kinds: SanitizerMask) -> Blacklists {
    let mut files = Vec::new();
    let mut deps = Vec::new();

    if let Some(path) = default_blacklist_path(&ctx.cfg.resource_dir, kinds) {
        if path.exists() {
            files.push(path);
        } else {
            trace!(path = %path.display(), "no default blacklist");
        }
    }

    let args = ctx.args;
    for arg in args {
        match arg.id {
            OptId::SanitizeBlacklist => {
                let path = PathBuf::from(arg.value());
                if path.exists() {
                    files.push(path.clone());
                    deps.push(path);
                } else {
                    ctx.emit(
                        Diagnostic::error(
                            DiagnosticCode::BlacklistFileMissing,
                            format!("no such file or directory: '{}'", path.display()),
                            Subject::File(path),
                        )
                        .at(arg.index),
                    );
                }
            }
            OptId::NoSanitizeBlacklist => {
                files.clear();
                deps.clear();
            }
            _ => {}
        }
    }

    match SpecialCaseList::create(&files) {
        Ok(list) => trace!(patterns = list.len(), "loaded blacklists"),
        Err(err) => {
            let message = err.to_string();
            ctx.emit(Diagnostic::error(
                DiagnosticCode::BlacklistMalformed,
                format!("malformed sanitizer blacklist: '{message}'"),
                Subject::Value(message.into()),
            ));
        }
    }

    debug!(files = files.len(), deps = deps.len(), "resolved blacklists");
    Blacklists { files, deps }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use sanitas_triple::TargetTriple;

    use super::*;
    use crate::{config::DriverConfig, options::ArgList, toolchain::Toolchain};

    fn run(
        resource_dir: &Path,
        kinds: SanitizerMask,
        args: &[String],
    ) -> (Blacklists, Vec<String>) {
        let tc = Toolchain::new(TargetTriple::parse("x86_64-unknown-linux-gnu").unwrap());
        let cfg = DriverConfig::default().with_resource_dir(resource_dir);
        let args = ArgList::parse(args).unwrap();
        let mut ctx = ResolveCtx::new(&tc, &cfg, &args);
        let blacklists = resolve_blacklists(&mut ctx, kinds);
        let messages = ctx
            .report
            .diagnostics
            .iter()
            .map(|d| d.message.clone())
            .collect();
        (blacklists, messages)
    }

    #[test]
    fn default_priority() {
        assert_eq!(
            default_blacklist(SanitizerMask::THREAD | SanitizerMask::CFI_ICALL),
            Some("tsan_blacklist.txt")
        );
        assert_eq!(
            default_blacklist(SanitizerMask::CFI_VCALL),
            Some("cfi_blacklist.txt")
        );
        assert_eq!(default_blacklist(SanitizerMask::NULL), None);
    }

    #[test]
    fn default_needs_a_resource_dir() {
        assert_eq!(default_blacklist_path(Path::new(""), SanitizerMask::ADDRESS), None);
        assert_eq!(
            default_blacklist_path(Path::new("/res"), SanitizerMask::ADDRESS),
            Some(PathBuf::from("/res/asan_blacklist.txt"))
        );
        assert_eq!(default_blacklist_path(Path::new("/res"), SanitizerMask::NULL), None);
    }

    #[test]
    fn default_file_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let (blacklists, messages) = run(dir.path(), SanitizerMask::ADDRESS, &[]);
        assert!(blacklists.files.is_empty());
        assert!(messages.is_empty());

        let default = dir.path().join("asan_blacklist.txt");
        fs::write(&default, "fun:main\n").unwrap();
        let (blacklists, _) = run(dir.path(), SanitizerMask::ADDRESS, &[]);
        assert_eq!(blacklists.files, [default]);
        assert!(blacklists.deps.is_empty());
    }

    #[test]
    fn user_files_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("mine.txt");
        fs::write(&user, "src:*.c\n").unwrap();
        let flag = format!("-fsanitize-blacklist={}", user.display());

        let (blacklists, messages) = run(dir.path(), SanitizerMask::ADDRESS, &[flag.clone()]);
        assert_eq!(blacklists.files, [user.clone()]);
        assert_eq!(blacklists.deps, [user.clone()]);
        assert!(messages.is_empty());

        let (blacklists, _) = run(
            dir.path(),
            SanitizerMask::ADDRESS,
            &[flag.clone(), "-fno-sanitize-blacklist".to_string()],
        );
        assert!(blacklists.files.is_empty());
        assert!(blacklists.deps.is_empty());

        let (blacklists, messages) = run(
            dir.path(),
            SanitizerMask::ADDRESS,
            &["-fno-sanitize-blacklist".to_string(), flag],
        );
        assert_eq!(blacklists.files, [user.clone()]);
        assert_eq!(blacklists.deps, [user]);
        assert!(messages.is_empty());
    }

    #[test]
    fn reset_drops_the_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("asan_blacklist.txt");
        fs::write(&default, "fun:main\n").unwrap();
        let user = dir.path().join("mine.txt");
        fs::write(&user, "src:*.c\n").unwrap();
        let flag = format!("-fsanitize-blacklist={}", user.display());

        let (blacklists, _) = run(
            dir.path(),
            SanitizerMask::ADDRESS,
            &["-fno-sanitize-blacklist".to_string()],
        );
        assert!(blacklists.files.is_empty());

        let (blacklists, _) = run(
            dir.path(),
            SanitizerMask::ADDRESS,
            &["-fno-sanitize-blacklist".to_string(), flag],
        );
        assert_eq!(blacklists.files, [user.clone()]);
        assert_eq!(blacklists.deps, [user]);
    }

    #[test]
    fn missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let broken = dir.path().join("broken.txt");
        fs::write(&broken, "fun:ok\nnope\n").unwrap();

        let (blacklists, messages) = run(
            dir.path(),
            SanitizerMask::empty(),
            &[
                format!("-fsanitize-blacklist={}", missing.display()),
                format!("-fsanitize-blacklist={}", broken.display()),
            ],
        );
        assert_eq!(blacklists.files, [broken.clone()]);
        assert_eq!(
            messages,
            [
                format!("no such file or directory: '{}'", missing.display()),
                format!(
                    "malformed sanitizer blacklist: 'error parsing file '{}': malformed line 2: 'nope''",
                    broken.display()
                ),
            ]
        );
    }
}
