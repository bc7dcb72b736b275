use sanitas_driver::{
    parse_and_resolve, resolve, resolve_with_args, ArgList, CoverageFeatures, DiagnosticCode,
    DriverConfig, DriverMode, Resolution, ResolveError, RttiMode, SanitizerMask, Severity,
    Subject, TargetTriple, Toolchain,
};

type M = SanitizerMask;

fn toolchain(triple: &str) -> Toolchain {
    Toolchain::new(TargetTriple::parse(triple).unwrap())
}

fn run(args: &[&str]) -> Resolution {
    run_on("x86_64-unknown-linux-gnu", args)
}

fn run_on(triple: &str, args: &[&str]) -> Resolution {
    let args = ArgList::parse(args).unwrap();
    resolve_with_args(&toolchain(triple), &DriverConfig::default(), &args)
}

fn codes(resolution: &Resolution) -> Vec<DiagnosticCode> {
    resolution.report.diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn last_flag_wins() {
    let resolution = run(&["-fsanitize=address", "-fno-sanitize=address"]);
    assert!(!resolution.args.sanitizers().contains(M::ADDRESS));

    let resolution = run(&["-fno-sanitize=address", "-fsanitize=address"]);
    assert!(resolution.args.sanitizers().contains(M::ADDRESS));

    let resolution = run(&["-fsanitize=undefined", "-fno-sanitize=shift,null"]);
    assert_eq!(
        resolution.args.sanitizers(),
        M::UNDEFINED - M::SHIFT - M::NULL
    );
    assert!(resolution.report.is_empty());
}

#[test]
fn address_wins_over_thread() {
    let resolution = run(&["-fsanitize=address,thread"]);
    assert_eq!(resolution.args.sanitizers(), M::ADDRESS);

    let dropped: Vec<_> = resolution
        .report
        .with_code(DiagnosticCode::MutuallyExclusiveKinds)
        .collect();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].subject, Subject::Kinds(M::THREAD));
    assert_eq!(resolution.report.len(), 1);
}

#[test]
fn legacy_coverage_level() {
    let resolution = run(&["-fsanitize=address", "-fsanitize-coverage=3"]);
    assert_eq!(resolution.args.coverage(), CoverageFeatures::EDGE);
    assert_eq!(codes(&resolution), [DiagnosticCode::DeprecatedSyntax]);
}

#[test]
fn coverage_conflict_keeps_both_bits() {
    let resolution = run(&["-fsanitize=address", "-fsanitize-coverage=func,edge"]);
    assert_eq!(
        resolution.args.coverage(),
        CoverageFeatures::FUNC | CoverageFeatures::EDGE
    );
    assert_eq!(codes(&resolution), [DiagnosticCode::CoverageConflict]);
}

#[test]
fn track_origins() {
    let resolution = run(&["-fsanitize=memory"]);
    assert_eq!(resolution.args.msan_track_origins(), 0);

    let resolution = run(&["-fsanitize=memory", "-fsanitize-memory-track-origins"]);
    assert_eq!(resolution.args.msan_track_origins(), 2);

    let resolution = run(&["-fsanitize=memory", "-fsanitize-memory-track-origins=7"]);
    assert_eq!(resolution.args.msan_track_origins(), 7);
    assert_eq!(codes(&resolution), [DiagnosticCode::InvalidNumericValue]);
}

#[test]
fn trapping_undefined() {
    let resolution = run(&["-fsanitize=undefined", "-fsanitize-trap=undefined"]);
    let expected = M::UNDEFINED.expand_groups() - M::VPTR;
    assert_eq!(resolution.args.sanitizers(), expected);
    assert_eq!(resolution.args.trap(), expected);
    assert!(resolution.args.recoverable().is_empty());
    assert!(resolution.report.is_empty());
    assert!(!resolution.args.needs_ubsan_rt());
}

#[test]
fn explicit_vptr_while_trapping() {
    let resolution = run(&[
        "-fsanitize-undefined-trap-on-error",
        "-fsanitize=vptr,null",
    ]);
    assert_eq!(resolution.args.sanitizers(), M::NULL);
    assert_eq!(resolution.args.trap(), M::NULL);
    assert_eq!(codes(&resolution), [DiagnosticCode::IncompatibleWithTrapping]);
    assert_eq!(
        resolution.report.diagnostics[0].message,
        "invalid argument '-fsanitize=vptr' not allowed with '-fsanitize-trap=undefined'"
    );
}

#[test]
fn rtti_severity_depends_on_how_it_was_disabled() {
    let resolution = run_on("x86_64-scei-ps4", &["-fsanitize=vptr"]);
    assert!(resolution.args.sanitizers().is_empty());
    assert_eq!(resolution.report.diagnostics[0].severity, Severity::Warning);

    let resolution = run(&["-fno-rtti", "-fsanitize=vptr"]);
    assert!(resolution.args.sanitizers().is_empty());
    assert_eq!(resolution.report.diagnostics[0].severity, Severity::Error);
    assert_eq!(
        resolution.report.diagnostics[0].message,
        "invalid argument '-fsanitize=vptr' not allowed with '-fno-rtti'"
    );

    // The group silently loses vptr.
    let resolution = run(&["-fno-rtti", "-fsanitize=undefined"]);
    assert_eq!(resolution.args.sanitizers(), M::UNDEFINED - M::VPTR);
    assert!(resolution.report.is_empty());
}

#[test]
fn cfi_requirements() {
    let resolution = run(&["-fsanitize=cfi"]);
    assert_eq!(resolution.args.sanitizers(), M::CFI);
    assert_eq!(resolution.args.trap(), M::CFI);
    assert_eq!(
        codes(&resolution),
        [DiagnosticCode::MissingLto, DiagnosticCode::MissingVisibility]
    );

    let resolution = run(&[
        "-flto",
        "-fvisibility=hidden",
        "-fsanitize=cfi",
        "-fsanitize-cfi-cross-dso",
    ]);
    assert!(resolution.report.is_empty());
    assert!(resolution.args.cfi_cross_dso());
    assert!(resolution.args.requires_pie());
    assert!(resolution.args.needs_cfi_rt());
}

#[test]
fn toolchain_defaults_fill_in() {
    let tc = toolchain("x86_64-unknown-linux-gnu").with_default_sanitizers(M::SAFE_STACK | M::LEAK);
    let args = ArgList::parse(["-fno-sanitize=leak"]).unwrap();
    let resolution = resolve(&tc, &DriverConfig::default(), &args);
    assert_eq!(resolution.args.sanitizers(), M::SAFE_STACK);
}

#[test]
fn implicit_rtti_mode_can_be_forced() {
    let tc = toolchain("x86_64-unknown-linux-gnu").with_rtti_mode(RttiMode::DisabledImplicitly, None);
    let args = ArgList::parse(["-fsanitize=vptr"]).unwrap();
    let resolution = resolve(&tc, &DriverConfig::default(), &args);
    assert!(resolution.report.is_ok());
    assert_eq!(resolution.report.warnings().count(), 1);
}

/// Distinct spellings of the deprecated `-fsanitize-coverage=1`.
fn deprecated_coverage(count: usize) -> Vec<String> {
    (1..=count)
        .map(|zeros| format!("-fsanitize-coverage={}1", "0".repeat(zeros)))
        .collect()
}

#[test]
fn cl_mode_caps_warnings() {
    let args = ArgList::parse(deprecated_coverage(150)).unwrap();
    let tc = toolchain("x86_64-pc-windows-msvc");

    let resolution = resolve(&tc, &DriverConfig::for_mode(DriverMode::Cl), &args);
    assert_eq!(resolution.report.len(), 100);
    assert!(!resolution.report.has_errors());

    let resolution = resolve(&tc, &DriverConfig::default(), &args);
    assert_eq!(resolution.report.len(), 150);
}

#[test]
fn errors_survive_a_full_report() {
    let mut values = vec![
        "-fsanitize=address".to_string(),
        "-fsanitize-address-field-padding=9".to_string(),
    ];
    values.extend(deprecated_coverage(100));
    let tc = toolchain("x86_64-unknown-linux-gnu");
    let cfg = DriverConfig::for_mode(DriverMode::Cl);

    let resolution = resolve(&tc, &cfg, &ArgList::parse(&values).unwrap());
    assert_eq!(resolution.report.len(), 101);
    assert!(resolution.report.has_errors());
    assert_eq!(
        codes(&resolution).last(),
        Some(&DiagnosticCode::InvalidNumericValue)
    );

    let result = parse_and_resolve(&tc, &cfg, &values);
    assert!(matches!(result, Err(ResolveError::Rejected(_))));
}

#[test]
fn link_cxx_runtimes_follows_driver_mode() {
    let args = ArgList::parse(["-fsanitize=address"]).unwrap();
    let tc = toolchain("x86_64-unknown-linux-gnu");

    let resolution = resolve(&tc, &DriverConfig::for_mode(DriverMode::Gxx), &args);
    assert!(resolution.args.link_cxx_runtimes());

    let resolution = resolve(&tc, &DriverConfig::default(), &args);
    assert!(!resolution.args.link_cxx_runtimes());

    let args = ArgList::parse(["-fsanitize-link-c++-runtime"]).unwrap();
    let resolution = resolve(&tc, &DriverConfig::default(), &args);
    assert!(resolution.args.link_cxx_runtimes());
}

#[test]
fn unknown_values_are_reported_per_option() {
    let resolution = run(&[
        "-fsanitize=address,foo",
        "-fsanitize-coverage=edge,foo",
        "-fsanitize=foo",
    ]);
    assert_eq!(resolution.args.sanitizers(), M::ADDRESS);
    assert_eq!(resolution.args.coverage(), CoverageFeatures::EDGE);

    let subjects: Vec<_> = resolution
        .report
        .with_code(DiagnosticCode::UnknownOption)
        .map(|d| d.subject.to_string())
        .collect();
    assert_eq!(
        subjects,
        ["`-fsanitize=foo`", "`-fsanitize-coverage=foo`"]
    );
}
