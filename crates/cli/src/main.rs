use std::{path::PathBuf, process};

use clap::{Parser, ValueEnum};
use sanitas_driver::{
    resolve_with_args, ArgList, DriverConfig, DriverMode, InputKind, Resolution, SanitizerArgs,
    Toolchain,
};
use sanitas_triple::TargetTriple;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Resolves the sanitizer options of a compiler command line and prints the
/// resulting configuration and frontend flags.
#[derive(Parser, Debug)]
#[command(name = "sanitas", version, about, long_about = None)]
struct Cli {
    /// Target triple to resolve for.
    #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
    target: String,

    #[arg(long, value_enum, default_value_t = Mode::Gcc)]
    driver_mode: Mode,

    /// Compiler resource directory holding default blacklists and runtimes.
    #[arg(long)]
    resource_dir: Option<PathBuf>,

    /// Treat the compilation as using LTO even without `-flto`.
    #[arg(long)]
    lto: bool,

    #[arg(long, value_enum, default_value_t = Input::C)]
    input: Input,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Compiler arguments, after `--`.
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Gcc,
    #[value(name = "g++")]
    Gxx,
    Cl,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Input {
    C,
    #[value(name = "c++")]
    Cxx,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    target: String,
    config: &'a SanitizerArgs,
    flags: &'a [String],
    report: &'a sanitas_driver::ResolutionReport,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SANITAS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let triple = match TargetTriple::parse(&cli.target) {
        Ok(triple) => triple,
        Err(err) => {
            eprintln!("error: invalid target `{}`: {err}", cli.target);
            process::exit(2);
        }
    };

    let args = match ArgList::parse(&cli.args) {
        Ok(args) => args,
        Err(errors) => {
            for error in errors {
                eprintln!("error: {error}");
            }
            process::exit(2);
        }
    };

    let mode = match cli.driver_mode {
        Mode::Gcc => DriverMode::Gcc,
        Mode::Gxx => DriverMode::Gxx,
        Mode::Cl => DriverMode::Cl,
    };
    let mut cfg = DriverConfig::for_mode(mode);
    if let Some(resource_dir) = cli.resource_dir {
        cfg = cfg.with_resource_dir(resource_dir);
    }
    cfg.lto |= cli.lto;

    let input = match cli.input {
        Input::C => InputKind::C,
        Input::Cxx => InputKind::Cxx,
    };

    let toolchain = Toolchain::new(triple);
    let resolution = resolve_with_args(&toolchain, &cfg, &args);
    let flags = resolution.args.frontend_args(&toolchain, &cfg, input);
    tracing::debug!(flags = flags.len(), "lowered sanitizer configuration");

    match cli.format {
        Format::Text => print_text(&resolution, &flags),
        Format::Json => {
            let output = JsonOutput {
                target: toolchain.triple.to_string(),
                config: &resolution.args,
                flags: &flags,
                report: &resolution.report,
            };
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{json}"),
                Err(err) => {
                    eprintln!("error: failed to serialize output: {err}");
                    process::exit(2);
                }
            }
        }
    }

    process::exit(if resolution.report.has_errors() { 1 } else { 0 });
}

fn print_text(resolution: &Resolution, flags: &[String]) {
    let args = &resolution.args;
    println!("sanitizers:  {}", args.sanitizers());
    println!("recoverable: {}", args.recoverable());
    println!("trap:        {}", args.trap());
    println!("coverage:    {}", args.coverage());
    for flag in flags {
        println!("{flag}");
    }
    if !resolution.report.is_empty() {
        eprint!("{}", resolution.report);
    }
}
