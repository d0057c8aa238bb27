// Command-line front end for oxibrain.
//
// Two subcommands: `run` executes a source in any dialect, `convert`
// rewrites it into another dialect.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::detect::Dialect;
use crate::io::{self as oio, IoError, Source};
use crate::png;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Interpreter and converter for tape programs and their image dialects.
#[derive(Parser, Debug)]
#[command(
    name = "oxibrain",
    version,
    about = "Run and convert tape programs and their image dialects",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (errors only).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run a program.
    Run(RunArgs),
    /// Convert a program to another dialect.
    Convert(ConvertArgs),
}

/// Source dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TypeArg {
    /// Detect from the source bytes.
    Auto,
    /// Program text.
    Tape,
    /// Image of exact command colours.
    Path,
    /// Program embedded in a picture.
    Color,
}

/// Output dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputArg {
    Tape,
    Path,
    Color,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Source dialect.
    #[arg(short = 't', long = "type", value_enum, default_value_t = TypeArg::Auto)]
    source_type: TypeArg,

    /// Source file (stdin if omitted).
    #[arg(value_name = "SOURCE", value_hint = ValueHint::FilePath)]
    source: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Source dialect.
    #[arg(short = 't', long = "type", value_enum, default_value_t = TypeArg::Auto)]
    source_type: TypeArg,

    /// Output dialect.
    #[arg(short = 'o', long = "output", value_enum)]
    output_type: OutputArg,

    /// Host picture for colour output.
    #[arg(short = 'i', long = "image", value_name = "HOST", value_hint = ValueHint::FilePath)]
    image: Option<PathBuf>,

    /// Print conversion stats as JSON to stderr.
    #[arg(long = "json")]
    json_output: bool,

    /// Source file (stdin if omitted).
    #[arg(value_name = "SOURCE", value_hint = ValueHint::FilePath)]
    source: Option<PathBuf>,

    /// Destination file (stdout if omitted).
    #[arg(value_name = "DEST", value_hint = ValueHint::FilePath)]
    destination: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Convert,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    /// `None` means auto-detect.
    source_type: Option<Dialect>,
    output_type: Option<Dialect>,
    host_image: Option<PathBuf>,
    source_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    json_output: bool,
}

fn source_dialect(arg: TypeArg) -> Option<Dialect> {
    match arg {
        TypeArg::Auto => None,
        TypeArg::Tape => Some(Dialect::Tape),
        TypeArg::Path => Some(Dialect::Path),
        TypeArg::Color => Some(Dialect::Color),
    }
}

fn output_dialect(arg: OutputArg) -> Dialect {
    match arg {
        OutputArg::Tape => Dialect::Tape,
        OutputArg::Path => Dialect::Path,
        OutputArg::Color => Dialect::Color,
    }
}

fn resolve_options(cli: Cli) -> Options {
    let quiet = cli.quiet;
    let verbose = cli.verbose.min(3);
    let force = cli.force;

    match cli.command {
        Cmd::Run(args) => Options {
            command: Command::Run,
            force,
            quiet,
            verbose,
            source_type: source_dialect(args.source_type),
            output_type: None,
            host_image: None,
            source_file: args.source,
            output_file: None,
            json_output: false,
        },
        Cmd::Convert(args) => Options {
            command: Command::Convert,
            force,
            quiet,
            verbose,
            source_type: source_dialect(args.source_type),
            output_type: Some(output_dialect(args.output_type)),
            host_image: args.image,
            source_file: args.source,
            output_file: args.destination,
            json_output: args.json_output,
        },
    }
}

/// Usage problems clap cannot express, checked before any work is done.
fn validate_options(opts: &Options) -> Result<(), String> {
    if opts.output_type == Some(Dialect::Color) && opts.host_image.is_none() {
        return Err("--output color requires a host picture (--image HOST.png)".into());
    }
    if opts.host_image.is_some() && opts.output_type != Some(Dialect::Color) {
        return Err("--image is only used with --output color".into());
    }
    Ok(())
}

fn log_filter(opts: &Options) -> &'static str {
    if opts.quiet {
        return "error";
    }
    match opts.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("oxibrain".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let opts = resolve_options(cli);
        let _ = validate_options(&opts);
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn report(context: &str, e: &IoError) -> i32 {
    match context {
        "" => eprintln!("oxibrain: {e}"),
        _ => eprintln!("oxibrain: {context}: {e}"),
    }
    1
}

fn load_source(opts: &Options) -> Result<(Dialect, Source), i32> {
    let name = opts
        .source_file
        .as_ref()
        .map_or_else(|| "stdin".to_string(), |p| p.display().to_string());
    let (dialect, source) =
        oio::load_path(opts.source_file.as_deref(), opts.source_type).map_err(|e| report(&name, &e))?;
    if opts.source_type.is_none() && opts.verbose > 0 && !opts.quiet {
        eprintln!("oxibrain: {name}: detected {dialect} source");
    }
    Ok((dialect, source))
}

// ---------------------------------------------------------------------------
// Run command
// ---------------------------------------------------------------------------

fn cmd_run(opts: &Options) -> i32 {
    let (dialect, source) = match load_source(opts) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = oio::run(&source, dialect, &mut out);
    let _ = out.flush();

    match result {
        Ok(tape) => {
            if opts.verbose > 1 && !opts.quiet {
                eprintln!(
                    "oxibrain: halted with {} cells, cursor at {}",
                    tape.cells().len(),
                    tape.cursor()
                );
            }
            0
        }
        Err(e) => report("", &e),
    }
}

// ---------------------------------------------------------------------------
// Convert command
// ---------------------------------------------------------------------------

fn cmd_convert(opts: &Options) -> i32 {
    let Some(target) = opts.output_type else {
        eprintln!("oxibrain: convert requires an output dialect");
        return 1;
    };

    if let Some(path) = &opts.output_file {
        if path.exists() && !opts.force {
            eprintln!(
                "oxibrain: output file exists, use -f to overwrite: {}",
                path.display()
            );
            return 1;
        }
    }

    let host = match &opts.host_image {
        Some(path) => match oio::read_bytes(Some(path.as_path())).and_then(|b| Ok(png::decode(&b)?)) {
            Ok(image) => Some(image),
            Err(e) => return report(&format!("host image: {}", path.display()), &e),
        },
        None => None,
    };

    let (dialect, source) = match load_source(opts) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let (output, stats) = match oio::convert(&source, dialect, target, host.as_ref()) {
        Ok(converted) => converted,
        Err(e) => return report("convert", &e),
    };

    if let Err(e) = oio::write_output(opts.output_file.as_deref(), output.as_bytes(), opts.force) {
        return report("write", &e);
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "oxibrain: {} -> {}: {} instructions, {} bytes",
            stats.source, stats.output, stats.instructions, stats.output_size
        );
    }

    if opts.json_output {
        let json = serde_json::json!({
            "source_type": stats.source.name(),
            "output_type": stats.output.name(),
            "instructions": stats.instructions,
            "width": stats.dimensions.map(|(w, _)| w),
            "height": stats.dimensions.map(|(_, h)| h),
            "output_size": stats.output_size,
        });
        match serde_json::to_string_pretty(&json) {
            Ok(text) => eprintln!("{text}"),
            Err(e) => {
                eprintln!("oxibrain: json: {e}");
                return 1;
            }
        }
    }

    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(&opts)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(msg) = validate_options(&opts) {
        eprintln!("oxibrain: {msg}");
        process::exit(2);
    }

    let exit_code = match opts.command {
        Command::Run => cmd_run(&opts),
        Command::Convert => cmd_convert(&opts),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
